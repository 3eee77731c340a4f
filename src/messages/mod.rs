//! # Messages Module
//!
//! Data structures for the bytes that travel over the air.
//!
//! ## Architecture
//!
//! - **AdvertisingPdu**: the single reusable buffer an advertising PDU is built into
//! - **AdStructure**: length-prefixed, typed chunk of advertising data
//! - **ManufacturerData**: the sensor record carried in the manufacturer specific AD structure
//! - **ServiceData**: temperature and battery readings as 16-bit UUID service data
//! - **RadioFrame**: fixed-size byte frame exchanged with the radio
//!
//! ## PDU Layout
//!
//! ```text
//! | type (1) | length (1) | device address (6) | advertising data (1..=21) | CRC (3) |
//! ```
//!
//! `length` covers the device address and the advertising data, not the header or the CRC.
//! Nothing here allocates: every buffer has a fixed capacity of RADIO_PAYLOAD_MAX bytes.

pub mod ad_structure;
pub mod advertising_pdu;
pub mod device_name;
pub mod manufacturer_data;
pub mod radio_frame;
pub mod service_data;

pub use ad_structure::{ADVERTISING_FLAGS, AdStructure, AdStructureIter, AdType};
pub use advertising_pdu::{AdvertisingPdu, DeviceAddress};
pub use device_name::DeviceName;
pub use manufacturer_data::{BatteryLevel, ManufacturerData, StatusFlags, Tenths, WEATHER_NODE_UUID};
pub use radio_frame::RadioFrame;
pub use service_data::{BATTERY_SERVICE_UUID, NrfFloat, ServiceData, TEMPERATURE_SERVICE_UUID};
