#![cfg_attr(not(feature = "std"), no_std)]

//! # SoftBLE Radio Library
//!
//! Software-defined Bluetooth Low Energy advertising for plain 2.4 GHz packet radios.
//!
//! Radios such as the nRF24L01 family can shift raw bytes out at 1 Mbps on an arbitrary
//! frequency, but know nothing about BLE framing. This crate performs every PHY-layer step a
//! BLE scanner expects in software and hands the finished bytes to the radio:
//!
//! 1. Assemble the advertising PDU (header, device address, AD structures)
//! 2. Append the CRC-24 computed over header, address and advertising data
//! 3. Whiten the whole PDU with the channel-keyed LFSR
//! 4. Reverse the bit order of every byte (BLE is LSB-first on air, the radio MSB-first)
//!
//! The order of these steps is fixed; any other order produces frames a scanner silently drops.
//!
//! ## Radio devices
//!
//! The hardware is reached through the [`RadioPort`] trait. One backend is selected with a
//! cargo feature and re-exported as [`RadioDevice`]:
//!
//! - `radio-device-echo`: in-memory loopback, transmitted frames can be received back
//! - `radio-device-nrf24`: nRF24L01(+) compatible transceiver over `embedded-hal` SPI

#[cfg(all(feature = "radio-device-echo", feature = "radio-device-nrf24"))]
compile_error!("Only one radio implementation feature can be enabled at a time");

#[cfg(all(not(test), not(any(feature = "radio-device-echo", feature = "radio-device-nrf24"))))]
compile_error!("At least one radio implementation feature must be enabled");

pub mod advertiser;
pub mod beacon;
pub mod channel;
pub mod messages;
pub mod phy;
pub mod radio_devices;
pub mod scanner;
pub mod sensor;

pub use advertiser::{Advertiser, AdvertiserState, AdvertisingError};
pub use beacon::{BatteryTracker, BeaconConfiguration, BeaconScheduler, PowerMonitor, run_beacon};
pub use channel::{AdvertisingChannel, ChannelSequencer};
pub use messages::{
    AdStructure, AdStructureIter, AdType, AdvertisingPdu, BatteryLevel, DeviceAddress, DeviceName, ManufacturerData, NrfFloat, RadioFrame,
    ServiceData, StatusFlags, Tenths,
};
pub use scanner::{DecodeError, ReceivedAdvertisement, WEATHER_NODE_NAME_PREFIX, WeatherReport, decode_frame};
pub use sensor::{SensorError, SensorReading, SensorSource};

#[cfg(any(feature = "radio-device-echo", feature = "radio-device-nrf24"))]
pub use radio_devices::RadioDevice;

//Protocol constants, changing any of them breaks compatibility with BLE scanners

/// Largest frame the radio can shift out in one transmission
pub const RADIO_PAYLOAD_MAX: usize = 32;
/// PDU type byte followed by the payload length byte
pub const PDU_HEADER_SIZE: usize = 2;
pub const DEVICE_ADDRESS_SIZE: usize = 6;
pub const CRC_SIZE: usize = 3;
/// Room left for AD structures once header, address and CRC are accounted for
pub const MAX_ADVERTISING_DATA_SIZE: usize = RADIO_PAYLOAD_MAX - PDU_HEADER_SIZE - DEVICE_ADDRESS_SIZE - CRC_SIZE;
pub const MAX_DEVICE_NAME_LEN: usize = 6;

/// ADV_NONCONN_IND with the TxAdd bit set (random transmitter address)
pub const PDU_TYPE_ADV_NONCONN_IND_RANDOM: u8 = 0x42;

/// Access address shared by all advertising channel packets
pub const ADVERTISING_ACCESS_ADDRESS: u32 = 0x8E89_BED6;

/// Interface to the packet radio that carries the software-framed BLE packets
///
/// The radio is a plain 2.4 GHz transceiver. It is expected to be configured with the
/// advertising access address as its (bit-reversed) pipe address, 1 Mbps data rate and
/// every hardware framing feature (CRC, auto-ack, dynamic payloads) disabled, because all
/// BLE framing is done by this crate.
///
/// Note: Construction is not part of this trait as it depends entirely on the hardware
/// (bus, pins, timing).
///
/// # Examples
/// ```rust,ignore
/// use softble_radio_lib::RadioPort;
///
/// fn blast<R: RadioPort>(radio: &mut R, frame: &[u8]) -> Result<(), R::Error> {
///     radio.set_frequency(2)?; // 2402 MHz, BLE channel 37
///     radio.transmit(frame)?;
///     while !radio.transmit_queue_empty()? {}
///     Ok(())
/// }
/// ```
pub trait RadioPort {
    /// Error reported by the underlying hardware interface
    type Error;

    /// Tune the radio to `2400 + mhz_offset` MHz
    fn set_frequency(&mut self, mhz_offset: u8) -> Result<(), Self::Error>;

    /// Enqueue `frame` for transmission. Must not wait for the frame to leave the antenna.
    fn transmit(&mut self, frame: &[u8]) -> Result<(), Self::Error>;

    /// Returns `true` once every enqueued frame has been sent
    fn transmit_queue_empty(&mut self) -> Result<bool, Self::Error>;

    /// Copy a received raw frame into `buffer`, returning its length.
    ///
    /// Radios without a receive path keep the default, which never yields a frame.
    fn receive(&mut self, _buffer: &mut [u8]) -> Result<Option<usize>, Self::Error> {
        Ok(None)
    }

    /// Bring the radio up with the BLE-compatible configuration
    fn power_up(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }

    /// Put the radio into its lowest power state between advertising events
    fn power_down(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

/// Size limit violations, detected before anything is written or transmitted
#[derive(Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "std", derive(Debug))]
pub enum SizeViolation {
    /// An advertising PDU must carry at least one byte of advertising data
    AdvertisingDataEmpty,
    /// Advertising data exceeds MAX_ADVERTISING_DATA_SIZE (contains the offending length)
    AdvertisingDataTooLong(usize),
    /// Framed PDU exceeds RADIO_PAYLOAD_MAX (contains the offending length)
    FrameTooLong(usize),
    /// Device name exceeds MAX_DEVICE_NAME_LEN (contains the offending length)
    DeviceNameTooLong(usize),
}

#[cfg(all(test, feature = "std"))]
mod tests {
    use super::*;

    #[test]
    fn advertising_data_budget_matches_radio_payload() {
        assert_eq!(MAX_ADVERTISING_DATA_SIZE, 21);
        assert_eq!(PDU_HEADER_SIZE + DEVICE_ADDRESS_SIZE + MAX_ADVERTISING_DATA_SIZE + CRC_SIZE, RADIO_PAYLOAD_MAX);
    }

    #[test]
    fn default_receive_yields_nothing() {
        struct TxOnly;
        impl RadioPort for TxOnly {
            type Error = ();
            fn set_frequency(&mut self, _mhz_offset: u8) -> Result<(), ()> {
                Ok(())
            }
            fn transmit(&mut self, _frame: &[u8]) -> Result<(), ()> {
                Ok(())
            }
            fn transmit_queue_empty(&mut self) -> Result<bool, ()> {
                Ok(true)
            }
        }

        let mut radio = TxOnly;
        let mut buffer = [0u8; RADIO_PAYLOAD_MAX];
        assert_eq!(radio.receive(&mut buffer), Ok(None));
        assert_eq!(radio.power_up(), Ok(()));
        assert_eq!(radio.power_down(), Ok(()));
    }

    #[test]
    fn access_address_is_stored_bit_reversed_by_radios() {
        assert_eq!(ADVERTISING_ACCESS_ADDRESS.reverse_bits(), 0x6B7D_9171);
    }
}
