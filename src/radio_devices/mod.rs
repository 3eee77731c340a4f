//! Radio device implementations
//!
//! Each backend implements [`crate::RadioPort`] and exposes a `RadioDevice` type. The one
//! selected by cargo feature is re-exported from here:
//!
//! - `echo`: in-memory loopback for testing, transmitted frames are received back
//! - `nrf24`: nRF24L01(+) compatible transceiver over `embedded-hal` SPI

#[cfg(any(test, feature = "radio-device-echo"))]
pub mod echo;

#[cfg(any(test, feature = "radio-device-nrf24"))]
pub mod nrf24;

// Re-export the active radio device implementation
#[cfg(feature = "radio-device-echo")]
pub use echo::RadioDevice;

#[cfg(feature = "radio-device-nrf24")]
pub use nrf24::{Nrf24Configuration, Nrf24Error, RadioDevice, TxPower};
