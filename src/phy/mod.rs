//! # PHY Module
//!
//! The bit-exact transformations BLE defines between a link-layer PDU and the bits on air.
//!
//! - **crc24**: CRC over header, address and advertising data
//! - **whitening**: channel-keyed XOR scrambling of the PDU and its CRC
//! - **bit_reversal**: LSB-first over-the-air order versus the radio's MSB-first shift order
//!
//! On transmit the steps run CRC, whiten, reverse. On receive they run in the opposite order:
//! reverse, de-whiten (whitening is its own inverse), then verify the CRC.
//!
//! All functions work in place on caller-owned buffers and never allocate.

pub mod bit_reversal;
pub mod crc24;
pub mod whitening;

pub use bit_reversal::reverse_bits;
pub use crc24::{CRC_INIT, crc24};
pub use whitening::{whiten, whiten_with_seed, whitening_seed};
