//! # Service Data
//!
//! 16-bit UUID service data, the layout the second firmware generation advertises its
//! readings in.
//!
//! ```text
//! | uuid (2, little-endian) | value (1..=4) |
//! ```
//!
//! - Health Thermometer (0x1809): the value is a 4-byte [`NrfFloat`]
//! - Battery Service (0x180F): the value is one byte of remaining capacity in percent

use super::ad_structure::{AdStructure, AdType};
use super::manufacturer_data::Tenths;

/// Health Thermometer service
pub const TEMPERATURE_SERVICE_UUID: u16 = 0x1809;
/// Battery Service
pub const BATTERY_SERVICE_UUID: u16 = 0x180F;

const UUID_SIZE: usize = 2;
const MAX_VALUE_SIZE: usize = 4;
const MANTISSA_MASK: u32 = 0x00FF_FFFF;
const HUNDREDTHS_EXPONENT: i8 = -2;

/// IEEE 11073 32-bit FLOAT: 8-bit signed exponent over a 24-bit signed mantissa
///
/// Values are always encoded in hundredths (exponent -2), like the nRF SDK helpers do.
#[derive(Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "std", derive(Debug))]
pub struct NrfFloat(u32);

impl NrfFloat {
    /// Encode a value given in hundredths; only the low 24 bits of `hundredths` are kept
    pub const fn from_hundredths(hundredths: i32) -> Self {
        let exponent = (HUNDREDTHS_EXPONENT as u8 as u32) << 24;
        NrfFloat(exponent | (hundredths as u32 & MANTISSA_MASK))
    }

    /// Encode `value`, truncating toward zero at the hundredths digit
    ///
    /// # Examples
    /// ```rust
    /// use softble_radio_lib::messages::NrfFloat;
    ///
    /// assert_eq!(NrfFloat::from_f32(27.0).raw(), 0xFE00_0A8C);
    /// ```
    pub fn from_f32(value: f32) -> Self {
        Self::from_hundredths((value * 100.0) as i32)
    }

    pub const fn from_tenths(value: Tenths) -> Self {
        Self::from_hundredths(value.tenths() as i32 * 10)
    }

    pub const fn from_raw(raw: u32) -> Self {
        NrfFloat(raw)
    }

    pub const fn raw(self) -> u32 {
        self.0
    }

    pub const fn exponent(self) -> i8 {
        (self.0 >> 24) as u8 as i8
    }

    /// Sign-extended 24-bit mantissa
    pub const fn mantissa(self) -> i32 {
        ((self.0 << 8) as i32) >> 8
    }

    pub fn as_f32(self) -> f32 {
        let mut value = self.mantissa() as f32;
        let exponent = self.exponent();
        for _ in 0..exponent.unsigned_abs() {
            if exponent < 0 {
                value /= 10.0;
            } else {
                value *= 10.0;
            }
        }
        value
    }

    pub const fn to_le_bytes(self) -> [u8; 4] {
        self.0.to_le_bytes()
    }

    pub const fn from_le_bytes(bytes: [u8; 4]) -> Self {
        NrfFloat(u32::from_le_bytes(bytes))
    }
}

/// Service data payload: UUID followed by its value, ready to be wrapped in an AD structure
#[derive(Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "std", derive(Debug))]
pub struct ServiceData {
    bytes: [u8; UUID_SIZE + MAX_VALUE_SIZE],
    length: usize,
}

impl ServiceData {
    /// Health Thermometer reading
    pub const fn temperature(value: NrfFloat) -> Self {
        let uuid = TEMPERATURE_SERVICE_UUID.to_le_bytes();
        let value = value.to_le_bytes();
        ServiceData {
            bytes: [uuid[0], uuid[1], value[0], value[1], value[2], value[3]],
            length: UUID_SIZE + 4,
        }
    }

    /// Battery level, capped at 100 percent
    pub const fn battery(percentage: u8) -> Self {
        let uuid = BATTERY_SERVICE_UUID.to_le_bytes();
        let percentage = if percentage > 100 { 100 } else { percentage };
        ServiceData {
            bytes: [uuid[0], uuid[1], percentage, 0, 0, 0],
            length: UUID_SIZE + 1,
        }
    }

    /// Parse the data of a service data AD structure
    ///
    /// Returns `None` when the UUID is missing or the value is longer than any service
    /// carried here.
    pub fn from_bytes(data: &[u8]) -> Option<Self> {
        if data.len() <= UUID_SIZE || data.len() > UUID_SIZE + MAX_VALUE_SIZE {
            return None;
        }
        let mut bytes = [0u8; UUID_SIZE + MAX_VALUE_SIZE];
        bytes[..data.len()].copy_from_slice(data);
        Some(ServiceData { bytes, length: data.len() })
    }

    pub fn uuid(&self) -> u16 {
        u16::from_le_bytes([self.bytes[0], self.bytes[1]])
    }

    pub fn value(&self) -> &[u8] {
        &self.bytes[UUID_SIZE..self.length]
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes[..self.length]
    }

    /// The temperature, if this is a complete Health Thermometer payload
    pub fn temperature_value(&self) -> Option<NrfFloat> {
        if self.uuid() != TEMPERATURE_SERVICE_UUID {
            return None;
        }
        let value: [u8; 4] = self.value().try_into().ok()?;
        Some(NrfFloat::from_le_bytes(value))
    }

    pub fn battery_percentage(&self) -> Option<u8> {
        match self.value() {
            [percentage] if self.uuid() == BATTERY_SERVICE_UUID => Some(*percentage),
            _ => None,
        }
    }

    pub fn ad_structure(&self) -> AdStructure<'_> {
        AdStructure::new(AdType::ServiceData16, self.as_bytes())
    }
}

#[cfg(all(test, feature = "std"))]
mod tests {
    use super::*;

    #[test]
    fn encodes_in_hundredths() {
        let value = NrfFloat::from_f32(27.0);
        assert_eq!(value.raw(), 0xFE00_0A8C);
        assert_eq!(value.to_le_bytes(), [0x8C, 0x0A, 0x00, 0xFE]);
        assert_eq!(value.exponent(), -2);
        assert_eq!(value.mantissa(), 2700);
    }

    #[test]
    fn negative_mantissa_stays_in_24_bits() {
        let value = NrfFloat::from_f32(-5.0);
        assert_eq!(value.raw(), 0xFEFF_FE0C);
        assert_eq!(value.mantissa(), -500);
        assert_eq!(value.as_f32(), -5.0);
        assert_eq!(NrfFloat::from_tenths(Tenths::from_tenths(-50)), value);
    }

    #[test]
    fn decodes_wire_bytes() {
        let value = NrfFloat::from_le_bytes([0x8C, 0x0A, 0x00, 0xFE]);
        assert_eq!(value.as_f32(), 27.0);
        assert_eq!(NrfFloat::from_raw(0x0100_0003).as_f32(), 30.0);
    }

    #[test]
    fn temperature_service_data() {
        let data = ServiceData::temperature(NrfFloat::from_f32(27.0));
        assert_eq!(data.as_bytes(), &[0x09, 0x18, 0x8C, 0x0A, 0x00, 0xFE]);
        assert_eq!(data.uuid(), TEMPERATURE_SERVICE_UUID);
        assert_eq!(data.battery_percentage(), None);

        let structure = data.ad_structure();
        assert_eq!(structure.ad_type, AdType::ServiceData16);
        assert_eq!(structure.encoded_len(), 8);
    }

    #[test]
    fn battery_service_data() {
        let data = ServiceData::battery(87);
        assert_eq!(data.as_bytes(), &[0x0F, 0x18, 87]);
        assert_eq!(data.battery_percentage(), Some(87));
        assert_eq!(data.temperature_value(), None);
        assert_eq!(ServiceData::battery(250).battery_percentage(), Some(100));
    }

    #[test]
    fn parses_received_payloads() {
        let data = ServiceData::from_bytes(&[0x09, 0x18, 0x8C, 0x0A, 0x00, 0xFE]).unwrap();
        assert_eq!(data.temperature_value().map(NrfFloat::as_f32), Some(27.0));
        assert!(ServiceData::from_bytes(&[0x09, 0x18]).is_none());
        assert!(ServiceData::from_bytes(&[0x09, 0x18, 1, 2, 3, 4, 5]).is_none());
    }
}
