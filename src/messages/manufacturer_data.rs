//! # Manufacturer Data Record
//!
//! Application payload of a sensor node, carried as one manufacturer specific AD structure.
//!
//! ## Layout (8 bytes)
//!
//! ```text
//! | uuid (2) | humidity (2) | temperature (2) | status (1) | reserved (1) |
//! ```
//!
//! - Humidity and temperature are tenths in sign-magnitude, big-endian: bit 15 is the sign,
//!   bits 14-0 the magnitude. This is the sensor's native format and what the station app
//!   decodes.
//! - Status byte: bits 1-0 battery level, bit 2 sensor failure, bits 7-3 reserved (zero).

/// Identifier of the two-temperature/two-humidity byte weather node record
pub const WEATHER_NODE_UUID: [u8; 2] = [0xA9, 0x53];

const STATUS_BATTERY_MASK: u8 = 0x03;
const STATUS_SENSOR_FAILURE: u8 = 0x04;

/// A measurement in tenths of its unit (percent relative humidity or degrees Celsius)
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
#[cfg_attr(feature = "std", derive(Debug))]
pub struct Tenths(i16);

impl Tenths {
    pub const fn from_tenths(tenths: i16) -> Self {
        Tenths(tenths)
    }

    pub const fn tenths(self) -> i16 {
        self.0
    }

    pub fn as_f32(self) -> f32 {
        self.0 as f32 / 10.0
    }

    /// Decode the big-endian sign-magnitude wire form
    pub const fn from_sign_magnitude(bytes: [u8; 2]) -> Self {
        let magnitude = (((bytes[0] & 0x7F) as i16) << 8) | bytes[1] as i16;
        if bytes[0] & 0x80 != 0 { Tenths(-magnitude) } else { Tenths(magnitude) }
    }

    /// Encode to the big-endian sign-magnitude wire form, saturating at 15 bits of magnitude
    pub const fn to_sign_magnitude(self) -> [u8; 2] {
        let mut magnitude = self.0.unsigned_abs();
        if magnitude > 0x7FFF {
            magnitude = 0x7FFF;
        }
        let sign = if self.0 < 0 { 0x80 } else { 0x00 };
        [((magnitude >> 8) as u8) | sign, magnitude as u8]
    }
}

/// Remaining battery capacity, as tracked by brown-out threshold steps
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
#[cfg_attr(feature = "std", derive(Debug))]
pub enum BatteryLevel {
    #[default]
    High = 0,
    MediumHigh = 1,
    MediumLow = 2,
    Low = 3,
}

impl BatteryLevel {
    /// Decode from the two least significant bits of `bits`
    pub const fn from_bits(bits: u8) -> Self {
        match bits & STATUS_BATTERY_MASK {
            0 => BatteryLevel::High,
            1 => BatteryLevel::MediumHigh,
            2 => BatteryLevel::MediumLow,
            _ => BatteryLevel::Low,
        }
    }

    pub const fn bits(self) -> u8 {
        self as u8
    }

    /// One step lower, `Low` stays `Low`
    pub const fn lower(self) -> Self {
        match self {
            BatteryLevel::High => BatteryLevel::MediumHigh,
            BatteryLevel::MediumHigh => BatteryLevel::MediumLow,
            BatteryLevel::MediumLow | BatteryLevel::Low => BatteryLevel::Low,
        }
    }
}

/// Packed status byte of the record
#[derive(Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "std", derive(Debug))]
pub struct StatusFlags {
    pub battery_level: BatteryLevel,
    pub sensor_failure: bool,
}

impl StatusFlags {
    pub const fn to_byte(self) -> u8 {
        let mut byte = self.battery_level.bits();
        if self.sensor_failure {
            byte |= STATUS_SENSOR_FAILURE;
        }
        byte
    }

    /// Decode a status byte, ignoring the reserved bits
    pub const fn from_byte(byte: u8) -> Self {
        StatusFlags {
            battery_level: BatteryLevel::from_bits(byte),
            sensor_failure: byte & STATUS_SENSOR_FAILURE != 0,
        }
    }
}

/// The record a sensor node broadcasts
#[derive(Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "std", derive(Debug))]
pub struct ManufacturerData {
    pub uuid: [u8; 2],
    pub humidity: Tenths,
    pub temperature: Tenths,
    pub status: StatusFlags,
}

impl ManufacturerData {
    /// Encoded size, fixed so the record always fits next to the flags and name structures
    pub const SIZE: usize = 8;

    /// Weather node record with full battery and no sensor failure
    pub const fn new(humidity: Tenths, temperature: Tenths) -> Self {
        ManufacturerData {
            uuid: WEATHER_NODE_UUID,
            humidity,
            temperature,
            status: StatusFlags {
                battery_level: BatteryLevel::High,
                sensor_failure: false,
            },
        }
    }

    pub const fn to_bytes(&self) -> [u8; Self::SIZE] {
        let humidity = self.humidity.to_sign_magnitude();
        let temperature = self.temperature.to_sign_magnitude();
        [
            self.uuid[0],
            self.uuid[1],
            humidity[0],
            humidity[1],
            temperature[0],
            temperature[1],
            self.status.to_byte(),
            0,
        ]
    }

    /// Decode a record from manufacturer specific data
    ///
    /// # Returns
    /// * `Some(record)` if `bytes` holds at least SIZE bytes (extra bytes are ignored)
    /// * `None` otherwise
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        if bytes.len() < Self::SIZE {
            return None;
        }
        Some(ManufacturerData {
            uuid: [bytes[0], bytes[1]],
            humidity: Tenths::from_sign_magnitude([bytes[2], bytes[3]]),
            temperature: Tenths::from_sign_magnitude([bytes[4], bytes[5]]),
            status: StatusFlags::from_byte(bytes[6]),
        })
    }

    pub fn is_weather_node(&self) -> bool {
        self.uuid == WEATHER_NODE_UUID
    }
}

#[cfg(all(test, feature = "std"))]
mod tests {
    use super::*;

    #[test]
    fn reference_record_encoding() {
        let record = ManufacturerData::new(Tenths::from_tenths(730), Tenths::from_tenths(270));
        assert_eq!(record.to_bytes(), [0xA9, 0x53, 0x02, 0xDA, 0x01, 0x0E, 0x00, 0x00]);
    }

    #[test]
    fn negative_values_use_sign_bit() {
        assert_eq!(Tenths::from_tenths(-101).to_sign_magnitude(), [0x80, 0x65]);
        assert_eq!(Tenths::from_sign_magnitude([0x80, 0x65]), Tenths::from_tenths(-101));
        assert_eq!(Tenths::from_sign_magnitude([0x00, 0x00]), Tenths::from_tenths(0));
    }

    #[test]
    fn magnitude_saturates() {
        assert_eq!(Tenths::from_tenths(i16::MIN).to_sign_magnitude(), [0xFF, 0xFF]);
        assert_eq!(Tenths::from_tenths(i16::MAX).to_sign_magnitude(), [0x7F, 0xFF]);
    }

    #[test]
    fn status_byte_packing() {
        let status = StatusFlags {
            battery_level: BatteryLevel::MediumLow,
            sensor_failure: true,
        };
        assert_eq!(status.to_byte(), 0x06);
        assert_eq!(StatusFlags::from_byte(0x06), status);
        // Reserved bits are ignored on decode
        assert_eq!(StatusFlags::from_byte(0xF9).battery_level, BatteryLevel::MediumHigh);
        assert!(!StatusFlags::from_byte(0xF9).sensor_failure);
    }

    #[test]
    fn battery_level_only_goes_down() {
        assert_eq!(BatteryLevel::High.lower(), BatteryLevel::MediumHigh);
        assert_eq!(BatteryLevel::MediumHigh.lower(), BatteryLevel::MediumLow);
        assert_eq!(BatteryLevel::MediumLow.lower(), BatteryLevel::Low);
        assert_eq!(BatteryLevel::Low.lower(), BatteryLevel::Low);
    }

    #[test]
    fn decodes_what_the_station_app_expects() {
        let bytes = [0xA9, 0x53, 0x02, 0xDA, 0x80, 0x32, 0x07, 0x00];
        let record = ManufacturerData::from_bytes(&bytes).unwrap();
        assert!(record.is_weather_node());
        assert_eq!(record.humidity.as_f32(), 73.0);
        assert_eq!(record.temperature.as_f32(), -5.0);
        assert_eq!(record.status.battery_level, BatteryLevel::Low);
        assert!(record.status.sensor_failure);
    }

    #[test]
    fn short_data_is_not_a_record() {
        assert!(ManufacturerData::from_bytes(&[0xA9, 0x53, 0x02]).is_none());
    }
}
