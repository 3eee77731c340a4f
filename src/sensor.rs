//! # Sensor Interface
//!
//! Temperature/humidity sensors feeding the manufacturer record.
//!
//! The bit-banged one-wire timing of the DHT22 is hardware specific and lives behind
//! [`SensorSource`]; this module only validates and decodes the 5-byte frame such a driver
//! reads: `| humidity (2) | temperature (2) | checksum |`, both values in sign-magnitude tenths.

use crate::messages::Tenths;

/// Number of bytes a DHT22 transfers per measurement
pub const DHT22_FRAME_SIZE: usize = 5;

/// One measurement
#[derive(Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "std", derive(Debug))]
pub struct SensorReading {
    pub humidity: Tenths,
    pub temperature: Tenths,
}

#[derive(Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "std", derive(Debug))]
pub enum SensorError {
    /// The sensor did not answer or a bit timed out
    NoResponse,
    /// Frame received but the checksum does not match
    Checksum,
}

/// Something that can be polled for a measurement
pub trait SensorSource {
    fn read(&mut self) -> Result<SensorReading, SensorError>;
}

/// Validate and decode a raw DHT22 frame
///
/// The checksum is the low byte of the sum of the four data bytes.
///
/// # Examples
/// ```rust
/// use softble_radio_lib::sensor::decode_dht22_frame;
///
/// let reading = decode_dht22_frame(&[0x02, 0xDA, 0x01, 0x0E, 0xEB]).unwrap();
/// assert_eq!(reading.humidity.tenths(), 730);
/// assert_eq!(reading.temperature.tenths(), 270);
/// ```
pub fn decode_dht22_frame(frame: &[u8; DHT22_FRAME_SIZE]) -> Result<SensorReading, SensorError> {
    let checksum = frame[..4].iter().fold(0u8, |acc, byte| acc.wrapping_add(*byte));
    if checksum != frame[4] {
        log::trace!("DHT22 checksum mismatch: computed {:#04x}, received {:#04x}", checksum, frame[4]);
        return Err(SensorError::Checksum);
    }
    Ok(SensorReading {
        humidity: Tenths::from_sign_magnitude([frame[0], frame[1]]),
        temperature: Tenths::from_sign_magnitude([frame[2], frame[3]]),
    })
}

#[cfg(all(test, feature = "std"))]
mod tests {
    use super::*;

    #[test]
    fn decodes_valid_frame() {
        let reading = decode_dht22_frame(&[0x02, 0xDA, 0x01, 0x0E, 0xEB]).unwrap();
        assert_eq!(reading.humidity, Tenths::from_tenths(730));
        assert_eq!(reading.temperature, Tenths::from_tenths(270));
    }

    #[test]
    fn negative_temperature() {
        // 0x80 0x65 is -10.1 C
        let frame = [0x01, 0x90, 0x80, 0x65, 0x76];
        let reading = decode_dht22_frame(&frame).unwrap();
        assert_eq!(reading.humidity, Tenths::from_tenths(400));
        assert_eq!(reading.temperature, Tenths::from_tenths(-101));
    }

    #[test]
    fn checksum_wraps_at_eight_bits() {
        // 0xFF + 0xFF + 0x02 + 0x03 = 0x203
        let frame = [0xFF, 0xFF, 0x02, 0x03, 0x03];
        assert!(decode_dht22_frame(&frame).is_ok());
    }

    #[test]
    fn rejects_bad_checksum() {
        assert_eq!(decode_dht22_frame(&[0x02, 0xDA, 0x01, 0x0E, 0x00]), Err(SensorError::Checksum));
    }
}
