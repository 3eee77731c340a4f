/// Initial shift register value for advertising channel PDUs, in wire bit order
pub const CRC_INIT: [u8; 3] = [0xAA, 0xAA, 0xAA];

// Generator x^24 + x^10 + x^9 + x^6 + x^4 + x^3 + x + 1, bit-reversed to match the
// right-shifting register below.
const TAP_MID: u8 = 0x60; // x^10 + x^9
const TAP_LOW: u8 = 0xDA; // x^6 + x^4 + x^3 + x + 1

/// Calculate the BLE CRC-24 of `data`
///
/// The 24-bit register is kept as three bytes in wire bit order: `register[0]` holds bits
/// 23-16, `register[2]` bits 7-0. Input bytes are consumed LSB first, as they go on air.
///
/// The result is appended to the PDU as is, before whitening and bit reversal.
///
/// # Examples
/// ```rust
/// use softble_radio_lib::phy::crc24;
///
/// assert_eq!(crc24(&[]), [0xAA, 0xAA, 0xAA]);
/// assert_eq!(crc24(b"Hello World"), [0xB6, 0x8C, 0xB0]);
/// ```
pub fn crc24(data: &[u8]) -> [u8; 3] {
    let mut register = CRC_INIT;

    for &byte in data {
        let mut input = byte;
        for _ in 0..8 {
            let outgoing = register[0] & 0x01;

            register[0] >>= 1;
            if register[1] & 0x01 != 0 {
                register[0] |= 0x80;
            }
            register[1] >>= 1;
            if register[2] & 0x01 != 0 {
                register[1] |= 0x80;
            }
            register[2] >>= 1;

            if outgoing != input & 0x01 {
                register[1] ^= TAP_MID;
                register[2] ^= TAP_LOW;
            }
            input >>= 1;
        }
    }

    register
}

#[cfg(all(test, feature = "std"))]
mod tests {
    use super::*;

    #[test]
    fn empty_input_returns_initial_register() {
        assert_eq!(crc24(&[]), [0xAA, 0xAA, 0xAA]);
    }

    #[test]
    fn matches_reference_vector() {
        // Same vector as the rf24ble crate's crc24_ble()
        assert_eq!(crc24(b"Hello World"), [0xB6, 0x8C, 0xB0]);
    }

    #[test]
    fn is_deterministic() {
        let data = [0x42, 0x1B, 0xCB, 0x71, 0x1D, 0xBB, 0xA5, 0x6A];
        assert_eq!(crc24(&data), crc24(&data));
    }

    #[test]
    fn weather_node_advertisement_crc() {
        let pdu = [
            0x42, 0x1B, 0xCB, 0x71, 0x1D, 0xBB, 0xA5, 0x6A, 0x02, 0x01, 0x05, 0x07, 0x09, b'w', b'N', b'o', b'd', b'e', b'1', 0x09, 0xFF,
            0xA9, 0x53, 0x02, 0xDA, 0x01, 0x0E, 0x00, 0x00,
        ];
        assert_eq!(crc24(&pdu), [0x48, 0xAD, 0x31]);
    }

    #[test]
    fn single_bit_change_alters_crc() {
        assert_eq!(crc24(&[0x42, 0x00]), [0x44, 0xBB, 0xE2]);
        assert_ne!(crc24(&[0x42, 0x00]), crc24(&[0x42, 0x01]));
    }
}
