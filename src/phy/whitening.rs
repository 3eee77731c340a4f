use crate::channel::AdvertisingChannel;

/// Feedback taps of the x^7 + x^4 + 1 LFSR in wire bit order
const LFSR_TAPS: u8 = 0x88;

/// Initial LFSR state for a BLE channel number (0-39): the channel with bit 6 forced set
pub const fn whitening_seed(ble_channel: u8) -> u8 {
    (ble_channel & 0x3F) | 0x40
}

/// Whiten or de-whiten `buf` for transmission on `channel`
///
/// Whitening is an involution: applying it twice with the same channel restores the input.
/// It covers the whole PDU including the CRC, not only the advertising data.
///
/// # Examples
/// ```rust
/// use softble_radio_lib::{AdvertisingChannel, phy::whiten};
///
/// let mut buf = *b"Hello World";
/// whiten(AdvertisingChannel::Ch39, &mut buf);
/// assert_eq!(buf[0], 0x57);
/// whiten(AdvertisingChannel::Ch39, &mut buf);
/// assert_eq!(&buf, b"Hello World");
/// ```
pub fn whiten(channel: AdvertisingChannel, buf: &mut [u8]) {
    whiten_with_seed(channel.whitening_seed(), buf);
}

/// Whiten `buf` starting from an explicit 7-bit LFSR state
///
/// The LFSR is re-initialized from `seed` on every call; no state survives between packets.
pub fn whiten_with_seed(seed: u8, buf: &mut [u8]) {
    let mut lfsr = seed;
    for byte in buf {
        let mut mask = 0u8;
        for bit in 0..8 {
            if lfsr & 0x01 != 0 {
                lfsr ^= LFSR_TAPS;
                mask |= 1 << bit;
            }
            lfsr >>= 1;
        }
        *byte ^= mask;
    }
}
