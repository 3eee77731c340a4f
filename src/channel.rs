//! # Advertising Channels
//!
//! BLE reserves three RF channels for advertising. They are identified here by a logical
//! index (0, 1, 2), which maps to the BLE channel numbers 37, 38 and 39 and to the radio
//! frequencies 2402, 2426 and 2480 MHz.
//!
//! The BLE channel number seeds data whitening, the frequency offset tunes the radio. Mixing
//! the two up produces frames nobody can de-whiten.

use crate::phy::whitening_seed;

struct ChannelTableEntry {
    ble_channel: u8,
    frequency_offset: u8,
}

// Indexed by AdvertisingChannel discriminant
const CHANNEL_TABLE: [ChannelTableEntry; 3] = [
    ChannelTableEntry {
        ble_channel: 37,
        frequency_offset: 2,
    },
    ChannelTableEntry {
        ble_channel: 38,
        frequency_offset: 26,
    },
    ChannelTableEntry {
        ble_channel: 39,
        frequency_offset: 80,
    },
];

/// One of the three BLE advertising channels
#[derive(Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "std", derive(Debug))]
pub enum AdvertisingChannel {
    /// BLE channel 37, 2402 MHz
    Ch37 = 0,
    /// BLE channel 38, 2426 MHz
    Ch38 = 1,
    /// BLE channel 39, 2480 MHz
    Ch39 = 2,
}

impl AdvertisingChannel {
    pub const ALL: [AdvertisingChannel; 3] = [AdvertisingChannel::Ch37, AdvertisingChannel::Ch38, AdvertisingChannel::Ch39];

    /// Returns the channel for a logical index, `None` outside 0..=2
    pub const fn from_index(index: u8) -> Option<Self> {
        match index {
            0 => Some(AdvertisingChannel::Ch37),
            1 => Some(AdvertisingChannel::Ch38),
            2 => Some(AdvertisingChannel::Ch39),
            _ => None,
        }
    }

    pub const fn index(self) -> u8 {
        self as u8
    }

    /// BLE channel number (37-39), used to seed whitening
    pub const fn ble_channel(self) -> u8 {
        CHANNEL_TABLE[self as usize].ble_channel
    }

    /// Radio frequency as an offset in MHz above 2400 MHz
    pub const fn frequency_offset(self) -> u8 {
        CHANNEL_TABLE[self as usize].frequency_offset
    }

    pub const fn frequency_mhz(self) -> u16 {
        2400 + self.frequency_offset() as u16
    }

    pub const fn whitening_seed(self) -> u8 {
        whitening_seed(self.ble_channel())
    }
}

/// Round-robin helper cycling through the advertising channels
///
/// Yields 0, 1, 2, 0, ... Which channels an event uses is up to the caller; the advertiser
/// itself does not require any particular sequence.
#[derive(Clone, Default)]
#[cfg_attr(feature = "std", derive(Debug))]
pub struct ChannelSequencer {
    next: u8,
}

impl ChannelSequencer {
    pub const fn new() -> Self {
        ChannelSequencer { next: 0 }
    }

    /// Start the sequence at `channel` instead of channel 37
    pub const fn starting_at(channel: AdvertisingChannel) -> Self {
        ChannelSequencer { next: channel.index() }
    }

    /// Returns the next channel and advances the 2-bit index, wrapping after index 2
    pub fn next_channel(&mut self) -> AdvertisingChannel {
        let channel = AdvertisingChannel::from_index(self.next).unwrap_or(AdvertisingChannel::Ch37);
        self.next = if self.next >= 2 { 0 } else { self.next + 1 };
        channel
    }
}

impl Iterator for ChannelSequencer {
    type Item = AdvertisingChannel;

    fn next(&mut self) -> Option<AdvertisingChannel> {
        Some(self.next_channel())
    }
}

#[cfg(all(test, feature = "std"))]
mod tests {
    use super::*;

    #[test]
    fn channel_table_mapping() {
        assert_eq!(AdvertisingChannel::Ch37.ble_channel(), 37);
        assert_eq!(AdvertisingChannel::Ch38.ble_channel(), 38);
        assert_eq!(AdvertisingChannel::Ch39.ble_channel(), 39);
        assert_eq!(AdvertisingChannel::Ch37.frequency_mhz(), 2402);
        assert_eq!(AdvertisingChannel::Ch38.frequency_mhz(), 2426);
        assert_eq!(AdvertisingChannel::Ch39.frequency_mhz(), 2480);
    }

    #[test]
    fn from_index_rejects_out_of_range() {
        assert_eq!(AdvertisingChannel::from_index(0), Some(AdvertisingChannel::Ch37));
        assert_eq!(AdvertisingChannel::from_index(2), Some(AdvertisingChannel::Ch39));
        assert_eq!(AdvertisingChannel::from_index(3), None);
        for channel in AdvertisingChannel::ALL {
            assert_eq!(AdvertisingChannel::from_index(channel.index()), Some(channel));
        }
    }

    #[test]
    fn sequencer_wraps_after_three_channels() {
        let sequence: Vec<u8> = ChannelSequencer::new().take(7).map(|c| c.index()).collect();
        assert_eq!(sequence, vec![0, 1, 2, 0, 1, 2, 0]);
    }

    #[test]
    fn sequencer_can_start_anywhere() {
        let mut sequencer = ChannelSequencer::starting_at(AdvertisingChannel::Ch39);
        assert_eq!(sequencer.next_channel(), AdvertisingChannel::Ch39);
        assert_eq!(sequencer.next_channel(), AdvertisingChannel::Ch37);
    }
}
