//! # Radio Frame Module
//!
//! Raw byte frame exchanged with the radio.
//!
//! ## Design Considerations
//!
//! - **Public Fields**: `data` and `length` are public so radio drivers can fill the buffer
//!   in place
//! - **Fixed Size**: every frame reserves RADIO_PAYLOAD_MAX bytes, so frames can live on the
//!   stack or in static queues without allocation

use crate::RADIO_PAYLOAD_MAX;

/// Raw frame as handed to or received from the radio
///
/// On the transmit side this holds a PDU after whitening and bit reversal, on the receive
/// side the undecoded bytes read from the radio.
#[derive(Clone)]
#[cfg_attr(feature = "std", derive(Debug))]
pub struct RadioFrame {
    /// Raw frame buffer of fixed size
    pub data: [u8; RADIO_PAYLOAD_MAX],

    /// Number of valid bytes in `data`
    pub length: usize,
}

impl Default for RadioFrame {
    fn default() -> Self {
        Self::new()
    }
}

impl RadioFrame {
    /// Creates an empty frame
    pub const fn new() -> Self {
        RadioFrame {
            data: [0u8; RADIO_PAYLOAD_MAX],
            length: 0,
        }
    }

    /// Creates a frame holding a copy of `bytes`
    ///
    /// # Returns
    /// * `Some(frame)` if `bytes` fits into RADIO_PAYLOAD_MAX
    /// * `None` otherwise
    pub fn from_slice(bytes: &[u8]) -> Option<Self> {
        let mut frame = RadioFrame::new();
        if frame.load(bytes) { Some(frame) } else { None }
    }

    /// Replace the frame content with a copy of `bytes`
    ///
    /// Returns `false` and leaves the frame untouched if `bytes` does not fit.
    pub fn load(&mut self, bytes: &[u8]) -> bool {
        if bytes.len() > RADIO_PAYLOAD_MAX {
            return false;
        }
        self.data[..bytes.len()].copy_from_slice(bytes);
        self.length = bytes.len();
        true
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.data[..self.length]
    }

    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.data[..self.length]
    }

    pub fn len(&self) -> usize {
        self.length
    }

    pub fn is_empty(&self) -> bool {
        self.length == 0
    }
}

#[cfg(all(test, feature = "std"))]
mod tests {
    use super::*;

    #[test]
    fn from_slice_copies_bytes() {
        let frame = RadioFrame::from_slice(&[1, 2, 3]).unwrap();
        assert_eq!(frame.as_slice(), &[1, 2, 3]);
        assert_eq!(frame.len(), 3);
        assert!(!frame.is_empty());
    }

    #[test]
    fn oversized_input_is_rejected() {
        assert!(RadioFrame::from_slice(&[0u8; RADIO_PAYLOAD_MAX + 1]).is_none());

        let mut frame = RadioFrame::from_slice(&[7, 7]).unwrap();
        assert!(!frame.load(&[0u8; RADIO_PAYLOAD_MAX + 1]));
        assert_eq!(frame.as_slice(), &[7, 7]);
    }

    #[test]
    fn full_size_frame_fits() {
        let frame = RadioFrame::from_slice(&[0xAB; RADIO_PAYLOAD_MAX]).unwrap();
        assert_eq!(frame.len(), RADIO_PAYLOAD_MAX);
    }
}
