//! # Radio Device Echo - Loopback Device for Testing
//!
//! A radio device that keeps every transmitted frame and hands it back on receive. It lets
//! the whole transmit path (PDU, CRC, whitening, bit reversal) be checked against the scanner
//! side without any hardware.
//!
//! ## Architecture
//!
//! - Transmitted frames are pushed into an in-memory queue, exactly as they would be shifted
//!   out over the air
//! - `receive` pops the oldest frame
//! - The tuned frequency and power state are recorded so tests can check the channel hopping
//!   and the power cycle of an advertising event
//!
//! ## Limitations
//!
//! - No timing: the transmit queue is empty as soon as `transmit` returns
//! - The frequency is not taken into account on receive, a frame sent on channel 37 can be
//!   read back while tuned to channel 39
//!
//! ## Design Considerations
//!
//! - Backpressure handling drops frames if the echo queue is full, and logs a warning
//! - Same `RadioPort` API as the hardware backends

use embassy_sync::blocking_mutex::raw::NoopRawMutex;
use embassy_sync::channel::{Channel, TrySendError};
use log::{Level, log};

use crate::RadioPort;
use crate::messages::RadioFrame;

/// Frames kept for receive before new ones are dropped
pub const ECHO_QUEUE_SIZE: usize = 8;

#[derive(Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "std", derive(Debug))]
pub enum EchoError {
    /// The frame does not fit into a radio payload (contains the offending length)
    FrameTooLong(usize),
}

/// Echo radio device - loopback implementation for testing
///
/// # Example
/// ```rust,ignore
/// let mut radio = RadioDevice::new();
/// radio.transmit(&[0x12, 0x34])?;
/// let mut buffer = [0u8; 32];
/// assert_eq!(radio.receive(&mut buffer)?, Some(2));
/// ```
pub struct RadioDevice {
    queue: Channel<NoopRawMutex, RadioFrame, ECHO_QUEUE_SIZE>,
    frequency_offset: Option<u8>,
    powered: bool,
    transmitted_count: u32,
}

impl Default for RadioDevice {
    fn default() -> Self {
        Self::new()
    }
}

impl RadioDevice {
    pub const fn new() -> Self {
        RadioDevice {
            queue: Channel::new(),
            frequency_offset: None,
            powered: false,
            transmitted_count: 0,
        }
    }

    /// Last frequency set, as offset in MHz above 2400 MHz
    pub fn frequency_offset(&self) -> Option<u8> {
        self.frequency_offset
    }

    pub fn is_powered(&self) -> bool {
        self.powered
    }

    /// Frames accepted by `transmit`, including ones dropped because the queue was full
    pub fn transmitted_count(&self) -> u32 {
        self.transmitted_count
    }

    /// Frames waiting to be received
    pub fn pending(&self) -> usize {
        self.queue.len()
    }
}

impl RadioPort for RadioDevice {
    type Error = EchoError;

    fn set_frequency(&mut self, mhz_offset: u8) -> Result<(), EchoError> {
        self.frequency_offset = Some(mhz_offset);
        Ok(())
    }

    fn transmit(&mut self, frame: &[u8]) -> Result<(), EchoError> {
        let frame = RadioFrame::from_slice(frame).ok_or(EchoError::FrameTooLong(frame.len()))?;
        self.transmitted_count = self.transmitted_count.wrapping_add(1);
        log::trace!("Echoing frame: {} bytes at offset {:?}", frame.length, self.frequency_offset);
        match self.queue.try_send(frame) {
            Ok(_) => {}
            Err(TrySendError::Full(dropped)) => {
                log!(Level::Warn, "Echo queue full, dropping frame. length: {}", dropped.length);
            }
        }
        Ok(())
    }

    fn transmit_queue_empty(&mut self) -> Result<bool, EchoError> {
        Ok(true)
    }

    fn receive(&mut self, buffer: &mut [u8]) -> Result<Option<usize>, EchoError> {
        let Ok(frame) = self.queue.try_receive() else {
            return Ok(None);
        };
        let length = frame.length.min(buffer.len());
        buffer[..length].copy_from_slice(&frame.as_slice()[..length]);
        Ok(Some(length))
    }

    fn power_up(&mut self) -> Result<(), EchoError> {
        self.powered = true;
        Ok(())
    }

    fn power_down(&mut self) -> Result<(), EchoError> {
        self.powered = false;
        Ok(())
    }
}
