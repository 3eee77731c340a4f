//! # Advertising Transmitter
//!
//! Turns a device address and a manufacturer record into BLE advertisements on a
//! [`RadioPort`].
//!
//! ## Architecture
//!
//! The advertiser owns exactly one PDU buffer and one scratch frame:
//! - `prepare` builds the PDU and appends the CRC once per advertising event
//! - `send` copies the PDU into the scratch frame, whitens it for the channel, reverses the
//!   bits and hands it to the radio, then busy-waits until the radio reports its transmit
//!   queue empty
//!
//! The prepared PDU is never modified by `send`, so one `prepare` serves any number of
//! transmissions on any channels.
//!
//! ## State Machine
//!
//! ```text
//! Idle --prepare--> Prepared --send(ch)--> Transmitting(ch) --done--> Prepared
//! ```
//!
//! `send` while `Idle` is rejected with [`AdvertisingError::NotPrepared`] and the radio is
//! not touched. A rejected `prepare` leaves state and PDU as they were.
//!
//! ## Change Detection
//!
//! The last address and record bytes used for a successful `prepare` are kept. Preparing the
//! same pair again skips the rebuild (and the CRC); [`Advertiser::rebuild_count`] makes this
//! observable.

use log::{Level, log};

use crate::channel::{AdvertisingChannel, ChannelSequencer};
use crate::messages::{AdStructure, AdvertisingPdu, DeviceAddress, DeviceName, ManufacturerData, RadioFrame};
use crate::phy::{reverse_bits, whiten};
use crate::{RadioPort, SizeViolation};

#[derive(Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "std", derive(Debug))]
pub enum AdvertiserState {
    /// Nothing prepared yet
    Idle,
    /// A PDU with CRC is ready to be sent
    Prepared,
    /// A send on the given channel is in progress
    Transmitting(AdvertisingChannel),
}

#[derive(Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "std", derive(Debug))]
pub enum AdvertisingError<E> {
    /// The PDU or frame would exceed a size limit, nothing was built or sent
    Size(SizeViolation),
    /// `send` was called before a successful `prepare`
    NotPrepared,
    /// The radio reported an error
    Radio(E),
}

impl<E> From<SizeViolation> for AdvertisingError<E> {
    fn from(violation: SizeViolation) -> Self {
        AdvertisingError::Size(violation)
    }
}

/// Software BLE advertiser on top of a plain packet radio
pub struct Advertiser<R: RadioPort> {
    radio: R,
    device_name: DeviceName,
    pdu: AdvertisingPdu,
    scratch: RadioFrame,
    state: AdvertiserState,
    previous: Option<(DeviceAddress, [u8; ManufacturerData::SIZE])>,
    rebuild_count: u32,
}

impl<R: RadioPort> Advertiser<R> {
    pub fn new(radio: R, device_name: DeviceName) -> Self {
        Advertiser {
            radio,
            device_name,
            pdu: AdvertisingPdu::new(),
            scratch: RadioFrame::new(),
            state: AdvertiserState::Idle,
            previous: None,
            rebuild_count: 0,
        }
    }

    /// Prepare the sensor advertisement (Flags, Complete Local Name, Manufacturer Data)
    ///
    /// Skips the rebuild if `address` and the encoded `record` equal the ones of the last
    /// successful call.
    ///
    /// # Returns
    /// * `Ok(())` if a PDU with CRC is prepared
    /// * `Err(SizeViolation)` if the advertisement does not fit; nothing changes
    pub fn prepare(&mut self, address: &DeviceAddress, record: &ManufacturerData) -> Result<(), SizeViolation> {
        let record_bytes = record.to_bytes();
        if self.state != AdvertiserState::Idle && self.previous == Some((*address, record_bytes)) {
            log!(Level::Debug, "Manufacturer data unchanged, reusing prepared PDU");
            return Ok(());
        }

        if let Err(violation) = self.pdu.build_sensor_advertisement(address, &self.device_name, record) {
            log!(Level::Warn, "Sensor advertisement rejected, PDU left unchanged");
            return Err(violation);
        }
        self.pdu.append_crc();
        self.previous = Some((*address, record_bytes));
        self.finish_rebuild();
        Ok(())
    }

    /// Prepare an advertisement from an arbitrary list of AD structures
    ///
    /// Always rebuilds, and forgets the last manufacturer record so the next
    /// [`Advertiser::prepare`] rebuilds too.
    pub fn prepare_ad(&mut self, address: &DeviceAddress, structures: &[AdStructure]) -> Result<(), SizeViolation> {
        if let Err(violation) = self.pdu.build(address, structures) {
            log!(Level::Warn, "Advertising data rejected, PDU left unchanged");
            return Err(violation);
        }
        self.pdu.append_crc();
        self.previous = None;
        self.finish_rebuild();
        Ok(())
    }

    fn finish_rebuild(&mut self) {
        self.rebuild_count = self.rebuild_count.wrapping_add(1);
        self.state = AdvertiserState::Prepared;
        log!(
            Level::Debug,
            "Advertising PDU rebuilt: {} bytes, rebuild #{}",
            self.pdu.frame().len(),
            self.rebuild_count
        );
    }

    /// Transmit the prepared PDU once on `channel`
    ///
    /// Blocks until the radio reports its transmit queue empty. The same channel may be used
    /// several times per event.
    pub fn send(&mut self, channel: AdvertisingChannel) -> Result<(), AdvertisingError<R::Error>> {
        if self.state == AdvertiserState::Idle {
            return Err(AdvertisingError::NotPrepared);
        }
        let frame = self.pdu.frame();
        if frame.is_empty() {
            return Err(AdvertisingError::NotPrepared);
        }
        if !self.scratch.load(frame) {
            return Err(SizeViolation::FrameTooLong(frame.len()).into());
        }

        self.state = AdvertiserState::Transmitting(channel);
        // CRC is already part of the frame, whitening must come before bit reversal
        whiten(channel, self.scratch.as_mut_slice());
        reverse_bits(self.scratch.as_mut_slice());

        let result = self.transmit_scratch(channel);
        self.state = AdvertiserState::Prepared;
        result
    }

    fn transmit_scratch(&mut self, channel: AdvertisingChannel) -> Result<(), AdvertisingError<R::Error>> {
        self.radio.set_frequency(channel.frequency_offset()).map_err(AdvertisingError::Radio)?;
        self.radio.transmit(self.scratch.as_slice()).map_err(AdvertisingError::Radio)?;
        while !self.radio.transmit_queue_empty().map_err(AdvertisingError::Radio)? {
            core::hint::spin_loop();
        }
        log::trace!("Advertisement sent on BLE channel {}: {} bytes", channel.ble_channel(), self.scratch.len());
        Ok(())
    }

    /// Run one complete advertising event
    ///
    /// Powers the radio up, prepares the advertisement, sends it `transmissions` times on the
    /// channels yielded by `sequencer` and powers the radio down again. The radio is powered
    /// down even if powering up, preparing or sending failed; the first error is returned.
    pub fn advertise_event(
        &mut self,
        address: &DeviceAddress,
        record: &ManufacturerData,
        transmissions: u8,
        sequencer: &mut ChannelSequencer,
    ) -> Result<(), AdvertisingError<R::Error>> {
        if let Err(error) = self.radio.power_up() {
            // A half-finished power up may have left the radio drawing current
            let _ = self.radio.power_down();
            return Err(AdvertisingError::Radio(error));
        }
        let result = self.prepare_and_send(address, record, transmissions, sequencer);
        let power_down = self.radio.power_down().map_err(AdvertisingError::Radio);
        result.and(power_down)
    }

    fn prepare_and_send(
        &mut self,
        address: &DeviceAddress,
        record: &ManufacturerData,
        transmissions: u8,
        sequencer: &mut ChannelSequencer,
    ) -> Result<(), AdvertisingError<R::Error>> {
        self.prepare(address, record)?;
        for _ in 0..transmissions {
            self.send(sequencer.next_channel())?;
        }
        Ok(())
    }

    pub fn state(&self) -> AdvertiserState {
        self.state
    }

    /// Number of times the PDU and CRC have been rebuilt
    pub fn rebuild_count(&self) -> u32 {
        self.rebuild_count
    }

    pub fn pdu(&self) -> &AdvertisingPdu {
        &self.pdu
    }

    pub fn device_name(&self) -> &DeviceName {
        &self.device_name
    }

    pub fn radio(&self) -> &R {
        &self.radio
    }

    pub fn radio_mut(&mut self) -> &mut R {
        &mut self.radio
    }

    pub fn into_radio(self) -> R {
        self.radio
    }
}
