//! # Advertising PDU
//!
//! The one reusable buffer an ADV_NONCONN_IND PDU is assembled in.
//!
//! Building never allocates: the buffer has room for the largest frame the radio can send
//! (RADIO_PAYLOAD_MAX), and every size check happens before the first byte is written, so a
//! rejected build leaves the previous PDU intact.

use rand_core::RngCore;

use super::ad_structure::{ADVERTISING_FLAGS, AdStructure, AdType, encoded_len};
use super::device_name::DeviceName;
use super::manufacturer_data::ManufacturerData;
use crate::phy::crc24;
use crate::{
    CRC_SIZE, DEVICE_ADDRESS_SIZE, MAX_ADVERTISING_DATA_SIZE, PDU_HEADER_SIZE, PDU_TYPE_ADV_NONCONN_IND_RANDOM, RADIO_PAYLOAD_MAX,
    SizeViolation,
};

const ADDRESS_OFFSET: usize = PDU_HEADER_SIZE;
const ADVERTISING_DATA_OFFSET: usize = PDU_HEADER_SIZE + DEVICE_ADDRESS_SIZE;

/// Marks a static random device address
const STATIC_RANDOM_MARKER: u8 = 0xC0;

/// Six byte device address, stored in the order it is copied into the PDU
///
/// Byte 0 is treated as the most significant byte: it carries the two bits that mark a
/// static random address.
#[derive(Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "std", derive(Debug))]
pub struct DeviceAddress(pub [u8; DEVICE_ADDRESS_SIZE]);

impl DeviceAddress {
    /// Use `bytes` verbatim
    pub const fn new(bytes: [u8; DEVICE_ADDRESS_SIZE]) -> Self {
        DeviceAddress(bytes)
    }

    /// Use `bytes` with the static random marker bits forced on
    pub const fn new_static_random(mut bytes: [u8; DEVICE_ADDRESS_SIZE]) -> Self {
        bytes[0] |= STATIC_RANDOM_MARKER;
        DeviceAddress(bytes)
    }

    /// Generate a fresh static random address
    ///
    /// # Examples
    /// ```rust
    /// use rand_core::SeedableRng;
    /// use rand_wyrand::WyRand;
    /// use softble_radio_lib::DeviceAddress;
    ///
    /// let mut rng = WyRand::seed_from_u64(0x5EED);
    /// let address = DeviceAddress::random_static(&mut rng);
    /// assert!(address.is_static_random());
    /// ```
    pub fn random_static<R: RngCore + ?Sized>(rng: &mut R) -> Self {
        let mut bytes = [0u8; DEVICE_ADDRESS_SIZE];
        rng.fill_bytes(&mut bytes);
        Self::new_static_random(bytes)
    }

    pub const fn is_static_random(&self) -> bool {
        self.0[0] & STATIC_RANDOM_MARKER == STATIC_RANDOM_MARKER
    }

    pub const fn as_bytes(&self) -> &[u8; DEVICE_ADDRESS_SIZE] {
        &self.0
    }
}

/// Fixed-capacity advertising PDU buffer
///
/// Holds `| 0x42 | length | address | advertising data | CRC |`. The CRC is only present
/// after [`AdvertisingPdu::append_crc`]; a new build discards it again.
#[derive(Clone)]
#[cfg_attr(feature = "std", derive(Debug))]
pub struct AdvertisingPdu {
    buffer: [u8; RADIO_PAYLOAD_MAX],
    advertising_data_len: usize,
    crc_appended: bool,
}

impl Default for AdvertisingPdu {
    fn default() -> Self {
        Self::new()
    }
}

impl AdvertisingPdu {
    /// Creates an empty buffer; nothing is transmittable until a successful build
    pub const fn new() -> Self {
        AdvertisingPdu {
            buffer: [0u8; RADIO_PAYLOAD_MAX],
            advertising_data_len: 0,
            crc_appended: false,
        }
    }

    /// Build a PDU from an address and an ordered list of AD structures
    ///
    /// # Returns
    /// * `Ok(())` if the PDU has been written (without CRC)
    /// * `Err(SizeViolation)` if the advertising data is empty or longer than
    ///   MAX_ADVERTISING_DATA_SIZE; the buffer is left untouched
    pub fn build(&mut self, address: &DeviceAddress, structures: &[AdStructure]) -> Result<(), SizeViolation> {
        let advertising_data_len = encoded_len(structures);
        if advertising_data_len == 0 {
            return Err(SizeViolation::AdvertisingDataEmpty);
        }
        if advertising_data_len > MAX_ADVERTISING_DATA_SIZE {
            return Err(SizeViolation::AdvertisingDataTooLong(advertising_data_len));
        }

        self.buffer[0] = PDU_TYPE_ADV_NONCONN_IND_RANDOM;
        self.buffer[1] = (DEVICE_ADDRESS_SIZE + advertising_data_len) as u8;
        self.buffer[ADDRESS_OFFSET..ADVERTISING_DATA_OFFSET].copy_from_slice(address.as_bytes());

        let mut offset = ADVERTISING_DATA_OFFSET;
        for structure in structures {
            // Sizes were validated above, so every structure fits
            offset += structure.encode(&mut self.buffer[offset..]).unwrap_or(0);
        }

        self.advertising_data_len = advertising_data_len;
        self.crc_appended = false;
        Ok(())
    }

    /// Build the sensor node advertisement: Flags, Complete Local Name, Manufacturer Data
    ///
    /// The order matches what the reference scanning apps expect. An empty name leaves the
    /// name structure out instead of sending it without data.
    pub fn build_sensor_advertisement(
        &mut self,
        address: &DeviceAddress,
        name: &DeviceName,
        record: &ManufacturerData,
    ) -> Result<(), SizeViolation> {
        let flags = [ADVERTISING_FLAGS];
        let record_bytes = record.to_bytes();
        let flags = AdStructure::new(AdType::Flags, &flags);
        let record = AdStructure::new(AdType::ManufacturerSpecificData, &record_bytes);
        if name.is_empty() {
            return self.build(address, &[flags, record]);
        }
        self.build(address, &[flags, AdStructure::new(AdType::CompleteLocalName, name.as_bytes()), record])
    }

    /// Compute the CRC over header, address and advertising data and append it
    ///
    /// Does nothing on an empty buffer.
    pub fn append_crc(&mut self) {
        if self.is_empty() {
            return;
        }
        let crc_offset = self.crc_offset();
        let crc = crc24(&self.buffer[..crc_offset]);
        self.buffer[crc_offset..crc_offset + CRC_SIZE].copy_from_slice(&crc);
        self.crc_appended = true;
    }

    /// `true` until the first successful build
    pub fn is_empty(&self) -> bool {
        self.advertising_data_len == 0
    }

    pub fn has_crc(&self) -> bool {
        self.crc_appended
    }

    pub fn pdu_type(&self) -> u8 {
        self.buffer[0]
    }

    /// Declared length of address plus advertising data
    pub fn payload_length(&self) -> u8 {
        self.buffer[1]
    }

    pub fn address(&self) -> DeviceAddress {
        let mut bytes = [0u8; DEVICE_ADDRESS_SIZE];
        bytes.copy_from_slice(&self.buffer[ADDRESS_OFFSET..ADVERTISING_DATA_OFFSET]);
        DeviceAddress(bytes)
    }

    pub fn advertising_data(&self) -> &[u8] {
        &self.buffer[ADVERTISING_DATA_OFFSET..self.crc_offset()]
    }

    /// The appended CRC, `None` before [`AdvertisingPdu::append_crc`]
    pub fn crc(&self) -> Option<[u8; CRC_SIZE]> {
        if !self.crc_appended {
            return None;
        }
        let offset = self.crc_offset();
        let mut crc = [0u8; CRC_SIZE];
        crc.copy_from_slice(&self.buffer[offset..offset + CRC_SIZE]);
        Some(crc)
    }

    /// Header, address, advertising data and CRC, as handed to whitening
    ///
    /// Empty until a PDU has been built and its CRC appended.
    pub fn frame(&self) -> &[u8] {
        if !self.crc_appended {
            return &[];
        }
        &self.buffer[..self.crc_offset() + CRC_SIZE]
    }

    fn crc_offset(&self) -> usize {
        ADVERTISING_DATA_OFFSET + self.advertising_data_len
    }
}
