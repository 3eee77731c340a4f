//! # Scanner Side Decoding
//!
//! Undoes what the advertiser does to a frame: bit reversal, then de-whitening, then the CRC
//! check. Used with a receiving radio (or the echo device) to verify what actually goes on
//! air, and to read weather node advertisements the way the companion station app does.

use crate::channel::AdvertisingChannel;
use crate::messages::{AdStructureIter, AdType, BatteryLevel, DeviceAddress, DeviceName, ManufacturerData, RadioFrame, Tenths};
use crate::phy::{crc24, reverse_bits, whiten};
use crate::{CRC_SIZE, DEVICE_ADDRESS_SIZE, MAX_ADVERTISING_DATA_SIZE, PDU_HEADER_SIZE, RADIO_PAYLOAD_MAX};

/// Name prefix the station app lists weather nodes by
pub const WEATHER_NODE_NAME_PREFIX: &str = "wNode";

const MIN_PAYLOAD_LENGTH: u8 = DEVICE_ADDRESS_SIZE as u8;
const MAX_PAYLOAD_LENGTH: u8 = (DEVICE_ADDRESS_SIZE + MAX_ADVERTISING_DATA_SIZE) as u8;

#[derive(Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "std", derive(Debug))]
pub enum DecodeError {
    /// Fewer bytes than header, address, declared data and CRC need
    FrameTooShort,
    /// Declared payload length cannot hold an address or does not fit a radio payload
    LengthOutOfRange(u8),
    CrcMismatch,
}

/// An advertising PDU that passed the CRC check
#[derive(Clone)]
#[cfg_attr(feature = "std", derive(Debug))]
pub struct ReceivedAdvertisement {
    pdu_type: u8,
    address: DeviceAddress,
    data: [u8; MAX_ADVERTISING_DATA_SIZE],
    data_len: usize,
}

impl ReceivedAdvertisement {
    pub fn pdu_type(&self) -> u8 {
        self.pdu_type
    }

    pub fn address(&self) -> DeviceAddress {
        self.address
    }

    pub fn advertising_data(&self) -> &[u8] {
        &self.data[..self.data_len]
    }

    pub fn ad_structures(&self) -> AdStructureIter<'_> {
        AdStructureIter::new(self.advertising_data())
    }
}

/// Decode a raw frame as received on `channel`
///
/// `raw` may be longer than the PDU (radios with fixed payload width deliver trailing
/// bytes); only the first RADIO_PAYLOAD_MAX bytes are looked at and the declared length
/// decides where the PDU ends.
pub fn decode_frame(channel: AdvertisingChannel, raw: &[u8]) -> Result<ReceivedAdvertisement, DecodeError> {
    let mut frame = RadioFrame::new();
    let usable = raw.len().min(RADIO_PAYLOAD_MAX);
    frame.load(&raw[..usable]);

    let pdu = frame.as_mut_slice();
    reverse_bits(pdu);
    whiten(channel, pdu);

    if pdu.len() < PDU_HEADER_SIZE {
        return Err(DecodeError::FrameTooShort);
    }
    let payload_length = pdu[1];
    if !(MIN_PAYLOAD_LENGTH..=MAX_PAYLOAD_LENGTH).contains(&payload_length) {
        return Err(DecodeError::LengthOutOfRange(payload_length));
    }
    let crc_offset = PDU_HEADER_SIZE + payload_length as usize;
    if pdu.len() < crc_offset + CRC_SIZE {
        return Err(DecodeError::FrameTooShort);
    }
    if crc24(&pdu[..crc_offset]) != pdu[crc_offset..crc_offset + CRC_SIZE] {
        log::trace!("CRC mismatch on BLE channel {}", channel.ble_channel());
        return Err(DecodeError::CrcMismatch);
    }

    let address_end = PDU_HEADER_SIZE + DEVICE_ADDRESS_SIZE;
    let mut address = [0u8; DEVICE_ADDRESS_SIZE];
    address.copy_from_slice(&pdu[PDU_HEADER_SIZE..address_end]);
    let data_len = crc_offset - address_end;
    let mut data = [0u8; MAX_ADVERTISING_DATA_SIZE];
    data[..data_len].copy_from_slice(&pdu[address_end..crc_offset]);

    Ok(ReceivedAdvertisement {
        pdu_type: pdu[0],
        address: DeviceAddress::new(address),
        data,
        data_len,
    })
}

/// Measurement broadcast by a weather node, as shown by the station app
#[derive(Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "std", derive(Debug))]
pub struct WeatherReport {
    pub address: DeviceAddress,
    pub name: Option<DeviceName>,
    pub humidity: Tenths,
    pub temperature: Tenths,
    pub battery_level: BatteryLevel,
    pub sensor_failure: bool,
}

impl WeatherReport {
    /// Extract the weather node record from an advertisement
    ///
    /// # Returns
    /// * `Some(report)` if the advertisement carries manufacturer data with the weather node
    ///   UUID and at least the full record
    /// * `None` for any other advertisement
    ///
    /// The device name is not checked; see [`WeatherReport::from_station_advertisement`] for
    /// the stricter filter the station app applies.
    pub fn from_advertisement(advertisement: &ReceivedAdvertisement) -> Option<Self> {
        let mut name = None;
        let mut record = None;
        for structure in advertisement.ad_structures() {
            match structure.ad_type {
                AdType::CompleteLocalName | AdType::ShortenedLocalName => {
                    name = DeviceName::from_bytes(structure.data).ok();
                }
                AdType::ManufacturerSpecificData => {
                    record = ManufacturerData::from_bytes(structure.data).filter(|r| r.is_weather_node());
                }
                _ => {}
            }
        }
        let record = record?;
        Some(WeatherReport {
            address: advertisement.address(),
            name,
            humidity: record.humidity,
            temperature: record.temperature,
            battery_level: record.status.battery_level,
            sensor_failure: record.status.sensor_failure,
        })
    }

    /// Like [`WeatherReport::from_advertisement`], but also requires a local name starting
    /// with WEATHER_NODE_NAME_PREFIX
    pub fn from_station_advertisement(advertisement: &ReceivedAdvertisement) -> Option<Self> {
        Self::from_advertisement(advertisement).filter(|report| report.name_starts_with(WEATHER_NODE_NAME_PREFIX))
    }

    pub fn name_starts_with(&self, prefix: &str) -> bool {
        self.name.is_some_and(|name| name.as_bytes().starts_with(prefix.as_bytes()))
    }
}
