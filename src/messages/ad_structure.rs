//! # AD Structures
//!
//! Advertising data is a sequence of `| length | type | data... |` chunks where `length`
//! counts the type byte plus the data. Consumers walk the sequence by the length prefix, so
//! the order only matters to applications that expect a particular layout.

/// LE Limited Discoverable Mode
pub const FLAG_LE_LIMITED_DISCOVERABLE: u8 = 0x01;
/// LE General Discoverable Mode
pub const FLAG_LE_GENERAL_DISCOVERABLE: u8 = 0x02;
/// BR/EDR Not Supported
pub const FLAG_BR_EDR_NOT_SUPPORTED: u8 = 0x04;

/// Flags value broadcast by sensor nodes (0x05), as expected by the reference scanning apps
pub const ADVERTISING_FLAGS: u8 = FLAG_LE_LIMITED_DISCOVERABLE | FLAG_BR_EDR_NOT_SUPPORTED;

/// AD type codes from the Bluetooth assigned numbers
#[derive(Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "std", derive(Debug))]
pub enum AdType {
    Flags,
    ShortenedLocalName,
    CompleteLocalName,
    /// Service data with a 16-bit service UUID
    ServiceData16,
    ManufacturerSpecificData,
    /// Any other assigned number, carried through unchanged
    Other(u8),
}

impl AdType {
    pub const fn code(self) -> u8 {
        match self {
            AdType::Flags => 0x01,
            AdType::ShortenedLocalName => 0x08,
            AdType::CompleteLocalName => 0x09,
            AdType::ServiceData16 => 0x16,
            AdType::ManufacturerSpecificData => 0xFF,
            AdType::Other(code) => code,
        }
    }

    pub const fn from_code(code: u8) -> Self {
        match code {
            0x01 => AdType::Flags,
            0x08 => AdType::ShortenedLocalName,
            0x09 => AdType::CompleteLocalName,
            0x16 => AdType::ServiceData16,
            0xFF => AdType::ManufacturerSpecificData,
            other => AdType::Other(other),
        }
    }
}

/// A single AD structure borrowing its data
#[derive(Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "std", derive(Debug))]
pub struct AdStructure<'a> {
    pub ad_type: AdType,
    pub data: &'a [u8],
}

impl<'a> AdStructure<'a> {
    pub const fn new(ad_type: AdType, data: &'a [u8]) -> Self {
        AdStructure { ad_type, data }
    }

    /// Bytes this structure takes in the PDU: length byte, type byte and data
    pub const fn encoded_len(&self) -> usize {
        2 + self.data.len()
    }

    /// Write the structure to the start of `out`
    ///
    /// # Returns
    /// The number of bytes written, or `None` if `out` is too small or the data is too long
    /// for the one-byte length prefix.
    pub fn encode(&self, out: &mut [u8]) -> Option<usize> {
        let total = self.encoded_len();
        if total > out.len() || self.data.len() > u8::MAX as usize - 1 {
            return None;
        }
        out[0] = (self.data.len() + 1) as u8;
        out[1] = self.ad_type.code();
        out[2..total].copy_from_slice(self.data);
        Some(total)
    }
}

/// Total encoded size of a list of AD structures
pub fn encoded_len(structures: &[AdStructure]) -> usize {
    structures.iter().map(|s| s.encoded_len()).fold(0usize, |acc, len| acc.saturating_add(len))
}

/// Iterator over the AD structures in a block of advertising data
///
/// Stops at the end of the data, at a zero length byte (early termination padding), or at a
/// structure whose length runs past the end of the data.
#[derive(Clone)]
pub struct AdStructureIter<'a> {
    remaining: &'a [u8],
}

impl<'a> AdStructureIter<'a> {
    pub const fn new(advertising_data: &'a [u8]) -> Self {
        AdStructureIter { remaining: advertising_data }
    }
}

impl<'a> Iterator for AdStructureIter<'a> {
    type Item = AdStructure<'a>;

    fn next(&mut self) -> Option<AdStructure<'a>> {
        let (&length, rest) = self.remaining.split_first()?;
        let length = length as usize;
        if length == 0 || length > rest.len() {
            self.remaining = &[];
            return None;
        }
        let (structure, rest) = rest.split_at(length);
        self.remaining = rest;
        Some(AdStructure::new(AdType::from_code(structure[0]), &structure[1..]))
    }
}
