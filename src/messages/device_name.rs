use crate::{MAX_DEVICE_NAME_LEN, SizeViolation};

/// Local name broadcast in the Complete Local Name AD structure
///
/// Limited to MAX_DEVICE_NAME_LEN bytes so that flags, name and the manufacturer record fit
/// into the advertising data together.
#[derive(Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "std", derive(Debug))]
pub struct DeviceName {
    bytes: [u8; MAX_DEVICE_NAME_LEN],
    length: u8,
}

impl DeviceName {
    pub fn new(name: &str) -> Result<Self, SizeViolation> {
        Self::from_bytes(name.as_bytes())
    }

    pub fn from_bytes(name: &[u8]) -> Result<Self, SizeViolation> {
        if name.len() > MAX_DEVICE_NAME_LEN {
            return Err(SizeViolation::DeviceNameTooLong(name.len()));
        }
        let mut bytes = [0u8; MAX_DEVICE_NAME_LEN];
        bytes[..name.len()].copy_from_slice(name);
        Ok(DeviceName {
            bytes,
            length: name.len() as u8,
        })
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes[..self.length as usize]
    }

    /// The name as text, `None` if it is not valid UTF-8
    pub fn as_str(&self) -> Option<&str> {
        core::str::from_utf8(self.as_bytes()).ok()
    }

    pub fn is_empty(&self) -> bool {
        self.length == 0
    }
}

#[cfg(all(test, feature = "std"))]
mod tests {
    use super::*;

    #[test]
    fn accepts_names_up_to_six_bytes() {
        let name = DeviceName::new("wNode1").unwrap();
        assert_eq!(name.as_bytes(), b"wNode1");
        assert_eq!(name.as_str(), Some("wNode1"));
        assert!(DeviceName::new("").unwrap().is_empty());
    }

    #[test]
    fn rejects_long_names() {
        assert_eq!(DeviceName::new("wNode12"), Err(SizeViolation::DeviceNameTooLong(7)));
    }

    #[test]
    fn non_utf8_names_have_no_str_form() {
        let name = DeviceName::from_bytes(&[0xFF, 0xFE]).unwrap();
        assert_eq!(name.as_str(), None);
    }
}
