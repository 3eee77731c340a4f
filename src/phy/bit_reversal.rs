/// Reverse the bit order inside every byte of `buf`
///
/// BLE sends each byte LSB first while the radio shifts bytes out MSB first, so this is the
/// last step before transmission and the first one after reception. Byte order is untouched.
pub fn reverse_bits(buf: &mut [u8]) {
    for byte in buf {
        *byte = byte.reverse_bits();
    }
}
