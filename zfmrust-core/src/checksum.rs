//! ZFM frame checksum
//!
//! The checksum covers the kind byte, the two length bytes and the payload,
//! summed as unsigned bytes modulo 65536. The start code and address are not
//! included.

use tracing::trace;

/// Calculate the checksum for a frame
///
/// `length` is the value of the wire length field (payload length + 2).
///
/// # Examples
///
/// ```
/// use zfmrust_core::checksum;
///
/// let checksum = checksum::calculate(0x01, 0x0007, &[0x13, 0, 0, 0, 0]);
/// assert_eq!(checksum, 0x001B);
/// ```
pub fn calculate(kind: u8, length: u16, payload: &[u8]) -> u16 {
    let [len_hi, len_lo] = length.to_be_bytes();

    let mut sum = u32::from(kind) + u32::from(len_hi) + u32::from(len_lo);

    for &byte in payload {
        sum = (sum + u32::from(byte)) & 0xFFFF;
    }

    let checksum = sum as u16;

    trace!(
        kind = kind,
        length = length,
        payload_len = payload.len(),
        checksum = format!("0x{:04X}", checksum),
        "Calculated checksum"
    );

    checksum
}

/// Verify a received checksum
pub fn verify(kind: u8, length: u16, payload: &[u8], expected: u16) -> bool {
    calculate(kind, length, payload) == expected
}
