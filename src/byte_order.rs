//! Helpers for the little-endian 24-bit length prefix used by `MySQL`
//! packets.
//!
//! These helpers keep the bit twiddling in one place so the framing code can
//! stay explicit about wire layout without repeating shifts and masks.

/// Largest value representable by a 24-bit length field.
pub const MAX_U24: u32 = 0x00ff_ffff;

/// Parse a little-endian `u24` from its on-wire representation.
///
/// # Examples
///
/// ```
/// use querysplit::byte_order::read_le_u24;
///
/// assert_eq!(read_le_u24([0x09, 0x00, 0x00]), 9);
/// assert_eq!(read_le_u24([0x56, 0x34, 0x12]), 0x12_3456);
/// ```
#[must_use]
pub fn read_le_u24(bytes: [u8; 3]) -> u32 {
    u32::from_le_bytes([bytes[0], bytes[1], bytes[2], 0])
}

/// Serialise a `u24` in little-endian order.
///
/// Returns `None` when `value` does not fit in 24 bits.
///
/// # Examples
///
/// ```
/// use querysplit::byte_order::write_le_u24;
///
/// assert_eq!(write_le_u24(0x12_3456), Some([0x56, 0x34, 0x12]));
/// assert_eq!(write_le_u24(0x0100_0000), None);
/// ```
#[must_use]
pub fn write_le_u24(value: u32) -> Option<[u8; 3]> {
    if value > MAX_U24 {
        return None;
    }
    let [lo, mid, hi, _] = value.to_le_bytes();
    Some([lo, mid, hi])
}
