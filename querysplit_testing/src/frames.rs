//! Encoders for client packets.

use querysplit::{QUERY_OPCODE, byte_order::write_le_u24};

/// Encode `body` as one packet with the given sequence id.
///
/// # Panics
///
/// Panics if `body` does not fit a 24-bit length.
#[must_use]
pub fn packet(sequence_id: u8, body: &[u8]) -> Vec<u8> {
    let len = u32::try_from(body.len())
        .ok()
        .and_then(write_le_u24)
        .expect("packet body exceeds the 24-bit length field");
    let mut out = Vec::with_capacity(body.len() + 4);
    out.extend_from_slice(&len);
    out.push(sequence_id);
    out.extend_from_slice(body);
    out
}

/// Encode a query packet carrying `sql`.
#[must_use]
pub fn query_packet(sequence_id: u8, sql: &str) -> Vec<u8> {
    let mut body = Vec::with_capacity(sql.len() + 1);
    body.push(QUERY_OPCODE);
    body.extend_from_slice(sql.as_bytes());
    packet(sequence_id, &body)
}
