//! Boundary detection for length-prefixed packets.

use std::io;

use bytes::{Buf, Bytes, BytesMut};
use tokio_util::codec::Decoder;

use super::HEADER_LEN;
use crate::byte_order::read_le_u24;

/// One complete packet as it appeared on the wire.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Packet {
    declared_len: u32,
    sequence_id: u8,
    body: Bytes,
}

impl Packet {
    /// Body length declared by the header (opcode plus payload).
    #[must_use]
    pub const fn declared_len(&self) -> u32 { self.declared_len }

    /// Bytes the packet occupied on the wire, header included.
    #[must_use]
    pub fn total_len(&self) -> usize { HEADER_LEN + self.body.len() }

    #[must_use]
    pub const fn sequence_id(&self) -> u8 { self.sequence_id }

    /// Command byte, absent for an empty body.
    #[must_use]
    pub fn opcode(&self) -> Option<u8> { self.body.first().copied() }

    /// Body bytes following the opcode.
    #[must_use]
    pub fn payload(&self) -> &[u8] { self.body.get(1..).unwrap_or_default() }

    /// Consume the packet, returning the payload without the opcode.
    #[must_use]
    pub fn into_payload(mut self) -> Bytes {
        if !self.body.is_empty() {
            self.body.advance(1);
        }
        self.body
    }
}

/// Incremental decoder for `MySQL` packets.
///
/// The decoder caches the size of the packet at the front of the buffer once
/// its header has been read, so repeated calls while a large packet trickles
/// in do not re-parse the header.
#[derive(Clone, Debug, Default)]
pub struct PacketDecoder {
    frame_size: Option<usize>,
}

impl PacketDecoder {
    #[must_use]
    pub fn new() -> Self { Self::default() }

    /// Total size of the partially received packet, if its header is known.
    #[must_use]
    pub const fn pending_frame_size(&self) -> Option<usize> { self.frame_size }

    /// Forget any cached header.
    pub fn reset(&mut self) { self.frame_size = None; }

    /// Split the next complete packet off the front of `src`.
    ///
    /// Returns `None` while the header or the body is still incomplete. Bytes
    /// of a returned packet are removed from `src`.
    pub fn decode_packet(&mut self, src: &mut BytesMut) -> Option<Packet> {
        let frame_size = match self.frame_size {
            Some(size) => size,
            None => {
                if src.len() < HEADER_LEN {
                    return None;
                }
                let declared = read_le_u24([src[0], src[1], src[2]]);
                let size = HEADER_LEN + declared as usize;
                self.frame_size = Some(size);
                size
            }
        };
        if src.len() < frame_size {
            return None;
        }

        self.frame_size = None;
        let mut frame = src.split_to(frame_size);
        let declared_len = read_le_u24([frame[0], frame[1], frame[2]]);
        let sequence_id = frame[3];
        frame.advance(HEADER_LEN);

        Some(Packet {
            declared_len,
            sequence_id,
            body: frame.freeze(),
        })
    }
}

impl Decoder for PacketDecoder {
    type Item = Packet;
    type Error = io::Error;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        Ok(self.decode_packet(src))
    }
}
