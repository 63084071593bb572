//! Stateful extraction of complete packets from chunked input.

use std::time::SystemTime;

use bytes::{Bytes, BytesMut};
use tracing::debug;

use super::{Packet, PacketDecoder};
use crate::flow::Chunk;

/// A complete packet tagged with the capture time of the chunk that
/// supplied its last byte.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Frame {
    packet: Packet,
    seen: SystemTime,
}

impl Frame {
    #[must_use]
    pub const fn new(packet: Packet, seen: SystemTime) -> Self { Self { packet, seen } }

    /// Header-declared body length.
    #[must_use]
    pub const fn declared_len(&self) -> u32 { self.packet.declared_len() }

    /// Bytes consumed from the stream, header included.
    #[must_use]
    pub fn total_len(&self) -> usize { self.packet.total_len() }

    #[must_use]
    pub const fn sequence_id(&self) -> u8 { self.packet.sequence_id() }

    #[must_use]
    pub fn opcode(&self) -> Option<u8> { self.packet.opcode() }

    /// Payload following the opcode byte.
    #[must_use]
    pub fn payload(&self) -> &[u8] { self.packet.payload() }

    /// Timestamp of the chunk that completed the frame.
    #[must_use]
    pub const fn seen(&self) -> SystemTime { self.seen }

    #[must_use]
    pub fn into_payload(self) -> Bytes { self.packet.into_payload() }
}

/// Accumulation buffer plus framing state for one direction.
///
/// Bytes are appended with [`push`](Self::push) and complete frames are
/// pulled with [`next_frame`](Self::next_frame). Consumed bytes leave the
/// buffer as soon as their frame is returned; a partial packet stays buffered
/// across any number of pushes.
#[derive(Debug, Default)]
pub struct FrameExtractor {
    buffer: BytesMut,
    decoder: PacketDecoder,
}

impl FrameExtractor {
    #[must_use]
    pub fn new() -> Self { Self::default() }

    /// Append bytes to the accumulation buffer.
    pub fn push(&mut self, bytes: &[u8]) { self.buffer.extend_from_slice(bytes); }

    /// Return the next complete frame, tagging it with `seen`.
    pub fn next_frame(&mut self, seen: SystemTime) -> Option<Frame> {
        self.decoder
            .decode_packet(&mut self.buffer)
            .map(|packet| Frame::new(packet, seen))
    }

    /// Push every chunk in order and collect all frames they complete.
    pub fn extract(&mut self, chunks: &[Chunk]) -> Vec<Frame> {
        let mut frames = Vec::new();
        for chunk in chunks {
            self.push(chunk.payload());
            while let Some(frame) = self.next_frame(chunk.seen()) {
                frames.push(frame);
            }
        }
        frames
    }

    /// Bytes currently held for an incomplete packet.
    #[must_use]
    pub fn buffered_len(&self) -> usize { self.buffer.len() }

    /// Size of the packet being accumulated, once its header has arrived.
    #[must_use]
    pub const fn pending_frame_size(&self) -> Option<usize> { self.decoder.pending_frame_size() }

    /// Drop any trailing partial packet.
    ///
    /// Returns the number of bytes discarded. A capture that ends mid-packet
    /// simply loses that packet.
    pub fn finish(&mut self) -> usize {
        let residual = self.buffer.len();
        if residual > 0 {
            debug!(
                residual,
                expected = ?self.decoder.pending_frame_size(),
                "dropping truncated trailing packet"
            );
        }
        self.buffer.clear();
        self.decoder.reset();
        residual
    }
}
