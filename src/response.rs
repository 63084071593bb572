//! Buffering of server responses between client requests.
//!
//! Server bytes are kept verbatim until the client completes its next packet
//! or the session ends, then handed out as one [`ResponseRange`] stamped
//! with the capture time of its first byte. Pairing a range with the request
//! before it is only as reliable as the cross-direction ordering of the
//! deliveries.

use std::time::SystemTime;

use bytes::{Bytes, BytesMut};

use crate::flow::Chunk;

/// A flushed run of response bytes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResponseRange {
    started: SystemTime,
    bytes: Bytes,
}

impl ResponseRange {
    /// Capture time of the first byte in the range.
    #[must_use]
    pub const fn started(&self) -> SystemTime { self.started }

    #[must_use]
    pub fn bytes(&self) -> &[u8] { &self.bytes }

    #[must_use]
    pub fn into_bytes(self) -> Bytes { self.bytes }
}

/// Accumulates bytes from the responding direction.
#[derive(Debug, Default)]
pub struct ResponseCollector {
    buffer: BytesMut,
    started: Option<SystemTime>,
}

impl ResponseCollector {
    #[must_use]
    pub fn new() -> Self { Self::default() }

    /// Append a chunk, remembering its timestamp if the buffer was empty.
    pub fn push(&mut self, chunk: &Chunk) {
        if chunk.is_empty() {
            return;
        }
        self.started.get_or_insert(chunk.seen());
        self.buffer.extend_from_slice(chunk.payload());
    }

    /// Take everything buffered so far, leaving the collector empty.
    ///
    /// Returns `None` when nothing has been buffered since the last flush.
    pub fn take(&mut self) -> Option<ResponseRange> {
        let started = self.started.take()?;
        let bytes = self.buffer.split().freeze();
        Some(ResponseRange { started, bytes })
    }

    #[must_use]
    pub fn buffered_len(&self) -> usize { self.buffer.len() }
}
