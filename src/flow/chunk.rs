//! Unit of delivery from the reassembly engine.

use std::time::SystemTime;

use bytes::Bytes;

/// Contiguous bytes from one direction together with the capture time of the
/// packet that carried them.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Chunk {
    payload: Bytes,
    seen: SystemTime,
}

impl Chunk {
    /// Construct a new [`Chunk`].
    #[must_use]
    pub fn new(payload: impl Into<Bytes>, seen: SystemTime) -> Self {
        Self {
            payload: payload.into(),
            seen,
        }
    }

    /// Borrow the chunk bytes.
    #[must_use]
    pub fn payload(&self) -> &[u8] { &self.payload }

    /// Capture timestamp of the packet that supplied these bytes.
    #[must_use]
    pub const fn seen(&self) -> SystemTime { self.seen }

    #[must_use]
    pub fn len(&self) -> usize { self.payload.len() }

    #[must_use]
    pub fn is_empty(&self) -> bool { self.payload.is_empty() }
}
