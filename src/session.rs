//! Per-connection behaviour plugged into the [`FlowCorrelator`].
//!
//! The correlator only knows how to pair half-streams and when a connection
//! is finished. What happens to the bytes is decided by a [`SessionHandler`]
//! created by a [`SessionFactory`] when the first direction of a connection
//! is observed.
//!
//! [`FlowCorrelator`]: crate::flow::FlowCorrelator

use crate::flow::{Chunk, ConnectionKey};

/// Identifier assigned to a correlated session.
///
/// Identifiers are handed out by the factory in creation order, starting at
/// one, so they sort in the order connections were first seen.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SessionId(u64);

impl From<u64> for SessionId {
    fn from(value: u64) -> Self { Self(value) }
}

impl SessionId {
    /// Create a new [`SessionId`] with the provided value.
    #[must_use]
    pub const fn new(id: u64) -> Self { Self(id) }

    /// Return the inner `u64` representation.
    #[must_use]
    pub const fn as_u64(&self) -> u64 { self.0 }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:08}", self.0)
    }
}

/// Directional index of a half-stream inside its session.
///
/// The first direction observed is [`StreamIndex::First`], its reverse is
/// [`StreamIndex::Second`]. The index says nothing about which side is the
/// client; handlers derive roles from the connection key instead.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StreamIndex {
    /// Direction that created the session.
    First,
    /// Direction that completed the pairing.
    Second,
}

impl StreamIndex {
    /// The opposite direction of the same session.
    #[must_use]
    pub const fn other(self) -> Self {
        match self {
            Self::First => Self::Second,
            Self::Second => Self::First,
        }
    }

    /// Numeric form used for slot addressing (`0` or `1`).
    #[must_use]
    pub const fn as_usize(self) -> usize {
        match self {
            Self::First => 0,
            Self::Second => 1,
        }
    }
}

/// Behaviour of one bidirectional session.
pub trait SessionHandler {
    /// Receive reassembled chunks for the direction identified by `index`.
    ///
    /// Chunks arrive in capture order within one direction.
    ///
    /// # Errors
    ///
    /// Returns an error when persisting output fails; the caller is expected
    /// to abort processing.
    fn on_bytes(&mut self, index: StreamIndex, chunks: &[Chunk]) -> crate::Result<()>;

    /// Called exactly once when the session is finished.
    ///
    /// # Errors
    ///
    /// Returns an error when flushing output fails.
    fn on_complete(&mut self) -> crate::Result<()>;
}

/// Creates a [`SessionHandler`] for each new connection.
pub trait SessionFactory {
    /// Handler type produced by this factory.
    type Handler: SessionHandler;

    /// Build the handler for a connection first observed under `key`.
    ///
    /// `key` identifies the direction that will be reported as
    /// [`StreamIndex::First`].
    fn new_session(&mut self, key: &ConnectionKey) -> Self::Handler;
}
