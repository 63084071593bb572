//! Pairing of unidirectional TCP streams into bidirectional sessions.
//!
//! A reassembly engine reports each direction of a connection on its own and
//! in no particular order. This module collects those half-streams keyed by
//! [`ConnectionKey`], matches each one with its exact reverse, and tells the
//! owning [`SessionHandler`](crate::session::SessionHandler) when the whole
//! connection has finished.

pub mod chunk;
pub mod correlator;
pub mod key;

pub use chunk::Chunk;
pub use correlator::{FlowCorrelator, HalfStream};
pub use key::{ConnectionKey, FlowPair};
