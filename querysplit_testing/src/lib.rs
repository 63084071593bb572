//! Helpers for exercising `querysplit` without touching the filesystem or a
//! real network.
//!
//! ```rust
//! use querysplit::{SplitConfig, SplitterFactory};
//! use querysplit_testing::{MemorySink, query_packet};
//!
//! let factory = SplitterFactory::new(MemorySink::new(), SplitConfig::default());
//! let bytes = query_packet(0, "SELECT 1");
//! assert_eq!(bytes[..4], [9_u8, 0, 0, 0]);
//! # let _ = factory;
//! ```

pub mod frames;
pub mod logging;
pub mod pcap;
pub mod sink;

pub use frames::{packet, query_packet};
pub use logging::{LoggerHandle, logger};
pub use pcap::{Conversation, Flags, PcapWriter, at_micros};
pub use sink::{MemorySink, StoredArtifact};
