#![doc(html_root_url = "https://docs.rs/querysplit/latest")]
//! Public API for the `querysplit` library.
//!
//! This crate pairs the two directions of captured TCP connections into
//! bidirectional sessions and splits the client side of `MySQL` traffic into
//! one artefact per query packet, optionally keeping the server responses
//! alongside.

pub mod byte_order;
pub mod capture;
pub mod config;
pub mod error;
pub mod flow;
pub mod frame;
pub mod metrics;
pub mod response;
pub mod session;
pub mod sink;
pub mod split;

pub use capture::{CaptureError, Driver, DriverConfig, TcpSegment, read_pcap};
pub use config::SplitConfig;
pub use error::{Error, Result};
pub use flow::{Chunk, ConnectionKey, FlowCorrelator, FlowPair, HalfStream};
pub use frame::{Frame, FrameExtractor, PacketDecoder, QUERY_OPCODE};
pub use response::{ResponseCollector, ResponseRange};
pub use session::{SessionFactory, SessionHandler, SessionId, StreamIndex};
pub use sink::{ArtifactSink, DirectorySink, SinkError};
pub use split::{QuerySplitter, SplitterFactory};
