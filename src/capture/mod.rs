//! Capture input: pcap records to ordered half-stream deliveries.
//!
//! This layer is the orchestrator around the correlator. It reads a legacy
//! pcap capture, decodes link, network and TCP headers into
//! [`TcpSegment`]s, and hands them to a [`Driver`] which orders each
//! direction's bytes before delivering them to the [`FlowCorrelator`].
//!
//! [`FlowCorrelator`]: crate::flow::FlowCorrelator

pub mod driver;
pub mod reader;
pub mod segment;

use thiserror::Error;

pub use driver::{Driver, DriverConfig};
pub use reader::{CaptureStats, read_pcap};
pub use segment::{TcpFlags, TcpSegment};

/// Errors raised while reading a capture.
#[derive(Debug, Error)]
pub enum CaptureError {
    /// The input does not start with a recognised capture header.
    #[error("not a pcap capture: {0}")]
    Open(String),
    /// The input uses the pcapng container.
    #[error("pcapng captures are not supported; convert with `editcap -F pcap`")]
    PcapNg,
    /// The input ends inside a record.
    #[error("capture truncated inside the record at byte {offset}")]
    Truncated { offset: usize },
    /// A record could not be parsed.
    #[error("malformed pcap record: {0}")]
    Parse(String),
    /// Reading more input failed.
    #[error("failed to read capture: {0}")]
    Read(String),
}

#[cfg(test)]
mod tests;
