//! Canonical error and result types for the crate.
//!
//! Every failure surfaced by `querysplit` is unrecoverable for a batch run
//! over a finished capture, so the crate exposes a single error type that
//! callers propagate to `main` and report once.

use thiserror::Error;

use crate::{capture::CaptureError, sink::SinkError};

/// Top-level error type exposed by `querysplit`.
#[derive(Debug, Error)]
pub enum Error {
    /// Writing an artefact or its container failed.
    #[error("artefact storage failed: {0}")]
    Sink(#[from] SinkError),
    /// The capture could not be read.
    #[error("capture input failed: {0}")]
    Capture(#[from] CaptureError),
}

/// Canonical result alias used by `querysplit` public APIs.
pub type Result<T> = std::result::Result<T, Error>;
