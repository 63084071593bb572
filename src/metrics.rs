//! Metric helpers for `querysplit`.
//!
//! This module defines metric names and simple helper functions wrapping the
//! [`metrics`](https://docs.rs/metrics) crate. Without the `metrics` feature
//! the helpers compile to nothing.

/// Name of the counter tracking correlated sessions.
pub const SESSIONS_TOTAL: &str = "querysplit_sessions_total";
/// Name of the counter tracking complete client packets.
pub const FRAMES_TOTAL: &str = "querysplit_frames_total";
/// Name of the counter tracking stored artefacts.
pub const ARTIFACTS_TOTAL: &str = "querysplit_artifacts_total";

/// Kind of stored artefact.
#[derive(Clone, Copy, Debug)]
pub enum ArtifactKind {
    /// A client query payload.
    Request,
    /// A flushed run of server bytes.
    Response,
}

impl ArtifactKind {
    #[cfg_attr(not(feature = "metrics"), allow(dead_code))]
    fn as_str(self) -> &'static str {
        match self {
            ArtifactKind::Request => "request",
            ArtifactKind::Response => "response",
        }
    }
}

/// Record a newly created session.
pub fn inc_sessions() {
    #[cfg(feature = "metrics")]
    ::metrics::counter!(SESSIONS_TOTAL).increment(1);
}

/// Record a complete client packet, labelled by whether it was a query.
pub fn inc_frames(query: bool) {
    #[cfg(feature = "metrics")]
    ::metrics::counter!(FRAMES_TOTAL, "kind" => if query { "query" } else { "other" }).increment(1);
    #[cfg(not(feature = "metrics"))]
    let _ = query;
}

/// Record a stored artefact.
pub fn inc_artifacts(kind: ArtifactKind) {
    #[cfg(feature = "metrics")]
    ::metrics::counter!(ARTIFACTS_TOTAL, "kind" => kind.as_str()).increment(1);
    #[cfg(not(feature = "metrics"))]
    let _ = kind;
}
