//! Persistence of extracted artefacts.
//!
//! An [`ArtifactSink`] stores byte ranges under a per-session container.
//! Containers are requested lazily by the caller, so sessions that never
//! produce an artefact leave nothing behind. [`DirectorySink`] maps
//! containers to directories and artefacts to files.

pub mod directory;
pub mod naming;

use std::{io, path::PathBuf, time::SystemTime};

use thiserror::Error;

pub use directory::DirectorySink;

use crate::session::SessionId;

/// Errors raised while persisting artefacts.
#[derive(Debug, Error)]
pub enum SinkError {
    /// The session container could not be created.
    #[error("failed to create container {}: {source}", .path.display())]
    CreateContainer {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    /// An artefact could not be created or written.
    #[error("failed to write artefact {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    /// The artefact timestamps could not be applied.
    #[error("failed to set times on {}: {source}", .path.display())]
    SetTimes {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Destination for extracted artefacts.
pub trait ArtifactSink {
    /// Handle identifying a session container.
    type Container: Clone;

    /// Create the container for `session` if it does not exist yet.
    ///
    /// Calling this again for the same session returns an equivalent handle.
    ///
    /// # Errors
    ///
    /// Returns [`SinkError::CreateContainer`] if the container cannot be made.
    fn ensure_container(
        &self,
        session: SessionId,
        first_seen: SystemTime,
    ) -> Result<Self::Container, SinkError>;

    /// Store `bytes` under `name` inside `container`.
    ///
    /// The artefact's modification time is set to `timestamp`. If `name` is
    /// already taken a sortable suffix is appended (see
    /// [`naming::candidate_name`]); the name actually used is returned.
    ///
    /// # Errors
    ///
    /// Returns a [`SinkError`] if the artefact cannot be written.
    fn store(
        &self,
        container: &Self::Container,
        name: &str,
        timestamp: SystemTime,
        bytes: &[u8],
    ) -> Result<String, SinkError>;
}
