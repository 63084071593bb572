//! Filesystem-backed artefact sink.

use std::{
    fs::{self, File, FileTimes, OpenOptions},
    io::{self, Write},
    path::{Path, PathBuf},
    time::SystemTime,
};

use tracing::{debug, trace};

use super::{
    ArtifactSink,
    SinkError,
    naming::{candidate_name, container_name},
};
use crate::session::SessionId;

/// Writes one directory per session and one file per artefact.
///
/// Files are created with create-new semantics; an existing file is never
/// overwritten, a suffixed name is chosen instead.
#[derive(Clone, Debug)]
pub struct DirectorySink {
    root: PathBuf,
}

impl DirectorySink {
    /// Create a sink rooted at `root`. The root itself must exist.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self { Self { root: root.into() } }

    #[must_use]
    pub fn root(&self) -> &Path { &self.root }
}

impl ArtifactSink for DirectorySink {
    type Container = PathBuf;

    fn ensure_container(
        &self,
        session: SessionId,
        first_seen: SystemTime,
    ) -> Result<PathBuf, SinkError> {
        let path = self.root.join(container_name(session, first_seen));
        if !path.is_dir() {
            fs::create_dir(&path).map_err(|source| SinkError::CreateContainer {
                path: path.clone(),
                source,
            })?;
            debug!(path = %path.display(), "created session directory");
        }
        Ok(path)
    }

    fn store(
        &self,
        container: &PathBuf,
        name: &str,
        timestamp: SystemTime,
        bytes: &[u8],
    ) -> Result<String, SinkError> {
        let (mut file, name, path) = create_exclusive(container, name)?;
        file.write_all(bytes)
            .map_err(|source| SinkError::Write {
                path: path.clone(),
                source,
            })?;
        let times = FileTimes::new()
            .set_accessed(timestamp)
            .set_modified(timestamp);
        file.set_times(times)
            .map_err(|source| SinkError::SetTimes {
                path: path.clone(),
                source,
            })?;
        trace!(path = %path.display(), len = bytes.len(), "stored artefact");
        Ok(name)
    }
}

fn create_exclusive(dir: &Path, base: &str) -> Result<(File, String, PathBuf), SinkError> {
    let mut attempt = 0_u64;
    loop {
        let name = candidate_name(base, attempt);
        let path = dir.join(&name);
        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(file) => return Ok((file, name, path)),
            Err(err) if err.kind() == io::ErrorKind::AlreadyExists => attempt += 1,
            Err(source) => return Err(SinkError::Write { path, source }),
        }
    }
}
