//! In-memory [`ArtifactSink`].

use std::{
    collections::BTreeSet,
    io,
    path::PathBuf,
    sync::{Mutex, MutexGuard},
    time::SystemTime,
};

use querysplit::{
    ArtifactSink,
    SessionId,
    SinkError,
    sink::naming::{candidate_name, container_name},
};

/// One artefact captured by [`MemorySink`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoredArtifact {
    pub container: String,
    pub name: String,
    pub timestamp: SystemTime,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Default)]
struct Inner {
    containers: BTreeSet<String>,
    artifacts: Vec<StoredArtifact>,
    ensure_calls: usize,
}

/// Records containers and artefacts in store order.
///
/// Names are disambiguated exactly like the directory sink. A sink built with
/// [`MemorySink::failing_after`] rejects writes once the given number of
/// artefacts has been stored.
#[derive(Debug, Default)]
pub struct MemorySink {
    inner: Mutex<Inner>,
    capacity: Option<usize>,
}

impl MemorySink {
    #[must_use]
    pub fn new() -> Self { Self::default() }

    /// A sink that fails every store after the first `stored` succeed.
    #[must_use]
    pub fn failing_after(stored: usize) -> Self {
        Self {
            capacity: Some(stored),
            ..Self::default()
        }
    }

    /// Snapshot of all stored artefacts.
    #[must_use]
    pub fn artifacts(&self) -> Vec<StoredArtifact> { self.lock().artifacts.clone() }

    /// Names of containers created so far, sorted.
    #[must_use]
    pub fn containers(&self) -> Vec<String> { self.lock().containers.iter().cloned().collect() }

    /// Number of times a container was requested.
    #[must_use]
    pub fn ensure_calls(&self) -> usize { self.lock().ensure_calls }

    fn lock(&self) -> MutexGuard<'_, Inner> { self.inner.lock().expect("memory sink poisoned") }
}

impl ArtifactSink for MemorySink {
    type Container = String;

    fn ensure_container(
        &self,
        session: SessionId,
        first_seen: SystemTime,
    ) -> Result<String, SinkError> {
        let name = container_name(session, first_seen);
        let mut inner = self.lock();
        inner.ensure_calls += 1;
        inner.containers.insert(name.clone());
        Ok(name)
    }

    fn store(
        &self,
        container: &String,
        name: &str,
        timestamp: SystemTime,
        bytes: &[u8],
    ) -> Result<String, SinkError> {
        let mut inner = self.lock();
        if self.capacity.is_some_and(|cap| inner.artifacts.len() >= cap) {
            return Err(SinkError::Write {
                path: PathBuf::from(container).join(name),
                source: io::Error::other("memory sink is full"),
            });
        }
        let taken = |candidate: &str| {
            inner
                .artifacts
                .iter()
                .any(|a| a.container == *container && a.name == candidate)
        };
        let mut attempt = 0;
        let mut chosen = candidate_name(name, attempt);
        while taken(&chosen) {
            attempt += 1;
            chosen = candidate_name(name, attempt);
        }
        inner.artifacts.push(StoredArtifact {
            container: container.clone(),
            name: chosen.clone(),
            timestamp,
            bytes: bytes.to_vec(),
        });
        Ok(chosen)
    }
}
