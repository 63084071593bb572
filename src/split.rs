//! Session handler that splits client traffic into per-query artefacts.
//!
//! [`QuerySplitter`] is the [`SessionHandler`] installed for every
//! connection. Client bytes run through a [`FrameExtractor`]; each query
//! packet is stored under the timestamp of the chunk that completed it. With
//! response capture enabled, server bytes are buffered in a
//! [`ResponseCollector`] and stored just before the next client packet
//! completes and once more when the session ends.

use std::{sync::Arc, time::SystemTime};

use tracing::debug;

use crate::{
    config::SplitConfig,
    flow::{Chunk, ConnectionKey},
    frame::{Frame, FrameExtractor},
    metrics::{self, ArtifactKind},
    response::ResponseCollector,
    session::{SessionFactory, SessionHandler, SessionId, StreamIndex},
    sink::{
        ArtifactSink,
        SinkError,
        naming::{request_name, response_name},
    },
};

/// Which direction of a connection first observed as `key` is the client.
///
/// The direction sent *from* the server port is the response side. When
/// neither port, or both, is the server port, the endpoint with the lower
/// `(port, address)` is taken as the server. The choice depends only on the
/// connection, so both arrival orders agree.
#[must_use]
pub fn requester_index(key: &ConnectionKey, server_port: u16) -> StreamIndex {
    let transport = key.transport();
    let network = key.network();
    let src_is_server = transport.src == server_port;
    let source_serves = if src_is_server != (transport.dst == server_port) {
        src_is_server
    } else {
        (transport.src, network.src) < (transport.dst, network.dst)
    };
    if source_serves {
        StreamIndex::Second
    } else {
        StreamIndex::First
    }
}

/// Builds a [`QuerySplitter`] per connection and numbers sessions.
#[derive(Debug)]
pub struct SplitterFactory<S> {
    sink: Arc<S>,
    config: SplitConfig,
    created: u64,
}

impl<S: ArtifactSink> SplitterFactory<S> {
    #[must_use]
    pub fn new(sink: S, config: SplitConfig) -> Self {
        Self {
            sink: Arc::new(sink),
            config,
            created: 0,
        }
    }

    #[must_use]
    pub fn sink(&self) -> &S { &self.sink }

    #[must_use]
    pub const fn config(&self) -> SplitConfig { self.config }

    /// Number of sessions created so far.
    #[must_use]
    pub const fn created(&self) -> u64 { self.created }
}

impl<S: ArtifactSink> SessionFactory for SplitterFactory<S> {
    type Handler = QuerySplitter<S>;

    fn new_session(&mut self, key: &ConnectionKey) -> QuerySplitter<S> {
        self.created += 1;
        let id = SessionId::from(self.created);
        let requester = requester_index(key, self.config.server_port);
        metrics::inc_sessions();
        debug!(session = %id, %key, ?requester, "new session");
        QuerySplitter::new(id, requester, Arc::clone(&self.sink), self.config)
    }
}

/// Per-connection state: accumulation buffer, optional response buffer and
/// the lazily created container.
pub struct QuerySplitter<S: ArtifactSink> {
    id: SessionId,
    requester: StreamIndex,
    sink: Arc<S>,
    config: SplitConfig,
    first_seen: Option<SystemTime>,
    container: Option<S::Container>,
    extractor: FrameExtractor,
    responses: Option<ResponseCollector>,
    stored: usize,
}

impl<S: ArtifactSink> QuerySplitter<S> {
    #[must_use]
    pub fn new(id: SessionId, requester: StreamIndex, sink: Arc<S>, config: SplitConfig) -> Self {
        Self {
            id,
            requester,
            sink,
            config,
            first_seen: None,
            container: None,
            extractor: FrameExtractor::new(),
            responses: config.save_responses.then(ResponseCollector::new),
            stored: 0,
        }
    }

    #[must_use]
    pub const fn id(&self) -> SessionId { self.id }

    #[must_use]
    pub const fn requester(&self) -> StreamIndex { self.requester }

    /// Number of artefacts written for this session.
    #[must_use]
    pub const fn stored(&self) -> usize { self.stored }

    fn on_request_bytes(&mut self, chunks: &[Chunk]) -> Result<(), SinkError> {
        for chunk in chunks {
            self.extractor.push(chunk.payload());
            while let Some(frame) = self.extractor.next_frame(chunk.seen()) {
                self.on_frame(&frame)?;
            }
        }
        Ok(())
    }

    fn on_frame(&mut self, frame: &Frame) -> Result<(), SinkError> {
        self.flush_responses()?;
        let query = frame.opcode() == Some(self.config.query_opcode);
        metrics::inc_frames(query);
        if query {
            self.write(&request_name(frame.seen()), frame.seen(), frame.payload())?;
            metrics::inc_artifacts(ArtifactKind::Request);
        }
        Ok(())
    }

    fn flush_responses(&mut self) -> Result<(), SinkError> {
        let Some(range) = self.responses.as_mut().and_then(ResponseCollector::take) else {
            return Ok(());
        };
        self.write(&response_name(range.started()), range.started(), range.bytes())?;
        metrics::inc_artifacts(ArtifactKind::Response);
        Ok(())
    }

    fn write(&mut self, name: &str, timestamp: SystemTime, bytes: &[u8]) -> Result<(), SinkError> {
        let container = match self.container.take() {
            Some(container) => container,
            None => self.sink.ensure_container(
                self.id,
                self.first_seen.unwrap_or(timestamp),
            )?,
        };
        let stored = self.sink.store(&container, name, timestamp, bytes);
        self.container = Some(container);
        stored?;
        self.stored += 1;
        Ok(())
    }
}

impl<S: ArtifactSink> SessionHandler for QuerySplitter<S> {
    fn on_bytes(&mut self, index: StreamIndex, chunks: &[Chunk]) -> crate::Result<()> {
        if self.first_seen.is_none() {
            self.first_seen = chunks.first().map(Chunk::seen);
        }
        if index == self.requester {
            return Ok(self.on_request_bytes(chunks)?);
        }
        if let Some(responses) = self.responses.as_mut() {
            for chunk in chunks {
                responses.push(chunk);
            }
        }
        Ok(())
    }

    fn on_complete(&mut self) -> crate::Result<()> {
        self.flush_responses()?;
        let dropped = self.extractor.finish();
        debug!(session = %self.id, stored = self.stored, dropped, "session finished");
        Ok(())
    }
}
