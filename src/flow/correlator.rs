//! Pairing state machine for half-streams.
//!
//! [`FlowCorrelator`] keeps an arena of sessions indexed by position and a
//! pending map from the *expected* key of the missing direction to the
//! session waiting for it. A [`HalfStream`] is a plain index into the arena,
//! so no half-stream ever owns or borrows its session.

use std::collections::HashMap;

use tracing::{debug, trace, warn};

use super::{Chunk, ConnectionKey};
use crate::session::{SessionFactory, SessionHandler, StreamIndex};

/// Handle for one direction of a correlated connection.
///
/// Returned by [`FlowCorrelator::on_half_arrival`] and passed back for every
/// delivery and for the completion signal of that direction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct HalfStream {
    session: usize,
    index: StreamIndex,
}

impl HalfStream {
    /// Directional index within the owning session.
    #[must_use]
    pub const fn index(&self) -> StreamIndex { self.index }

    /// Arena position of the owning session.
    #[must_use]
    pub const fn session(&self) -> usize { self.session }
}

#[derive(Clone, Copy, Debug, Default)]
struct HalfState {
    done: bool,
}

#[derive(Debug)]
struct SessionSlot<H> {
    handler: H,
    halves: [Option<HalfState>; 2],
    // Completes on its own signal; no sibling will ever be matched.
    standalone: bool,
}

impl<H> SessionSlot<H> {
    fn new(handler: H, standalone: bool) -> Self {
        Self {
            handler,
            halves: [Some(HalfState::default()), None],
            standalone,
        }
    }

    fn first_done(&self) -> bool { matches!(self.halves[0], Some(HalfState { done: true })) }

    fn ready(&self) -> bool {
        if self.standalone {
            return self.first_done();
        }
        self.halves
            .iter()
            .all(|half| matches!(half, Some(HalfState { done: true })))
    }
}

/// Pairs half-stream arrivals into bidirectional sessions.
///
/// All methods take `&mut self`: the pending map and the arena are owned by
/// one correlator and mutated from a single thread. Wrap the whole
/// correlator in a mutex if it must be shared.
pub struct FlowCorrelator<F: SessionFactory> {
    factory: F,
    pending: HashMap<ConnectionKey, usize>,
    sessions: Vec<Option<SessionSlot<F::Handler>>>,
    live: usize,
}

impl<F: SessionFactory> FlowCorrelator<F> {
    /// Create a correlator that builds session handlers with `factory`.
    #[must_use]
    pub fn new(factory: F) -> Self {
        Self {
            factory,
            pending: HashMap::new(),
            sessions: Vec::new(),
            live: 0,
        }
    }

    /// Register a newly observed direction.
    ///
    /// If the reverse direction is already waiting, the new half completes
    /// that session and the pending entry is removed. Otherwise a new session
    /// is created and parked under `key.reverse()`.
    ///
    /// # Errors
    ///
    /// Returns an error if completing a session displaced by this arrival
    /// fails.
    pub fn on_half_arrival(&mut self, key: ConnectionKey) -> crate::Result<HalfStream> {
        if let Some(session) = self.pending.remove(&key) {
            if let Some(slot) = self.slot_mut(session) {
                slot.halves[StreamIndex::Second.as_usize()] = Some(HalfState::default());
                debug!(%key, session, "paired reverse half-stream");
                return Ok(HalfStream {
                    session,
                    index: StreamIndex::Second,
                });
            }
        }

        let standalone = key.is_self_reverse();
        let handler = self.factory.new_session(&key);
        let session = self.sessions.len();
        self.sessions.push(Some(SessionSlot::new(handler, standalone)));
        self.live += 1;

        if standalone {
            warn!(%key, session, "connection key equals its own reverse; not pairing");
        } else if let Some(displaced) = self.pending.insert(key.reverse(), session) {
            debug!(%key, displaced, "direction observed again before pairing");
            self.orphan(displaced)?;
        } else {
            trace!(%key, session, "waiting for reverse half-stream");
        }

        Ok(HalfStream {
            session,
            index: StreamIndex::First,
        })
    }

    /// Forward reassembled chunks to the session owning `half`.
    ///
    /// Deliveries for a session that has already completed are ignored.
    ///
    /// # Errors
    ///
    /// Propagates the handler's error.
    pub fn on_bytes(&mut self, half: HalfStream, chunks: &[Chunk]) -> crate::Result<()> {
        if chunks.is_empty() {
            return Ok(());
        }
        match self.slot_mut(half.session) {
            Some(slot) => slot.handler.on_bytes(half.index, chunks),
            None => {
                debug!(session = half.session, "ignoring bytes for finished session");
                Ok(())
            }
        }
    }

    /// Mark `half` as finished and complete the session when both halves are.
    ///
    /// Repeated signals for the same half are ignored.
    ///
    /// # Errors
    ///
    /// Propagates the handler's completion error.
    pub fn on_half_complete(&mut self, half: HalfStream) -> crate::Result<()> {
        let Some(slot) = self.slot_mut(half.session) else {
            return Ok(());
        };
        let Some(state) = slot.halves[half.index.as_usize()].as_mut() else {
            return Ok(());
        };
        if state.done {
            return Ok(());
        }
        state.done = true;

        if slot.ready() {
            self.complete(half.session)
        } else {
            Ok(())
        }
    }

    /// Complete every session whose reverse direction never arrived.
    ///
    /// Call once at end of capture. Calling again finds nothing pending and
    /// does nothing.
    ///
    /// # Errors
    ///
    /// Stops at the first handler error.
    pub fn on_global_flush(&mut self) -> crate::Result<()> {
        let mut unpaired: Vec<usize> = self.pending.drain().map(|(_, session)| session).collect();
        if unpaired.is_empty() {
            return Ok(());
        }
        unpaired.sort_unstable();
        debug!(count = unpaired.len(), "completing unpaired sessions");
        for session in unpaired {
            self.complete(session)?;
        }
        Ok(())
    }

    /// Number of sessions waiting for their reverse direction.
    #[must_use]
    pub fn pending_len(&self) -> usize { self.pending.len() }

    /// Number of sessions that have not completed yet.
    #[must_use]
    pub fn sessions_len(&self) -> usize { self.live }

    /// Borrow the session factory.
    #[must_use]
    pub fn factory(&self) -> &F { &self.factory }

    fn slot_mut(&mut self, session: usize) -> Option<&mut SessionSlot<F::Handler>> {
        self.sessions.get_mut(session).and_then(Option::as_mut)
    }

    // A newer arrival took over the pending key; the displaced session can no
    // longer be paired.
    fn orphan(&mut self, session: usize) -> crate::Result<()> {
        let Some(slot) = self.slot_mut(session) else {
            return Ok(());
        };
        slot.standalone = true;
        if slot.first_done() {
            self.complete(session)
        } else {
            Ok(())
        }
    }

    fn complete(&mut self, session: usize) -> crate::Result<()> {
        let Some(mut slot) = self.sessions.get_mut(session).and_then(Option::take) else {
            return Ok(());
        };
        self.live -= 1;
        trace!(session, "session complete");
        slot.handler.on_complete()
    }
}
