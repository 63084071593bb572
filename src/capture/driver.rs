//! Minimal in-order TCP reassembly feeding the correlator.
//!
//! Each direction tracks the next expected sequence number. Retransmitted
//! bytes are trimmed, segments ahead of the expected sequence are held until
//! the gap fills, and a direction that holds more than
//! [`DriverConfig::max_buffered_bytes`] gives up on its oldest gap. FIN or
//! RST closes a direction; everything still open is closed by
//! [`Driver::finish`].

use std::{
    collections::{HashMap, HashSet},
    time::SystemTime,
};

use bytes::Bytes;
use tracing::{debug, trace};

use super::TcpSegment;
use crate::{
    flow::{Chunk, ConnectionKey, FlowCorrelator, HalfStream},
    session::SessionFactory,
};

/// Reassembly limits.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DriverConfig {
    /// Out-of-order bytes a direction may hold before skipping a gap.
    pub max_buffered_bytes: usize,
}

impl DriverConfig {
    /// Default out-of-order allowance per direction (1 MiB).
    pub const DEFAULT_MAX_BUFFERED_BYTES: usize = 1024 * 1024;
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            max_buffered_bytes: Self::DEFAULT_MAX_BUFFERED_BYTES,
        }
    }
}

#[derive(Debug)]
struct Held {
    sequence: u32,
    payload: Bytes,
    seen: SystemTime,
}

#[derive(Debug)]
struct Direction {
    half: HalfStream,
    opened: u64,
    next: Option<u32>,
    held: Vec<Held>,
    held_bytes: usize,
}

// Signed distance from `next` to `sequence` in modulo-2^32 sequence space.
fn seq_offset(sequence: u32, next: u32) -> i64 {
    #[expect(
        clippy::cast_possible_wrap,
        reason = "sequence comparison is defined modulo 2^32"
    )]
    let offset = sequence.wrapping_sub(next) as i32;
    i64::from(offset)
}

fn seq_advance(next: u32, len: usize) -> u32 {
    #[expect(
        clippy::cast_possible_truncation,
        reason = "sequence arithmetic wraps modulo 2^32"
    )]
    let len = len as u32;
    next.wrapping_add(len)
}

impl Direction {
    fn new(half: HalfStream, opened: u64) -> Self {
        Self {
            half,
            opened,
            next: None,
            held: Vec::new(),
            held_bytes: 0,
        }
    }

    // Deliver the part of `payload` not yet seen, then anything held that has
    // become contiguous. Segments ahead of the expected sequence are held.
    fn accept(&mut self, sequence: u32, payload: Bytes, seen: SystemTime, out: &mut Vec<Chunk>) {
        let next = *self.next.get_or_insert(sequence);
        if seq_offset(sequence, next) > 0 {
            self.held_bytes += payload.len();
            self.held.push(Held {
                sequence,
                payload,
                seen,
            });
            return;
        }
        self.deliver(sequence, payload, seen, out);
        self.release_contiguous(out);
    }

    fn deliver(&mut self, sequence: u32, payload: Bytes, seen: SystemTime, out: &mut Vec<Chunk>) {
        let next = *self.next.get_or_insert(sequence);
        let overlap = usize::try_from(-seq_offset(sequence, next)).unwrap_or(usize::MAX);
        if overlap >= payload.len() {
            trace!(sequence, len = payload.len(), "dropping retransmitted segment");
            return;
        }
        let fresh = payload.slice(overlap..);
        self.next = Some(seq_advance(next, fresh.len()));
        out.push(Chunk::new(fresh, seen));
    }

    fn release_contiguous(&mut self, out: &mut Vec<Chunk>) {
        while let Some(next) = self.next {
            let Some(pos) = self
                .held
                .iter()
                .position(|held| seq_offset(held.sequence, next) <= 0)
            else {
                break;
            };
            let held = self.held.swap_remove(pos);
            self.held_bytes -= held.payload.len();
            self.deliver(held.sequence, held.payload, held.seen, out);
        }
    }

    // Jump over the gap before the earliest held segment.
    fn skip_gap(&mut self, out: &mut Vec<Chunk>) -> bool {
        let Some(next) = self.next else {
            return false;
        };
        let Some(earliest) = self
            .held
            .iter()
            .map(|held| held.sequence)
            .min_by_key(|sequence| seq_offset(*sequence, next))
        else {
            return false;
        };
        debug!(
            skipped = seq_offset(earliest, next),
            "skipping sequence gap"
        );
        self.next = Some(earliest);
        self.release_contiguous(out);
        true
    }
}

/// Feeds decoded segments through per-direction reassembly into a
/// [`FlowCorrelator`].
pub struct Driver<F: SessionFactory> {
    correlator: FlowCorrelator<F>,
    config: DriverConfig,
    open: HashMap<ConnectionKey, Direction>,
    closed: HashSet<ConnectionKey>,
    opened: u64,
}

impl<F: SessionFactory> Driver<F> {
    #[must_use]
    pub fn new(factory: F, config: DriverConfig) -> Self {
        Self {
            correlator: FlowCorrelator::new(factory),
            config,
            open: HashMap::new(),
            closed: HashSet::new(),
            opened: 0,
        }
    }

    #[must_use]
    pub fn correlator(&self) -> &FlowCorrelator<F> { &self.correlator }

    /// Number of directions currently being reassembled.
    #[must_use]
    pub fn open_directions(&self) -> usize { self.open.len() }

    /// Process one segment captured at `seen`.
    ///
    /// # Errors
    ///
    /// Propagates session handler errors.
    pub fn process(&mut self, segment: TcpSegment, seen: SystemTime) -> crate::Result<()> {
        let key = segment.key();
        let flags = segment.flags();
        if self.closed.contains(&key) {
            if !flags.syn {
                trace!(%key, "ignoring segment for closed direction");
                return Ok(());
            }
            self.closed.remove(&key);
        }

        if !self.open.contains_key(&key) {
            let half = self.correlator.on_half_arrival(key)?;
            self.opened += 1;
            self.open.insert(key, Direction::new(half, self.opened));
        }
        let Some(direction) = self.open.get_mut(&key) else {
            return Ok(());
        };

        let mut sequence = segment.sequence();
        if flags.syn {
            sequence = sequence.wrapping_add(1);
            direction.next = Some(sequence);
        }

        let mut chunks = Vec::new();
        let payload = segment.payload().clone();
        if !payload.is_empty() {
            direction.accept(sequence, payload, seen, &mut chunks);
            while direction.held_bytes > self.config.max_buffered_bytes {
                if !direction.skip_gap(&mut chunks) {
                    break;
                }
            }
        }
        let half = direction.half;
        self.correlator.on_bytes(half, &chunks)?;

        if flags.fin || flags.rst {
            self.close(key)?;
        }
        Ok(())
    }

    /// Close every open direction and complete all sessions.
    ///
    /// # Errors
    ///
    /// Propagates session handler errors.
    pub fn finish(&mut self) -> crate::Result<()> {
        let mut keys: Vec<(u64, ConnectionKey)> = self
            .open
            .iter()
            .map(|(key, direction)| (direction.opened, *key))
            .collect();
        keys.sort_unstable_by_key(|(opened, _)| *opened);
        for (_, key) in keys {
            self.close(key)?;
        }
        self.closed.clear();
        self.correlator.on_global_flush()
    }

    fn close(&mut self, key: ConnectionKey) -> crate::Result<()> {
        let Some(mut direction) = self.open.remove(&key) else {
            return Ok(());
        };
        let mut chunks = Vec::new();
        while direction.skip_gap(&mut chunks) {}
        self.correlator.on_bytes(direction.half, &chunks)?;
        self.closed.insert(key);
        self.correlator.on_half_complete(direction.half)
    }
}
