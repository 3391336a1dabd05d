//! Append gate and chunk queue
//!
//! Single-concurrency admission control in front of the append sink. Chunks
//! are held in arrival order and handed out for submission one at a time:
//! at most one append is ever in flight, which is what prevents
//! append-while-appending failures at the sink.
//!
//! The gate is a pure state machine over (queue, sink-busy): it decides, it
//! never performs sink calls itself. The caller must treat a returned
//! [`GateStep::Submit`] and the actual sink submission as one atomic step —
//! both happen inside the same critical section, never across an await.

use bytes::Bytes;
use std::collections::VecDeque;

/// Outcome of one gate step
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum GateStep {
    /// Submit this chunk to the sink now
    Submit(Bytes),

    /// Nothing to do: sink busy or queue empty
    Idle,
}

/// FIFO chunk queue plus single-flight drain logic
///
/// Unbounded: backpressure is the producer's concern, not the queue's.
/// Chunks leave in exactly the order they arrived; no reordering, no
/// dropping, no duplication.
#[derive(Debug, Default)]
pub(crate) struct AppendGate {
    queue: VecDeque<Bytes>,
}

impl AppendGate {
    pub(crate) fn new() -> Self {
        Self {
            queue: VecDeque::new(),
        }
    }

    /// Admit an arriving chunk, then perform one drain step
    ///
    /// The chunk always enters the queue first; when the sink is idle the
    /// oldest queued chunk (not necessarily the one just admitted) comes
    /// back out for submission.
    pub(crate) fn admit(&mut self, chunk: Bytes, sink_busy: bool) -> GateStep {
        self.queue.push_back(chunk);
        self.drain(sink_busy)
    }

    /// One drain step, driven by an append-complete signal
    ///
    /// Pops and returns the oldest chunk only when the sink is idle. One
    /// step per completion event; never a loop.
    pub(crate) fn drain(&mut self, sink_busy: bool) -> GateStep {
        if sink_busy {
            return GateStep::Idle;
        }
        match self.queue.pop_front() {
            Some(chunk) => GateStep::Submit(chunk),
            None => GateStep::Idle,
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.queue.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Discard all queued chunks, returning how many were dropped
    pub(crate) fn clear(&mut self) -> usize {
        let dropped = self.queue.len();
        self.queue.clear();
        dropped
    }
}
