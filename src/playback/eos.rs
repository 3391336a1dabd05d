//! End-of-stream quiescence bookkeeping
//!
//! Infers "no more chunks are coming" from a timed silence window: a stall
//! with an empty queue arms a countdown; if nothing supersedes it before it
//! fires, the stream is declared finished. Only one timer is ever live —
//! arming or cancelling bumps a generation counter, so an already-sleeping
//! task discovers at fire time that it was superseded and does nothing.
//!
//! The fire-time condition re-check itself lives in the player (it needs the
//! sink, pipeline, and queue); this type only tracks which arming is current
//! and whether end of stream was already declared this session.

/// Generation-counted quiescence timer state
#[derive(Debug, Default)]
pub(crate) struct QuiescenceTimer {
    generation: u64,
    declared: bool,
}

impl QuiescenceTimer {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Arm a new countdown, superseding any pending one
    ///
    /// Returns the generation token the timer task must present when firing.
    pub(crate) fn arm(&mut self) -> u64 {
        self.generation += 1;
        self.generation
    }

    /// Cancel any pending countdown without arming a new one
    pub(crate) fn cancel(&mut self) {
        self.generation += 1;
    }

    /// True if `token` belongs to the most recent arming
    pub(crate) fn is_current(&self, token: u64) -> bool {
        self.generation == token
    }

    /// Latch end-of-stream as declared for this session
    ///
    /// Returns false if it was already declared, enforcing exactly-once.
    pub(crate) fn declare(&mut self) -> bool {
        if self.declared {
            return false;
        }
        self.declared = true;
        true
    }

    /// Reset for a fresh session
    pub(crate) fn reset(&mut self) {
        self.generation += 1;
        self.declared = false;
    }
}
