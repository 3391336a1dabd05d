//! Session state management

use serde::{Deserialize, Serialize};

/// Session state
///
/// One live session per player instance. After `Destroyed`, a new session
/// requires explicit re-initialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    /// No session yet; `init()` has never run
    Uninitialized,

    /// `init()` in progress, waiting for the pipeline's source-open signal
    Opening,

    /// Pipeline ready, append sink created, feedable
    Open,

    /// Torn down by `destroy()`; feeding fails until re-`init()`
    Destroyed,
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionState::Uninitialized => write!(f, "uninitialized"),
            SessionState::Opening => write!(f, "opening"),
            SessionState::Open => write!(f, "open"),
            SessionState::Destroyed => write!(f, "destroyed"),
        }
    }
}
