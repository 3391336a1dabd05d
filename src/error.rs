//! Error types for speech-player
//!
//! Defines module-specific error types using thiserror for clear error propagation.

use thiserror::Error;

/// Main error type for speech-player
#[derive(Error, Debug)]
pub enum Error {
    /// Player has been destroyed; a new session requires `init()`
    #[error("player has been destroyed, call init() to start a new session")]
    Destroyed,

    /// Media source not open yet; `init()` has not completed
    #[error("media source not opened, await init() before feeding")]
    NotReady,

    /// The decoding pipeline rejected a submitted chunk
    #[error("append rejected: {0}")]
    AppendRejected(String),

    /// A play/pause transition attempt failed
    #[error("playback transition failed: {0}")]
    Transition(String),

    /// No playback element is bound to the player
    #[error("no playback element bound")]
    NoElement,

    /// Decoding pipeline errors
    #[error("media pipeline error: {0}")]
    Pipeline(String),
}

/// Convenience Result type using speech-player Error
pub type Result<T> = std::result::Result<T, Error>;
