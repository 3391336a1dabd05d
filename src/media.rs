//! Collaborator interfaces for the media stack
//!
//! The decoding pipeline, append sink, and playback element are external
//! collaborators. They are modeled as capability traits injected through a
//! [`MediaBackend`], never reached through ambient globals, so a real media
//! engine and a test double are interchangeable.
//!
//! All trait methods are non-blocking requests or cheap live queries; results
//! of asynchronous work (append completion, stalls, play/pause transitions)
//! come back to the player as [`MediaEvent`]s on the channel handed out when
//! the pipeline is created. Implementations must not call back into the
//! player from inside a trait method.

use crate::error::Result;
use bytes::Bytes;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Events delivered by the media stack to the player core
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaEvent {
    /// One-shot: the decoding pipeline finished opening and accepts sinks
    SourceOpen,

    /// The append sink finished consuming the last submitted chunk
    AppendComplete,

    /// Playback caught up to the end of buffered data and is waiting
    Stalled,

    /// The playback element entered the playing state
    Playing,

    /// The playback element entered the paused state
    Paused,
}

/// Sender half handed to collaborators for event delivery
pub type MediaEventSender = mpsc::UnboundedSender<MediaEvent>;

/// Receiver half consumed by the player's event pump
pub type MediaEventReceiver = mpsc::UnboundedReceiver<MediaEvent>;

/// Session-level decoding pipeline
///
/// Owns at most one append sink and can be told that no more input is
/// coming. Created once per session by the [`MediaBackend`]; emits
/// [`MediaEvent::SourceOpen`] exactly once when ready.
pub trait MediaPipeline: Send + Sync {
    /// Open the append sink for the given MIME type
    ///
    /// Called once per session, after [`MediaEvent::SourceOpen`].
    fn open_sink(&self, mime_type: &str) -> Result<Arc<dyn AppendSink>>;

    /// Live readiness query: true while the pipeline accepts input
    fn is_ready(&self) -> bool;

    /// Signal that no more input is coming
    ///
    /// Fails if the pipeline is not ready or input has already ended.
    fn end_of_stream(&self) -> Result<()>;

    /// Detach the open sink from the pipeline
    fn remove_sink(&self);
}

/// The single append sink bound to a decoding pipeline
///
/// Accepts one chunk at a time; completion is reported asynchronously via
/// [`MediaEvent::AppendComplete`].
pub trait AppendSink: Send + Sync {
    /// Submit one chunk for decode/render
    ///
    /// Non-blocking: initiates the append and returns. Must not be called
    /// while [`busy`](Self::busy) is true; fails with
    /// [`Error::AppendRejected`](crate::error::Error::AppendRejected) if the
    /// sink cannot accept the chunk. A failed submit leaves the sink idle.
    fn submit(&self, chunk: Bytes) -> Result<()>;

    /// True while an append is in flight
    fn busy(&self) -> bool;

    /// Abort any in-flight append
    ///
    /// Tolerates being called with nothing in flight.
    fn abort(&self);
}

/// The playback element the decoded audio renders through
///
/// May be externally owned and mutated by caller code between player
/// operations, so [`paused`](Self::paused) is the live truth and is never
/// cached by the player.
pub trait PlaybackElement: Send + Sync {
    /// Request a transition to playing
    fn play(&self) -> Result<()>;

    /// Request a transition to paused
    fn pause(&self) -> Result<()>;

    /// Live paused query
    fn paused(&self) -> bool;

    /// Install the session's event wiring
    ///
    /// Playing/Paused/Stalled notifications for this session are delivered
    /// on `events`. Called once per session; a later call replaces the
    /// wiring of the previous session.
    fn bind_events(&self, events: MediaEventSender);
}

/// Factory for the media stack
///
/// The player creates one pipeline per session and receives that session's
/// events on the channel it supplies.
pub trait MediaBackend: Send + Sync {
    /// Create a playback element, used when the caller did not supply one
    fn create_element(&self) -> Arc<dyn PlaybackElement>;

    /// Create a decoding pipeline bound to `element`
    ///
    /// The pipeline must emit [`MediaEvent::SourceOpen`] on `events` once it
    /// is ready to open sinks.
    fn create_pipeline(
        &self,
        element: Arc<dyn PlaybackElement>,
        events: MediaEventSender,
    ) -> Arc<dyn MediaPipeline>;
}
