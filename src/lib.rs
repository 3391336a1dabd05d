//! # speech-player
//!
//! Incremental playback of streamed speech audio (for example text-to-speech
//! delivered progressively over a network response): arriving binary chunks
//! are fed into a buffered media pipeline before the whole payload exists,
//! and playback stays continuous across chunk boundaries.
//!
//! **Core:** an append gate that keeps at most one append in flight against
//! the decoding pipeline while draining queued chunks strictly in arrival
//! order, plus a quiescence detector that infers end of stream from a timed
//! silence window instead of an explicit "done" marker.
//!
//! **Architecture:** the media stack (decoding pipeline, append sink,
//! playback element) is an injected collaborator behind the traits in
//! [`media`]; the player itself never decodes, validates, or transcodes
//! audio and holds no persistent state.

pub mod error;
pub mod events;
pub mod media;
pub mod options;
pub mod playback;

pub use error::{Error, Result};
pub use events::{EventBus, PlayerEvent};
pub use options::PlayerOptions;
pub use playback::{SessionState, SpeechPlayer};
