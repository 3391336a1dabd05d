//! Playback core: append gate, end-of-stream detection, session lifecycle

pub(crate) mod eos;
pub(crate) mod gate;
pub mod player;
pub mod session;

pub use player::SpeechPlayer;
pub use session::SessionState;
