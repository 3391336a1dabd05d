//! Player configuration
//!
//! Options are an immutable snapshot captured at construction and never
//! mutated afterwards.

use crate::media::PlaybackElement;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Default MIME type hint for the decoding pipeline
pub const DEFAULT_MIME_TYPE: &str = "audio/mpeg";

/// Default quiescence window before end-of-stream is inferred
///
/// Trades detection latency against premature termination when chunks are
/// merely slow to arrive. Not derived from network conditions.
pub const DEFAULT_END_OF_STREAM_DELAY: Duration = Duration::from_millis(500);

/// Lifecycle callback type
pub type Callback = Arc<dyn Fn() + Send + Sync>;

/// Construction-time player options
#[derive(Clone, Default)]
pub struct PlayerOptions {
    /// Content-type hint for the decoding pipeline (default `audio/mpeg`)
    pub mime_type: Option<String>,

    /// Quiescence window for end-of-stream inference (default 500ms)
    pub end_of_stream_delay: Option<Duration>,

    /// Invoked when the playback element enters the playing state
    pub on_playing: Option<Callback>,

    /// Invoked when the playback element enters the paused state
    pub on_pause: Option<Callback>,

    /// Invoked exactly once per session when end of stream is inferred
    pub on_chunk_end: Option<Callback>,

    /// Externally owned playback element; the player creates its own via the
    /// backend when not supplied
    pub element: Option<Arc<dyn PlaybackElement>>,
}

impl PlayerOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = Some(mime_type.into());
        self
    }

    pub fn with_end_of_stream_delay(mut self, delay: Duration) -> Self {
        self.end_of_stream_delay = Some(delay);
        self
    }

    pub fn with_on_playing(mut self, f: impl Fn() + Send + Sync + 'static) -> Self {
        self.on_playing = Some(Arc::new(f));
        self
    }

    pub fn with_on_pause(mut self, f: impl Fn() + Send + Sync + 'static) -> Self {
        self.on_pause = Some(Arc::new(f));
        self
    }

    pub fn with_on_chunk_end(mut self, f: impl Fn() + Send + Sync + 'static) -> Self {
        self.on_chunk_end = Some(Arc::new(f));
        self
    }

    pub fn with_element(mut self, element: Arc<dyn PlaybackElement>) -> Self {
        self.element = Some(element);
        self
    }

    /// Resolved MIME type
    pub fn mime_type(&self) -> &str {
        self.mime_type.as_deref().unwrap_or(DEFAULT_MIME_TYPE)
    }

    /// Resolved quiescence window
    pub fn end_of_stream_delay(&self) -> Duration {
        self.end_of_stream_delay
            .unwrap_or(DEFAULT_END_OF_STREAM_DELAY)
    }
}

impl fmt::Debug for PlayerOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlayerOptions")
            .field("mime_type", &self.mime_type())
            .field("end_of_stream_delay", &self.end_of_stream_delay())
            .field("on_playing", &self.on_playing.is_some())
            .field("on_pause", &self.on_pause.is_some())
            .field("on_chunk_end", &self.on_chunk_end.is_some())
            .field("element", &self.element.is_some())
            .finish()
    }
}
