//! Speech player facade
//!
//! Orchestrates the append gate, the quiescence detector, and the media
//! collaborators into one player: `init` opens a session against the
//! decoding pipeline, `feed` admits arriving chunks, and the per-session
//! event pump reacts to sink completions and element transitions.
//!
//! # Concurrency
//!
//! All core state lives behind one `std::sync::Mutex`, locked only for
//! non-awaiting critical sections. Enqueue, drain decision, and the sink
//! submission happen inside a single lock scope, which is what makes the
//! single-flight invariant hold without any further locking. User callbacks
//! and event-bus emission run after the lock is released.
//!
//! Every `init` and `destroy` bumps a session epoch; event pumps and timer
//! tasks from a superseded session compare epochs and exit.

use crate::error::{Error, Result};
use crate::events::{EventBus, PlayerEvent};
use crate::media::{
    AppendSink, MediaBackend, MediaEvent, MediaPipeline, PlaybackElement,
};
use crate::options::PlayerOptions;
use crate::playback::eos::QuiescenceTimer;
use crate::playback::gate::{AppendGate, GateStep};
use crate::playback::session::SessionState;
use bytes::Bytes;
use futures::{Stream, StreamExt};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, trace, warn};

/// Capacity of the public event bus
const EVENT_BUS_CAPACITY: usize = 64;

/// Streaming speech player
///
/// Cheap to clone; clones share one player instance.
#[derive(Clone)]
pub struct SpeechPlayer {
    shared: Arc<Shared>,
}

struct Shared {
    state: Mutex<Inner>,
    backend: Arc<dyn MediaBackend>,
    options: PlayerOptions,
    events: EventBus,
}

struct Inner {
    session: SessionState,
    /// Bumped on every init and destroy; stale pumps and timers exit
    epoch: u64,
    gate: AppendGate,
    quiescence: QuiescenceTimer,
    pipeline: Option<Arc<dyn MediaPipeline>>,
    sink: Option<Arc<dyn AppendSink>>,
    element: Option<Arc<dyn PlaybackElement>>,
    play_waiters: Vec<oneshot::Sender<bool>>,
    pause_waiters: Vec<oneshot::Sender<bool>>,
}

impl SpeechPlayer {
    /// Create a new player over the given media backend
    ///
    /// No session exists yet; call [`init`](Self::init) before feeding.
    pub fn new(backend: Arc<dyn MediaBackend>, options: PlayerOptions) -> Self {
        let element = options.element.clone();
        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(Inner {
                    session: SessionState::Uninitialized,
                    epoch: 0,
                    gate: AppendGate::new(),
                    quiescence: QuiescenceTimer::new(),
                    pipeline: None,
                    sink: None,
                    element,
                    play_waiters: Vec::new(),
                    pause_waiters: Vec::new(),
                }),
                backend,
                options,
                events: EventBus::new(EVENT_BUS_CAPACITY),
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.shared.state.lock().unwrap()
    }

    /// Open a new session
    ///
    /// Creates the decoding pipeline, binds the playback element, and
    /// suspends until the pipeline reports source-open; then creates the
    /// append sink and installs event wiring. Calling `init` again (including
    /// after [`destroy`](Self::destroy)) discards the prior session and
    /// returns the player to a feedable state.
    pub async fn init(&self) -> Result<()> {
        let (tx, mut rx) = mpsc::unbounded_channel();

        let (pipeline, element, epoch, stale_waiters) = {
            let mut inner = self.lock();
            inner.epoch += 1;
            inner.session = SessionState::Opening;
            inner.sink = None;
            inner.pipeline = None;
            let dropped = inner.gate.clear();
            if dropped > 0 {
                debug!(dropped, "discarded queued chunks from prior session");
            }
            inner.quiescence.reset();
            // A confirming play/pause from the superseded session will never
            // see its transition event; resolve it unconfirmed.
            let mut stale_waiters = std::mem::take(&mut inner.play_waiters);
            stale_waiters.append(&mut inner.pause_waiters);

            let element = match inner.element.clone() {
                Some(element) => element,
                None => {
                    let element = self.shared.backend.create_element();
                    inner.element = Some(Arc::clone(&element));
                    element
                }
            };
            let pipeline = self
                .shared
                .backend
                .create_pipeline(Arc::clone(&element), tx.clone());
            inner.pipeline = Some(Arc::clone(&pipeline));
            (pipeline, element, inner.epoch, stale_waiters)
        };
        for waiter in stale_waiters {
            let _ = waiter.send(false);
        }

        debug!(epoch, "waiting for pipeline source-open");
        loop {
            match rx.recv().await {
                Some(MediaEvent::SourceOpen) => break,
                Some(event) => trace!(?event, "ignoring event before source-open"),
                None => {
                    return Err(Error::Pipeline(
                        "pipeline closed before source-open".into(),
                    ))
                }
            }
        }

        let sink = pipeline.open_sink(self.shared.options.mime_type())?;
        element.bind_events(tx);

        {
            let mut inner = self.lock();
            if inner.epoch != epoch {
                // Superseded by a re-init or destroy while we awaited.
                return match inner.session {
                    SessionState::Destroyed => Err(Error::Destroyed),
                    _ => Err(Error::Pipeline("session superseded during init".into())),
                };
            }
            inner.sink = Some(sink);
            inner.session = SessionState::Open;
        }

        let player = self.clone();
        tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                if !player.handle_event(epoch, event) {
                    break;
                }
            }
            trace!(epoch, "event pump finished");
        });

        info!(
            mime_type = self.shared.options.mime_type(),
            epoch, "player session open"
        );
        Ok(())
    }

    /// Feed one chunk of audio payload
    ///
    /// Synchronous and non-blocking: the chunk is queued and, when the sink
    /// is idle, the oldest queued chunk is submitted before this returns.
    ///
    /// # Errors
    ///
    /// [`Error::Destroyed`] after [`destroy`](Self::destroy);
    /// [`Error::NotReady`] before [`init`](Self::init) has completed;
    /// [`Error::AppendRejected`] when the pipeline rejects the submission
    /// (the rejected chunk is dropped, later queued chunks are unaffected).
    pub fn feed(&self, chunk: impl Into<Bytes>) -> Result<()> {
        let chunk = chunk.into();
        let mut inner = self.lock();
        match inner.session {
            SessionState::Destroyed => return Err(Error::Destroyed),
            SessionState::Uninitialized | SessionState::Opening => {
                return Err(Error::NotReady)
            }
            SessionState::Open => {}
        }
        let sink = match inner.sink.clone() {
            Some(sink) => sink,
            None => return Err(Error::NotReady),
        };

        let size = chunk.len();
        match inner.gate.admit(chunk, sink.busy()) {
            GateStep::Submit(next) => {
                trace!(size, queued = inner.gate.len(), "chunk fed, submitting");
                sink.submit(next)?;
            }
            GateStep::Idle => {
                trace!(size, queued = inner.gate.len(), "chunk fed, sink busy");
            }
        }
        Ok(())
    }

    /// Feed every chunk of a byte stream, in stream order
    ///
    /// Stops cleanly at stream end without declaring end-of-stream; that
    /// inference is left to the quiescence detector.
    pub async fn feed_stream<S, B>(&self, mut stream: S) -> Result<()>
    where
        S: Stream<Item = B> + Unpin,
        B: Into<Bytes>,
    {
        while let Some(chunk) = stream.next().await {
            self.feed(chunk)?;
        }
        debug!("chunk stream drained");
        Ok(())
    }

    /// Request a transition to playing
    ///
    /// Resolves `true` once the playing transition is observed, `false` when
    /// the element was already playing or the session was torn down before
    /// the transition was seen.
    ///
    /// # Errors
    ///
    /// [`Error::NoElement`] when no playback element is bound (distinct from
    /// the already-playing case); [`Error::Transition`] when the element
    /// rejects the request.
    pub async fn play(&self) -> Result<bool> {
        let rx = {
            let mut inner = self.lock();
            let element = inner.element.clone().ok_or(Error::NoElement)?;
            if !element.paused() {
                return Ok(false);
            }
            let (tx, rx) = oneshot::channel();
            inner.play_waiters.push(tx);
            if let Err(e) = element.play() {
                inner.play_waiters.pop();
                return Err(e);
            }
            // Transition may complete before its event is delivered.
            if !element.paused() {
                inner.play_waiters.pop();
                return Ok(true);
            }
            rx
        };
        Ok(rx.await.unwrap_or(false))
    }

    /// Request a transition to paused
    ///
    /// Same contract as [`play`](Self::play), toward the paused state.
    pub async fn pause(&self) -> Result<bool> {
        let rx = {
            let mut inner = self.lock();
            let element = inner.element.clone().ok_or(Error::NoElement)?;
            if element.paused() {
                return Ok(false);
            }
            let (tx, rx) = oneshot::channel();
            inner.pause_waiters.push(tx);
            if let Err(e) = element.pause() {
                inner.pause_waiters.pop();
                return Err(e);
            }
            if element.paused() {
                inner.pause_waiters.pop();
                return Ok(true);
            }
            rx
        };
        Ok(rx.await.unwrap_or(false))
    }

    /// Live paused query
    ///
    /// True when no element is bound: nothing can be playing.
    pub fn paused(&self) -> bool {
        let inner = self.lock();
        inner.element.as_ref().map_or(true, |element| element.paused())
    }

    /// Live playing query
    pub fn playing(&self) -> bool {
        !self.paused()
    }

    /// Tear down the session
    ///
    /// Pauses the element if playing, detaches the sink, signals end of
    /// input to the pipeline, aborts any in-flight append, and clears the
    /// chunk queue. A second call is a no-op. Feeding requires
    /// [`init`](Self::init) afterwards.
    pub fn destroy(&self) {
        let waiters = {
            let mut inner = self.lock();
            if inner.session == SessionState::Destroyed {
                return;
            }
            if let Some(element) = &inner.element {
                if !element.paused() {
                    if let Err(e) = element.pause() {
                        warn!(error = %e, "pause during destroy failed");
                    }
                }
            }
            inner.session = SessionState::Destroyed;
            inner.epoch += 1;
            inner.quiescence.cancel();

            let sink = inner.sink.take();
            if let Some(pipeline) = inner.pipeline.take() {
                pipeline.remove_sink();
                if pipeline.is_ready() {
                    if let Err(e) = pipeline.end_of_stream() {
                        warn!(error = %e, "end-of-stream during destroy failed");
                    }
                }
            }
            if let Some(sink) = sink {
                sink.abort();
            }
            let dropped = inner.gate.clear();
            if dropped > 0 {
                debug!(dropped, "discarded queued chunks on destroy");
            }

            let mut waiters = std::mem::take(&mut inner.play_waiters);
            waiters.append(&mut inner.pause_waiters);
            waiters
        };
        for waiter in waiters {
            let _ = waiter.send(false);
        }
        info!("player destroyed");
    }

    /// Current session state
    pub fn session_state(&self) -> SessionState {
        self.lock().session
    }

    /// Number of chunks waiting in the queue (not yet handed to the sink)
    pub fn queued_chunks(&self) -> usize {
        self.lock().gate.len()
    }

    /// Subscribe to [`PlayerEvent`] broadcasts
    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<PlayerEvent> {
        self.shared.events.subscribe()
    }

    /// React to one media event; returns false when the pump should exit
    fn handle_event(&self, epoch: u64, event: MediaEvent) -> bool {
        match event {
            MediaEvent::AppendComplete => self.on_append_complete(epoch),
            MediaEvent::Stalled => self.on_stalled(epoch),
            MediaEvent::Playing => self.on_transition(epoch, PlayerEvent::Playing),
            MediaEvent::Paused => self.on_transition(epoch, PlayerEvent::Paused),
            MediaEvent::SourceOpen => {
                trace!("ignoring source-open after session established");
                true
            }
        }
    }

    /// One drain step plus resume-on-data, driven by append completion
    fn on_append_complete(&self, epoch: u64) -> bool {
        let mut inner = self.lock();
        if inner.epoch != epoch {
            return false;
        }
        // Data just landed in the buffer; a pending quiescence countdown is
        // no longer meaningful.
        inner.quiescence.cancel();

        if let Some(element) = inner.element.clone() {
            if element.paused() {
                debug!("buffer gained data while paused, resuming playback");
                if let Err(e) = element.play() {
                    warn!(error = %e, "resume-on-data play request failed");
                }
            }
        }

        if let Some(sink) = inner.sink.clone() {
            // One successful submission per completion event. A rejected
            // chunk produces no further completion, so on rejection keep
            // popping until a submit succeeds or the queue empties; stopping
            // there would strand everything behind the rejected chunk.
            while let GateStep::Submit(chunk) = inner.gate.drain(sink.busy()) {
                let size = chunk.len();
                match sink.submit(chunk) {
                    Ok(()) => {
                        trace!(size, queued = inner.gate.len(), "draining next chunk");
                        break;
                    }
                    Err(e) => {
                        warn!(error = %e, size, "queued chunk rejected by sink, dropping it");
                    }
                }
            }
        }
        true
    }

    /// Arm (or re-arm) the quiescence countdown on a stall
    fn on_stalled(&self, epoch: u64) -> bool {
        let token = {
            let mut inner = self.lock();
            if inner.epoch != epoch {
                return false;
            }
            inner.quiescence.arm()
        };
        let delay = self.shared.options.end_of_stream_delay();
        trace!(token, ?delay, "stall observed, quiescence countdown armed");

        let player = self.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            player.fire_quiescence(epoch, token);
        });
        true
    }

    /// Timer expiry: atomically re-check quiescence and declare end of stream
    fn fire_quiescence(&self, epoch: u64, token: u64) {
        {
            let mut inner = self.lock();
            if inner.epoch != epoch || !inner.quiescence.is_current(token) {
                return;
            }
            if inner.session != SessionState::Open {
                return;
            }
            let (sink, pipeline) = match (inner.sink.clone(), inner.pipeline.clone()) {
                (Some(sink), Some(pipeline)) => (sink, pipeline),
                _ => return,
            };
            if sink.busy() || !pipeline.is_ready() || !inner.gate.is_empty() {
                // Not quiescent after all; a later stall will re-arm.
                trace!(token, "quiescence window elapsed but conditions changed");
                return;
            }
            if !inner.quiescence.declare() {
                return;
            }
            info!("stream quiescent, signaling end of input");
            if let Err(e) = pipeline.end_of_stream() {
                warn!(error = %e, "end-of-stream signal failed");
            }
        }

        self.shared.events.emit_lossy(PlayerEvent::ChunkEnd);
        if let Some(cb) = &self.shared.options.on_chunk_end {
            cb();
        }
    }

    /// Playing/Paused observed: resolve waiters, notify
    fn on_transition(&self, epoch: u64, event: PlayerEvent) -> bool {
        let waiters = {
            let mut inner = self.lock();
            if inner.epoch != epoch {
                return false;
            }
            match event {
                PlayerEvent::Playing => std::mem::take(&mut inner.play_waiters),
                PlayerEvent::Paused => std::mem::take(&mut inner.pause_waiters),
                PlayerEvent::ChunkEnd => Vec::new(),
            }
        };
        for waiter in waiters {
            let _ = waiter.send(true);
        }

        self.shared.events.emit_lossy(event);
        let callback = match event {
            PlayerEvent::Playing => self.shared.options.on_playing.as_ref(),
            PlayerEvent::Paused => self.shared.options.on_pause.as_ref(),
            PlayerEvent::ChunkEnd => None,
        };
        if let Some(cb) = callback {
            cb();
        }
        true
    }
}

impl std::fmt::Debug for SpeechPlayer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.lock();
        f.debug_struct("SpeechPlayer")
            .field("session", &inner.session)
            .field("epoch", &inner.epoch)
            .field("queued_chunks", &inner.gate.len())
            .finish()
    }
}
