//! Test helpers for speech-player integration tests
//!
//! Provides a mock media stack (backend, pipeline, sink, element) that
//! records every submission and transition request so tests can verify
//! ordering and single-flight without a real decoder.

#![allow(dead_code)]

use bytes::Bytes;
use speech_player::error::{Error, Result};
use speech_player::media::{
    AppendSink, MediaBackend, MediaEvent, MediaEventSender, MediaPipeline, PlaybackElement,
};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, Once};

/// Install the test tracing subscriber once per process
///
/// Player traces surface in failing tests via `RUST_LOG`, e.g.
/// `RUST_LOG=speech_player=trace cargo test`.
pub fn init_tracing() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// Mock playback element
///
/// Transitions synchronously by default: a play/pause request flips the
/// paused flag and emits the matching event. With `defer_transitions`, a
/// request only records intent and the test applies it via
/// `complete_pending`, exercising the player's confirmation wait.
pub struct MockElement {
    paused: AtomicBool,
    deferred: AtomicBool,
    fail_transitions: AtomicBool,
    pending_play: AtomicBool,
    pending_pause: AtomicBool,
    events: Mutex<Option<MediaEventSender>>,
}

impl MockElement {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            paused: AtomicBool::new(true),
            deferred: AtomicBool::new(false),
            fail_transitions: AtomicBool::new(false),
            pending_play: AtomicBool::new(false),
            pending_pause: AtomicBool::new(false),
            events: Mutex::new(None),
        })
    }

    fn send(&self, event: MediaEvent) {
        if let Some(tx) = self.events.lock().unwrap().as_ref() {
            let _ = tx.send(event);
        }
    }

    /// Emit a stall (underrun) notification
    pub fn stall(&self) {
        self.send(MediaEvent::Stalled);
    }

    /// Make play/pause requests wait for `complete_pending`
    pub fn defer_transitions(&self) {
        self.deferred.store(true, Ordering::SeqCst);
    }

    /// Make play/pause requests fail
    pub fn fail_transitions(&self, fail: bool) {
        self.fail_transitions.store(fail, Ordering::SeqCst);
    }

    /// Apply a deferred transition request and emit its event
    pub fn complete_pending(&self) {
        if self.pending_play.swap(false, Ordering::SeqCst) {
            self.paused.store(false, Ordering::SeqCst);
            self.send(MediaEvent::Playing);
        }
        if self.pending_pause.swap(false, Ordering::SeqCst) {
            self.paused.store(true, Ordering::SeqCst);
            self.send(MediaEvent::Paused);
        }
    }

    /// Mutate play/pause state externally, without emitting events
    pub fn force_paused(&self, paused: bool) {
        self.paused.store(paused, Ordering::SeqCst);
    }

    /// Current paused flag
    pub fn is_paused(&self) -> bool {
        self.paused.load(Ordering::SeqCst)
    }
}

impl PlaybackElement for MockElement {
    fn play(&self) -> Result<()> {
        if self.fail_transitions.load(Ordering::SeqCst) {
            return Err(Error::Transition("injected element failure".into()));
        }
        if self.deferred.load(Ordering::SeqCst) {
            self.pending_play.store(true, Ordering::SeqCst);
            return Ok(());
        }
        if self.paused.swap(false, Ordering::SeqCst) {
            self.send(MediaEvent::Playing);
        }
        Ok(())
    }

    fn pause(&self) -> Result<()> {
        if self.fail_transitions.load(Ordering::SeqCst) {
            return Err(Error::Transition("injected element failure".into()));
        }
        if self.deferred.load(Ordering::SeqCst) {
            self.pending_pause.store(true, Ordering::SeqCst);
            return Ok(());
        }
        if !self.paused.swap(true, Ordering::SeqCst) {
            self.send(MediaEvent::Paused);
        }
        Ok(())
    }

    fn paused(&self) -> bool {
        self.paused.load(Ordering::SeqCst)
    }

    fn bind_events(&self, events: MediaEventSender) {
        *self.events.lock().unwrap() = Some(events);
    }
}

/// Mock append sink
///
/// `submit` marks the sink busy until the test calls `complete_append`,
/// which also emits the completion event. Submitting while busy is counted
/// as a single-flight violation.
pub struct MockSink {
    events: MediaEventSender,
    busy: AtomicBool,
    aborted: AtomicBool,
    reject_next: AtomicBool,
    violations: AtomicUsize,
    submitted: Mutex<Vec<Bytes>>,
}

impl MockSink {
    fn new(events: MediaEventSender) -> Arc<Self> {
        Arc::new(Self {
            events,
            busy: AtomicBool::new(false),
            aborted: AtomicBool::new(false),
            reject_next: AtomicBool::new(false),
            violations: AtomicUsize::new(0),
            submitted: Mutex::new(Vec::new()),
        })
    }

    /// Finish the in-flight append and emit the completion event
    pub fn complete_append(&self) {
        self.busy.store(false, Ordering::SeqCst);
        let _ = self.events.send(MediaEvent::AppendComplete);
    }

    /// Reject the next submission without becoming busy
    pub fn reject_next(&self) {
        self.reject_next.store(true, Ordering::SeqCst);
    }

    /// Every chunk submitted so far, in submission order
    pub fn submitted(&self) -> Vec<Bytes> {
        self.submitted.lock().unwrap().clone()
    }

    /// Sizes of submitted chunks, in submission order
    pub fn submitted_sizes(&self) -> Vec<usize> {
        self.submitted.lock().unwrap().iter().map(Bytes::len).collect()
    }

    /// How many times submit was called while an append was in flight
    pub fn single_flight_violations(&self) -> usize {
        self.violations.load(Ordering::SeqCst)
    }

    pub fn was_aborted(&self) -> bool {
        self.aborted.load(Ordering::SeqCst)
    }
}

impl AppendSink for MockSink {
    fn submit(&self, chunk: Bytes) -> Result<()> {
        if self.busy.load(Ordering::SeqCst) {
            self.violations.fetch_add(1, Ordering::SeqCst);
            return Err(Error::AppendRejected("append already in flight".into()));
        }
        if self.reject_next.swap(false, Ordering::SeqCst) {
            return Err(Error::AppendRejected("injected rejection".into()));
        }
        self.submitted.lock().unwrap().push(chunk);
        self.busy.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn busy(&self) -> bool {
        self.busy.load(Ordering::SeqCst)
    }

    fn abort(&self) {
        self.aborted.store(true, Ordering::SeqCst);
        self.busy.store(false, Ordering::SeqCst);
    }
}

/// Mock decoding pipeline
pub struct MockPipeline {
    events: MediaEventSender,
    ready: AtomicBool,
    ended: AtomicBool,
    detached: AtomicBool,
    eos_calls: AtomicUsize,
    sink: Mutex<Option<Arc<MockSink>>>,
}

impl MockPipeline {
    fn new(events: MediaEventSender) -> Arc<Self> {
        Arc::new(Self {
            events,
            ready: AtomicBool::new(false),
            ended: AtomicBool::new(false),
            detached: AtomicBool::new(false),
            eos_calls: AtomicUsize::new(0),
            sink: Mutex::new(None),
        })
    }

    /// Mark the source open and emit the one-shot ready signal
    pub fn announce_open(&self) {
        self.ready.store(true, Ordering::SeqCst);
        let _ = self.events.send(MediaEvent::SourceOpen);
    }

    /// Handle to the opened sink; panics if no sink was opened yet
    pub fn sink(&self) -> Arc<MockSink> {
        self.sink
            .lock()
            .unwrap()
            .clone()
            .expect("no sink opened on mock pipeline")
    }

    /// How many times end-of-stream was signaled
    pub fn end_of_stream_calls(&self) -> usize {
        self.eos_calls.load(Ordering::SeqCst)
    }

    pub fn sink_detached(&self) -> bool {
        self.detached.load(Ordering::SeqCst)
    }
}

impl MediaPipeline for MockPipeline {
    fn open_sink(&self, _mime_type: &str) -> Result<Arc<dyn AppendSink>> {
        let sink = MockSink::new(self.events.clone());
        *self.sink.lock().unwrap() = Some(Arc::clone(&sink));
        Ok(sink)
    }

    fn is_ready(&self) -> bool {
        self.ready.load(Ordering::SeqCst) && !self.ended.load(Ordering::SeqCst)
    }

    fn end_of_stream(&self) -> Result<()> {
        if !self.is_ready() {
            return Err(Error::Pipeline("pipeline not ready".into()));
        }
        self.ended.store(true, Ordering::SeqCst);
        self.eos_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn remove_sink(&self) {
        self.detached.store(true, Ordering::SeqCst);
    }
}

/// Mock media backend
///
/// Records every pipeline and element it creates. By default pipelines
/// announce source-open immediately; `manual_open` backends wait for the
/// test to call `announce_open`.
pub struct MockBackend {
    auto_open: bool,
    pipelines: Mutex<Vec<Arc<MockPipeline>>>,
    elements: Mutex<Vec<Arc<MockElement>>>,
}

impl MockBackend {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            auto_open: true,
            pipelines: Mutex::new(Vec::new()),
            elements: Mutex::new(Vec::new()),
        })
    }

    pub fn manual_open() -> Arc<Self> {
        Arc::new(Self {
            auto_open: false,
            pipelines: Mutex::new(Vec::new()),
            elements: Mutex::new(Vec::new()),
        })
    }

    /// Most recently created pipeline
    pub fn pipeline(&self) -> Arc<MockPipeline> {
        self.pipelines
            .lock()
            .unwrap()
            .last()
            .cloned()
            .expect("no pipeline created on mock backend")
    }

    /// Most recently created element
    pub fn element(&self) -> Arc<MockElement> {
        self.elements
            .lock()
            .unwrap()
            .last()
            .cloned()
            .expect("no element created on mock backend")
    }

    pub fn pipeline_count(&self) -> usize {
        self.pipelines.lock().unwrap().len()
    }

    pub fn elements_created(&self) -> usize {
        self.elements.lock().unwrap().len()
    }
}

impl MediaBackend for MockBackend {
    fn create_element(&self) -> Arc<dyn PlaybackElement> {
        let element = MockElement::new();
        self.elements.lock().unwrap().push(Arc::clone(&element));
        element
    }

    fn create_pipeline(
        &self,
        _element: Arc<dyn PlaybackElement>,
        events: MediaEventSender,
    ) -> Arc<dyn MediaPipeline> {
        let pipeline = MockPipeline::new(events);
        if self.auto_open {
            pipeline.announce_open();
        }
        self.pipelines.lock().unwrap().push(Arc::clone(&pipeline));
        pipeline
    }
}
