//! Shared fixtures for parlo-player integration tests
//!
//! `ScriptedBackend` hands out in-memory handles whose transport state is
//! visible to the test through a `Monitor`. Nothing advances on its own: tests
//! move positions and deliver end-of-media explicitly.

#![allow(dead_code)]

use async_trait::async_trait;
use parlo_common::config::MediaConfig;
use parlo_common::events::{ContentKind, EventBus, ParloEvent};
use parlo_player::media::{
    HandleStatus, MediaBackend, MediaError, MediaEvent, MediaHandle, ResourceLocation,
};
use parlo_player::playback::{HighlightSink, PlaybackController, ResourceResolver};
use parlo_player::playlist::PlaylistKey;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{broadcast, Semaphore};

#[derive(Debug, Clone, Default)]
pub struct FakeState {
    pub opened: bool,
    pub duration: f64,
    pub position: f64,
    pub sounding: bool,
    pub ended: bool,
    pub volume: f32,
    pub plays: usize,
    pub reject_play: bool,
}

struct FakeHandle {
    segment: usize,
    states: Arc<Mutex<Vec<FakeState>>>,
}

impl FakeHandle {
    fn with<R>(&self, f: impl FnOnce(&mut FakeState) -> R) -> R {
        let mut states = self.states.lock().unwrap();
        f(&mut states[self.segment])
    }
}

impl MediaHandle for FakeHandle {
    fn duration_seconds(&self) -> Option<f64> {
        Some(self.with(|s| s.duration))
    }

    fn position_seconds(&self) -> f64 {
        self.with(|s| s.position)
    }

    fn status(&self) -> HandleStatus {
        self.with(|s| {
            if s.ended {
                HandleStatus::Ended
            } else if s.sounding {
                HandleStatus::Sounding
            } else if s.position > 0.0 {
                HandleStatus::Paused
            } else {
                HandleStatus::Idle
            }
        })
    }

    fn play(&mut self) -> Result<(), MediaError> {
        self.with(|s| {
            if s.reject_play {
                return Err(MediaError::PlayRejected("autoplay blocked".to_string()));
            }
            s.sounding = true;
            s.ended = false;
            s.plays += 1;
            Ok(())
        })
    }

    fn pause(&mut self) {
        self.with(|s| s.sounding = false)
    }

    fn seek(&mut self, offset_seconds: f64) {
        self.with(|s| {
            s.position = offset_seconds.clamp(0.0, s.duration);
            s.ended = false;
        })
    }

    fn set_volume(&mut self, volume: f32) {
        self.with(|s| s.volume = volume)
    }

    fn volume(&self) -> f32 {
        self.with(|s| s.volume)
    }
}

/// Backend whose outcomes are fixed up front
pub struct ScriptedBackend {
    states: Arc<Mutex<Vec<FakeState>>>,
    attempts: Arc<Mutex<Vec<String>>>,
    unavailable: HashSet<usize>,
    missing_paths: HashSet<String>,
    gate: Option<Arc<Semaphore>>,
}

impl ScriptedBackend {
    pub fn new(durations: &[f64]) -> Self {
        let states = durations
            .iter()
            .map(|d| FakeState {
                duration: *d,
                volume: 1.0,
                ..Default::default()
            })
            .collect();
        Self {
            states: Arc::new(Mutex::new(states)),
            attempts: Arc::new(Mutex::new(Vec::new())),
            unavailable: HashSet::new(),
            missing_paths: HashSet::new(),
            gate: None,
        }
    }

    /// Every candidate for `segment` fails
    pub fn failing(mut self, segment: usize) -> Self {
        self.unavailable.insert(segment);
        self
    }

    /// One specific candidate location fails
    pub fn missing(mut self, relative_path: &str) -> Self {
        self.missing_paths.insert(relative_path.to_string());
        self
    }

    /// The handle for `segment` loads but refuses to play
    pub fn rejecting(self, segment: usize) -> Self {
        self.states.lock().unwrap()[segment].reject_play = true;
        self
    }

    /// Every `open` waits until the test releases it through `Monitor::release`
    pub fn gated(mut self) -> Self {
        self.gate = Some(Arc::new(Semaphore::new(0)));
        self
    }

    pub fn monitor(&self) -> Monitor {
        Monitor {
            states: self.states.clone(),
            attempts: self.attempts.clone(),
            gate: self.gate.clone(),
        }
    }
}

#[async_trait]
impl MediaBackend for ScriptedBackend {
    async fn open(
        &self,
        location: &ResourceLocation,
        segment: usize,
    ) -> Result<Box<dyn MediaHandle>, MediaError> {
        if let Some(gate) = &self.gate {
            gate.acquire().await.unwrap().forget();
        }
        self.attempts
            .lock()
            .unwrap()
            .push(location.relative_path.clone());

        if self.unavailable.contains(&segment) || self.missing_paths.contains(&location.relative_path) {
            return Err(MediaError::NotFound(location.relative_path.clone()));
        }

        self.states.lock().unwrap()[segment].opened = true;
        Ok(Box::new(FakeHandle {
            segment,
            states: self.states.clone(),
        }))
    }
}

/// Test-side view of every handle the backend created
#[derive(Clone)]
pub struct Monitor {
    states: Arc<Mutex<Vec<FakeState>>>,
    attempts: Arc<Mutex<Vec<String>>>,
    gate: Option<Arc<Semaphore>>,
}

impl Monitor {
    /// Let `opens` more backend opens through a gated backend
    pub fn release(&self, opens: usize) {
        if let Some(gate) = &self.gate {
            gate.add_permits(opens);
        }
    }

    pub fn state(&self, segment: usize) -> FakeState {
        self.states.lock().unwrap()[segment].clone()
    }

    /// Segments whose handle currently reports sounding
    pub fn sounding(&self) -> Vec<usize> {
        self.states
            .lock()
            .unwrap()
            .iter()
            .enumerate()
            .filter(|(_, s)| s.sounding && !s.ended)
            .map(|(i, _)| i)
            .collect()
    }

    pub fn attempts(&self) -> Vec<String> {
        self.attempts.lock().unwrap().clone()
    }

    /// Move a handle's position forward as if time passed
    pub fn advance(&self, segment: usize, seconds: f64) {
        let mut states = self.states.lock().unwrap();
        let s = &mut states[segment];
        s.position = (s.position + seconds).min(s.duration);
    }

    /// Run a handle to its natural end and return the notification it posts
    pub fn finish(&self, segment: usize) -> MediaEvent {
        let mut states = self.states.lock().unwrap();
        let s = &mut states[segment];
        s.position = s.duration;
        s.ended = true;
        MediaEvent::Ended { segment }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum HighlightCall {
    UnmarkAll,
    Mark(usize, bool),
}

/// Highlight sink that records calls and tracks what is marked
#[derive(Clone, Default)]
pub struct RecordingSink {
    pub calls: Arc<Mutex<Vec<HighlightCall>>>,
    pub marked: Arc<Mutex<HashSet<usize>>>,
}

impl RecordingSink {
    pub fn marked(&self) -> Vec<usize> {
        let mut marked: Vec<usize> = self.marked.lock().unwrap().iter().copied().collect();
        marked.sort_unstable();
        marked
    }

    pub fn calls(&self) -> Vec<HighlightCall> {
        self.calls.lock().unwrap().clone()
    }
}

impl HighlightSink for RecordingSink {
    fn unmark_all(&mut self) {
        self.calls.lock().unwrap().push(HighlightCall::UnmarkAll);
        self.marked.lock().unwrap().clear();
    }

    fn mark(&mut self, index: usize, scroll_into_view: bool) {
        self.calls
            .lock()
            .unwrap()
            .push(HighlightCall::Mark(index, scroll_into_view));
        self.marked.lock().unwrap().insert(index);
    }
}

pub fn dialogue_key() -> PlaylistKey {
    PlaylistKey::new(ContentKind::Dialogue, "market", "es")
}

/// Playlist text with `n` speaker lines, each with an English translation
pub fn dialogue_text(n: usize) -> String {
    (0..n)
        .map(|i| {
            let speaker = if i % 2 == 0 { "Ana" } else { "Luis" };
            format!("{}: Frase número {}\n    en: Sentence number {}\n\n", speaker, i, i)
        })
        .collect()
}

pub struct Harness {
    pub controller: PlaybackController,
    pub monitor: Monitor,
    pub sink: RecordingSink,
    pub events: broadcast::Receiver<ParloEvent>,
}

impl Harness {
    /// Controller over `backend` with no playlist loaded yet
    pub fn new(backend: ScriptedBackend) -> Self {
        let monitor = backend.monitor();
        let bus = Arc::new(EventBus::new(1024));
        let events = bus.subscribe();
        let sink = RecordingSink::default();
        let resolver = ResourceResolver::new(Arc::new(backend), MediaConfig::default());
        let controller = PlaybackController::new(
            resolver,
            bus,
            Box::new(sink.clone()),
            Duration::from_millis(100),
        );
        Self {
            controller,
            monitor,
            sink,
            events,
        }
    }

    /// Controller with an `n`-segment dialogue loaded
    pub async fn loaded(backend: ScriptedBackend, n: usize) -> Self {
        let mut harness = Self::new(backend);
        harness
            .controller
            .load_playlist(dialogue_key(), &dialogue_text(n))
            .await
            .unwrap();
        harness
    }

    /// All events received so far
    pub fn drain_events(&mut self) -> Vec<ParloEvent> {
        let mut out = Vec::new();
        while let Ok(event) = self.events.try_recv() {
            out.push(event);
        }
        out
    }

    /// Deliver end-of-media for `segment`
    pub fn finish(&mut self, segment: usize) {
        let event = self.monitor.finish(segment);
        self.controller.on_media_event(event);
    }

    /// At most one handle sounding, and it is the one the session says
    pub fn assert_single_active(&self) {
        let sounding = self.monitor.sounding();
        assert!(sounding.len() <= 1, "more than one handle sounding: {:?}", sounding);
        if let Some(index) = sounding.first() {
            assert_eq!(self.controller.session().active_handle(), Some(*index));
        }
    }
}
