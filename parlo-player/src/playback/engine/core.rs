//! Core controller - construction, loading and orchestration
//!
//! **Responsibilities:**
//! - PlaybackController struct definition
//! - Playlist loading (parse, preload, ready)
//! - The single state transition point, which also arms and disarms the
//!   progress sampler
//! - Progress publication and read accessors
//!
//! All methods take `&mut self` and run to completion. The only suspension
//! point is preload inside [`PlaybackController::load_playlist`].

use crate::error::{Error, Result};
use crate::media::MediaHandle;
use crate::playback::highlight::{HighlightSink, HighlightSynchronizer};
use crate::playback::progress::{ProgressSampler, ProgressSnapshot};
use crate::playback::resolver::ResourceResolver;
use crate::playback::session::PlaybackSession;
use crate::playlist::{self, Playlist, PlaylistKey};
use parlo_common::events::{EventBus, LoadState, ParloEvent, PlayerState};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

pub struct PlaybackController {
    pub(super) resolver: ResourceResolver,
    pub(super) events: Arc<EventBus>,
    pub(super) highlight: HighlightSynchronizer,
    pub(super) sampler: ProgressSampler,
    pub(super) playlist: Option<Playlist>,
    pub(super) session: PlaybackSession,
    pub(super) state: PlayerState,
}

impl PlaybackController {
    pub fn new(
        resolver: ResourceResolver,
        events: Arc<EventBus>,
        sink: Box<dyn HighlightSink>,
        progress_interval: Duration,
    ) -> Self {
        Self {
            resolver,
            events,
            highlight: HighlightSynchronizer::new(sink),
            sampler: ProgressSampler::new(progress_interval),
            playlist: None,
            session: PlaybackSession::default(),
            state: PlayerState::Idle,
        }
    }

    /// Start with a persisted volume preference
    pub fn with_volume(mut self, volume: f32) -> Self {
        self.session = PlaybackSession::new(volume);
        self
    }

    /// Parse `raw`, resolve every segment and become `Ready`
    ///
    /// A parse failure leaves the current playlist untouched. Segments that
    /// exhaust their fallback chain do not fail the load; they are reported
    /// with `SegmentFailed` and stay silent.
    pub async fn load_playlist(&mut self, key: PlaylistKey, raw: &str) -> Result<()> {
        let playlist = self.begin_load(key, raw)?;
        self.finish_load(playlist).await;
        Ok(())
    }

    /// First half of a load: parse, release the old playlist, enter `Loading`
    ///
    /// The returned playlist is not attached until
    /// [`PlaybackController::finish_load`] has preloaded it, so callers can
    /// publish the `Loading` state in between.
    pub fn begin_load(&mut self, key: PlaylistKey, raw: &str) -> Result<Playlist> {
        let segments = playlist::build(raw)?;
        info!("Loading playlist {} ({} segments)", key, segments.len());

        self.teardown();
        self.session = PlaybackSession::new(self.preferred_volume());
        self.transition(PlayerState::Loading);
        Ok(Playlist::new(key, segments))
    }

    /// Preload `playlist`, attach it and become `Ready`
    pub async fn finish_load(&mut self, mut playlist: Playlist) {
        let events = self.events.clone();
        self.resolver
            .preload(&mut playlist, |loaded_count, total_count| {
                events.emit_lossy(ParloEvent::PreloadProgress {
                    loaded_count,
                    total_count,
                    timestamp: chrono::Utc::now(),
                });
            })
            .await;

        let volume = self.session.volume;
        for resource in playlist.resources_mut() {
            if let Some(handle) = resource.handle_mut() {
                handle.set_volume(volume);
            }
        }

        for (index, resource) in playlist.resources().iter().enumerate() {
            if resource.load_state() == LoadState::Failed {
                let reason = match resource.failure() {
                    Some(failure) => failure.to_string(),
                    None => format!("no playable audio after {} attempts", resource.attempts()),
                };
                self.events.emit_lossy(ParloEvent::SegmentFailed {
                    index,
                    reason,
                    timestamp: chrono::Utc::now(),
                });
            }
        }

        let loaded = ParloEvent::PlaylistLoaded {
            kind: playlist.key().kind,
            content_id: playlist.key().content_id.clone(),
            language: playlist.key().language.clone(),
            segment_count: playlist.len(),
            failed_count: playlist.count_in(LoadState::Failed),
            total_seconds: playlist.total_duration_seconds(),
            timestamp: chrono::Utc::now(),
        };

        self.playlist = Some(playlist);
        self.transition(PlayerState::Ready);
        self.events.emit_lossy(loaded);
        self.publish_progress();
    }

    /// Silence and drop the current playlist
    fn teardown(&mut self) {
        if let Some(mut old) = self.playlist.take() {
            debug!("Releasing playlist {}", old.key());
            for resource in old.resources_mut() {
                if let Some(handle) = resource.handle_mut() {
                    handle.stop();
                }
            }
        }
        self.session.active_handle = None;
        self.session.is_playing = false;
        self.highlight.clear();
    }

    /// Move the state machine and keep the sampler in step with it
    pub(super) fn transition(&mut self, new_state: PlayerState) {
        if new_state.is_playing() {
            self.sampler.start();
        } else {
            self.sampler.stop();
        }

        let old_state = self.state;
        if old_state == new_state {
            return;
        }
        self.state = new_state;
        info!("Player state: {} -> {}", old_state, new_state);

        self.events.emit_lossy(ParloEvent::PlayerStateChanged {
            old_state,
            new_state,
            timestamp: chrono::Utc::now(),
        });
    }

    /// Playable states all require a loaded playlist
    pub(super) fn ensure_loaded(&self) -> Result<usize> {
        match (&self.playlist, self.state) {
            (Some(playlist), state) if state != PlayerState::Loading && state != PlayerState::Idle => {
                Ok(playlist.len())
            }
            _ => Err(Error::InvalidState(format!(
                "no playlist ready (state: {})",
                self.state
            ))),
        }
    }

    pub(super) fn handle_mut(&mut self, index: usize) -> Option<&mut (dyn MediaHandle + 'static)> {
        self.playlist
            .as_mut()
            .and_then(|p| p.resource_mut(index))
            .and_then(|r| r.handle_mut())
    }

    pub(super) fn is_failed(&self, index: usize) -> bool {
        self.playlist.as_ref().map_or(true, |p| p.is_failed(index))
    }

    /// Stop and rewind every handle except `keep`
    pub(super) fn silence_all_except(&mut self, keep: Option<usize>) {
        if let Some(playlist) = self.playlist.as_mut() {
            for (index, resource) in playlist.resources_mut().iter_mut().enumerate() {
                if Some(index) == keep {
                    continue;
                }
                if let Some(handle) = resource.handle_mut() {
                    handle.stop();
                }
            }
        }
        if self.session.active_handle != keep {
            self.session.active_handle = None;
        }
    }

    /// Volume to carry into a new session
    fn preferred_volume(&self) -> f32 {
        if self.session.is_muted {
            self.session.last_volume_before_mute
        } else {
            self.session.volume
        }
    }

    /// Emit the current position once, outside the sampler cadence
    pub(super) fn publish_progress(&self) {
        let snapshot = self.progress();
        self.events.emit_lossy(ParloEvent::PlaybackProgress {
            current_index: snapshot.current_index,
            current_seconds: snapshot.current_time,
            total_seconds: snapshot.total_time,
            is_playing: snapshot.is_playing,
            timestamp: chrono::Utc::now(),
        });
    }

    /// Sampler tick: publish progress if still playing
    pub fn sample_progress(&mut self) -> ProgressSnapshot {
        let snapshot = self.progress();
        if snapshot.is_playing {
            self.publish_progress();
        } else {
            warn!("Progress sampler ticked while not playing");
            self.sampler.stop();
        }
        snapshot
    }

    /// Wait for the next sampler tick; pends forever while not playing
    pub async fn next_sample(&mut self) {
        self.sampler.tick().await
    }

    pub fn is_sampling(&self) -> bool {
        self.sampler.is_active()
    }

    pub fn progress(&self) -> ProgressSnapshot {
        ProgressSampler::sample(self.playlist.as_ref(), &self.session)
    }

    pub fn state(&self) -> PlayerState {
        self.state
    }

    pub fn session(&self) -> &PlaybackSession {
        &self.session
    }

    pub fn playlist(&self) -> Option<&Playlist> {
        self.playlist.as_ref()
    }

    pub fn highlighted(&self) -> Option<usize> {
        self.highlight.active()
    }

    pub fn events(&self) -> &Arc<EventBus> {
        &self.events
    }
}
