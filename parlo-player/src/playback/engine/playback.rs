//! Transport operations for PlaybackController
//!
//! **Responsibilities:**
//! - play all, play one segment, pause, resume, stop, seek
//! - Sequential advance on end-of-media
//! - Keeping at most one handle sounding
//!
//! Every path that starts a handle first stops and rewinds all others.
//! End-of-media notifications are re-validated against the live session before
//! they are acted on, so a notification from a handle that has since been
//! stopped, replaced or rewound is dropped.

use super::PlaybackController;
use crate::error::{Error, Result};
use crate::media::{HandleStatus, MediaEvent};
use parlo_common::events::{ParloEvent, PlayerState};
use tracing::{debug, info, trace, warn};

impl PlaybackController {
    /// Play from `current_index` and keep advancing
    ///
    /// From `Paused` this continues the paused segment; from `PlayingSingle`
    /// it only switches the mode so the current segment's end advances.
    pub fn play_all(&mut self) -> Result<()> {
        self.ensure_loaded()?;
        info!("Play all from segment {}", self.session.current_index);

        match self.state {
            PlayerState::PlayingSequential => Ok(()),
            PlayerState::PlayingSingle => {
                self.session.is_sequential = true;
                self.transition(PlayerState::PlayingSequential);
                Ok(())
            }
            _ => {
                let from = self.session.current_index;
                self.run_sequence(from, None);
                Ok(())
            }
        }
    }

    /// Continue after a pause in whichever mode was active
    pub fn resume(&mut self) -> Result<()> {
        self.ensure_loaded()?;
        match self.state {
            PlayerState::Paused => {}
            state if state.is_playing() => return Ok(()),
            state => {
                return Err(Error::InvalidState(format!("nothing to resume (state: {})", state)))
            }
        }

        let index = self.session.current_index;
        info!(
            "Resume segment {} ({})",
            index,
            if self.session.is_sequential { "sequential" } else { "single" }
        );

        if self.session.is_sequential {
            self.run_sequence(index, None);
        } else if !self.is_failed(index) && self.start_segment(index, None) {
            self.session.is_playing = true;
            self.transition(PlayerState::PlayingSingle);
            self.publish_progress();
        } else {
            self.finish_single(index);
        }
        Ok(())
    }

    /// Play only segment `index`, from its start
    ///
    /// Cancels sequential mode. A failed segment still becomes current and
    /// highlighted; it just makes no sound.
    pub fn play_segment(&mut self, index: usize) -> Result<()> {
        let len = self.ensure_loaded()?;
        if index >= len {
            return Err(Error::InvalidSegment { index, len });
        }
        info!("Play segment {}", index);

        self.silence_all_except(None);
        self.session.is_sequential = false;
        self.session.current_index = index;
        self.highlight.show(index);

        if self.is_failed(index) {
            debug!("Segment {} has no audio, nothing to play", index);
            self.finish_single(index);
            return Ok(());
        }

        if self.start_segment(index, Some(0.0)) {
            self.session.is_playing = true;
            self.transition(PlayerState::PlayingSingle);
            self.publish_progress();
        } else {
            self.finish_single(index);
        }
        Ok(())
    }

    /// Stop sounding but keep position and mode
    pub fn pause(&mut self) {
        if !self.session.is_playing {
            trace!("Pause ignored, not playing");
            return;
        }
        info!("Pause at segment {}", self.session.current_index);

        if let Some(active) = self.session.active_handle.take() {
            if let Some(handle) = self.handle_mut(active) {
                handle.pause();
            }
        }
        self.session.is_playing = false;
        self.transition(PlayerState::Paused);
        self.publish_progress();
    }

    /// Rewind everything to the start of the playlist
    ///
    /// Idempotent.
    pub fn stop(&mut self) {
        debug!("Stop");
        self.silence_all_except(None);
        self.session.current_index = 0;
        self.session.is_playing = false;
        self.session.is_sequential = false;
        self.highlight.clear();
        if self.playlist.is_some() {
            self.transition(PlayerState::Ready);
        }
        self.publish_progress();
    }

    /// Jump to a global time
    ///
    /// While playing, playback continues at the new position in the current
    /// mode. Otherwise only the index, highlight and retained position move.
    pub fn seek(&mut self, target_seconds: f64) -> Result<()> {
        self.ensure_loaded()?;
        let Some(playlist) = self.playlist.as_ref() else {
            return Ok(());
        };
        let total = playlist.total_duration_seconds();
        let target = if target_seconds.is_nan() {
            0.0
        } else {
            target_seconds.clamp(0.0, total)
        };
        let location = playlist.ledger().locate(target);
        info!(
            "Seek to {:.3}s -> segment {} + {:.3}s",
            target, location.index, location.offset_seconds
        );

        let was_playing = self.session.is_playing;
        self.silence_all_except(None);
        self.session.current_index = location.index;
        self.highlight.show(location.index);

        if !was_playing {
            if let Some(handle) = self.handle_mut(location.index) {
                handle.seek(location.offset_seconds);
            }
            self.publish_progress();
            return Ok(());
        }

        if self.session.is_sequential {
            self.run_sequence(location.index, Some(location.offset_seconds));
        } else if !self.is_failed(location.index)
            && self.start_segment(location.index, Some(location.offset_seconds))
        {
            self.publish_progress();
        } else {
            self.finish_single(location.index);
        }
        Ok(())
    }

    /// Route a backend notification
    pub fn on_media_event(&mut self, event: MediaEvent) {
        match event {
            MediaEvent::Ended { segment } => self.on_segment_ended(segment),
        }
    }

    fn on_segment_ended(&mut self, segment: usize) {
        let ended = self
            .playlist
            .as_ref()
            .and_then(|p| p.resource(segment))
            .map_or(false, |r| r.status() == HandleStatus::Ended);
        let current = self.session.is_playing
            && self.session.current_index == segment
            && self.session.active_handle == Some(segment)
            && ended;

        if !current {
            trace!("Ignoring stale end-of-media for segment {}", segment);
            return;
        }
        debug!("Segment {} reached end of media", segment);

        if self.session.is_sequential {
            if let Some(handle) = self.handle_mut(segment) {
                handle.stop();
            }
            self.session.active_handle = None;
            self.run_sequence(segment + 1, Some(0.0));
        } else {
            self.finish_single(segment);
        }
    }

    /// Start the first playable segment at or after `from` in sequential mode
    ///
    /// `first_offset` applies to `from` only (`None` keeps its retained
    /// position); later segments start at 0. Failed segments are skipped
    /// without being highlighted. Running off the end stops the player.
    fn run_sequence(&mut self, from: usize, first_offset: Option<f64>) {
        let len = self.playlist.as_ref().map_or(0, |p| p.len());
        self.session.is_sequential = true;

        let mut offset = first_offset;
        for index in from..len {
            if self.is_failed(index) {
                debug!("Skipping failed segment {}", index);
                offset = Some(0.0);
                continue;
            }

            self.silence_all_except(Some(index));
            self.session.current_index = index;
            self.highlight.show(index);

            if self.start_segment(index, offset) {
                self.session.is_playing = true;
                self.transition(PlayerState::PlayingSequential);
                self.publish_progress();
                return;
            }
            offset = Some(0.0);
        }

        info!("Sequential playback reached end of playlist");
        self.stop();
    }

    /// Issue `play()` on one handle
    ///
    /// `offset` of `None` continues from the handle's retained position.
    /// Returns false when the segment has no handle or the backend refuses to
    /// start; the rejection is logged and reported, never propagated.
    fn start_segment(&mut self, index: usize, offset: Option<f64>) -> bool {
        let volume = self.session.volume;
        let Some(handle) = self
            .playlist
            .as_mut()
            .and_then(|p| p.resource_mut(index))
            .and_then(|r| r.handle_mut())
        else {
            return false;
        };

        handle.set_volume(volume);
        if let Some(offset) = offset {
            handle.seek(offset);
        }

        match handle.play() {
            Ok(()) => {
                let offset_seconds = handle.position_seconds();
                self.session.active_handle = Some(index);
                self.events.emit_lossy(ParloEvent::SegmentStarted {
                    index,
                    offset_seconds,
                    timestamp: chrono::Utc::now(),
                });
                true
            }
            Err(source) => {
                handle.stop();
                let error = Error::PlaybackStart { index, source };
                warn!("{}", error);
                self.events.emit_lossy(ParloEvent::SegmentFailed {
                    index,
                    reason: error.to_string(),
                    timestamp: chrono::Utc::now(),
                });
                false
            }
        }
    }

    /// End single-segment playback, keeping index and highlight
    fn finish_single(&mut self, index: usize) {
        if let Some(handle) = self.handle_mut(index) {
            handle.stop();
        }
        self.session.active_handle = None;
        self.session.is_playing = false;
        self.transition(PlayerState::Ready);
        self.publish_progress();
    }
}
