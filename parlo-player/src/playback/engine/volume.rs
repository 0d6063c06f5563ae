//! Volume and mute
//!
//! Changes are applied to every segment handle at once, not only the active
//! one, so a later segment never starts at a stale level.

use super::PlaybackController;
use crate::error::{Error, Result};
use parlo_common::events::ParloEvent;
use tracing::info;

impl PlaybackController {
    /// Set the volume (clamped to [0, 1]) and return the applied value
    ///
    /// A positive value also unmutes and becomes the level restored by the
    /// next unmute.
    pub fn set_volume(&mut self, volume: f32) -> Result<f32> {
        if !volume.is_finite() {
            return Err(Error::BadRequest(format!("volume must be a number, got {}", volume)));
        }
        let volume = volume.clamp(0.0, 1.0);
        let old_volume = self.session.volume;

        if volume > 0.0 {
            self.session.is_muted = false;
            self.session.last_volume_before_mute = volume;
        }
        self.session.volume = volume;
        info!("Volume {:.2} -> {:.2}", old_volume, volume);

        self.apply_volume();
        self.emit_volume_changed(old_volume);
        Ok(volume)
    }

    /// Flip mute; returns the new mute flag
    ///
    /// Unmuting restores exactly the level that was active when muting.
    pub fn toggle_mute(&mut self) -> bool {
        let old_volume = self.session.volume;

        if self.session.is_muted {
            self.session.volume = self.session.last_volume_before_mute;
            self.session.is_muted = false;
        } else {
            if self.session.volume > 0.0 {
                self.session.last_volume_before_mute = self.session.volume;
            }
            self.session.volume = 0.0;
            self.session.is_muted = true;
        }
        info!(
            "{} (volume {:.2})",
            if self.session.is_muted { "Muted" } else { "Unmuted" },
            self.session.volume
        );

        self.apply_volume();
        self.emit_volume_changed(old_volume);
        self.session.is_muted
    }

    fn apply_volume(&mut self) {
        let volume = self.session.volume;
        if let Some(playlist) = self.playlist.as_mut() {
            for resource in playlist.resources_mut() {
                if let Some(handle) = resource.handle_mut() {
                    handle.set_volume(volume);
                }
            }
        }
    }

    fn emit_volume_changed(&self, old_volume: f32) {
        self.events.emit_lossy(ParloEvent::VolumeChanged {
            old_volume,
            new_volume: self.session.volume,
            muted: self.session.is_muted,
            timestamp: chrono::Utc::now(),
        });
    }
}
