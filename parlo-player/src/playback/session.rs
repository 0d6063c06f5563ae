//! Mutable runtime state of one player
//!
//! Owned by the controller and replaced wholesale when a playlist loads.

use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlaybackSession {
    pub(crate) current_index: usize,
    pub(crate) is_sequential: bool,
    pub(crate) is_playing: bool,
    /// Segment whose handle is the one allowed to sound
    pub(crate) active_handle: Option<usize>,
    pub(crate) volume: f32,
    pub(crate) is_muted: bool,
    pub(crate) last_volume_before_mute: f32,
}

impl PlaybackSession {
    /// Fresh session carrying over a volume preference
    pub fn new(volume: f32) -> Self {
        let volume = volume.clamp(0.0, 1.0);
        Self {
            current_index: 0,
            is_sequential: false,
            is_playing: false,
            active_handle: None,
            volume,
            is_muted: false,
            last_volume_before_mute: if volume > 0.0 { volume } else { 1.0 },
        }
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn is_sequential(&self) -> bool {
        self.is_sequential
    }

    pub fn is_playing(&self) -> bool {
        self.is_playing
    }

    pub fn active_handle(&self) -> Option<usize> {
        self.active_handle
    }

    /// Effective volume applied to handles (0 while muted)
    pub fn volume(&self) -> f32 {
        self.volume
    }

    pub fn is_muted(&self) -> bool {
        self.is_muted
    }

    pub fn last_volume_before_mute(&self) -> f32 {
        self.last_volume_before_mute
    }
}

impl Default for PlaybackSession {
    fn default() -> Self {
        Self::new(1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_session_clamps_volume() {
        let session = PlaybackSession::new(1.7);
        assert_eq!(session.volume(), 1.0);
        assert_eq!(session.current_index(), 0);
        assert!(!session.is_playing());
        assert!(session.active_handle().is_none());
    }

    #[test]
    fn test_zero_volume_remembers_full_scale() {
        let session = PlaybackSession::new(0.0);
        assert_eq!(session.volume(), 0.0);
        assert_eq!(session.last_volume_before_mute(), 1.0);
    }
}
