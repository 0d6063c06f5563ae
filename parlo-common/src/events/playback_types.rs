//! Playback-related type definitions
//!
//! Supporting types for player state and per-segment resource lifecycle.

use serde::{Deserialize, Serialize};

/// Player state machine
///
/// `Idle → Loading → Ready ⇄ PlayingSequential | PlayingSingle | Paused`.
/// A stop collapses back to `Ready` with the position reset.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PlayerState {
    /// No playlist loaded
    Idle,
    /// Playlist parsed, audio resources resolving
    Loading,
    /// Playlist ready, nothing sounding
    Ready,
    /// Playing and advancing through segments automatically
    PlayingSequential,
    /// Playing one segment only
    PlayingSingle,
    /// Paused mid-segment, position retained
    Paused,
}

impl PlayerState {
    pub fn is_playing(&self) -> bool {
        matches!(self, PlayerState::PlayingSequential | PlayerState::PlayingSingle)
    }
}

impl std::fmt::Display for PlayerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlayerState::Idle => write!(f, "idle"),
            PlayerState::Loading => write!(f, "loading"),
            PlayerState::Ready => write!(f, "ready"),
            PlayerState::PlayingSequential => write!(f, "playing_sequential"),
            PlayerState::PlayingSingle => write!(f, "playing_single"),
            PlayerState::Paused => write!(f, "paused"),
        }
    }
}

/// Load state of one segment's audio resource
///
/// `Failed` is terminal: a failed segment is never retried automatically.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub enum LoadState {
    Pending,
    Loaded,
    Failed,
}

impl LoadState {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, LoadState::Pending)
    }
}

impl std::fmt::Display for LoadState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LoadState::Pending => write!(f, "Pending"),
            LoadState::Loaded => write!(f, "Loaded"),
            LoadState::Failed => write!(f, "Failed"),
        }
    }
}

/// Content type of a playlist
///
/// Dialogues and stories share one engine; only the resource directory differs.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    Dialogue,
    Story,
}

impl ContentKind {
    /// Directory name used in resource locations
    pub fn dir_name(&self) -> &'static str {
        match self {
            ContentKind::Dialogue => "dialogues",
            ContentKind::Story => "stories",
        }
    }
}

impl std::fmt::Display for ContentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ContentKind::Dialogue => write!(f, "dialogue"),
            ContentKind::Story => write!(f, "story"),
        }
    }
}
