//! Event types for the Parlo event system
//!
//! Provides shared event definitions and the EventBus used to fan player
//! events out to SSE clients and other observers.

mod playback_types;

pub use playback_types::{ContentKind, LoadState, PlayerState};

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Parlo event types
///
/// Events are broadcast via EventBus and serialized for SSE transmission.
/// All times are global playlist times in seconds.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ParloEvent {
    /// A playlist finished preloading and is ready to play
    PlaylistLoaded {
        kind: ContentKind,
        content_id: String,
        language: String,
        segment_count: usize,
        failed_count: usize,
        total_seconds: f64,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Incremental preload progress
    ///
    /// Emitted once per segment reaching a terminal load state.
    PreloadProgress {
        loaded_count: usize,
        total_count: usize,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// A segment exhausted its fallback chain or refused to start
    ///
    /// Informational only: the segment stays navigable, it is just silent.
    SegmentFailed {
        index: usize,
        reason: String,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Player state machine transition
    PlayerStateChanged {
        old_state: PlayerState,
        new_state: PlayerState,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// A segment's audio started sounding
    SegmentStarted {
        index: usize,
        offset_seconds: f64,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Mark this segment active (all others inactive)
    SegmentHighlighted {
        index: usize,
        /// Ask the view to bring the segment into the viewport
        scroll_into_view: bool,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// No segment is active
    HighlightCleared {
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Progress bar sample
    ///
    /// Emitted by the progress sampler while playing, and once on every
    /// transition that moves the displayed position.
    PlaybackProgress {
        current_index: usize,
        current_seconds: f64,
        total_seconds: f64,
        is_playing: bool,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Volume or mute changed
    VolumeChanged {
        old_volume: f32,
        new_volume: f32,
        muted: bool,
        timestamp: chrono::DateTime<chrono::Utc>,
    },
}

impl ParloEvent {
    /// Event name used for the SSE `event:` field
    pub fn event_type(&self) -> &'static str {
        match self {
            ParloEvent::PlaylistLoaded { .. } => "PlaylistLoaded",
            ParloEvent::PreloadProgress { .. } => "PreloadProgress",
            ParloEvent::SegmentFailed { .. } => "SegmentFailed",
            ParloEvent::PlayerStateChanged { .. } => "PlayerStateChanged",
            ParloEvent::SegmentStarted { .. } => "SegmentStarted",
            ParloEvent::SegmentHighlighted { .. } => "SegmentHighlighted",
            ParloEvent::HighlightCleared { .. } => "HighlightCleared",
            ParloEvent::PlaybackProgress { .. } => "PlaybackProgress",
            ParloEvent::VolumeChanged { .. } => "VolumeChanged",
        }
    }
}

/// One-to-many event broadcaster
///
/// Thin wrapper over `tokio::sync::broadcast`. Slow subscribers lag and lose
/// the oldest events rather than blocking the player.
pub struct EventBus {
    tx: broadcast::Sender<ParloEvent>,
    capacity: usize,
}

impl EventBus {
    /// Creates a new EventBus with specified channel capacity
    ///
    /// # Examples
    ///
    /// ```
    /// use parlo_common::events::EventBus;
    ///
    /// let event_bus = EventBus::new(256);
    /// assert_eq!(event_bus.capacity(), 256);
    /// ```
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx, capacity }
    }

    /// Subscribe to all future events
    pub fn subscribe(&self) -> broadcast::Receiver<ParloEvent> {
        self.tx.subscribe()
    }

    /// Emit an event to all subscribers
    ///
    /// Returns `Ok(subscriber_count)` if at least one subscriber exists.
    #[allow(clippy::result_large_err)]
    pub fn emit(
        &self,
        event: ParloEvent,
    ) -> Result<usize, broadcast::error::SendError<ParloEvent>> {
        self.tx.send(event)
    }

    /// Emit an event, ignoring if no subscribers are listening
    pub fn emit_lossy(&self, event: ParloEvent) {
        let _ = self.tx.send(event);
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
