//! Shared player state
//!
//! Read-mostly view of the player for HTTP handlers. Only the player actor
//! writes it, after every command, media event and sampler tick, so handlers
//! never wait on the actor to answer a status query.

use crate::playback::ProgressSnapshot;
use parlo_common::events::{EventBus, ParloEvent, PlayerState};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::{broadcast, RwLock};

/// Everything a status query returns
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PlayerStatus {
    pub state: PlayerState,
    #[serde(flatten)]
    pub progress: ProgressSnapshot,
    pub highlighted: Option<usize>,
    pub volume: f32,
    pub muted: bool,
}

impl Default for PlayerStatus {
    fn default() -> Self {
        Self {
            state: PlayerState::Idle,
            progress: ProgressSnapshot::zero(),
            highlighted: None,
            volume: 0.75,
            muted: false,
        }
    }
}

/// Shared state accessible by all components
pub struct SharedState {
    /// Latest status published by the player actor
    pub status: RwLock<PlayerStatus>,

    /// Event broadcaster for SSE events
    pub events: Arc<EventBus>,
}

impl SharedState {
    pub fn new(events: Arc<EventBus>) -> Self {
        Self {
            status: RwLock::new(PlayerStatus::default()),
            events,
        }
    }

    /// Subscribe to event stream for SSE
    pub fn subscribe_events(&self) -> broadcast::Receiver<ParloEvent> {
        self.events.subscribe()
    }

    pub async fn get_status(&self) -> PlayerStatus {
        *self.status.read().await
    }

    pub async fn set_status(&self, status: PlayerStatus) {
        *self.status.write().await = status;
    }
}

impl Default for SharedState {
    fn default() -> Self {
        Self::new(Arc::new(EventBus::new(256)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_default_status() {
        let state = SharedState::default();
        let status = state.get_status().await;
        assert_eq!(status.state, PlayerState::Idle);
        assert_eq!(status.progress, ProgressSnapshot::zero());
        assert_eq!(status.volume, 0.75);
    }

    #[tokio::test]
    async fn test_set_status() {
        let state = SharedState::default();
        let status = PlayerStatus {
            state: PlayerState::Paused,
            progress: ProgressSnapshot {
                current_time: 3.5,
                total_time: 9.0,
                current_index: 1,
                is_playing: false,
            },
            highlighted: Some(1),
            volume: 0.4,
            muted: false,
        };
        state.set_status(status).await;

        assert_eq!(state.get_status().await, status);
    }

    #[tokio::test]
    async fn test_broadcast_reaches_subscriber() {
        let state = SharedState::default();
        let mut rx = state.subscribe_events();
        state.events.emit_lossy(ParloEvent::HighlightCleared {
            timestamp: chrono::Utc::now(),
        });
        assert!(matches!(
            rx.recv().await.unwrap(),
            ParloEvent::HighlightCleared { .. }
        ));
    }

    #[test]
    fn test_status_serializes_flat_progress() {
        let json = serde_json::to_value(PlayerStatus::default()).unwrap();
        assert_eq!(json["state"], "idle");
        assert_eq!(json["current_time"], 0.0);
        assert_eq!(json["is_playing"], false);
    }
}
