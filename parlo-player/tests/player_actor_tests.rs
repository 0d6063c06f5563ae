//! Player task behaviour observed through the shared status

mod helpers;

use helpers::{dialogue_key, dialogue_text, Harness, ScriptedBackend};
use parlo_common::events::PlayerState;
use parlo_player::player::spawn_player;
use parlo_player::state::SharedState;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

#[tokio::test]
async fn test_status_reports_loading_during_preload() {
    let harness = Harness::new(ScriptedBackend::new(&[1.0, 2.0]).gated());
    let monitor = harness.monitor.clone();
    let state = Arc::new(SharedState::new(harness.controller.events().clone()));
    let (_media_tx, media_rx) = mpsc::unbounded_channel();
    let (player, _task) = spawn_player(harness.controller, media_rx, state.clone(), None);

    let loader = player.clone();
    let load = tokio::spawn(async move {
        loader
            .load_playlist(dialogue_key(), dialogue_text(2))
            .await
    });

    tokio::time::timeout(Duration::from_secs(5), async {
        while state.get_status().await.state != PlayerState::Loading {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("status never reported Loading");
    assert!(!load.is_finished());

    monitor.release(2);
    let view = load.await.unwrap().unwrap();
    assert_eq!(view.segments.len(), 2);

    let status = state.get_status().await;
    assert_eq!(status.state, PlayerState::Ready);
    assert_eq!(player.status().await.unwrap().state, PlayerState::Ready);
}
