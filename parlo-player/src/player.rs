//! Player actor
//!
//! One task owns the [`PlaybackController`] and multiplexes three inputs:
//! commands from [`PlayerHandle`]s, end-of-media notifications from the media
//! backend, and the progress sampler tick. Each input is handled to completion
//! before the next is looked at, so transitions never interleave.

use crate::db::settings;
use crate::error::{Error, Result};
use crate::media::MediaEvent;
use crate::playback::PlaybackController;
use crate::playlist::{PlaylistKey, PlaylistView};
use crate::state::{PlayerStatus, SharedState};
use sqlx::SqlitePool;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Commands accepted by the player task; each carries its reply channel
pub enum PlayerCommand {
    LoadPlaylist {
        key: PlaylistKey,
        text: String,
        reply: oneshot::Sender<Result<PlaylistView>>,
    },
    PlayAll {
        reply: oneshot::Sender<Result<()>>,
    },
    Resume {
        reply: oneshot::Sender<Result<()>>,
    },
    PlaySegment {
        index: usize,
        reply: oneshot::Sender<Result<()>>,
    },
    Pause {
        reply: oneshot::Sender<Result<()>>,
    },
    Stop {
        reply: oneshot::Sender<Result<()>>,
    },
    Seek {
        position_seconds: f64,
        reply: oneshot::Sender<Result<()>>,
    },
    SetVolume {
        volume: f32,
        reply: oneshot::Sender<Result<f32>>,
    },
    ToggleMute {
        reply: oneshot::Sender<Result<bool>>,
    },
    DescribePlaylist {
        reply: oneshot::Sender<Result<Option<PlaylistView>>>,
    },
    Status {
        reply: oneshot::Sender<Result<PlayerStatus>>,
    },
}

/// Cloneable client of the player task
#[derive(Clone)]
pub struct PlayerHandle {
    tx: mpsc::Sender<PlayerCommand>,
}

impl PlayerHandle {
    async fn request<T>(
        &self,
        make: impl FnOnce(oneshot::Sender<Result<T>>) -> PlayerCommand,
    ) -> Result<T> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(make(reply))
            .await
            .map_err(|_| Error::Internal("player task is not running".to_string()))?;
        rx.await
            .map_err(|_| Error::Internal("player task dropped the request".to_string()))?
    }

    pub async fn load_playlist(&self, key: PlaylistKey, text: String) -> Result<PlaylistView> {
        self.request(|reply| PlayerCommand::LoadPlaylist { key, text, reply })
            .await
    }

    pub async fn play_all(&self) -> Result<()> {
        self.request(|reply| PlayerCommand::PlayAll { reply }).await
    }

    pub async fn resume(&self) -> Result<()> {
        self.request(|reply| PlayerCommand::Resume { reply }).await
    }

    pub async fn play_segment(&self, index: usize) -> Result<()> {
        self.request(|reply| PlayerCommand::PlaySegment { index, reply })
            .await
    }

    pub async fn pause(&self) -> Result<()> {
        self.request(|reply| PlayerCommand::Pause { reply }).await
    }

    pub async fn stop(&self) -> Result<()> {
        self.request(|reply| PlayerCommand::Stop { reply }).await
    }

    pub async fn seek(&self, position_seconds: f64) -> Result<()> {
        self.request(|reply| PlayerCommand::Seek {
            position_seconds,
            reply,
        })
        .await
    }

    /// Returns the applied (clamped) volume
    pub async fn set_volume(&self, volume: f32) -> Result<f32> {
        self.request(|reply| PlayerCommand::SetVolume { volume, reply })
            .await
    }

    /// Returns the new mute flag
    pub async fn toggle_mute(&self) -> Result<bool> {
        self.request(|reply| PlayerCommand::ToggleMute { reply }).await
    }

    pub async fn playlist(&self) -> Result<Option<PlaylistView>> {
        self.request(|reply| PlayerCommand::DescribePlaylist { reply })
            .await
    }

    /// Status computed by the player task at the moment of the request
    pub async fn status(&self) -> Result<PlayerStatus> {
        self.request(|reply| PlayerCommand::Status { reply }).await
    }
}

/// Spawn the player task
///
/// When `db` is given, every user-initiated volume change is persisted.
pub fn spawn_player(
    controller: PlaybackController,
    media_events: mpsc::UnboundedReceiver<MediaEvent>,
    state: Arc<SharedState>,
    db: Option<SqlitePool>,
) -> (PlayerHandle, JoinHandle<()>) {
    let (tx, rx) = mpsc::channel(64);
    let task = tokio::spawn(run_player(controller, rx, media_events, state, db));
    (PlayerHandle { tx }, task)
}

async fn run_player(
    mut controller: PlaybackController,
    mut commands: mpsc::Receiver<PlayerCommand>,
    mut media_events: mpsc::UnboundedReceiver<MediaEvent>,
    state: Arc<SharedState>,
    db: Option<SqlitePool>,
) {
    info!("Player task started");
    publish_status(&controller, &state).await;

    loop {
        tokio::select! {
            command = commands.recv() => match command {
                Some(command) => {
                    handle_command(&mut controller, command, &state, db.as_ref()).await
                }
                None => {
                    info!("All player handles dropped, player task exiting");
                    break;
                }
            },
            Some(event) = media_events.recv() => {
                debug!("Media event: {:?}", event);
                controller.on_media_event(event);
            }
            _ = controller.next_sample(), if controller.is_sampling() => {
                controller.sample_progress();
            }
        }

        publish_status(&controller, &state).await;
    }

    controller.stop();
}

async fn handle_command(
    controller: &mut PlaybackController,
    command: PlayerCommand,
    state: &SharedState,
    db: Option<&SqlitePool>,
) {
    match command {
        PlayerCommand::LoadPlaylist { key, text, reply } => {
            let result = match controller.begin_load(key, &text) {
                Ok(playlist) => {
                    // Status readers see Loading for the whole preload
                    publish_status(controller, state).await;
                    controller.finish_load(playlist).await;
                    controller
                        .playlist()
                        .map(|p| p.view())
                        .ok_or_else(|| Error::Internal("playlist missing after load".to_string()))
                }
                Err(e) => Err(e),
            };
            if let Err(e) = &result {
                warn!("Playlist load failed: {}", e);
            }
            let _ = reply.send(result);
        }
        PlayerCommand::PlayAll { reply } => {
            let _ = reply.send(controller.play_all());
        }
        PlayerCommand::Resume { reply } => {
            let _ = reply.send(controller.resume());
        }
        PlayerCommand::PlaySegment { index, reply } => {
            let _ = reply.send(controller.play_segment(index));
        }
        PlayerCommand::Pause { reply } => {
            controller.pause();
            let _ = reply.send(Ok(()));
        }
        PlayerCommand::Stop { reply } => {
            controller.stop();
            let _ = reply.send(Ok(()));
        }
        PlayerCommand::Seek {
            position_seconds,
            reply,
        } => {
            let _ = reply.send(controller.seek(position_seconds));
        }
        PlayerCommand::SetVolume { volume, reply } => {
            let result = controller.set_volume(volume);
            if let (Ok(applied), Some(db)) = (&result, db) {
                if let Err(e) = settings::set_volume(db, *applied).await {
                    warn!("Failed to persist volume: {}", e);
                }
            }
            let _ = reply.send(result);
        }
        PlayerCommand::ToggleMute { reply } => {
            let _ = reply.send(Ok(controller.toggle_mute()));
        }
        PlayerCommand::DescribePlaylist { reply } => {
            let _ = reply.send(Ok(controller.playlist().map(|p| p.view())));
        }
        PlayerCommand::Status { reply } => {
            let _ = reply.send(Ok(status_of(controller)));
        }
    }
}

fn status_of(controller: &PlaybackController) -> PlayerStatus {
    let session = controller.session();
    PlayerStatus {
        state: controller.state(),
        progress: controller.progress(),
        highlighted: controller.highlighted(),
        volume: session.volume(),
        muted: session.is_muted(),
    }
}

async fn publish_status(controller: &PlaybackController, state: &SharedState) {
    state.set_status(status_of(controller)).await;
}
