//! HTTP request handlers
//!
//! Every control endpoint forwards to the player task and answers with the
//! player status as it stands right after the command.

use crate::api::server::AppContext;
use crate::error::Error;
use crate::playlist::{PlaylistKey, PlaylistView};
use crate::state::PlayerStatus;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use parlo_common::events::ContentKind;
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    status: String,
    module: String,
    version: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StatusResponse {
    pub status: String,
}

#[derive(Debug, Deserialize)]
pub struct LoadPlaylistRequest {
    kind: ContentKind,
    content_id: String,
    language: String,
    /// Inline playlist text; read from the playlist source when absent
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SeekRequest {
    position_seconds: f64,
}

#[derive(Debug, Deserialize)]
pub struct VolumeRequest {
    /// 0.0-1.0
    volume: f32,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct VolumeResponse {
    pub volume: f32,
    pub muted: bool,
}

type ApiError = (StatusCode, Json<StatusResponse>);
type ApiResult<T> = Result<Json<T>, ApiError>;

/// Map a crate error to an HTTP error response
fn api_error(e: Error) -> ApiError {
    let code = match &e {
        Error::PlaylistLoad(_) | Error::BadRequest(_) | Error::InvalidSegment { .. } => {
            StatusCode::BAD_REQUEST
        }
        Error::InvalidState(_) => StatusCode::CONFLICT,
        Error::Io(io) if io.kind() == std::io::ErrorKind::NotFound => StatusCode::NOT_FOUND,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    if code.is_server_error() {
        error!("Request failed: {}", e);
    } else {
        warn!("Request rejected: {}", e);
    }
    (
        code,
        Json(StatusResponse {
            status: format!("error: {}", e),
        }),
    )
}

/// Fetch the status once a command has been applied
async fn status_after(ctx: &AppContext, result: crate::Result<()>) -> ApiResult<PlayerStatus> {
    result.map_err(api_error)?;
    ctx.player.status().await.map(Json).map_err(api_error)
}

// ============================================================================
// Health Endpoint
// ============================================================================

/// GET /health - Health check endpoint
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        module: "parlo_player".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// ============================================================================
// Playlist Endpoints
// ============================================================================

/// POST /playlist/load - Parse, preload and ready a playlist
pub async fn load_playlist(
    State(ctx): State<AppContext>,
    Json(req): Json<LoadPlaylistRequest>,
) -> ApiResult<PlaylistView> {
    let key = PlaylistKey::new(req.kind, req.content_id, req.language);
    info!("Load playlist request: {}", key);

    let text = match req.text {
        Some(text) => text,
        None => ctx.source.fetch(&key).await.map_err(api_error)?,
    };

    ctx.player
        .load_playlist(key, text)
        .await
        .map(Json)
        .map_err(api_error)
}

/// GET /playlist - Segments with load state and durations
pub async fn get_playlist(State(ctx): State<AppContext>) -> ApiResult<PlaylistView> {
    match ctx.player.playlist().await.map_err(api_error)? {
        Some(view) => Ok(Json(view)),
        None => Err((
            StatusCode::NOT_FOUND,
            Json(StatusResponse {
                status: "error: no playlist loaded".to_string(),
            }),
        )),
    }
}

// ============================================================================
// Playback Control Endpoints
// ============================================================================

/// POST /playback/play - Play all from the current segment
pub async fn play_all(State(ctx): State<AppContext>) -> ApiResult<PlayerStatus> {
    let result = ctx.player.play_all().await;
    status_after(&ctx, result).await
}

/// POST /playback/resume - Continue after pause
pub async fn resume(State(ctx): State<AppContext>) -> ApiResult<PlayerStatus> {
    let result = ctx.player.resume().await;
    status_after(&ctx, result).await
}

/// POST /playback/pause
pub async fn pause(State(ctx): State<AppContext>) -> ApiResult<PlayerStatus> {
    let result = ctx.player.pause().await;
    status_after(&ctx, result).await
}

/// POST /playback/stop
pub async fn stop(State(ctx): State<AppContext>) -> ApiResult<PlayerStatus> {
    let result = ctx.player.stop().await;
    status_after(&ctx, result).await
}

/// POST /playback/segment/:index - Play one segment only
pub async fn play_segment(
    State(ctx): State<AppContext>,
    Path(index): Path<usize>,
) -> ApiResult<PlayerStatus> {
    let result = ctx.player.play_segment(index).await;
    status_after(&ctx, result).await
}

/// POST /playback/seek - Jump to a global time in seconds
pub async fn seek(
    State(ctx): State<AppContext>,
    Json(req): Json<SeekRequest>,
) -> ApiResult<PlayerStatus> {
    let result = ctx.player.seek(req.position_seconds).await;
    status_after(&ctx, result).await
}

/// GET /playback/progress - Latest published status
pub async fn get_progress(State(ctx): State<AppContext>) -> Json<PlayerStatus> {
    Json(ctx.state.get_status().await)
}

// ============================================================================
// Volume Endpoints
// ============================================================================

/// GET /audio/volume
pub async fn get_volume(State(ctx): State<AppContext>) -> Json<VolumeResponse> {
    let status = ctx.state.get_status().await;
    Json(VolumeResponse {
        volume: status.volume,
        muted: status.muted,
    })
}

/// POST /audio/volume - Set and persist the volume
pub async fn set_volume(
    State(ctx): State<AppContext>,
    Json(req): Json<VolumeRequest>,
) -> ApiResult<VolumeResponse> {
    let volume = ctx.player.set_volume(req.volume).await.map_err(api_error)?;
    let status = ctx.player.status().await.map_err(api_error)?;
    Ok(Json(VolumeResponse {
        volume,
        muted: status.muted,
    }))
}

/// POST /audio/mute - Toggle mute
pub async fn toggle_mute(State(ctx): State<AppContext>) -> ApiResult<VolumeResponse> {
    ctx.player.toggle_mute().await.map_err(api_error)?;
    let status = ctx.player.status().await.map_err(api_error)?;
    Ok(Json(VolumeResponse {
        volume: status.volume,
        muted: status.muted,
    }))
}
