//! HTTP server setup and routing

use crate::error::{Error, Result};
use crate::player::PlayerHandle;
use crate::playlist::PlaylistSource;
use crate::state::SharedState;
use axum::{
    routing::{get, post},
    Router,
};
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

/// Shared application context passed to all handlers
#[derive(Clone)]
pub struct AppContext {
    pub state: Arc<SharedState>,
    pub player: PlayerHandle,
    /// Where playlist text comes from when a load request carries none
    pub source: Arc<dyn PlaylistSource>,
}

/// Build the router with all routes and layers
pub fn create_router(ctx: AppContext) -> Router {
    Router::new()
        .route("/health", get(super::handlers::health))
        // Playlist
        .route("/playlist/load", post(super::handlers::load_playlist))
        .route("/playlist", get(super::handlers::get_playlist))
        // Transport
        .route("/playback/play", post(super::handlers::play_all))
        .route("/playback/resume", post(super::handlers::resume))
        .route("/playback/pause", post(super::handlers::pause))
        .route("/playback/stop", post(super::handlers::stop))
        .route("/playback/segment/:index", post(super::handlers::play_segment))
        .route("/playback/seek", post(super::handlers::seek))
        .route("/playback/progress", get(super::handlers::get_progress))
        // Volume
        .route("/audio/volume", get(super::handlers::get_volume))
        .route("/audio/volume", post(super::handlers::set_volume))
        .route("/audio/mute", post(super::handlers::toggle_mute))
        // SSE event stream
        .route("/events", get(super::sse::event_stream))
        .with_state(ctx)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// Serve the API until `shutdown` resolves
pub async fn run(
    port: u16,
    ctx: AppContext,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<()> {
    let app = create_router(ctx);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!("Starting HTTP server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| Error::Http(format!("Failed to bind to {}: {}", addr, e)))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| Error::Http(format!("Server error: {}", e)))?;

    Ok(())
}
