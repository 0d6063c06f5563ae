//! Parlo player (parlo-player) - Main entry point
//!
//! Serves the segment playback engine over HTTP with an SSE event stream.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use parlo_common::config::{config_file_path, TomlConfig, CONFIG_FILE_ENV, ROOT_FOLDER_ENV};
use parlo_common::events::EventBus;
use parlo_player::api::{self, AppContext};
use parlo_player::config::Config;
use parlo_player::db;
use parlo_player::media::FileMediaBackend;
use parlo_player::playback::{EventBusHighlightSink, PlaybackController, ResourceResolver};
use parlo_player::player::spawn_player;
use parlo_player::playlist::FsPlaylistSource;
use parlo_player::state::SharedState;
use tokio::signal;
use tokio::sync::mpsc;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Command-line arguments for parlo-player
#[derive(Parser, Debug)]
#[command(name = "parlo-player")]
#[command(about = "Synchronized segment audio player for Parlo dialogues and stories")]
#[command(version)]
struct Args {
    /// Port to listen on
    #[arg(short, long, env = "PARLO_PORT")]
    port: Option<u16>,

    /// Root folder containing playlist text and audio
    #[arg(short, long, env = ROOT_FOLDER_ENV)]
    root_folder: Option<PathBuf>,

    /// Explicit config file
    #[arg(short, long, env = CONFIG_FILE_ENV)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Config is read before tracing is up so `log_level` can shape the filter;
    // its outcome is logged right after.
    let config_path = args.config.clone().or_else(config_file_path);
    let toml_result = config_path.as_deref().map(TomlConfig::from_file);
    let log_level = match &toml_result {
        Some(Ok(toml)) => toml.log_level.clone(),
        _ => None,
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                match &log_level {
                    Some(level) => {
                        format!("parlo_player={0},parlo_common={0},tower_http={0}", level).into()
                    }
                    None => "parlo_player=debug,tower_http=debug".into(),
                }
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let toml = match (config_path, toml_result) {
        (Some(path), Some(Ok(toml))) => {
            info!("Loaded config from {}", path.display());
            toml
        }
        (Some(path), Some(Err(e))) => {
            warn!("Ignoring config file {}: {}", path.display(), e);
            TomlConfig::default()
        }
        _ => {
            info!("No config file found, using compiled defaults");
            TomlConfig::default()
        }
    };

    let config = Config::resolve(args.port, args.root_folder, toml)
        .context("Invalid configuration")?;
    info!("Starting Parlo player on port {}", config.port);
    info!("Root folder: {}", config.root_folder.display());

    let pool = db::init_database(&config.db_path)
        .await
        .with_context(|| format!("Failed to open database {}", config.db_path.display()))?;
    let volume = match db::settings::get_volume(&pool).await {
        Ok(volume) => volume,
        Err(e) => {
            warn!("Could not read stored volume, using default: {}", e);
            db::settings::DEFAULT_VOLUME
        }
    };
    info!("Volume preference: {:.2}", volume);

    let events = Arc::new(EventBus::new(256));
    let state = Arc::new(SharedState::new(events.clone()));

    let (media_tx, media_rx) = mpsc::unbounded_channel();
    let backend = Arc::new(FileMediaBackend::new(config.root_folder.clone(), media_tx));
    let resolver = ResourceResolver::new(backend, config.media.clone());
    let controller = PlaybackController::new(
        resolver,
        events.clone(),
        Box::new(EventBusHighlightSink::new(events)),
        Duration::from_millis(config.media.progress_interval_ms),
    )
    .with_volume(volume);

    let (player, player_task) = spawn_player(controller, media_rx, state.clone(), Some(pool.clone()));
    info!("Player task spawned");

    let ctx = AppContext {
        state,
        player,
        source: Arc::new(FsPlaylistSource::new(config.root_folder.clone())),
    };

    api::run(config.port, ctx, shutdown_signal())
        .await
        .context("Server error")?;

    // The router held the last player handles; the task ends on its own
    if tokio::time::timeout(Duration::from_secs(2), player_task).await.is_err() {
        warn!("Player task did not finish in time");
    }
    pool.close().await;

    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("Failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
