//! Error types for parlo-player
//!
//! Defines module-specific error types using thiserror for clear error propagation.
//!
//! Only `PlaylistLoad` is fatal to a caller. `ResourceLoad` and `PlaybackStart`
//! exist so failures can be logged and reported uniformly; the controller
//! treats both as "this segment is silent" and keeps going.

use crate::media::MediaError;
use crate::playlist::ParseError;
use thiserror::Error;

/// Main error type for parlo-player
#[derive(Error, Debug)]
pub enum Error {
    /// Playlist text produced no usable segments
    #[error("Playlist load error: {0}")]
    PlaylistLoad(#[from] ParseError),

    /// A segment's fallback chain was exhausted
    #[error("Resource load error for segment {index}: {source}")]
    ResourceLoad {
        index: usize,
        #[source]
        source: MediaError,
    },

    /// The media backend refused to start a handle
    #[error("Playback start error for segment {index}: {source}")]
    PlaybackStart {
        index: usize,
        #[source]
        source: MediaError,
    },

    /// Segment index outside the loaded playlist
    #[error("Invalid segment index {index} (playlist has {len} segments)")]
    InvalidSegment { index: usize, len: usize },

    /// Invalid state for operation
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] parlo_common::Error),

    /// Database connection or query errors
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// File I/O errors
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP server errors
    #[error("HTTP server error: {0}")]
    Http(String),

    /// Invalid request
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Other errors
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Convenience Result type using parlo-player Error
pub type Result<T> = std::result::Result<T, Error>;
