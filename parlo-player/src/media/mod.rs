//! Media handles and backends
//!
//! A [`MediaBackend`] turns a resource location into a [`MediaHandle`]. Opening
//! a handle includes the metadata step, so a handle that exists knows its
//! duration. Handles report natural end-of-media through the backend's
//! [`MediaEvent`] channel; the controller decides whether that event is still
//! relevant.

pub mod clock;
pub mod file_backend;

pub use clock::ClockHandle;
pub use file_backend::{read_duration, FileMediaBackend};

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

/// Where one candidate audio resource lives
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResourceLocation {
    /// Path relative to the backend's root
    pub relative_path: String,
    pub format: String,
    pub language: String,
}

/// Transport status of a handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HandleStatus {
    /// Never started, or rewound
    Idle,
    /// Stopped mid-clip, position retained
    Paused,
    /// Currently sounding
    Sounding,
    /// Reached end of media
    Ended,
}

/// Notifications from handles to the controller
#[derive(Debug, Clone, PartialEq)]
pub enum MediaEvent {
    /// Natural end of media for the handle of `segment`
    Ended { segment: usize },
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum MediaError {
    #[error("resource not found: {0}")]
    NotFound(String),

    #[error("unsupported media: {0}")]
    Unsupported(String),

    #[error("media metadata unavailable: {0}")]
    Metadata(String),

    #[error("play request rejected: {0}")]
    PlayRejected(String),

    #[error("fallback chain exhausted after {attempts} attempts, last: {last}")]
    Exhausted {
        attempts: usize,
        last: Box<MediaError>,
    },
}

/// One playable clip
///
/// All methods are synchronous; only resolution suspends.
pub trait MediaHandle: Send + Sync {
    /// Known once the handle exists; `None` if the container had no length
    fn duration_seconds(&self) -> Option<f64>;

    /// Segment-local position
    fn position_seconds(&self) -> f64;

    fn status(&self) -> HandleStatus;

    /// Start or continue from the current position
    fn play(&mut self) -> Result<(), MediaError>;

    /// Stop sounding, keep position
    fn pause(&mut self);

    /// Move to `offset_seconds` (clamped to the clip) without changing whether
    /// the handle is sounding
    fn seek(&mut self, offset_seconds: f64);

    fn set_volume(&mut self, volume: f32);

    fn volume(&self) -> f32;

    /// Pause and rewind to 0
    fn stop(&mut self) {
        self.pause();
        self.seek(0.0);
    }
}

/// Produces handles for resource locations
#[async_trait]
pub trait MediaBackend: Send + Sync {
    /// Open and read metadata for one candidate location
    async fn open(
        &self,
        location: &ResourceLocation,
        segment: usize,
    ) -> Result<Box<dyn MediaHandle>, MediaError>;
}
