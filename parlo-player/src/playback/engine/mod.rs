//! Playback controller
//!
//! **Module Structure:**
//! - `core.rs`: struct, construction, playlist loading, state transitions
//! - `playback.rs`: transport operations and sequential advance
//! - `volume.rs`: volume and mute

mod core;
mod playback;
mod volume;

pub use self::core::PlaybackController;
