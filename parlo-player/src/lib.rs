//! # Parlo Player Library (parlo-player)
//!
//! Synchronized multi-segment audio playback for the Dialogues and Stories
//! learning modes.
//!
//! **Purpose:** Split a dialogue or story into ordered segments, resolve one
//! audio clip per segment through a fallback chain, and play the clips one at a
//! time or as a continuous sequence while keeping a highlight and a global
//! progress position in lock-step with whatever is sounding.
//!
//! **Architecture:** A single player actor task owns the
//! [`playback::PlaybackController`]; the HTTP/SSE layer talks to it through
//! [`player::PlayerHandle`].

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod media;
pub mod playback;
pub mod player;
pub mod playlist;
pub mod state;

pub use error::{Error, Result};
pub use state::SharedState;
