//! Playback engine
//!
//! **Module Structure:**
//! - `ledger.rs`: per-segment durations and global time mapping
//! - `resolver.rs`: fallback chain and preload
//! - `session.rs`: mutable runtime state
//! - `progress.rs`: progress sampler and snapshot
//! - `highlight.rs`: single active segment marking
//! - `engine/`: the controller state machine

pub mod engine;
pub mod highlight;
pub mod ledger;
pub mod progress;
pub mod resolver;
pub mod session;

pub use engine::PlaybackController;
pub use highlight::{EventBusHighlightSink, HighlightSink, HighlightSynchronizer};
pub use ledger::{DurationLedger, Location};
pub use progress::{ProgressSampler, ProgressSnapshot};
pub use resolver::{ResourceLocator, ResourceResolver, FALLBACK_TABLE, MAX_ATTEMPTS};
pub use session::PlaybackSession;
