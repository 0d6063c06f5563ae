//! # Parlo Common Library
//!
//! Shared code for the Parlo services including:
//! - Event types (ParloEvent enum) and the EventBus
//! - Configuration loading and root folder resolution
//! - Common error type

pub mod config;
pub mod error;
pub mod events;

pub use error::{Error, Result};
