//! Common error types for Parlo

use thiserror::Error;

/// Common result type for Parlo operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across Parlo crates
#[derive(Error, Debug)]
pub enum Error {
    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML parse error in a config file
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),
}
