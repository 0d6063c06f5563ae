//! parlo-player specific configuration
//!
//! Merges command-line values over the TOML file and compiled defaults.

use parlo_common::config::{
    validate_media_config, CompiledDefaults, MediaConfig, RootFolderResolver, TomlConfig,
};
use std::path::PathBuf;

/// Player configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub root_folder: PathBuf,
    pub db_path: PathBuf,
    pub log_level: String,
    pub media: MediaConfig,
}

impl Config {
    /// Resolve the final configuration
    ///
    /// `cli_port` and `cli_root` already include their environment fallbacks.
    pub fn resolve(
        cli_port: Option<u16>,
        cli_root: Option<PathBuf>,
        toml: TomlConfig,
    ) -> crate::Result<Self> {
        let defaults = CompiledDefaults::for_current_platform();
        validate_media_config(&toml.media)?;

        let root_folder = RootFolderResolver::new()
            .with_cli_arg(cli_root)
            .with_toml(toml.root_folder)
            .resolve();
        let db_path = toml
            .database
            .unwrap_or_else(|| root_folder.join("parlo.db"));

        Ok(Self {
            port: cli_port.or(toml.port).unwrap_or(defaults.port),
            root_folder,
            db_path,
            log_level: toml.log_level.unwrap_or(defaults.log_level),
            media: toml.media,
        })
    }
}
