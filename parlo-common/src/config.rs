//! Configuration loading and root folder resolution
//!
//! Configuration is layered. Every value can come from (highest priority first):
//! 1. Command-line argument
//! 2. Environment variable
//! 3. TOML config file
//! 4. Compiled default
//!
//! A missing or unreadable TOML file is never fatal: a warning is logged and
//! compiled defaults are used.

use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Environment variable naming the root folder
pub const ROOT_FOLDER_ENV: &str = "PARLO_ROOT_FOLDER";

/// Environment variable naming an explicit config file
pub const CONFIG_FILE_ENV: &str = "PARLO_CONFIG";

/// Media resolution settings (`[media]` table)
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct MediaConfig {
    /// Preferred audio file extension
    pub primary_format: String,
    /// Extension tried when the primary format is missing
    pub secondary_format: String,
    /// Language tried when the playlist language has no audio
    pub fallback_language: String,
    /// Location template, relative to the root folder.
    /// Placeholders: `{kind}`, `{content}`, `{lang}`, `{index}`, `{ext}`
    pub location_template: String,
    /// Progress sampling interval in milliseconds
    pub progress_interval_ms: u64,
    /// Maximum number of segments resolved at once during preload
    pub preload_concurrency: usize,
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            primary_format: "mp3".to_string(),
            secondary_format: "ogg".to_string(),
            fallback_language: "en".to_string(),
            location_template: "{kind}/{content}/{lang}/{index}.{ext}".to_string(),
            progress_interval_ms: 100,
            preload_concurrency: 8,
        }
    }
}

/// Contents of `config.toml`
///
/// All fields are optional so a partial file overrides only what it names.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TomlConfig {
    pub root_folder: Option<PathBuf>,
    pub port: Option<u16>,
    pub database: Option<PathBuf>,
    pub log_level: Option<String>,
    pub media: MediaConfig,
}

impl TomlConfig {
    /// Parse a TOML document
    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Read and parse a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Load the platform config file, falling back to defaults
    ///
    /// Never fails: an absent file is normal, an unreadable one is logged.
    pub fn load_or_default() -> Self {
        let Some(path) = config_file_path() else {
            debug!("No config file found, using compiled defaults");
            return Self::default();
        };

        match Self::from_file(&path) {
            Ok(config) => {
                debug!("Loaded config from {}", path.display());
                config
            }
            Err(e) => {
                warn!("Ignoring config file {}: {}", path.display(), e);
                Self::default()
            }
        }
    }
}

/// OS-dependent compiled defaults
#[derive(Debug, Clone)]
pub struct CompiledDefaults {
    pub root_folder: PathBuf,
    pub port: u16,
    pub log_level: String,
}

impl CompiledDefaults {
    pub fn for_current_platform() -> Self {
        Self {
            root_folder: default_root_folder(),
            port: 5760,
            log_level: "info".to_string(),
        }
    }
}

/// Resolves the root folder following CLI > env > TOML > default
pub struct RootFolderResolver {
    cli_arg: Option<PathBuf>,
    toml: Option<PathBuf>,
}

impl RootFolderResolver {
    pub fn new() -> Self {
        Self {
            cli_arg: None,
            toml: None,
        }
    }

    /// Command-line value, if one was given
    pub fn with_cli_arg(mut self, path: Option<PathBuf>) -> Self {
        self.cli_arg = path;
        self
    }

    /// Value from the TOML file, if any
    pub fn with_toml(mut self, path: Option<PathBuf>) -> Self {
        self.toml = path;
        self
    }

    pub fn resolve(&self) -> PathBuf {
        if let Some(path) = &self.cli_arg {
            return path.clone();
        }

        if let Ok(path) = std::env::var(ROOT_FOLDER_ENV) {
            if !path.is_empty() {
                return PathBuf::from(path);
            }
        }

        if let Some(path) = &self.toml {
            return path.clone();
        }

        default_root_folder()
    }
}

impl Default for RootFolderResolver {
    fn default() -> Self {
        Self::new()
    }
}

/// Locate the config file for this platform
///
/// `PARLO_CONFIG` wins; then `~/.config/parlo/config.toml`; on Linux also
/// `/etc/parlo/config.toml`.
pub fn config_file_path() -> Option<PathBuf> {
    if let Ok(path) = std::env::var(CONFIG_FILE_ENV) {
        let path = PathBuf::from(path);
        return path.exists().then_some(path);
    }

    let user_config = dirs::config_dir().map(|d| d.join("parlo").join("config.toml"));
    if let Some(path) = user_config {
        if path.exists() {
            return Some(path);
        }
    }

    if cfg!(target_os = "linux") {
        let system_config = PathBuf::from("/etc/parlo/config.toml");
        if system_config.exists() {
            return Some(system_config);
        }
    }

    None
}

/// Validate a media config before the engine uses it
pub fn validate_media_config(media: &MediaConfig) -> Result<()> {
    if media.primary_format.is_empty() || media.secondary_format.is_empty() {
        return Err(Error::Config("media formats must not be empty".to_string()));
    }
    if !media.location_template.contains("{index}") {
        return Err(Error::Config(
            "location_template must contain {index}".to_string(),
        ));
    }
    if media.progress_interval_ms == 0 {
        return Err(Error::Config("progress_interval_ms must be > 0".to_string()));
    }
    if media.preload_concurrency == 0 {
        return Err(Error::Config("preload_concurrency must be > 0".to_string()));
    }
    Ok(())
}

fn default_root_folder() -> PathBuf {
    if cfg!(target_os = "windows") {
        dirs::data_local_dir()
            .map(|d| d.join("parlo"))
            .unwrap_or_else(|| PathBuf::from("C:\\ProgramData\\parlo"))
    } else if cfg!(target_os = "macos") {
        dirs::data_dir()
            .map(|d| d.join("parlo"))
            .unwrap_or_else(|| PathBuf::from("/Library/Application Support/parlo"))
    } else {
        // ~/.local/share/parlo (or /var/lib/parlo for system-wide)
        dirs::data_local_dir()
            .map(|d| d.join("parlo"))
            .unwrap_or_else(|| PathBuf::from("/var/lib/parlo"))
    }
}
