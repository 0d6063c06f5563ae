//! Unit tests for configuration and graceful degradation
//!
//! Covers:
//! - Missing TOML files never cause failure
//! - Priority order for root folder resolution (CLI > env > TOML > default)
//! - Explicit config file via PARLO_CONFIG
//!
//! Tests that touch PARLO_* environment variables are marked #[serial] so they
//! do not race each other.

use parlo_common::config::{
    config_file_path, CompiledDefaults, RootFolderResolver, TomlConfig, CONFIG_FILE_ENV,
    ROOT_FOLDER_ENV,
};
use serial_test::serial;
use std::env;
use std::path::PathBuf;

#[test]
fn test_compiled_defaults_for_current_platform() {
    let defaults = CompiledDefaults::for_current_platform();

    assert!(!defaults.root_folder.as_os_str().is_empty());
    assert!(defaults.root_folder.to_string_lossy().contains("parlo"));
    assert_eq!(defaults.port, 5760);
    assert_eq!(defaults.log_level, "info");
}

#[test]
#[serial]
fn test_resolver_with_no_overrides_uses_default() {
    env::remove_var(ROOT_FOLDER_ENV);

    let root_folder = RootFolderResolver::new().resolve();
    let defaults = CompiledDefaults::for_current_platform();
    assert_eq!(root_folder, defaults.root_folder);
}

#[test]
#[serial]
fn test_resolver_env_beats_toml() {
    env::set_var(ROOT_FOLDER_ENV, "/tmp/parlo-test-env-folder");

    let root_folder = RootFolderResolver::new()
        .with_toml(Some(PathBuf::from("/tmp/parlo-from-toml")))
        .resolve();
    assert_eq!(root_folder, PathBuf::from("/tmp/parlo-test-env-folder"));

    env::remove_var(ROOT_FOLDER_ENV);
}

#[test]
#[serial]
fn test_resolver_cli_beats_env() {
    env::set_var(ROOT_FOLDER_ENV, "/tmp/parlo-test-env-folder");

    let root_folder = RootFolderResolver::new()
        .with_cli_arg(Some(PathBuf::from("/tmp/parlo-cli")))
        .resolve();
    assert_eq!(root_folder, PathBuf::from("/tmp/parlo-cli"));

    env::remove_var(ROOT_FOLDER_ENV);
}

#[test]
#[serial]
fn test_resolver_toml_used_without_env() {
    env::remove_var(ROOT_FOLDER_ENV);

    let root_folder = RootFolderResolver::new()
        .with_toml(Some(PathBuf::from("/srv/parlo")))
        .resolve();
    assert_eq!(root_folder, PathBuf::from("/srv/parlo"));
}

#[test]
#[serial]
fn test_explicit_config_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(
        &path,
        r#"
        root_folder = "/srv/lessons"
        port = 7001

        [media]
        secondary_format = "wav"
        "#,
    )
    .unwrap();

    env::set_var(CONFIG_FILE_ENV, &path);
    assert_eq!(config_file_path(), Some(path.clone()));

    let config = TomlConfig::load_or_default();
    assert_eq!(config.root_folder, Some(PathBuf::from("/srv/lessons")));
    assert_eq!(config.port, Some(7001));
    assert_eq!(config.media.secondary_format, "wav");
    assert_eq!(config.media.primary_format, "mp3");

    env::remove_var(CONFIG_FILE_ENV);
}

#[test]
#[serial]
fn test_broken_config_file_degrades_to_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "port = [this is not toml").unwrap();

    env::set_var(CONFIG_FILE_ENV, &path);
    let config = TomlConfig::load_or_default();
    assert!(config.port.is_none());
    assert!(config.root_folder.is_none());

    env::remove_var(CONFIG_FILE_ENV);
}

#[test]
#[serial]
fn test_missing_explicit_config_file() {
    env::set_var(CONFIG_FILE_ENV, "/nonexistent/parlo/config.toml");
    assert!(config_file_path().is_none());
    env::remove_var(CONFIG_FILE_ENV);
}
