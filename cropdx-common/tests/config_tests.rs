//! Integration tests for configuration loading
//!
//! Tests that change XDG_CONFIG_HOME are marked #[serial] so they do not
//! race each other.

use cropdx_common::config::{
    config_file_path, ConfigOverrides, ServerConfig, TranslationBackend, ValidationMode,
    DEFAULT_PORT, MAX_ACCESS_TOKEN_MINUTES, MAX_REFRESH_TOKEN_DAYS,
};
use serial_test::serial;
use std::env;
use std::fs;
use tempfile::TempDir;

const FULL_CONFIG: &str = r#"
host = "0.0.0.0"
port = 9100
max_upload_bytes = 2048

[auth]
access_token_minutes = 15
refresh_token_days = 2

[detection]
validation = "dimensions"
min_dimension = 64

[translation]
backend = "http"
base_url = "http://translate.local:5000"
timeout_ms = 1500

[cors]
allowed_origins = ["http://localhost:5173"]

[logging]
level = "debug"
"#;

#[test]
fn test_load_full_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("cropdx.toml");
    fs::write(&path, FULL_CONFIG).unwrap();

    let overrides = ConfigOverrides {
        data_dir: Some(dir.path().join("data")),
        ..Default::default()
    };
    let config = ServerConfig::load(Some(&path), &overrides).unwrap();

    assert_eq!(config.bind_address(), "0.0.0.0:9100");
    assert_eq!(config.max_upload_bytes, 2048);
    assert_eq!(config.auth.access_token_minutes, 15);
    assert_eq!(config.detection.validation, ValidationMode::Dimensions);
    assert_eq!(config.detection.min_dimension, 64);
    assert_eq!(config.translation.backend, TranslationBackend::Http);
    assert_eq!(config.translation.timeout_ms, 1500);
    assert_eq!(config.cors.allowed_origins, vec!["http://localhost:5173"]);
    assert_eq!(config.logging.level, "debug");
    assert_eq!(config.database_path, dir.path().join("data").join("cropdx.db"));
}

#[test]
fn test_explicit_missing_file_is_error() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("absent.toml");
    assert!(ServerConfig::load(Some(&missing), &ConfigOverrides::default()).is_err());
}

#[test]
fn test_invalid_values_rejected_on_load() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("bad.toml");
    fs::write(&path, "[auth]\naccess_token_minutes = 0\n").unwrap();

    assert!(ServerConfig::load(Some(&path), &ConfigOverrides::default()).is_err());
}

#[test]
fn test_token_lifetimes_bounded() {
    let mut config = ServerConfig::resolve(&ConfigOverrides::default(), Default::default());

    config.auth.refresh_token_days = MAX_REFRESH_TOKEN_DAYS;
    config.auth.access_token_minutes = MAX_ACCESS_TOKEN_MINUTES;
    assert!(config.validate().is_ok());

    // Large enough to overflow chrono when added to the current time
    config.auth.refresh_token_days = 1_000_000_000;
    assert!(config.validate().is_err());

    config.auth.refresh_token_days = 7;
    config.auth.access_token_minutes = MAX_ACCESS_TOKEN_MINUTES + 1;
    assert!(config.validate().is_err());
}

#[test]
fn test_directories_created() {
    let dir = TempDir::new().unwrap();
    let overrides = ConfigOverrides {
        data_dir: Some(dir.path().join("root")),
        ..Default::default()
    };
    let config = ServerConfig::resolve(&overrides, Default::default());

    config.ensure_directories().unwrap();
    assert!(config.detection_images_dir().is_dir());
    assert!(config.data_dir.is_dir());
}

#[test]
#[serial]
fn test_user_config_dir_discovered() {
    let home = TempDir::new().unwrap();
    let app_dir = home.path().join("cropdx");
    fs::create_dir_all(&app_dir).unwrap();
    fs::write(app_dir.join("config.toml"), "port = 9200\n").unwrap();

    let previous = env::var_os("XDG_CONFIG_HOME");
    env::set_var("XDG_CONFIG_HOME", home.path());

    let found = config_file_path(None).unwrap();
    let config = ServerConfig::load(None, &ConfigOverrides::default());

    match previous {
        Some(value) => env::set_var("XDG_CONFIG_HOME", value),
        None => env::remove_var("XDG_CONFIG_HOME"),
    }

    #[cfg(target_os = "linux")]
    {
        assert_eq!(found, Some(app_dir.join("config.toml")));
        assert_eq!(config.unwrap().port, 9200);
    }
    #[cfg(not(target_os = "linux"))]
    {
        let _ = (found, config);
    }
}

#[test]
#[serial]
fn test_cli_override_beats_discovered_file() {
    let home = TempDir::new().unwrap();
    let app_dir = home.path().join("cropdx");
    fs::create_dir_all(&app_dir).unwrap();
    fs::write(app_dir.join("config.toml"), "port = 9300\n").unwrap();

    let previous = env::var_os("XDG_CONFIG_HOME");
    env::set_var("XDG_CONFIG_HOME", home.path());

    let overrides = ConfigOverrides {
        port: Some(DEFAULT_PORT + 1),
        ..Default::default()
    };
    let config = ServerConfig::load(None, &overrides).unwrap();

    match previous {
        Some(value) => env::set_var("XDG_CONFIG_HOME", value),
        None => env::remove_var("XDG_CONFIG_HOME"),
    }

    assert_eq!(config.port, DEFAULT_PORT + 1);
}
