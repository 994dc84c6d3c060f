//! Configuration loading and resolution
//!
//! Settings are resolved in priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable (bound to the same CLI flag via clap `env`)
//! 3. TOML config file
//! 4. OS-dependent compiled default (fallback)
//!
//! Only items 1 and 2 arrive through [`ConfigOverrides`]; this module merges
//! them with the TOML layer and the compiled defaults.

use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Name of the subdirectory used under OS config/data directories
const APP_DIR_NAME: &str = "cropdx";

/// Subdirectory of the media root that holds detection uploads
pub const DETECTION_IMAGES_DIR: &str = "detection_images";

/// Configuration file contents
///
/// Every field is optional so a partial file only overrides what it names.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct TomlConfig {
    /// Interface to bind the HTTP server to
    #[serde(default)]
    pub host: Option<String>,

    /// HTTP server port
    #[serde(default)]
    pub port: Option<u16>,

    /// Folder holding the database and uploaded media
    #[serde(default)]
    pub data_dir: Option<PathBuf>,

    /// SQLite database file (defaults to `<data_dir>/cropdx.db`)
    #[serde(default)]
    pub database_path: Option<PathBuf>,

    /// Folder for stored uploads (defaults to `<data_dir>/media`)
    #[serde(default)]
    pub media_root: Option<PathBuf>,

    /// Request body limit for uploads
    #[serde(default)]
    pub max_upload_bytes: Option<usize>,

    #[serde(default)]
    pub auth: AuthConfig,

    #[serde(default)]
    pub detection: DetectionConfig,

    #[serde(default)]
    pub translation: TranslationConfig,

    #[serde(default)]
    pub cors: CorsConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Token lifetimes
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    #[serde(default = "default_access_token_minutes")]
    pub access_token_minutes: i64,

    #[serde(default = "default_refresh_token_days")]
    pub refresh_token_days: i64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            access_token_minutes: default_access_token_minutes(),
            refresh_token_days: default_refresh_token_days(),
        }
    }
}

/// Which heuristic decides whether an upload looks like a crop photo
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationMode {
    /// Mean green dominance over a 224×224 copy of the image
    GreenDominance,
    /// Width and height must both reach `min_dimension`
    Dimensions,
}

/// Image heuristic settings
#[derive(Debug, Clone, Deserialize)]
pub struct DetectionConfig {
    #[serde(default = "default_validation_mode")]
    pub validation: ValidationMode,

    #[serde(default = "default_green_threshold")]
    pub green_threshold: f32,

    #[serde(default = "default_min_dimension")]
    pub min_dimension: u32,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            validation: default_validation_mode(),
            green_threshold: default_green_threshold(),
            min_dimension: default_min_dimension(),
        }
    }
}

/// Translation backend selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TranslationBackend {
    /// Built-in phrase table only
    Static,
    /// LibreTranslate-compatible HTTP service, phrase table as fallback
    Http,
}

/// Translation settings
#[derive(Debug, Clone, Deserialize)]
pub struct TranslationConfig {
    #[serde(default = "default_translation_backend")]
    pub backend: TranslationBackend,

    /// Service base URL, e.g. `https://libretranslate.example.org`
    #[serde(default)]
    pub base_url: Option<String>,

    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default = "default_translation_timeout_ms")]
    pub timeout_ms: u64,

    #[serde(default = "default_source_lang")]
    pub source_lang: String,

    #[serde(default = "default_target_lang")]
    pub target_lang: String,
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            backend: default_translation_backend(),
            base_url: None,
            api_key: None,
            timeout_ms: default_translation_timeout_ms(),
            source_lang: default_source_lang(),
            target_lang: default_target_lang(),
        }
    }
}

/// CORS settings
///
/// An empty origin list means any origin is allowed.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct CorsConfig {
    #[serde(default)]
    pub allowed_origins: Vec<String>,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_access_token_minutes() -> i64 {
    60
}

fn default_refresh_token_days() -> i64 {
    7
}

fn default_validation_mode() -> ValidationMode {
    ValidationMode::GreenDominance
}

fn default_green_threshold() -> f32 {
    5.0
}

fn default_min_dimension() -> u32 {
    32
}

fn default_translation_backend() -> TranslationBackend {
    TranslationBackend::Static
}

fn default_translation_timeout_ms() -> u64 {
    5000
}

fn default_source_lang() -> String {
    "en".to_string()
}

fn default_target_lang() -> String {
    "rw".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 8000;
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;
/// Longest accepted access token lifetime (one day)
pub const MAX_ACCESS_TOKEN_MINUTES: i64 = 24 * 60;
/// Longest accepted refresh token lifetime (one year)
pub const MAX_REFRESH_TOKEN_DAYS: i64 = 365;

/// Values supplied on the command line or through environment variables
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub data_dir: Option<PathBuf>,
    pub database_path: Option<PathBuf>,
    pub media_root: Option<PathBuf>,
    pub log_level: Option<String>,
}

/// Fully resolved service configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub data_dir: PathBuf,
    pub database_path: PathBuf,
    pub media_root: PathBuf,
    pub max_upload_bytes: usize,
    pub auth: AuthConfig,
    pub detection: DetectionConfig,
    pub translation: TranslationConfig,
    pub cors: CorsConfig,
    pub logging: LoggingConfig,
}

impl ServerConfig {
    /// Merge overrides, the TOML layer and compiled defaults
    pub fn resolve(overrides: &ConfigOverrides, toml: TomlConfig) -> Self {
        let data_dir = overrides
            .data_dir
            .clone()
            .or(toml.data_dir)
            .unwrap_or_else(default_data_dir);

        let database_path = overrides
            .database_path
            .clone()
            .or(toml.database_path)
            .unwrap_or_else(|| data_dir.join("cropdx.db"));

        let media_root = overrides
            .media_root
            .clone()
            .or(toml.media_root)
            .unwrap_or_else(|| data_dir.join("media"));

        let mut logging = toml.logging;
        if let Some(level) = &overrides.log_level {
            logging.level = level.clone();
        }

        Self {
            host: overrides
                .host
                .clone()
                .or(toml.host)
                .unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port: overrides.port.or(toml.port).unwrap_or(DEFAULT_PORT),
            data_dir,
            database_path,
            media_root,
            max_upload_bytes: toml.max_upload_bytes.unwrap_or(DEFAULT_MAX_UPLOAD_BYTES),
            auth: toml.auth,
            detection: toml.detection,
            translation: toml.translation,
            cors: toml.cors,
            logging,
        }
    }

    /// Load the TOML layer (if any) and resolve against the overrides
    ///
    /// A missing config file is not an error; defaults are used instead.
    pub fn load(explicit_config: Option<&Path>, overrides: &ConfigOverrides) -> Result<Self> {
        let toml = match config_file_path(explicit_config)? {
            Some(path) => {
                info!("Loading configuration from {}", path.display());
                load_toml_config(&path)?
            }
            None => {
                warn!("No configuration file found, using defaults");
                TomlConfig::default()
            }
        };

        let config = Self::resolve(overrides, toml);
        config.validate()?;
        Ok(config)
    }

    /// Reject settings that cannot work at runtime
    pub fn validate(&self) -> Result<()> {
        if !(1..=MAX_ACCESS_TOKEN_MINUTES).contains(&self.auth.access_token_minutes) {
            return Err(Error::Config(format!(
                "auth.access_token_minutes must be between 1 and {}",
                MAX_ACCESS_TOKEN_MINUTES
            )));
        }
        if !(1..=MAX_REFRESH_TOKEN_DAYS).contains(&self.auth.refresh_token_days) {
            return Err(Error::Config(format!(
                "auth.refresh_token_days must be between 1 and {}",
                MAX_REFRESH_TOKEN_DAYS
            )));
        }
        if self.translation.backend == TranslationBackend::Http
            && self.translation.base_url.as_deref().map_or(true, str::is_empty)
        {
            return Err(Error::Config(
                "translation.base_url is required when translation.backend = \"http\""
                    .to_string(),
            ));
        }
        if self.max_upload_bytes == 0 {
            return Err(Error::Config("max_upload_bytes must be positive".to_string()));
        }
        Ok(())
    }

    /// `host:port` string for the listener
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Folder that detection uploads are written to
    pub fn detection_images_dir(&self) -> PathBuf {
        self.media_root.join(DETECTION_IMAGES_DIR)
    }

    /// Create the data, media and database folders if missing
    pub fn ensure_directories(&self) -> Result<()> {
        std::fs::create_dir_all(&self.data_dir)?;
        std::fs::create_dir_all(self.detection_images_dir())?;
        if let Some(parent) = self.database_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        Ok(())
    }
}

/// Parse a TOML configuration file
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Read {} failed: {}", path.display(), e)))?;
    toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse {} failed: {}", path.display(), e)))
}

/// Locate the configuration file
///
/// An explicit path must exist. Otherwise the user config directory is tried,
/// then `/etc/cropdx/config.toml` on Linux.
pub fn config_file_path(explicit: Option<&Path>) -> Result<Option<PathBuf>> {
    if let Some(path) = explicit {
        if !path.exists() {
            return Err(Error::Config(format!(
                "Config file not found: {}",
                path.display()
            )));
        }
        return Ok(Some(path.to_path_buf()));
    }

    if let Some(user_config) = dirs::config_dir().map(|d| d.join(APP_DIR_NAME).join("config.toml")) {
        if user_config.exists() {
            return Ok(Some(user_config));
        }
    }

    if cfg!(target_os = "linux") {
        let system_config = PathBuf::from("/etc").join(APP_DIR_NAME).join("config.toml");
        if system_config.exists() {
            return Ok(Some(system_config));
        }
    }

    Ok(None)
}

/// Get OS-dependent default data folder
pub fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join(APP_DIR_NAME))
        .unwrap_or_else(|| PathBuf::from("./cropdx_data"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_toml_keeps_section_defaults() {
        let toml: TomlConfig = toml::from_str(
            r#"
            port = 9100

            [detection]
            validation = "dimensions"
            "#,
        )
        .unwrap();

        assert_eq!(toml.port, Some(9100));
        assert_eq!(toml.detection.validation, ValidationMode::Dimensions);
        assert_eq!(toml.detection.green_threshold, 5.0);
        assert_eq!(toml.detection.min_dimension, 32);
        assert_eq!(toml.auth.access_token_minutes, 60);
        assert_eq!(toml.translation.backend, TranslationBackend::Static);
        assert_eq!(toml.translation.target_lang, "rw");
    }

    #[test]
    fn test_overrides_beat_toml() {
        let toml: TomlConfig = toml::from_str(
            r#"
            host = "0.0.0.0"
            port = 9100
            data_dir = "/srv/cropdx"
            "#,
        )
        .unwrap();

        let overrides = ConfigOverrides {
            port: Some(7000),
            ..Default::default()
        };
        let config = ServerConfig::resolve(&overrides, toml);

        assert_eq!(config.port, 7000);
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.database_path, PathBuf::from("/srv/cropdx/cropdx.db"));
        assert_eq!(config.media_root, PathBuf::from("/srv/cropdx/media"));
        assert_eq!(config.bind_address(), "0.0.0.0:7000");
    }

    #[test]
    fn test_compiled_defaults() {
        let config = ServerConfig::resolve(&ConfigOverrides::default(), TomlConfig::default());

        assert_eq!(config.host, DEFAULT_HOST);
        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.max_upload_bytes, DEFAULT_MAX_UPLOAD_BYTES);
        assert_eq!(config.data_dir, default_data_dir());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_http_backend_requires_base_url() {
        let toml: TomlConfig = toml::from_str(
            r#"
            [translation]
            backend = "http"
            "#,
        )
        .unwrap();

        let config = ServerConfig::resolve(&ConfigOverrides::default(), toml);
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_unknown_validation_mode_rejected() {
        let result: std::result::Result<TomlConfig, _> = toml::from_str(
            r#"
            [detection]
            validation = "neural_net"
            "#,
        );
        assert!(result.is_err());
    }
}
