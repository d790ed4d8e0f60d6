use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use crate::storage::dropbox::DEFAULT_BASE_URL;

// =============================================================================
// Time-related constants
// =============================================================================

/// Default lifetime of a cached listing or link in seconds (12 hours)
pub const DEFAULT_CACHE_TTL_SECS: u64 = 12 * 60 * 60;

/// Default interval between expired-entry sweeps in seconds (15 minutes)
pub const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 15 * 60;

/// Timeout for backend calls in milliseconds (30 seconds)
pub const FETCH_TIMEOUT_MS: u64 = 30_000;

/// Substring excluded from file listings unless configured otherwise
pub const DEFAULT_EXCLUDED_SUBSTRING: &str = ".txt";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path:?}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid config file {path:?}: {source}")]
    Invalid {
        path: PathBuf,
        source: serde_yaml::Error,
    },

    #[error("Invalid config file {path:?}: {field} must be greater than zero")]
    Zero { path: PathBuf, field: &'static str },
}

/// Top-level configuration structure
#[derive(Debug, Clone, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct LinkerConfig {
    pub cache: CacheConfig,
    pub storage: StorageConfig,
    pub logging: LoggingConfig,
}

impl LinkerConfig {
    /// Load configuration from a YAML file, falling back to defaults when the
    /// file does not exist
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(source) => {
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };

        let config = Self::from_yaml(&content).map_err(|source| ConfigError::Invalid {
            path: path.to_path_buf(),
            source,
        })?;

        match config.zero_field() {
            Some(field) => Err(ConfigError::Zero {
                path: path.to_path_buf(),
                field,
            }),
            None => Ok(config),
        }
    }

    /// Name of the first setting that must be non-zero but is zero
    pub fn zero_field(&self) -> Option<&'static str> {
        if self.cache.sweep_interval_secs == 0 {
            Some("cache.sweep_interval_secs")
        } else if self.storage.fetch_timeout_ms == 0 {
            Some("storage.fetch_timeout_ms")
        } else {
            None
        }
    }

    pub fn from_yaml(content: &str) -> Result<Self, serde_yaml::Error> {
        // An empty document deserializes to unit, not to a mapping
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(content)
    }
}

/// Cache-related configuration
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct CacheConfig {
    /// Lifetime of a cached entry in seconds
    pub ttl_secs: u64,
    /// Interval between sweeps of expired entries in seconds
    pub sweep_interval_secs: u64,
}

impl CacheConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_secs: DEFAULT_CACHE_TTL_SECS,
            sweep_interval_secs: DEFAULT_SWEEP_INTERVAL_SECS,
        }
    }
}

/// Remote storage configuration
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct StorageConfig {
    pub api_base_url: String,
    pub access_token: String,
    /// Timeout for a single backend call in milliseconds
    pub fetch_timeout_ms: u64,
    /// Files whose path contains any of these substrings are never listed
    pub exclude: Vec<String>,
}

impl StorageConfig {
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_millis(self.fetch_timeout_ms)
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_BASE_URL.to_string(),
            access_token: String::new(),
            fetch_timeout_ms: FETCH_TIMEOUT_MS,
            exclude: vec![DEFAULT_EXCLUDED_SUBSTRING.to_string()],
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive used when RUST_LOG is unset
    pub level: String,
    /// Emit JSON lines instead of human-readable text
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

/// Returns the path to the config directory for artifact-linker.
/// Uses $XDG_CONFIG_HOME/artifact-linker if XDG_CONFIG_HOME is set,
/// otherwise falls back to ~/.config/artifact-linker,
/// or ./artifact-linker if neither is available.
pub fn config_dir() -> PathBuf {
    app_dir_with_env(
        std::env::var("XDG_CONFIG_HOME").ok(),
        dirs::home_dir(),
        ".config",
    )
}

/// Returns the path to the data directory for artifact-linker.
/// Uses $XDG_DATA_HOME/artifact-linker if XDG_DATA_HOME is set,
/// otherwise falls back to ~/.local/share/artifact-linker,
/// or ./artifact-linker if neither is available.
pub fn data_dir() -> PathBuf {
    app_dir_with_env(
        std::env::var("XDG_DATA_HOME").ok(),
        dirs::home_dir(),
        ".local/share",
    )
}

/// Returns the path to the default config file.
pub fn config_path() -> PathBuf {
    config_dir().join("config.yml")
}

/// Returns the path to the log file.
pub fn log_path() -> PathBuf {
    data_dir().join("artifact-linker.log")
}

fn app_dir_with_env(
    xdg_home: Option<String>,
    home_dir: Option<PathBuf>,
    home_suffix: &str,
) -> PathBuf {
    let base = xdg_home
        .map(PathBuf::from)
        .or_else(|| home_dir.map(|home| home.join(home_suffix)))
        .unwrap_or_else(|| PathBuf::from("."));

    base.join("artifact-linker")
}
