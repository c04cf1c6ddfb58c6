//! Server configuration.
//!
//! Settings are read from `review-board.yaml` (or the file named by
//! `REVIEW_BOARD_CONFIG`), then individual fields are overridden from the
//! environment. Every field has a default, so a missing file is not an
//! error.
//!
//! | Variable | Field |
//! |----------|-------|
//! | `REVIEW_BOARD_HOST` | `host` |
//! | `REVIEW_BOARD_PORT` | `port` |
//! | `REVIEW_BOARD_ORIGIN` | `cors_origin` |
//! | `REVIEW_BOARD_ASSETS` | `assets_dir` |
//! | `REVIEW_BOARD_DELAY` | `initial_delay_secs` |

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use review_core::MAX_DELAY_SECS;
use serde::Deserialize;

/// Default configuration file, relative to the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "review-board.yaml";

/// Environment variable naming an alternative configuration file.
pub const CONFIG_PATH_ENV: &str = "REVIEW_BOARD_CONFIG";

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// A value was present but unusable.
    #[error("invalid config: {0}")]
    Invalid(String),
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Complete server configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ServerConfig {
    /// Address to bind to.
    #[serde(default = "default_host")]
    pub host: String,

    /// TCP port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Allowed CORS origin; `*` allows any.
    #[serde(default = "default_cors_origin")]
    pub cors_origin: String,

    /// Directory served under `/assets`.
    #[serde(default = "default_assets_dir")]
    pub assets_dir: PathBuf,

    /// Seconds between keep-alive comments on the event stream.
    #[serde(default = "default_keep_alive_secs")]
    pub keep_alive_secs: u64,

    /// Frames queued per stream subscriber before new frames are dropped.
    #[serde(default = "default_subscriber_buffer")]
    pub subscriber_buffer: usize,

    /// Throttle delay at startup, in seconds.
    #[serde(default)]
    pub initial_delay_secs: u64,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Log level used when `RUST_LOG` is unset.
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

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origin: default_cors_origin(),
            assets_dir: default_assets_dir(),
            keep_alive_secs: default_keep_alive_secs(),
            subscriber_buffer: default_subscriber_buffer(),
            initial_delay_secs: 0,
            logging: LoggingConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Load from the configured file (if present) and the environment,
    /// then validate.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the file cannot be read or parsed, an
    /// override cannot be parsed, or validation fails.
    pub fn load() -> Result<Self, ConfigError> {
        let path = std::env::var(CONFIG_PATH_ENV)
            .map_or_else(|_| PathBuf::from(DEFAULT_CONFIG_FILE), PathBuf::from);
        let mut config = if path.exists() {
            Self::from_file(&path)?
        } else {
            Self::default()
        };
        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a YAML file without overrides.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, or
    /// [`ConfigError::Yaml`] if the contents are not valid YAML.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yml::from_str(yaml)?;
        Ok(config)
    }

    /// Apply overrides from a variable lookup (normally the process
    /// environment).
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if a numeric override does not
    /// parse.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(val) = lookup("REVIEW_BOARD_HOST") {
            self.host = val;
        }
        if let Some(val) = lookup("REVIEW_BOARD_PORT") {
            self.port = val
                .parse()
                .map_err(|e| ConfigError::Invalid(format!("invalid REVIEW_BOARD_PORT: {e}")))?;
        }
        if let Some(val) = lookup("REVIEW_BOARD_ORIGIN") {
            self.cors_origin = val;
        }
        if let Some(val) = lookup("REVIEW_BOARD_ASSETS") {
            self.assets_dir = PathBuf::from(val);
        }
        if let Some(val) = lookup("REVIEW_BOARD_DELAY") {
            self.initial_delay_secs = val
                .parse()
                .map_err(|e| ConfigError::Invalid(format!("invalid REVIEW_BOARD_DELAY: {e}")))?;
        }
        Ok(())
    }

    /// Check value ranges.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] describing the first bad field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.port == 0 {
            return Err(ConfigError::Invalid(String::from("port must be non-zero")));
        }
        if self.keep_alive_secs == 0 {
            return Err(ConfigError::Invalid(String::from(
                "keep_alive_secs must be at least 1",
            )));
        }
        if self.subscriber_buffer == 0 {
            return Err(ConfigError::Invalid(String::from(
                "subscriber_buffer must be at least 1",
            )));
        }
        if self.initial_delay_secs > MAX_DELAY_SECS {
            return Err(ConfigError::Invalid(format!(
                "initial_delay_secs must be within 0-{MAX_DELAY_SECS}"
            )));
        }
        self.socket_addr().map(|_| ())
    }

    /// The address to bind.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if `host:port` is not a socket
    /// address.
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| ConfigError::Invalid(format!("invalid address: {e}")))
    }

    /// Keep-alive period for the event stream.
    pub const fn keep_alive(&self) -> Duration {
        Duration::from_secs(self.keep_alive_secs)
    }
}

fn default_host() -> String {
    String::from("0.0.0.0")
}

const fn default_port() -> u16 {
    54077
}

fn default_cors_origin() -> String {
    String::from("*")
}

fn default_assets_dir() -> PathBuf {
    PathBuf::from("./assets")
}

const fn default_keep_alive_secs() -> u64 {
    10
}

const fn default_subscriber_buffer() -> usize {
    review_core::hub::DEFAULT_SUBSCRIBER_BUFFER
}

fn default_log_level() -> String {
    String::from("info")
}
