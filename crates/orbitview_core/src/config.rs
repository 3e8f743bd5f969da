//! Runtime configuration for server and client binaries.
//!
//! # Responsibility
//! - Load `OrbitViewConfig` from an optional TOML file.
//! - Apply environment overrides on top of file values.
//! - Reject values that would make startup fail later in a less obvious way.
//!
//! # Invariants
//! - Every field has a default; a missing file yields the defaults.
//! - `validate()` runs after overrides, never before.

use serde::Deserialize;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};
use std::time::Duration;

const APP_DIR_NAME: &str = "orbitview";
const DEFAULT_BIND: &str = "127.0.0.1:3080";
const DEFAULT_DB_FILE_NAME: &str = "orbitview.sqlite3";
const DEFAULT_BASE_URL: &str = "http://localhost:3080";

/// Path of the TOML config file when not given on the command line.
pub const ENV_CONFIG: &str = "ORBITVIEW_CONFIG";
pub const ENV_BIND: &str = "ORBITVIEW_BIND";
pub const ENV_PORT: &str = "PORT";
pub const ENV_DB_PATH: &str = "ORBITVIEW_DB_PATH";
pub const ENV_BASE_URL: &str = "ORBITVIEW_BASE_URL";
pub const ENV_LOG_LEVEL: &str = "ORBITVIEW_LOG_LEVEL";

#[derive(Debug)]
pub enum ConfigError {
    Io { path: PathBuf, source: std::io::Error },
    Parse { path: PathBuf, source: toml::de::Error },
    Invalid(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "failed to read config `{}`: {source}", path.display())
            }
            Self::Parse { path, source } => {
                write!(f, "failed to parse config `{}`: {source}", path.display())
            }
            Self::Invalid(message) => write!(f, "invalid config: {message}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Parse { source, .. } => Some(source),
            Self::Invalid(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// `host:port` the HTTP API listens on.
    pub bind: String,
    pub db_path: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: DEFAULT_BIND.to_string(),
            db_path: PathBuf::from(DEFAULT_DB_FILE_NAME),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub base_url: Option<String>,
    /// Snapshot file; defaults under the platform data directory.
    pub snapshot_path: Option<PathBuf>,
    /// Unset means requests may wait indefinitely.
    pub request_timeout_secs: Option<u64>,
}

impl ClientConfig {
    pub fn base_url(&self) -> &str {
        self.base_url.as_deref().unwrap_or(DEFAULT_BASE_URL)
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }

    /// Configured snapshot path, else `<data_dir>/orbitview/three_viewer_presets.json`.
    pub fn resolve_snapshot_path(&self) -> Result<PathBuf, ConfigError> {
        if let Some(path) = &self.snapshot_path {
            return Ok(path.clone());
        }
        dirs::data_dir()
            .map(|dir| {
                dir.join(APP_DIR_NAME).join(format!(
                    "{}.json",
                    crate::client::snapshot::SNAPSHOT_KEY
                ))
            })
            .ok_or_else(|| {
                ConfigError::Invalid(
                    "could not determine data directory; set client.snapshot_path".to_string(),
                )
            })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    /// Absolute directory for rolling log files; stderr when unset.
    pub log_dir: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: crate::logging::default_log_level().to_string(),
            log_dir: None,
        }
    }
}

impl LoggingConfig {
    /// Starts rolling file logs when `log_dir` is set, stderr logs otherwise.
    pub fn init(&self) -> Result<(), String> {
        match &self.log_dir {
            Some(dir) => crate::logging::init_logging(&self.level, &dir.to_string_lossy()),
            None => crate::logging::init_stderr_logging(&self.level),
        }
    }
}

/// Top-level configuration document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct OrbitViewConfig {
    pub server: ServerConfig,
    pub client: ClientConfig,
    pub logging: LoggingConfig,
}

impl OrbitViewConfig {
    /// Loads configuration from `path` (when given), then the process environment.
    ///
    /// # Errors
    /// - `Io` / `Parse` when the given file cannot be read or decoded.
    /// - `Invalid` when the merged values fail validation.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_toml_str(contents: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(contents)
    }

    /// Applies overrides looked up by variable name.
    ///
    /// `PORT` replaces only the port of `server.bind`; `ORBITVIEW_BIND` wins over it.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(port) = lookup(ENV_PORT) {
            let host = self
                .server
                .bind
                .rsplit_once(':')
                .map_or(self.server.bind.as_str(), |(host, _)| host);
            self.server.bind = format!("{host}:{}", port.trim());
        }
        if let Some(bind) = lookup(ENV_BIND) {
            self.server.bind = bind;
        }
        if let Some(db_path) = lookup(ENV_DB_PATH) {
            self.server.db_path = PathBuf::from(db_path);
        }
        if let Some(base_url) = lookup(ENV_BASE_URL) {
            self.client.base_url = Some(base_url);
        }
        if let Some(level) = lookup(ENV_LOG_LEVEL) {
            self.logging.level = level;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.bind.trim().is_empty() {
            return Err(ConfigError::Invalid("server.bind cannot be empty".to_string()));
        }
        if self.server.db_path.as_os_str().is_empty() {
            return Err(ConfigError::Invalid(
                "server.db_path cannot be empty".to_string(),
            ));
        }
        if self.client.base_url().trim().is_empty() {
            return Err(ConfigError::Invalid(
                "client.base_url cannot be empty".to_string(),
            ));
        }
        if self.client.request_timeout_secs == Some(0) {
            return Err(ConfigError::Invalid(
                "client.request_timeout_secs must be greater than zero".to_string(),
            ));
        }
        crate::logging::normalize_level(&self.logging.level).map_err(ConfigError::Invalid)?;
        if let Some(log_dir) = &self.logging.log_dir {
            if !log_dir.is_absolute() {
                return Err(ConfigError::Invalid(format!(
                    "logging.log_dir must be an absolute path, got `{}`",
                    log_dir.display()
                )));
            }
        }
        Ok(())
    }
}
