//! Client configuration from defaults and environment overrides.
//!
//! # Responsibility
//! - Provide one validated settings struct for the gateway, session store
//!   and logging.
//!
//! # Invariants
//! - `api_base_url` is http(s) and never ends with `/`.
//! - `session_dir` and `log_dir` are absolute.
//! - Defaults live in the per-user data directory; the temp directory is
//!   used only when the platform reports none.
//! - `log_level` is one of trace|debug|info|warn|error.

use crate::logging::{default_log_level, normalize_level};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

pub const ENV_API_URL: &str = "TASKTREE_API_URL";
pub const ENV_SESSION_DIR: &str = "TASKTREE_SESSION_DIR";
pub const ENV_LOG_LEVEL: &str = "TASKTREE_LOG_LEVEL";
pub const ENV_LOG_DIR: &str = "TASKTREE_LOG_DIR";

pub const DEFAULT_API_URL: &str = "http://localhost:5000/api";
const DATA_DIR_NAME: &str = "tasktree";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    InvalidUrl(String),
    RelativePath { field: &'static str, value: String },
    InvalidLogLevel(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidUrl(value) => {
                write!(f, "api url must start with http:// or https://, got `{value}`")
            }
            Self::RelativePath { field, value } => {
                write!(f, "{field} must be an absolute path, got `{value}`")
            }
            Self::InvalidLogLevel(details) => write!(f, "{details}"),
        }
    }
}

impl Error for ConfigError {}

/// Settings for one client process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub api_base_url: String,
    pub session_dir: PathBuf,
    pub log_level: String,
    pub log_dir: PathBuf,
}

impl Default for ClientConfig {
    fn default() -> Self {
        let data_dir = default_data_dir();
        Self {
            api_base_url: DEFAULT_API_URL.to_string(),
            session_dir: data_dir.clone(),
            log_level: default_log_level().to_string(),
            log_dir: data_dir.join("logs"),
        }
    }
}

impl ClientConfig {
    /// Defaults overridden by `TASKTREE_*` environment variables.
    ///
    /// # Errors
    /// - Returns the first invalid value found.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`ClientConfig::from_env`] with an injectable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let read = |key: &str| {
            lookup(key)
                .map(|raw| raw.trim().to_string())
                .filter(|value| !value.is_empty())
        };
        if let Some(url) = read(ENV_API_URL) {
            config.api_base_url = url;
        }
        if let Some(dir) = read(ENV_SESSION_DIR) {
            config.session_dir = PathBuf::from(dir);
        }
        if let Some(level) = read(ENV_LOG_LEVEL) {
            config.log_level = level;
        }
        if let Some(dir) = read(ENV_LOG_DIR) {
            config.log_dir = PathBuf::from(dir);
        }
        config.validated()
    }

    /// Normalizes and checks every field.
    pub fn validated(mut self) -> Result<Self, ConfigError> {
        self.api_base_url = normalize_url(&self.api_base_url)?;
        require_absolute("session_dir", &self.session_dir)?;
        require_absolute("log_dir", &self.log_dir)?;
        self.log_level = normalize_level(&self.log_level)
            .map_err(ConfigError::InvalidLogLevel)?
            .to_string();
        Ok(self)
    }

    /// Log directory as the string `init_logging` expects.
    pub fn log_dir_str(&self) -> String {
        self.log_dir.to_string_lossy().into_owned()
    }
}

fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join(DATA_DIR_NAME)
}

fn normalize_url(raw: &str) -> Result<String, ConfigError> {
    let trimmed = raw.trim().trim_end_matches('/');
    let lower = trimmed.to_ascii_lowercase();
    let has_host = ["http://", "https://"]
        .iter()
        .any(|scheme| lower.starts_with(scheme) && lower.len() > scheme.len());
    if !has_host {
        return Err(ConfigError::InvalidUrl(raw.trim().to_string()));
    }
    Ok(trimmed.to_string())
}

fn require_absolute(field: &'static str, path: &Path) -> Result<(), ConfigError> {
    if path.is_absolute() {
        return Ok(());
    }
    Err(ConfigError::RelativePath {
        field,
        value: path.display().to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::{ClientConfig, ConfigError, DEFAULT_API_URL, ENV_API_URL, ENV_LOG_LEVEL};
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_are_valid() {
        let config = ClientConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.api_base_url, DEFAULT_API_URL);
        assert!(config.session_dir.is_absolute());
    }

    #[test]
    fn default_session_dir_is_per_user() {
        let config = ClientConfig::default();
        if let Some(base) = dirs::data_local_dir() {
            assert!(config.session_dir.starts_with(base));
        }
        assert!(config.session_dir.ends_with("tasktree"));
        assert!(config.log_dir.starts_with(&config.session_dir));
    }

    #[test]
    fn env_overrides_are_normalized() {
        let config = ClientConfig::from_lookup(lookup(&[
            (ENV_API_URL, " https://tasks.example.com/api/ "),
            (ENV_LOG_LEVEL, "WARNING"),
        ]))
        .unwrap();
        assert_eq!(config.api_base_url, "https://tasks.example.com/api");
        assert_eq!(config.log_level, "warn");
    }

    #[test]
    fn rejects_bad_values() {
        let error = ClientConfig::from_lookup(lookup(&[(ENV_API_URL, "ftp://x")])).unwrap_err();
        assert!(matches!(error, ConfigError::InvalidUrl(_)));

        let error =
            ClientConfig::from_lookup(lookup(&[("TASKTREE_SESSION_DIR", "rel/dir")])).unwrap_err();
        assert!(matches!(
            error,
            ConfigError::RelativePath {
                field: "session_dir",
                ..
            }
        ));

        let error = ClientConfig::from_lookup(lookup(&[(ENV_LOG_LEVEL, "loud")])).unwrap_err();
        assert!(matches!(error, ConfigError::InvalidLogLevel(_)));
    }
}
