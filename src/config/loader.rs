use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::config::types::{Config, MAX_DEPTH_LIMIT};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Cannot read config '{path}': {source}")]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Config '{path}' is not valid TOML for sdui: {source}")]
    Malformed {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

impl Config {
    /// `sdui/config.toml` under the platform config dir, or the current
    /// directory when there is none.
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("sdui")
            .join("config.toml")
    }

    /// Load the default config file. No file means defaults.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::config_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            tracing::debug!(path = %path.display(), "No config file, using defaults");
            Ok(Self::default())
        }
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Unreadable {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Config = toml::from_str(&text).map_err(|source| ConfigError::Malformed {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the service cannot start with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Err(err) = self.server.bind_addr.parse::<SocketAddr>() {
            return Err(ConfigError::Invalid {
                key: "server.bind_addr",
                reason: format!("'{}' is not host:port ({err})", self.server.bind_addr),
            });
        }

        let depth = self.interpreter.max_depth;
        if !(1..=MAX_DEPTH_LIMIT).contains(&depth) {
            return Err(ConfigError::Invalid {
                key: "interpreter.max_depth",
                reason: format!("{depth} is outside 1..={MAX_DEPTH_LIMIT}"),
            });
        }

        if self.resources.fetch_timeout_seconds == 0 {
            return Err(ConfigError::Invalid {
                key: "resources.fetch_timeout_seconds",
                reason: "must be at least 1".to_string(),
            });
        }

        if self.resources.cache_bytes < self.resources.max_bytes {
            return Err(ConfigError::Invalid {
                key: "resources.cache_bytes",
                reason: format!(
                    "{} is smaller than resources.max_bytes ({})",
                    self.resources.cache_bytes, self.resources.max_bytes
                ),
            });
        }

        Ok(())
    }
}
