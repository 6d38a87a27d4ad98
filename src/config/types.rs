use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Root configuration container.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub templates: TemplatesConfig,
    #[serde(default)]
    pub interpreter: InterpreterConfig,
    #[serde(default)]
    pub resources: ResourcesConfig,
}

/// HTTP listener settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Bind address for the screen service (host:port).
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
}

/// Where screen templates are stored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TemplatesConfig {
    /// Directory of `<screen-id>[.<locale>].json` files.
    #[serde(default)]
    pub directory: Option<PathBuf>,
    /// Load every template into the cache at startup.
    #[serde(default)]
    pub preload: bool,
}

/// Limits applied while evaluating component trees.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterpreterConfig {
    /// Maximum nesting depth, counting containers and list items (default: 32).
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
}

/// Out-of-band image fetching.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourcesConfig {
    /// Per-fetch timeout in seconds (default: 10).
    #[serde(default = "default_fetch_timeout")]
    pub fetch_timeout_seconds: u64,
    /// Largest accepted resource body in bytes (default: 5 MiB).
    #[serde(default = "default_max_bytes")]
    pub max_bytes: usize,
    /// Loaded bytes kept in memory before the oldest are evicted (default: 64 MiB).
    #[serde(default = "default_cache_bytes")]
    pub cache_bytes: usize,
}

pub const MAX_DEPTH_LIMIT: usize = 256;

fn default_bind_addr() -> String {
    "127.0.0.1:8080".to_string()
}

fn default_max_depth() -> usize {
    32
}

fn default_fetch_timeout() -> u64 {
    10
}

fn default_max_bytes() -> usize {
    5 * 1024 * 1024
}

fn default_cache_bytes() -> usize {
    64 * 1024 * 1024
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
        }
    }
}

impl Default for InterpreterConfig {
    fn default() -> Self {
        Self {
            max_depth: default_max_depth(),
        }
    }
}

impl Default for ResourcesConfig {
    fn default() -> Self {
        Self {
            fetch_timeout_seconds: default_fetch_timeout(),
            max_bytes: default_max_bytes(),
            cache_bytes: default_cache_bytes(),
        }
    }
}
