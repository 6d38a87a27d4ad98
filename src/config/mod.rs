//! Service configuration: TOML file, defaults and validation.

mod loader;
mod types;

pub use loader::ConfigError;
pub use types::{
    Config, InterpreterConfig, ResourcesConfig, ServerConfig, TemplatesConfig, MAX_DEPTH_LIMIT,
};
