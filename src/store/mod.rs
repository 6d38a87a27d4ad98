//! Template stores: read-mostly repositories of screen templates.
//!
//! A store maps a [`TemplateKey`] (screen id plus optional variant, e.g. a
//! locale) to a [`ScreenDocument`]. Stores are consulted by the resolver,
//! which caches what they return; they never see environment data.

mod directory;
mod memory;

use std::fmt;
use std::path::PathBuf;

use async_trait::async_trait;
use thiserror::Error;

use crate::schema::ScreenDocument;

pub use directory::DirectoryTemplateStore;
pub use memory::MemoryTemplateStore;

/// Lookup key for a stored template.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TemplateKey {
    pub screen_id: String,
    /// Template variant, currently a locale tag such as `en-US` or `fr`.
    pub variant: Option<String>,
}

impl TemplateKey {
    pub fn new(screen_id: impl Into<String>) -> Self {
        Self {
            screen_id: screen_id.into(),
            variant: None,
        }
    }

    pub fn with_variant(screen_id: impl Into<String>, variant: impl Into<String>) -> Self {
        Self {
            screen_id: screen_id.into(),
            variant: Some(variant.into()),
        }
    }
}

impl fmt::Display for TemplateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.variant {
            Some(variant) => write!(f, "{}.{}", self.screen_id, variant),
            None => write!(f, "{}", self.screen_id),
        }
    }
}

/// Errors raised by a template store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backing store cannot be reached or read.
    #[error("Template store '{store}' unavailable: {reason}")]
    Unavailable { store: &'static str, reason: String },

    /// A template exists but is not a valid screen document.
    #[error("Template '{key}' is malformed: {source}")]
    Malformed {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    /// Reading a template file failed.
    #[error("Failed to read template '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// A source of screen templates.
///
/// Implementations must be safe to call concurrently. Returning `Ok(None)`
/// means the key is unknown; errors mean the store itself failed.
#[async_trait]
pub trait TemplateStore: Send + Sync {
    /// Returns the name of this store for logging.
    fn name(&self) -> &'static str;

    /// Load the template stored under `key`.
    async fn load(&self, key: &TemplateKey) -> Result<Option<ScreenDocument>, StoreError>;

    /// Every screen id the store can enumerate, for cache warming.
    ///
    /// Default implementation enumerates nothing.
    async fn screen_ids(&self) -> Result<Vec<String>, StoreError> {
        Ok(Vec::new())
    }

    /// Check the store is reachable. Used by the readiness check.
    ///
    /// Default implementation always succeeds.
    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}
