//! Filesystem-backed template store.
//!
//! Layout: one JSON document per file, `<screen-id>.json` for the default
//! template and `<screen-id>.<variant>.json` for variants.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::schema::ScreenDocument;
use crate::store::{StoreError, TemplateKey, TemplateStore};

pub struct DirectoryTemplateStore {
    root: PathBuf,
}

impl DirectoryTemplateStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// File backing `key`, or `None` when the key cannot name a file.
    fn path_for(&self, key: &TemplateKey) -> Option<PathBuf> {
        if !is_safe_segment(&key.screen_id) {
            return None;
        }
        let file_name = match &key.variant {
            Some(variant) if is_safe_segment(variant) => format!("{}.{}.json", key.screen_id, variant),
            Some(_) => return None,
            None => format!("{}.json", key.screen_id),
        };
        Some(self.root.join(file_name))
    }

    fn unavailable(&self, reason: impl Into<String>) -> StoreError {
        StoreError::Unavailable {
            store: self.name(),
            reason: reason.into(),
        }
    }
}

/// Path segments may not contain separators, dots or traversal.
fn is_safe_segment(segment: &str) -> bool {
    !segment.is_empty()
        && segment
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

#[async_trait]
impl TemplateStore for DirectoryTemplateStore {
    fn name(&self) -> &'static str {
        "directory"
    }

    async fn load(&self, key: &TemplateKey) -> Result<Option<ScreenDocument>, StoreError> {
        let Some(path) = self.path_for(key) else {
            tracing::debug!(key = %key, "Rejected template key that cannot name a file");
            return Ok(None);
        };

        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                self.ping().await?;
                return Ok(None);
            }
            Err(source) => return Err(StoreError::Io { path, source }),
        };

        let document = ScreenDocument::from_slice(&bytes).map_err(|source| StoreError::Malformed {
            key: key.to_string(),
            source,
        })?;
        tracing::debug!(key = %key, path = %path.display(), "Loaded template from disk");
        Ok(Some(document))
    }

    async fn screen_ids(&self) -> Result<Vec<String>, StoreError> {
        let mut entries = tokio::fs::read_dir(&self.root)
            .await
            .map_err(|e| self.unavailable(format!("{}: {e}", self.root.display())))?;

        let mut ids = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| self.unavailable(e.to_string()))?
        {
            let name = entry.file_name();
            let Some(stem) = name.to_str().and_then(|n| n.strip_suffix(".json")) else {
                continue;
            };
            if is_safe_segment(stem) {
                ids.push(stem.to_string());
            }
        }
        ids.sort();
        Ok(ids)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        match tokio::fs::metadata(&self.root).await {
            Ok(meta) if meta.is_dir() => Ok(()),
            Ok(_) => Err(self.unavailable(format!("{} is not a directory", self.root.display()))),
            Err(e) => Err(self.unavailable(format!("{}: {e}", self.root.display()))),
        }
    }
}
