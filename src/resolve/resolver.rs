use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use parking_lot::RwLock;
use thiserror::Error;

use crate::resolve::ScreenContext;
use crate::schema::ScreenDocument;
use crate::store::{StoreError, TemplateKey, TemplateStore};

/// Errors surfaced by screen resolution.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("Screen id must not be empty")]
    InvalidScreenId,

    #[error("Screen '{screen_id}' not found")]
    NotFound { screen_id: String },

    #[error("Template store unavailable: {0}")]
    StoreUnavailable(#[source] StoreError),

    #[error("Template for screen '{screen_id}' is invalid: {source}")]
    InvalidTemplate {
        screen_id: String,
        #[source]
        source: StoreError,
    },
}

/// Remembered absent keys before the set is reset.
const MAX_CACHED_MISSES: usize = 4096;

#[derive(Default)]
struct TemplateCache {
    documents: HashMap<TemplateKey, Arc<ScreenDocument>>,
    /// Keys the store had no template for.
    misses: HashSet<TemplateKey>,
}

/// Looks up screen templates for request contexts.
///
/// Templates are immutable at rest, so each key is looked up in the store
/// once, found or not, and shared across requests until
/// [`invalidate`](Self::invalidate). The cache lock is only taken around map
/// access, never across a store load, so concurrent misses on the same key
/// may both hit the store; the first insert wins.
pub struct ScreenResolver {
    store: Arc<dyn TemplateStore>,
    cache: RwLock<TemplateCache>,
}

impl ScreenResolver {
    pub fn new(store: Arc<dyn TemplateStore>) -> Self {
        Self {
            store,
            cache: RwLock::new(TemplateCache::default()),
        }
    }

    pub fn store(&self) -> &Arc<dyn TemplateStore> {
        &self.store
    }

    /// Resolve `screen_id` for `context`.
    ///
    /// Locale variants are tried before the default template. The returned
    /// document is the stored template; no environment values are bound.
    pub async fn resolve(
        &self,
        screen_id: &str,
        context: &ScreenContext,
    ) -> Result<Arc<ScreenDocument>, ResolveError> {
        let screen_id = screen_id.trim();
        if screen_id.is_empty() {
            return Err(ResolveError::InvalidScreenId);
        }

        let keys = context
            .variant_candidates()
            .into_iter()
            .map(|variant| TemplateKey::with_variant(screen_id, variant))
            .chain(std::iter::once(TemplateKey::new(screen_id)));

        for key in keys {
            if let Some(document) = self.lookup(&key).await? {
                tracing::debug!(screen_id, key = %key, version = document.version, "Resolved screen");
                return Ok(document);
            }
        }

        tracing::info!(screen_id, "Screen not found");
        Err(ResolveError::NotFound {
            screen_id: screen_id.to_string(),
        })
    }

    async fn lookup(&self, key: &TemplateKey) -> Result<Option<Arc<ScreenDocument>>, ResolveError> {
        {
            let cache = self.cache.read();
            if let Some(document) = cache.documents.get(key) {
                return Ok(Some(document.clone()));
            }
            if cache.misses.contains(key) {
                return Ok(None);
            }
        }

        let loaded = self.store.load(key).await.map_err(|err| match err {
            StoreError::Malformed { .. } => ResolveError::InvalidTemplate {
                screen_id: key.screen_id.clone(),
                source: err,
            },
            other => {
                tracing::warn!(store = self.store.name(), error = %other, "Template store failed");
                ResolveError::StoreUnavailable(other)
            }
        })?;

        let mut cache = self.cache.write();
        let Some(document) = loaded else {
            if cache.misses.len() >= MAX_CACHED_MISSES {
                cache.misses.clear();
            }
            cache.misses.insert(key.clone());
            return Ok(None);
        };
        let entry = cache
            .documents
            .entry(key.clone())
            .or_insert_with(|| Arc::new(document));
        Ok(Some(entry.clone()))
    }

    /// Load every template the store can enumerate. Returns how many
    /// screens were cached; individual failures are logged and skipped.
    pub async fn warm(&self) -> Result<usize, ResolveError> {
        let ids = self
            .store
            .screen_ids()
            .await
            .map_err(ResolveError::StoreUnavailable)?;

        let mut warmed = 0;
        for id in ids {
            match self.lookup(&TemplateKey::new(id.clone())).await {
                Ok(Some(_)) => warmed += 1,
                Ok(None) => {}
                Err(err) => tracing::warn!(screen_id = %id, error = %err, "Skipping template during warm-up"),
            }
        }
        tracing::info!(count = warmed, "Template cache warmed");
        Ok(warmed)
    }

    /// Forget every cached template and miss so the next request goes back
    /// to the store.
    pub fn invalidate(&self) {
        let mut cache = self.cache.write();
        cache.documents.clear();
        cache.misses.clear();
    }

    /// Number of cached templates, not counting remembered misses.
    pub fn cached_len(&self) -> usize {
        self.cache.read().documents.len()
    }
}
