use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::schema::ScreenDocument;
use crate::store::{StoreError, TemplateKey, TemplateStore};

/// In-memory template store, for fixtures and embedded templates.
#[derive(Default)]
pub struct MemoryTemplateStore {
    templates: RwLock<HashMap<TemplateKey, ScreenDocument>>,
}

impl MemoryTemplateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `document` as the default template for its own id.
    pub fn insert(&self, document: ScreenDocument) {
        let key = TemplateKey::new(document.id.clone());
        self.templates.write().insert(key, document);
    }

    /// Store `document` as the `variant` template for its own id.
    pub fn insert_variant(&self, variant: impl Into<String>, document: ScreenDocument) {
        let key = TemplateKey::with_variant(document.id.clone(), variant);
        self.templates.write().insert(key, document);
    }

    pub fn with_document(self, document: ScreenDocument) -> Self {
        self.insert(document);
        self
    }

    pub fn len(&self) -> usize {
        self.templates.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.read().is_empty()
    }
}

#[async_trait]
impl TemplateStore for MemoryTemplateStore {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn load(&self, key: &TemplateKey) -> Result<Option<ScreenDocument>, StoreError> {
        Ok(self.templates.read().get(key).cloned())
    }

    async fn screen_ids(&self) -> Result<Vec<String>, StoreError> {
        let mut ids: Vec<String> = self
            .templates
            .read()
            .keys()
            .map(|key| key.screen_id.clone())
            .collect();
        ids.sort();
        ids.dedup();
        Ok(ids)
    }
}
