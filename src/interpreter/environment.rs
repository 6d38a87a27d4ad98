//! Bindings read by an evaluation pass.
//!
//! Keys are dot-paths (`user.role`, `job.count`). A lookup first tries the
//! whole path as a key, then walks into nested objects/arrays from the
//! longest bound prefix, so `{"user.name": "Jane"}` and
//! `{"user": {"name": "Jane"}}` both answer `user.name`. `null` counts as
//! absent.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::resolve::ScreenContext;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Environment {
    bindings: BTreeMap<String, Value>,
}

impl Environment {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed bindings from a request context.
    ///
    /// Binds `user.id`, `route.id`, `service.date` (RFC3339), `device.model`,
    /// `app.version` and `locale` for whichever fields are present.
    pub fn from_context(context: &ScreenContext) -> Self {
        let mut env = Self::new();
        let fields = [
            ("user.id", context.user_id.clone()),
            ("route.id", context.route_id.clone()),
            ("service.date", context.service_date.map(|d| d.to_rfc3339())),
            ("device.model", context.device_model.clone()),
            ("app.version", context.app_version.clone()),
            ("locale", context.locale.clone()),
        ];
        for (key, value) in fields {
            if let Some(value) = value {
                env.insert(key, Value::String(value));
            }
        }
        env
    }

    /// Build from a JSON object; any other value yields an empty environment.
    pub fn from_json(value: Value) -> Self {
        match value {
            Value::Object(map) => Self {
                bindings: map.into_iter().collect(),
            },
            _ => Self::default(),
        }
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.bindings.insert(key.into(), value.into());
    }

    /// Copy every binding of `other` over this environment.
    pub fn overlay(&mut self, other: &Environment) {
        for (key, value) in &other.bindings {
            self.bindings.insert(key.clone(), value.clone());
        }
    }

    pub fn get(&self, path: &str) -> Option<&Value> {
        if let Some(value) = self.bindings.get(path) {
            return present(value);
        }
        // Longest bound prefix first.
        for (split, _) in path.rmatch_indices('.') {
            let (prefix, rest) = (&path[..split], &path[split + 1..]);
            if let Some(root) = self.bindings.get(prefix) {
                return walk(root, rest);
            }
        }
        None
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

/// Follow a dot-path through objects (by key) and arrays (by index).
pub(crate) fn walk<'v>(root: &'v Value, path: &str) -> Option<&'v Value> {
    if path.is_empty() {
        return present(root);
    }
    let mut current = root;
    for segment in path.split('.') {
        current = match current {
            Value::Object(map) => map.get(segment)?,
            Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    present(current)
}

fn present(value: &Value) -> Option<&Value> {
    (!value.is_null()).then_some(value)
}

/// A read-only view used during evaluation: the caller's environment plus
/// any list item overlays, innermost first.
///
/// `item` and `item.*` resolve against the innermost item that has the
/// field, then outer items, then the environment itself.
#[derive(Debug, Clone, Copy)]
pub struct Scope<'a> {
    env: &'a Environment,
    item: Option<&'a Value>,
    parent: Option<&'a Scope<'a>>,
}

const ITEM: &str = "item";

impl<'a> Scope<'a> {
    pub fn root(env: &'a Environment) -> Self {
        Self {
            env,
            item: None,
            parent: None,
        }
    }

    /// A child scope overlaying `item` on top of this one.
    pub fn with_item(&'a self, item: &'a Value) -> Scope<'a> {
        Scope {
            env: self.env,
            item: Some(item),
            parent: Some(self),
        }
    }

    pub fn lookup(&self, path: &str) -> Option<&'a Value> {
        if let (Some(item), Some(rest)) = (self.item, item_path(path)) {
            if let Some(found) = walk(item, rest) {
                return Some(found);
            }
        }
        match self.parent {
            Some(parent) => parent.lookup(path),
            None => self.env.get(path),
        }
    }
}

/// `item` → `""`, `item.a.b` → `"a.b"`, anything else → `None`.
fn item_path(path: &str) -> Option<&str> {
    let rest = path.strip_prefix(ITEM)?;
    if rest.is_empty() {
        return Some("");
    }
    rest.strip_prefix('.')
}
