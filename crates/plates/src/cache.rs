//! Thread-safe template cache.
//!
//! [`TemplateCache`] is a manual memoization table: callers key it by template
//! name or path and skip re-resolving on a hit. It has no eviction, expiry or
//! size bound.
//!
//! Reads take a shared lock; `insert`, `remove` and `clear` take the exclusive
//! lock. Concurrent callers racing an insert against a get on the same key may
//! observe either value.
//!
//! ```rust
//! use plates::{engine, Factory, TemplateCache};
//! use serde_json::json;
//!
//! let factory = Factory::new("cached").default_parser(engine::text_parser);
//! let cache = TemplateCache::new();
//!
//! let tmpl = cache.get_or_insert_with("greeting", || factory.from_source("Hi {{ name }}"));
//! assert_eq!(tmpl.render(&json!({"name": "Bo"})).unwrap(), "Hi Bo");
//! assert!(cache.get("greeting").is_some());
//! ```

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::template::Template;

/// Concurrency-safe map from key to resolved [`Template`].
#[derive(Debug, Default)]
pub struct TemplateCache {
    items: RwLock<HashMap<String, Template>>,
}

impl TemplateCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, Template>> {
        self.items.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, Template>> {
        self.items.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Stores `template` under `key`, replacing any previous entry.
    pub fn insert(&self, key: impl Into<String>, template: Template) {
        self.write().insert(key.into(), template);
    }

    /// Returns the template cached under `key`.
    pub fn get(&self, key: &str) -> Option<Template> {
        self.read().get(key).cloned()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.read().contains_key(key)
    }

    /// Removes `key`. Does nothing if the key is not cached.
    pub fn remove(&self, key: &str) {
        self.write().remove(key);
    }

    /// Discards every entry.
    pub fn clear(&self) {
        *self.write() = HashMap::new();
    }

    /// Returns the cached template, resolving and storing it on a miss.
    ///
    /// `resolve` runs without any lock held, so two threads missing the same
    /// key may both resolve it; the first stored entry is kept and returned
    /// to both.
    pub fn get_or_insert_with<F>(&self, key: &str, resolve: F) -> Template
    where
        F: FnOnce() -> Template,
    {
        if let Some(template) = self.get(key) {
            return template;
        }

        let template = resolve();
        self.write()
            .entry(key.to_string())
            .or_insert(template)
            .clone()
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }
}
