use std::sync::Arc;

use moka::sync::Cache as MokaCache;

use super::hash;
use crate::error::TransformError;

/// Source text to translated text, kept for the life of the process only.
///
/// Clones share the same storage, so a cache can be handed to several
/// translators on purpose. `TranslationCache::new()` always starts empty.
#[derive(Clone)]
pub struct TranslationCache {
    entries: MokaCache<String, String>,
}

impl Default for TranslationCache {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for TranslationCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TranslationCache")
            .field("entries", &self.entries.entry_count())
            .finish()
    }
}

impl TranslationCache {
    pub fn new() -> Self {
        Self {
            entries: MokaCache::builder().build(),
        }
    }

    pub fn get(&self, source: &str) -> Option<String> {
        self.entries.get(&hash::hash_text(source))
    }

    pub fn insert(&self, source: &str, translation: &str) {
        self.entries
            .insert(hash::hash_text(source), translation.to_string());
    }

    /// Cached translation of `source`, or the result of `translate`.
    ///
    /// Concurrent callers asking for the same missing text wait for a single
    /// `translate` call. Errors are returned and never stored.
    pub fn get_or_translate(
        &self,
        source: &str,
        translate: impl FnOnce() -> Result<String, TransformError>,
    ) -> Result<String, TransformError> {
        self.entries
            .try_get_with(hash::hash_text(source), translate)
            .map_err(Arc::unwrap_or_clone)
    }

    pub fn len(&self) -> usize {
        self.entries.run_pending_tasks();
        self.entries.entry_count() as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
