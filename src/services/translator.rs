use std::sync::Arc;

use tracing::debug;

use crate::error::TransformError;
use crate::services::deepl::TranslationService;
use crate::services::transform::ScalarTransform;
use crate::services::translation_memory::cache::TranslationCache;
use crate::services::translit::translit;

/// Remote translation with memoization.
///
/// Text with nothing to transliterate is returned as is, without a remote call.
pub struct CachedTranslator {
    service: Arc<dyn TranslationService>,
    cache: TranslationCache,
}

impl CachedTranslator {
    /// The cache decides the memo lifetime: pass `TranslationCache::new()` for
    /// a private one, or a clone of an existing cache to share it.
    pub fn new(service: Arc<dyn TranslationService>, cache: TranslationCache) -> Self {
        Self { service, cache }
    }

    pub fn cache(&self) -> &TranslationCache {
        &self.cache
    }
}

impl ScalarTransform for CachedTranslator {
    fn transform(&mut self, text: &str) -> Result<String, TransformError> {
        if translit(text) == text {
            return Ok(text.to_string());
        }

        self.cache.get_or_translate(text, || {
            let translated = self.service.translate(text)?;
            debug!(chars = text.chars().count(), "translated");
            Ok(translated)
        })
    }
}
