/*!
 * Best-effort translation of statement text.
 *
 * - `cache`: the persistent source-text → translation table
 *
 * The `Translator` puts the cache in front of a remote provider. Translation
 * only ever improves the output: whenever no translation can be had, the
 * source text is used unchanged and the conversion carries on.
 */

use log::{debug, warn};

use crate::providers::Translate;

pub use self::cache::TranslationCache;

pub mod cache;

/// Counters for one conversion run
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TranslatorStats {
    /// Texts answered from the cache
    pub cache_hits: usize,
    /// Requests sent to the provider
    pub remote_calls: usize,
    /// Requests that failed and fell back to the source text
    pub failures: usize,
}

/// Cache-first translator with fallback to the source text
pub struct Translator {
    /// Whether translation was requested at all
    enabled: bool,
    /// ISO 639-1 target language
    target_language: String,
    cache: TranslationCache,
    /// Remote provider; `None` when no API key is available
    provider: Option<Box<dyn Translate>>,
    /// Render as "translation (source)" instead of the bare translation
    append_source_text: bool,
    /// Set after an authentication or quota failure
    suspended: bool,
    /// The missing-provider warning was already logged
    warned_no_provider: bool,
    stats: TranslatorStats,
}

impl Translator {
    /// A translator that returns every text unchanged
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            target_language: String::new(),
            cache: TranslationCache::in_memory(),
            provider: None,
            append_source_text: false,
            suspended: false,
            warned_no_provider: false,
            stats: TranslatorStats::default(),
        }
    }

    /// An enabled translator
    pub fn new(
        target_language: impl Into<String>,
        cache: TranslationCache,
        provider: Option<Box<dyn Translate>>,
    ) -> Self {
        Self {
            enabled: true,
            target_language: target_language.into(),
            cache,
            provider,
            append_source_text: true,
            suspended: false,
            warned_no_provider: false,
            stats: TranslatorStats::default(),
        }
    }

    /// Choose between "translation (source)" and the bare translation
    pub fn with_source_text(mut self, append_source_text: bool) -> Self {
        self.append_source_text = append_source_text;
        self
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn stats(&self) -> TranslatorStats {
        self.stats
    }

    pub fn cache(&self) -> &TranslationCache {
        &self.cache
    }

    /// Text to put in the output for `text`.
    ///
    /// Returns the source text verbatim when translation is disabled, the
    /// text is blank, or no translation could be obtained.
    pub async fn translate_field(&mut self, text: &str) -> String {
        if !self.enabled || text.trim().is_empty() {
            return text.to_string();
        }

        match self.translate_text(text).await {
            Some(translation) => self.render(text, &translation),
            None => text.to_string(),
        }
    }

    /// Raw translation of `text`, from the cache or the provider
    async fn translate_text(&mut self, text: &str) -> Option<String> {
        if let Some(cached) = self.cache.lookup(text) {
            self.stats.cache_hits += 1;
            return Some(cached);
        }

        if self.suspended {
            return None;
        }

        let Some(provider) = &self.provider else {
            if !self.warned_no_provider {
                warn!("No translation API key configured; only cached translations will be used");
                self.warned_no_provider = true;
            }
            return None;
        };

        self.stats.remote_calls += 1;
        match provider.translate(text, &self.target_language).await {
            Ok(translation) => {
                debug!("{} translated '{}' as '{}'", provider.name(), text, translation);
                if let Err(e) = self.cache.store(text, &translation) {
                    warn!("Could not persist translation cache entry: {:#}", e);
                }
                Some(translation)
            }
            Err(e) => {
                self.stats.failures += 1;
                warn!("Translation failed for '{}', keeping source text: {}", text, e);
                if e.is_fatal_for_session() {
                    warn!("Suspending remote translation for the rest of this run");
                    self.suspended = true;
                }
                None
            }
        }
    }

    fn render(&self, source: &str, translation: &str) -> String {
        let translation = translation.trim();
        if translation.is_empty() || translation == source {
            source.to_string()
        } else if self.append_source_text {
            format!("{} ({})", translation, source)
        } else {
            translation.to_string()
        }
    }
}
