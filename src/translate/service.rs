//! Translation service used by the synchronizer

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use dashmap::DashMap;

use super::tokens::{
    extract_tokens, is_only_tokens_or_whitespace, looks_like_url_or_html, restore_tokens,
    strip_mock_prefix,
};
use super::{MockTranslator, Translator};
use crate::limits::RateLimiter;

/// Outcome of translating one string
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Translation {
    /// Provider (or cache) produced text
    Translated(String),
    /// Not display text (blank, URL, HTML, tokens only); keep the source
    Unchanged,
    /// Provider failed; the caller keeps the source text
    Failed(String),
}

/// Wraps a [`Translator`] with the per-run policy: skip rules, placeholder
/// shielding, an in-run cache and the shared rate limiter.
pub struct TranslationService {
    translator: Arc<dyn Translator>,
    limiter: Arc<RateLimiter>,
    /// (source text, language code) → translated text; failures are never cached
    cache: DashMap<(String, String), String>,
    provider_calls: AtomicUsize,
}

impl TranslationService {
    pub fn new(translator: Arc<dyn Translator>, limiter: Arc<RateLimiter>) -> Self {
        Self {
            translator,
            limiter,
            cache: DashMap::new(),
            provider_calls: AtomicUsize::new(0),
        }
    }

    /// Mock provider without rate limiting
    pub fn mock() -> Self {
        Self::new(
            Arc::new(MockTranslator::new()),
            Arc::new(RateLimiter::new(1000.0, 1000)),
        )
    }

    pub fn translator_name(&self) -> &str {
        self.translator.name()
    }

    /// Number of requests that actually reached the provider
    pub fn provider_calls(&self) -> usize {
        self.provider_calls.load(Ordering::Relaxed)
    }

    pub async fn translate(&self, text: &str, code: &str) -> Translation {
        let source = if self.translator.name() == "mock" {
            text
        } else {
            strip_mock_prefix(text, code)
        };

        if is_only_tokens_or_whitespace(source) || looks_like_url_or_html(source) {
            return Translation::Unchanged;
        }

        let key = (source.to_string(), code.to_string());
        if let Some(hit) = self.cache.get(&key) {
            tracing::trace!(language = %code, "Translation cache hit");
            return Translation::Translated(hit.value().clone());
        }

        let (shielded, placeholders) = extract_tokens(source);
        self.limiter.acquire().await;
        self.provider_calls.fetch_add(1, Ordering::Relaxed);

        match self.translator.translate(&shielded, code).await {
            Ok(raw) => {
                let translated = restore_tokens(&raw, &placeholders);
                self.cache.insert(key, translated.clone());
                Translation::Translated(translated)
            }
            Err(e) => {
                tracing::warn!(
                    provider = self.translator.name(),
                    language = %code,
                    error = %e,
                    "Translation failed"
                );
                Translation::Failed(format!("{:#}", e))
            }
        }
    }
}
