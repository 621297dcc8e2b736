//! # Translation Layer
//!
//! Trait and implementations for machine-translation backends.
//!
//! ## Overview
//!
//! - [`Translator`] - Core trait: `text × target code → text`
//! - [`TranslationService`] - What the synchronizer talks to. Skips
//!   non-text, shields placeholder tokens, caches per run and rate-limits
//!   every provider call
//! - [`MockTranslator`] - Deterministic provider for tests and dry runs
//!
//! ## Available Providers
//!
//! | Provider | Requires | Notes |
//! |----------|----------|-------|
//! | `mock` | Nothing | Returns `"[<code>] <text>"` |
//! | `deepl` | API key | Upper-case target codes |
//! | `google` | API key | Cloud Translation v2 |
//! | `libretranslate` | Optional key | Two-letter target codes |
//!
//! ## Creating Translators
//!
//! ```rust
//! use sisloc::translate::create_translator;
//!
//! let mock = create_translator("mock", None, None);
//! assert!(mock.is_ok());
//!
//! let deepl = create_translator("deepl", None, None);
//! assert!(deepl.is_err()); // key required
//!
//! let unknown = create_translator("babelfish", None, None);
//! assert!(unknown.is_err());
//! ```

mod deepl;
mod google;
mod libretranslate;
mod mock;
mod service;
mod tokens;

pub use deepl::DeepLTranslator;
pub use google::GoogleTranslator;
pub use libretranslate::LibreTranslateTranslator;
pub use mock::MockTranslator;
pub use service::{Translation, TranslationService};
pub use tokens::{
    extract_tokens, is_only_tokens_or_whitespace, looks_like_url_or_html, restore_tokens,
    strip_mock_prefix,
};

use std::sync::Arc;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{Result, SislocError};

/// Request timeout for HTTP providers
const REQUEST_TIMEOUT_SECS: u64 = 20;

// ============================================================================
// TRANSLATOR TRAIT (ASYNC)
// ============================================================================

/// Core trait that all translation providers implement
///
/// Providers are stateless from the engine's point of view: one call per
/// string, no batching. Any error is treated as a transient failure of that
/// single string.
#[async_trait]
pub trait Translator: Send + Sync {
    /// Provider name (e.g., "mock", "deepl")
    fn name(&self) -> &str;

    /// Translate `text` into the language identified by `target`
    async fn translate(&self, text: &str, target: &str) -> anyhow::Result<String>;

    /// Check if this provider is usable (e.g., API key set)
    fn is_available(&self) -> bool {
        true
    }
}

// ============================================================================
// TRANSLATOR FACTORY
// ============================================================================

/// Create a translator instance by name
///
/// `endpoint` overrides the provider's default URL (self-hosted
/// LibreTranslate, DeepL free tier, test servers).
pub fn create_translator(
    name: &str,
    api_key: Option<&str>,
    endpoint: Option<&str>,
) -> Result<Arc<dyn Translator>> {
    let key = api_key.map(str::trim).filter(|k| !k.is_empty());
    let endpoint = endpoint.map(str::trim).filter(|e| !e.is_empty());
    let require_key = |provider: &str| {
        key.ok_or_else(|| SislocError::MissingTranslatorKey {
            name: provider.to_string(),
        })
    };

    let translator: Arc<dyn Translator> = match name.trim().to_lowercase().as_str() {
        "mock" => Arc::new(MockTranslator::new()),
        "deepl" => {
            let mut t = DeepLTranslator::new(require_key("deepl")?);
            if let Some(url) = endpoint {
                t = t.with_endpoint(url);
            }
            Arc::new(t)
        }
        "google" => {
            let mut t = GoogleTranslator::new(require_key("google")?);
            if let Some(url) = endpoint {
                t = t.with_endpoint(url);
            }
            Arc::new(t)
        }
        "libretranslate" => {
            let mut t = LibreTranslateTranslator::new(key);
            if let Some(url) = endpoint {
                t = t.with_endpoint(url);
            }
            Arc::new(t)
        }
        _ => {
            return Err(SislocError::UnknownTranslator {
                name: name.to_string(),
            })
        }
    };

    tracing::debug!(provider = translator.name(), "Translator created");
    Ok(translator)
}

/// HTTP client shared by the network providers
pub(crate) fn http_client() -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
        .build()
        .unwrap_or_default()
}

static HTML_ENTITY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"&(#[0-9]+|#[xX][0-9a-fA-F]+|[a-zA-Z]+);").unwrap());

/// Decode the HTML entities translation APIs put into plain-text results
pub(crate) fn unescape_html(text: &str) -> String {
    HTML_ENTITY
        .replace_all(text, |caps: &regex::Captures| {
            let entity = &caps[1];
            let decoded = match entity {
                "amp" => Some('&'),
                "lt" => Some('<'),
                "gt" => Some('>'),
                "quot" => Some('"'),
                "apos" => Some('\''),
                "nbsp" => Some('\u{a0}'),
                _ if entity.starts_with("#x") || entity.starts_with("#X") => {
                    u32::from_str_radix(&entity[2..], 16).ok().and_then(char::from_u32)
                }
                _ if entity.starts_with('#') => {
                    entity[1..].parse::<u32>().ok().and_then(char::from_u32)
                }
                _ => None,
            };
            decoded.map_or_else(|| caps[0].to_string(), String::from)
        })
        .into_owned()
}

/// Truncate an error body for logs and messages
pub(crate) fn snippet(body: &str) -> String {
    body.chars().take(200).collect()
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_translator_mock() {
        let translator = create_translator("mock", None, None).unwrap();
        assert_eq!(translator.name(), "mock");
        assert!(translator.is_available());
    }

    #[test]
    fn test_create_translator_requires_key() {
        let err = create_translator("google", Some("  "), None).err().unwrap();
        assert!(matches!(err, SislocError::MissingTranslatorKey { .. }));

        let google = create_translator("Google", Some("k"), None).unwrap();
        assert_eq!(google.name(), "google");
    }

    #[test]
    fn test_libretranslate_key_is_optional() {
        let libre = create_translator("libretranslate", None, Some("http://localhost:5000/translate"));
        assert_eq!(libre.unwrap().name(), "libretranslate");
    }

    #[test]
    fn test_create_translator_unknown() {
        let err = create_translator("babelfish", None, None).err().unwrap();
        assert!(matches!(err, SislocError::UnknownTranslator { .. }));
    }

    #[test]
    fn test_unescape_html() {
        assert_eq!(unescape_html("Tom &amp; Jerry"), "Tom & Jerry");
        assert_eq!(unescape_html("l&#39;accueil"), "l'accueil");
        assert_eq!(unescape_html("&#x4E2D;"), "中");
        assert_eq!(unescape_html("&bogus; stays"), "&bogus; stays");
    }
}
