//! LibreTranslate provider
//!
//! Works against the public instance or a self-hosted one. Instances
//! expect the base two-letter code, so `pt-BR` is sent as `pt`.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{http_client, snippet, unescape_html, Translator};

const LIBRETRANSLATE_URL: &str = "https://libretranslate.com/translate";

pub struct LibreTranslateTranslator {
    client: reqwest::Client,
    /// Some instances require a key; sent only when set
    api_key: Option<String>,
    endpoint: String,
}

impl LibreTranslateTranslator {
    pub fn new(api_key: Option<&str>) -> Self {
        Self {
            client: http_client(),
            api_key: api_key.map(str::to_string),
            endpoint: LIBRETRANSLATE_URL.to_string(),
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }
}

/// `pt-BR` → `pt`
fn base_code(target: &str) -> String {
    target
        .split('-')
        .next()
        .unwrap_or(target)
        .to_lowercase()
}

#[async_trait]
impl Translator for LibreTranslateTranslator {
    fn name(&self) -> &str {
        "libretranslate"
    }

    async fn translate(&self, text: &str, target: &str) -> Result<String> {
        let target = base_code(target);
        let payload = LibreRequest {
            q: text,
            source: "auto",
            target: &target,
            format: "text",
            api_key: self.api_key.as_deref(),
        };

        tracing::debug!(provider = "libretranslate", target = %target, endpoint = %self.endpoint, "Sending translation request");

        let response = self
            .client
            .post(&self.endpoint)
            .json(&payload)
            .send()
            .await
            .context("Failed to send request to LibreTranslate")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("LibreTranslate HTTP {}: {}", status.as_u16(), snippet(&body));
        }

        let parsed: LibreResponse = response
            .json()
            .await
            .context("Failed to parse LibreTranslate response")?;

        parsed
            .translated_text
            .or(parsed.translation)
            .filter(|t| !t.is_empty())
            .map(|t| unescape_html(&t))
            .context("LibreTranslate response missing 'translatedText'")
    }
}

// ============================================================================
// API TYPES
// ============================================================================

#[derive(Debug, Serialize)]
struct LibreRequest<'a> {
    q: &'a str,
    source: &'a str,
    target: &'a str,
    format: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    api_key: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct LibreResponse {
    #[serde(rename = "translatedText")]
    translated_text: Option<String>,
    translation: Option<String>,
}
