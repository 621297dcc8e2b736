//! DeepL provider
//!
//! Uses the v2 `/translate` endpoint with `DeepL-Auth-Key` authentication.
//! DeepL expects upper-case target codes (`ES`, `PT-BR`).

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{http_client, snippet, unescape_html, Translator};

const DEEPL_API_URL: &str = "https://api.deepl.com/v2/translate";

pub struct DeepLTranslator {
    client: reqwest::Client,
    api_key: String,
    endpoint: String,
}

impl DeepLTranslator {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: http_client(),
            api_key: api_key.into(),
            endpoint: DEEPL_API_URL.to_string(),
        }
    }

    /// Point at another endpoint (free tier `api-free.deepl.com`, test server)
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }
}

#[async_trait]
impl Translator for DeepLTranslator {
    fn name(&self) -> &str {
        "deepl"
    }

    async fn translate(&self, text: &str, target: &str) -> Result<String> {
        let payload = DeepLRequest {
            text: vec![text],
            target_lang: target.to_uppercase(),
        };

        tracing::debug!(provider = "deepl", target = %payload.target_lang, "Sending translation request");

        let response = self
            .client
            .post(&self.endpoint)
            .header("Authorization", format!("DeepL-Auth-Key {}", self.api_key))
            .json(&payload)
            .send()
            .await
            .context("Failed to send request to DeepL")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("DeepL HTTP {}: {}", status.as_u16(), snippet(&body));
        }

        let parsed: DeepLResponse = response
            .json()
            .await
            .context("Failed to parse DeepL response")?;

        parsed
            .translations
            .into_iter()
            .next()
            .map(|t| unescape_html(&t.text))
            .context("DeepL returned no translations")
    }

    fn is_available(&self) -> bool {
        !self.api_key.is_empty()
    }
}

// ============================================================================
// API TYPES
// ============================================================================

#[derive(Debug, Serialize)]
struct DeepLRequest<'a> {
    text: Vec<&'a str>,
    target_lang: String,
}

#[derive(Debug, Deserialize)]
struct DeepLResponse {
    #[serde(default)]
    translations: Vec<DeepLTranslation>,
}

#[derive(Debug, Deserialize)]
struct DeepLTranslation {
    text: String,
}
