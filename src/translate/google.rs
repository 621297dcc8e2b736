//! Google Cloud Translation (v2) provider

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{http_client, snippet, unescape_html, Translator};

const GOOGLE_API_URL: &str = "https://translation.googleapis.com/language/translate/v2";

pub struct GoogleTranslator {
    client: reqwest::Client,
    api_key: String,
    endpoint: String,
}

impl GoogleTranslator {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: http_client(),
            api_key: api_key.into(),
            endpoint: GOOGLE_API_URL.to_string(),
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }
}

#[async_trait]
impl Translator for GoogleTranslator {
    fn name(&self) -> &str {
        "google"
    }

    async fn translate(&self, text: &str, target: &str) -> Result<String> {
        let payload = GoogleRequest {
            q: text,
            target,
            format: "text",
        };

        tracing::debug!(provider = "google", target = %target, "Sending translation request");

        let response = self
            .client
            .post(&self.endpoint)
            .query(&[("key", self.api_key.as_str())])
            .json(&payload)
            .send()
            .await
            .context("Failed to send request to Google Translate")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Google Translate HTTP {}: {}", status.as_u16(), snippet(&body));
        }

        let parsed: GoogleResponse = response
            .json()
            .await
            .context("Failed to parse Google Translate response")?;

        parsed
            .data
            .translations
            .into_iter()
            .next()
            .map(|t| unescape_html(&t.translated_text))
            .context("Google Translate returned no translations")
    }

    fn is_available(&self) -> bool {
        !self.api_key.is_empty()
    }
}

// ============================================================================
// API TYPES
// ============================================================================

#[derive(Debug, Serialize)]
struct GoogleRequest<'a> {
    q: &'a str,
    target: &'a str,
    format: &'a str,
}

#[derive(Debug, Deserialize)]
struct GoogleResponse {
    data: GoogleData,
}

#[derive(Debug, Deserialize)]
struct GoogleData {
    #[serde(default)]
    translations: Vec<GoogleTranslation>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GoogleTranslation {
    translated_text: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_google_response_parsing() {
        let raw = r#"{"data": {"translations": [{"translatedText": "Hola &amp; adiós", "detectedSourceLanguage": "en"}]}}"#;
        let parsed: GoogleResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(
            unescape_html(&parsed.data.translations[0].translated_text),
            "Hola & adiós"
        );
    }

    #[test]
    fn test_google_name() {
        assert_eq!(GoogleTranslator::new("k").name(), "google");
    }
}
