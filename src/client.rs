//! Document stores: the remote API and local files

use std::path::PathBuf;

use async_trait::async_trait;
use url::Url;

use crate::config::redact;
use crate::document::Document;
use crate::error::{Result, SislocError};
use crate::schema::SchemaKind;

/// Where documents are fetched from and persisted to
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Short description for logs
    fn describe(&self) -> String;

    async fn fetch(&self, schema: SchemaKind, id: &str) -> Result<Document>;

    async fn persist(&self, schema: SchemaKind, id: &str, document: &Document) -> Result<()>;
}

// ============================================================================
// API CLIENT
// ============================================================================

/// Bearer-authenticated JSON client for `{base}/{collection}/{id}`
pub struct ApiClient {
    client: reqwest::Client,
    base: Url,
    token: String,
}

impl ApiClient {
    pub fn new(base_url: &str, token: impl Into<String>) -> Result<Self> {
        let mut base = Url::parse(base_url.trim()).map_err(|e| SislocError::InvalidUrl {
            url: base_url.to_string(),
            reason: e.to_string(),
        })?;
        if base.cannot_be_a_base() {
            return Err(SislocError::InvalidUrl {
                url: base_url.to_string(),
                reason: "not a base URL".to_string(),
            });
        }
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }

        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()?;

        Ok(Self {
            client,
            base,
            token: token.into(),
        })
    }

    pub fn resource_url(&self, schema: SchemaKind, id: &str) -> Result<Url> {
        let relative = format!("{}/{}", schema.api_segment(), id.trim());
        self.base.join(&relative).map_err(|e| SislocError::InvalidUrl {
            url: relative,
            reason: e.to_string(),
        })
    }

    async fn check(operation: String, response: reqwest::Response) -> Result<reqwest::Response> {
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status().as_u16();
        let body: String = response
            .text()
            .await
            .unwrap_or_default()
            .chars()
            .take(500)
            .collect();
        tracing::error!(operation = %operation, status, "API request failed");
        Err(SislocError::Http {
            operation,
            status,
            body,
        })
    }
}

#[async_trait]
impl DocumentStore for ApiClient {
    fn describe(&self) -> String {
        format!("api {}", self.base)
    }

    async fn fetch(&self, schema: SchemaKind, id: &str) -> Result<Document> {
        let url = self.resource_url(schema, id)?;
        tracing::info!(resource = schema.api_segment(), id = %redact(id), "Fetching document");

        let response = self
            .client
            .get(url)
            .bearer_auth(&self.token)
            .header("Accept", "application/json")
            .send()
            .await?;
        let response = Self::check(format!("GET {}/{}", schema.api_segment(), redact(id)), response).await?;

        let value: serde_json::Value =
            response
                .json()
                .await
                .map_err(|e| SislocError::UnexpectedResponse {
                    details: e.to_string(),
                })?;
        Document::from_value(value, schema)
    }

    async fn persist(&self, schema: SchemaKind, id: &str, document: &Document) -> Result<()> {
        let url = self.resource_url(schema, id)?;
        tracing::info!(resource = schema.api_segment(), id = %redact(id), "Persisting document");

        let response = self
            .client
            .put(url)
            .bearer_auth(&self.token)
            .header("Accept", "application/json")
            .json(&document.to_value())
            .send()
            .await?;
        Self::check(format!("PUT {}/{}", schema.api_segment(), redact(id)), response).await?;
        Ok(())
    }
}

// ============================================================================
// FILE STORE
// ============================================================================

/// Reads the document from a file; writes to `output` or back in place
pub struct FileStore {
    input: PathBuf,
    output: Option<PathBuf>,
}

impl FileStore {
    pub fn new(input: impl Into<PathBuf>) -> Self {
        Self {
            input: input.into(),
            output: None,
        }
    }

    pub fn with_output(mut self, output: impl Into<PathBuf>) -> Self {
        self.output = Some(output.into());
        self
    }

    pub fn output_path(&self) -> &PathBuf {
        self.output.as_ref().unwrap_or(&self.input)
    }
}

#[async_trait]
impl DocumentStore for FileStore {
    fn describe(&self) -> String {
        format!("file {}", self.input.display())
    }

    async fn fetch(&self, schema: SchemaKind, _id: &str) -> Result<Document> {
        tracing::info!(path = %self.input.display(), "Reading document");
        let text = tokio::fs::read_to_string(&self.input).await?;
        Document::parse(&text, schema)
    }

    async fn persist(&self, _schema: SchemaKind, _id: &str, document: &Document) -> Result<()> {
        let path = self.output_path();
        tracing::info!(path = %path.display(), "Writing document");
        let mut text = serde_json::to_string_pretty(&document.to_original_shape())?;
        text.push('\n');
        tokio::fs::write(path, text).await?;
        Ok(())
    }
}
