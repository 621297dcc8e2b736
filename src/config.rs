//! Run configuration
//!
//! Resolution order: CLI flag, then environment (a `.env` file is loaded
//! by `main` via dotenvy and never overrides the real environment), then
//! defaults.

use crate::error::{Result, SislocError};
use crate::lang::LanguageMap;
use crate::schema::SchemaKind;

pub const DEFAULT_API_BASE_URL: &str = "https://us.tractionguest.com";
pub const DEFAULT_SOURCE_LABEL: &str = "English";
pub const DEFAULT_RATE_LIMIT_QPS: f64 = 8.0;
pub const KNOWN_TRANSLATORS: &[&str] = &["mock", "deepl", "google", "libretranslate"];

#[derive(Debug, Clone)]
pub struct Config {
    pub experience: SchemaKind,
    pub resource_id: Option<String>,
    pub api_base_url: String,
    pub api_token: Option<String>,
    pub source_label: String,
    pub language_map: LanguageMap,
    pub translator: String,
    pub translator_api_key: Option<String>,
    pub translator_endpoint: Option<String>,
    pub rate_limit_qps: f64,
    pub dry_run: bool,
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            experience: SchemaKind::default(),
            resource_id: None,
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            api_token: None,
            source_label: DEFAULT_SOURCE_LABEL.to_string(),
            language_map: LanguageMap::default(),
            translator: "mock".to_string(),
            translator_api_key: None,
            translator_endpoint: None,
            rate_limit_qps: DEFAULT_RATE_LIMIT_QPS,
            dry_run: true,
            log_level: "info".to_string(),
        }
    }
}

/// Values given on the command line; `None` means "not given"
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub experience: Option<SchemaKind>,
    pub resource_id: Option<String>,
    pub api_token: Option<String>,
    pub source_label: Option<String>,
    pub language_map: Option<String>,
    pub translator: Option<String>,
    pub translator_api_key: Option<String>,
    pub translator_endpoint: Option<String>,
    pub rate_limit_qps: Option<f64>,
    pub write: bool,
    pub log_level: Option<String>,
}

impl Config {
    /// Read from the process environment
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read through an arbitrary lookup (the environment, or a map in tests)
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let mut config = Self::default();

        if let Some(kind) = get("SIS_EXPERIENCE_TYPE") {
            config.experience = kind.parse()?;
        }
        config.resource_id = get("SIS_WORKFLOW_ID");
        if let Some(url) = get("SIS_API_BASE_URL") {
            config.api_base_url = url;
        }
        config.api_token = get("SIS_API_KEY").or_else(|| get("SIS_API_TOKEN"));
        if let Some(label) = get("SIS_SOURCE_LANGUAGE_LABEL") {
            config.source_label = label;
        }
        if let Some(map) = get("SIS_LANGUAGE_MAP") {
            config.language_map = LanguageMap::parse(&map)?;
        }
        if let Some(name) = get("SIS_TRANSLATOR") {
            config.translator = name.to_lowercase();
        }
        config.translator_api_key = get("SIS_TRANSLATOR_API_KEY");
        config.translator_endpoint = get("SIS_TRANSLATOR_ENDPOINT");
        if let Some(qps) = get("SIS_RATE_LIMIT_QPS") {
            config.rate_limit_qps = parse_qps(&qps)?;
        }
        if let Some(flag) = get("SIS_DRY_RUN") {
            config.dry_run = parse_flag(&flag);
        }
        if let Some(level) = get("SIS_LOG_LEVEL") {
            config.log_level = level.to_lowercase();
        }

        Ok(config)
    }

    /// Layer command-line values on top
    pub fn apply(mut self, overrides: Overrides) -> Result<Self> {
        if let Some(kind) = overrides.experience {
            self.experience = kind;
        }
        if overrides.resource_id.is_some() {
            self.resource_id = overrides.resource_id;
        }
        if overrides.api_token.is_some() {
            self.api_token = overrides.api_token;
        }
        if let Some(label) = overrides.source_label {
            self.source_label = label;
        }
        if let Some(map) = overrides.language_map {
            self.language_map = LanguageMap::parse(&map)?;
        }
        if let Some(name) = overrides.translator {
            self.translator = name.to_lowercase();
        }
        if overrides.translator_api_key.is_some() {
            self.translator_api_key = overrides.translator_api_key;
        }
        if overrides.translator_endpoint.is_some() {
            self.translator_endpoint = overrides.translator_endpoint;
        }
        if let Some(qps) = overrides.rate_limit_qps {
            self.rate_limit_qps = qps;
        }
        if overrides.write {
            self.dry_run = false;
        }
        if let Some(level) = overrides.log_level {
            self.log_level = level;
        }
        Ok(self)
    }

    /// Check settings every run needs; `needs_api` adds the remote ones
    pub fn validate(&self, needs_api: bool) -> Result<()> {
        if !KNOWN_TRANSLATORS.contains(&self.translator.as_str()) {
            return Err(SislocError::UnknownTranslator {
                name: self.translator.clone(),
            });
        }
        if !(self.rate_limit_qps.is_finite() && self.rate_limit_qps > 0.0) {
            return Err(SislocError::Config {
                reason: format!("rate limit must be positive, got {}", self.rate_limit_qps),
            });
        }
        if self.source_label.trim().is_empty() {
            return Err(SislocError::Config {
                reason: "source language label is empty".to_string(),
            });
        }
        if needs_api {
            if self.api_token.is_none() {
                return Err(SislocError::Config {
                    reason: "API token is required (--token, SIS_API_KEY or SIS_API_TOKEN)"
                        .to_string(),
                });
            }
            if self.resource_id.is_none() {
                return Err(SislocError::Config {
                    reason: "resource id is required (--id or SIS_WORKFLOW_ID)".to_string(),
                });
            }
        }
        Ok(())
    }
}

fn parse_qps(raw: &str) -> Result<f64> {
    raw.parse::<f64>().map_err(|_| SislocError::Config {
        reason: format!("SIS_RATE_LIMIT_QPS is not a number: '{}'", raw),
    })
}

fn parse_flag(raw: &str) -> bool {
    matches!(raw.to_lowercase().as_str(), "1" | "true" | "yes" | "on")
}

/// Mask a secret or identifier for logs: `123456` → `12***56`
pub fn redact(value: &str) -> String {
    let chars: Vec<char> = value.chars().collect();
    if chars.len() <= 4 {
        return "***".to_string();
    }
    let head: String = chars[..2].iter().collect();
    let tail: String = chars[chars.len() - 2..].iter().collect();
    format!("{}***{}", head, tail)
}
