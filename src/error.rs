//! Error types with error codes and fix suggestions
//!
//! Error code ranges:
//! - SISLOC-001-009: Graph/document errors
//! - SISLOC-010-019: Language page and template errors
//! - SISLOC-020-029: Translation provider errors
//! - SISLOC-030-039: Transport/persist errors
//! - SISLOC-040-049: Configuration errors
//! - SISLOC-050-059: Validation errors

use thiserror::Error;

pub type Result<T> = std::result::Result<T, SislocError>;

/// Trait for errors that provide fix suggestions
pub trait FixSuggestion {
    fn fix_suggestion(&self) -> Option<&str>;
}

/// Every variant here is fatal for the run. Recoverable problems
/// (a failed string, a foreign node in a branch) are warnings in the
/// [`ChangeReport`](crate::report::ChangeReport) instead.
#[derive(Error, Debug)]
pub enum SislocError {
    // ═══════════════════════════════════════════
    // GRAPH / DOCUMENT ERRORS (001-009)
    // ═══════════════════════════════════════════
    #[error("[SISLOC-001] Failed to parse document: {details}")]
    ParseError { details: String },

    #[error("[SISLOC-002] Document is missing '{field}'")]
    MissingField { field: String },

    #[error("[SISLOC-003] Duplicate node id '{id}'")]
    DuplicateNodeId { id: String },

    #[error("[SISLOC-004] JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // ═══════════════════════════════════════════
    // LOCATOR / TEMPLATE ERRORS (010-019)
    // ═══════════════════════════════════════════
    #[error("[SISLOC-010] Language page not found ({matches} candidates for {schema} schema)")]
    LanguagePageNotFound { schema: String, matches: usize },

    #[error("[SISLOC-011] Template language '{label}' not found or not wired on the language page")]
    TemplateNotFound { label: String },

    #[error("[SISLOC-012] Template branch starting at '{start}' is empty")]
    EmptyTemplate { start: String },

    #[error("[SISLOC-013] Language page has no choices")]
    NoLanguageChoices,

    // ═══════════════════════════════════════════
    // TRANSLATION ERRORS (020-029)
    // ═══════════════════════════════════════════
    #[error("[SISLOC-020] Unknown translator '{name}'. Available: mock, deepl, google, libretranslate")]
    UnknownTranslator { name: String },

    #[error("[SISLOC-021] Translator '{name}' requires an API key")]
    MissingTranslatorKey { name: String },

    // ═══════════════════════════════════════════
    // TRANSPORT / PERSIST ERRORS (030-039)
    // ═══════════════════════════════════════════
    #[error("[SISLOC-030] HTTP {status} from {operation}: {body}")]
    Http {
        operation: String,
        status: u16,
        body: String,
    },

    #[error("[SISLOC-031] Request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("[SISLOC-032] IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("[SISLOC-033] Unexpected API response: {details}")]
    UnexpectedResponse { details: String },

    // ═══════════════════════════════════════════
    // CONFIGURATION ERRORS (040-049)
    // ═══════════════════════════════════════════
    #[error("[SISLOC-040] Configuration error: {reason}")]
    Config { reason: String },

    #[error("[SISLOC-041] Invalid URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    // ═══════════════════════════════════════════
    // VALIDATION ERRORS (050-059)
    // ═══════════════════════════════════════════
    #[error("[SISLOC-050] Validation failed with {count} new error(s): {first}")]
    ValidationFailed { count: usize, first: String },
}

impl SislocError {
    /// Stable error code, e.g. `SISLOC-010`
    pub fn code(&self) -> &'static str {
        match self {
            Self::ParseError { .. } => "SISLOC-001",
            Self::MissingField { .. } => "SISLOC-002",
            Self::DuplicateNodeId { .. } => "SISLOC-003",
            Self::Json(_) => "SISLOC-004",
            Self::LanguagePageNotFound { .. } => "SISLOC-010",
            Self::TemplateNotFound { .. } => "SISLOC-011",
            Self::EmptyTemplate { .. } => "SISLOC-012",
            Self::NoLanguageChoices => "SISLOC-013",
            Self::UnknownTranslator { .. } => "SISLOC-020",
            Self::MissingTranslatorKey { .. } => "SISLOC-021",
            Self::Http { .. } => "SISLOC-030",
            Self::Transport(_) => "SISLOC-031",
            Self::Io(_) => "SISLOC-032",
            Self::UnexpectedResponse { .. } => "SISLOC-033",
            Self::Config { .. } => "SISLOC-040",
            Self::InvalidUrl { .. } => "SISLOC-041",
            Self::ValidationFailed { .. } => "SISLOC-050",
        }
    }
}

impl FixSuggestion for SislocError {
    fn fix_suggestion(&self) -> Option<&str> {
        match self {
            SislocError::ParseError { .. } | SislocError::Json(_) => {
                Some("Check the document is the unmodified API payload")
            }
            SislocError::MissingField { .. } => {
                Some("Check --experience matches the resource type")
            }
            SislocError::DuplicateNodeId { .. } => Some("Node ids must be unique in the body"),
            SislocError::LanguagePageNotFound { matches: 0, .. } => {
                Some("Add a language choice page (data_name/flex_field = \"language\")")
            }
            SislocError::LanguagePageNotFound { .. } => {
                Some("Keep exactly one language choice page in the workflow")
            }
            SislocError::TemplateNotFound { .. } => {
                Some("Pass --source-label matching a wired choice (default: English)")
            }
            SislocError::EmptyTemplate { .. } => {
                Some("Wire the template choice to an existing start page")
            }
            SislocError::NoLanguageChoices => Some("Add at least one language choice"),
            SislocError::UnknownTranslator { .. } => {
                Some("Use --translator mock|deepl|google|libretranslate")
            }
            SislocError::MissingTranslatorKey { .. } => {
                Some("Set SIS_TRANSLATOR_API_KEY or pass --translator-api-key")
            }
            SislocError::Http { status: 401, .. } | SislocError::Http { status: 403, .. } => {
                Some("Check SIS_API_KEY is valid for this account")
            }
            SislocError::Http { status: 404, .. } => Some("Check the resource id and --experience"),
            SislocError::Http { .. } | SislocError::Transport(_) => {
                Some("Check SIS_API_BASE_URL and network access")
            }
            SislocError::Io(_) => Some("Check file path and permissions"),
            SislocError::UnexpectedResponse { .. } => {
                Some("Check --experience matches the resource type")
            }
            SislocError::Config { .. } => Some("Check flags and SIS_* environment variables"),
            SislocError::InvalidUrl { .. } => Some("Use an absolute http(s) URL"),
            SislocError::ValidationFailed { .. } => {
                Some("Run with --log-level debug and inspect the reported edges")
            }
        }
    }
}
