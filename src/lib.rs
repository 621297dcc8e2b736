//! sisloc - language branch synchronization for visitor-registration workflows

pub mod client;
pub mod config;
pub mod document;
pub mod error;
pub mod fields;
pub mod graph;
pub mod identity;
pub mod lang;
pub mod limits;
pub mod locate;
pub mod pipeline;
pub mod report;
pub mod schema;
pub mod sync;
pub mod translate;
pub mod validate;

pub use client::{ApiClient, DocumentStore, FileStore};
pub use config::{Config, Overrides};
pub use document::Document;
pub use error::{FixSuggestion, SislocError};
pub use graph::{Graph, Node};
pub use identity::CorrespondenceTag;
pub use lang::LanguageMap;
pub use limits::RateLimiter;
pub use pipeline::{localize, run, RunOptions, RunOutcome};
pub use report::ChangeReport;
pub use schema::SchemaKind;
pub use sync::BranchSynchronizer;
pub use translate::{create_translator, TranslationService, Translator};
