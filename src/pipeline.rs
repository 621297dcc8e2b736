//! End-to-end run: fetch → localize → validate → persist
//!
//! Everything up to the persist step runs identically in dry-run and write
//! mode, so both report the same counts. Nothing is written unless the
//! whole run succeeds.

use crate::client::DocumentStore;
use crate::config::redact;
use crate::document::Document;
use crate::error::{Result, SislocError};
use crate::graph::Graph;
use crate::lang::LanguageMap;
use crate::locate::{extract_template, language_page, locate};
use crate::report::ChangeReport;
use crate::schema::SchemaKind;
use crate::sync::BranchSynchronizer;
use crate::translate::TranslationService;
use crate::validate::{introduced_errors, validate, NodeDiff};

#[derive(Debug, Clone)]
pub struct RunOptions {
    pub schema: SchemaKind,
    pub source_label: String,
    pub language_map: LanguageMap,
    pub dry_run: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            schema: SchemaKind::default(),
            source_label: crate::config::DEFAULT_SOURCE_LABEL.to_string(),
            language_map: LanguageMap::default(),
            dry_run: true,
        }
    }
}

#[derive(Debug)]
pub struct RunOutcome {
    pub report: ChangeReport,
    pub diff: NodeDiff,
    pub persisted: bool,
    /// The document as it was (or would have been) persisted
    pub document: Document,
}

/// Synchronize every wired non-template language in `graph`
pub async fn localize(
    graph: &mut Graph,
    schema: SchemaKind,
    source_label: &str,
    language_map: &LanguageMap,
    service: &TranslationService,
) -> Result<ChangeReport> {
    let page = language_page(locate(graph, schema)?, schema)?;
    tracing::info!(page = %page.node_id, choices = page.choices.len(), "Language page found");

    let template = extract_template(graph, &page, source_label)?;
    tracing::info!(
        label = %template.choice.label,
        start = %template.start,
        nodes = template.order.len(),
        "Template branch resolved"
    );

    let synchronizer = BranchSynchronizer::new(schema, &page, &template, service);
    let mut report = ChangeReport::new();

    for choice in &page.choices {
        if choice.id == template.choice.id {
            continue;
        }
        if !choice.is_wired() {
            tracing::debug!(label = %choice.label, "Unwired language choice; skipping");
            continue;
        }
        let Some(code) = language_map.code_for(&choice.label) else {
            report.warn(format!(
                "could not infer language code for '{}'; language skipped",
                choice.label
            ));
            continue;
        };
        report.absorb(synchronizer.sync(graph, choice, &code).await?);
    }

    Ok(report)
}

/// Fetch, localize, and persist when not in dry-run mode
pub async fn run(
    store: &dyn DocumentStore,
    id: &str,
    service: &TranslationService,
    options: &RunOptions,
) -> Result<RunOutcome> {
    if options.dry_run {
        tracing::info!("Running in DRY RUN mode (nothing will be persisted)");
    } else {
        tracing::info!("Running in WRITE mode");
    }

    let mut document = store.fetch(options.schema, id).await?;
    let original = document.graph()?;
    let mut graph = original.clone();

    let report = localize(
        &mut graph,
        options.schema,
        &options.source_label,
        &options.language_map,
        service,
    )
    .await?;

    let before = validate(&original);
    let after = validate(&graph);
    for issue in after.iter().filter(|i| !i.is_error()) {
        tracing::warn!("Validation {}", issue);
    }

    let diff = NodeDiff::between(&original, &graph);
    tracing::info!(
        provider_calls = service.provider_calls(),
        "Diff summary: {}",
        diff
    );

    document.set_graph(&graph)?;

    if options.dry_run {
        return Ok(RunOutcome {
            report,
            diff,
            persisted: false,
            document,
        });
    }

    let introduced = introduced_errors(&before, &after);
    if let Some(first) = introduced.first() {
        for issue in &introduced {
            tracing::error!("Validation {}", issue);
        }
        return Err(SislocError::ValidationFailed {
            count: introduced.len(),
            first: first.message.clone(),
        });
    }

    tracing::info!(store = %store.describe(), id = %redact(id), "Persisting localized document");
    store.persist(options.schema, id, &document).await?;

    Ok(RunOutcome {
        report,
        diff,
        persisted: true,
        document,
    })
}
