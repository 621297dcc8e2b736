//! Language page location and template extraction

use std::collections::HashSet;

use serde_json::Value;

use crate::error::{Result, SislocError};
use crate::graph::{id_from_value, preorder, Graph, Node};
use crate::schema::SchemaKind;

/// One option on the language selector
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LanguageChoice {
    /// Stable choice identifier (reason/option id)
    pub id: String,
    /// Display label, e.g. "Spanish"
    pub label: String,
    /// Start of this language's branch; `None` means unwired
    pub target: Option<String>,
}

impl LanguageChoice {
    pub fn is_wired(&self) -> bool {
        self.target.is_some()
    }
}

/// The language selector with its choices resolved to branch starts
#[derive(Debug, Clone)]
pub struct LanguagePage {
    pub node_id: String,
    /// Choices in declaration order
    pub choices: Vec<LanguageChoice>,
    /// The page's own `next.default`, used only as a template fallback
    pub default_target: Option<String>,
}

impl LanguagePage {
    /// Ids never entered when walking a branch
    pub fn boundary(&self) -> HashSet<String> {
        [self.node_id.clone()].into()
    }
}

/// Canonical branch all other languages are mirrored from
#[derive(Debug, Clone)]
pub struct Template {
    pub choice: LanguageChoice,
    pub start: String,
    /// Branch node ids in traversal order
    pub order: Vec<String>,
}

/// Find the single language selector node.
///
/// Zero or several matches both fail; an ambiguous graph is never guessed at.
pub fn locate(graph: &Graph, schema: SchemaKind) -> Result<&Node> {
    let mut candidates = graph.nodes().filter(|n| schema.is_language_page(n));
    match (candidates.next(), candidates.next()) {
        (Some(node), None) => Ok(node),
        (None, _) => Err(SislocError::LanguagePageNotFound {
            schema: schema.name().to_string(),
            matches: 0,
        }),
        (Some(_), Some(_)) => Err(SislocError::LanguagePageNotFound {
            schema: schema.name().to_string(),
            matches: 2 + candidates.count(),
        }),
    }
}

/// Read choices and routing from the language page
pub fn language_page(node: &Node, schema: SchemaKind) -> Result<LanguagePage> {
    let entries = node
        .configuration()
        .and_then(|c| c.get(schema.choices_key()))
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default();

    let next = node.body().get("next");
    let conditions = next
        .and_then(|n| n.get("conditions"))
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default();

    let mut choices = Vec::new();
    for entry in entries {
        let (Some(id), Some(label)) = (schema.choice_id(entry), schema.choice_label(entry)) else {
            tracing::debug!(entry = %entry, "Skipping language choice without id or label");
            continue;
        };
        // First matching condition wins; a null result leaves the choice unwired
        let target = conditions
            .iter()
            .find(|cond| {
                cond.get("lval")
                    .and_then(Value::as_str)
                    .is_some_and(|lval| schema.routing_lvals().contains(&lval))
                    && cond.get("rval").and_then(id_from_value).as_deref() == Some(id.as_str())
            })
            .and_then(|cond| cond.get("result"))
            .and_then(id_from_value);
        choices.push(LanguageChoice { id, label, target });
    }

    if choices.is_empty() {
        return Err(SislocError::NoLanguageChoices);
    }

    let default_target = next.and_then(|n| n.get("default")).and_then(id_from_value);
    tracing::debug!(
        page = %node.id(),
        choices = choices.len(),
        default = ?default_target,
        "Language routing resolved"
    );

    Ok(LanguagePage {
        node_id: node.id().to_string(),
        choices,
        default_target,
    })
}

/// Resolve the template branch for `source_label` (case-insensitive)
pub fn extract_template(graph: &Graph, page: &LanguagePage, source_label: &str) -> Result<Template> {
    let not_found = || SislocError::TemplateNotFound {
        label: source_label.to_string(),
    };

    let choice = page
        .choices
        .iter()
        .find(|c| c.label.trim().to_lowercase() == source_label.trim().to_lowercase())
        .ok_or_else(not_found)?;

    let start = match (&choice.target, &page.default_target) {
        (Some(target), _) => target.clone(),
        (None, Some(default)) => {
            tracing::warn!(
                label = %choice.label,
                default = %default,
                "No explicit start for template language; using page default"
            );
            default.clone()
        }
        (None, None) => return Err(not_found()),
    };

    let order = preorder(graph, &start, &page.boundary());
    if order.is_empty() {
        return Err(SislocError::EmptyTemplate { start });
    }

    Ok(Template {
        choice: LanguageChoice {
            target: Some(start.clone()),
            ..choice.clone()
        },
        start,
        order,
    })
}
