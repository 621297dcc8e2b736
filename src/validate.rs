//! Post-sync graph checks and node diff

use std::collections::HashSet;
use std::fmt;

use serde_json::Value;

use crate::graph::{id_from_value, Graph};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Severity {
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Issue {
    pub severity: Severity,
    pub message: String,
}

impl Issue {
    fn error(message: String) -> Self {
        Self {
            severity: Severity::Error,
            message,
        }
    }

    fn warning(message: String) -> Self {
        Self {
            severity: Severity::Warning,
            message,
        }
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let level = match self.severity {
            Severity::Warning => "warning",
            Severity::Error => "error",
        };
        write!(f, "{}: {}", level, self.message)
    }
}

/// Structural checks over the whole graph, in document order
pub fn validate(graph: &Graph) -> Vec<Issue> {
    let mut issues = Vec::new();

    if graph.is_empty() {
        issues.push(Issue::error("body has no nodes".to_string()));
        return issues;
    }

    if let Some(start) = graph.starting_node_id() {
        if !graph.contains(&start) {
            issues.push(Issue::error(format!(
                "starting_node_id '{}' not found in nodes",
                start
            )));
        }
    }

    for node in graph.nodes() {
        match node.body().get("id").and_then(id_from_value) {
            Some(id) if id == node.id() => {}
            other => issues.push(Issue::warning(format!(
                "node key/id mismatch: key={} id={}",
                node.id(),
                other.as_deref().unwrap_or("<none>")
            ))),
        }

        let Some(next) = node.body().get("next").filter(|n| !n.is_null()) else {
            continue;
        };
        let conditions = next
            .get("conditions")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default();
        for (i, cond) in conditions.iter().enumerate() {
            if let Some(target) = cond.get("result").and_then(id_from_value) {
                if !graph.contains(&target) {
                    issues.push(Issue::error(format!(
                        "node {} condition {} -> '{}' not found",
                        node.id(),
                        i,
                        target
                    )));
                }
            }
        }
        if let Some(target) = next.get("default").and_then(id_from_value) {
            if !graph.contains(&target) {
                issues.push(Issue::error(format!(
                    "node {} default -> '{}' not found",
                    node.id(),
                    target
                )));
            }
        }
    }

    issues
}

/// Errors present in `after` that were not already in `before`
pub fn introduced_errors(before: &[Issue], after: &[Issue]) -> Vec<Issue> {
    let known: HashSet<&Issue> = before.iter().filter(|i| i.is_error()).collect();
    after
        .iter()
        .filter(|i| i.is_error() && !known.contains(i))
        .cloned()
        .collect()
}

/// Node-level difference between two versions of a graph
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NodeDiff {
    pub added: Vec<String>,
    pub removed: Vec<String>,
    pub changed: Vec<String>,
    pub total: usize,
}

impl NodeDiff {
    pub fn between(before: &Graph, after: &Graph) -> Self {
        let mut diff = NodeDiff {
            total: after.len(),
            ..Default::default()
        };
        for node in after.nodes() {
            match before.get(node.id()) {
                None => diff.added.push(node.id().to_string()),
                Some(old) if old != node => diff.changed.push(node.id().to_string()),
                Some(_) => {}
            }
        }
        diff.removed = before
            .node_ids()
            .filter(|id| !after.contains(id))
            .map(str::to_string)
            .collect();
        diff
    }

    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty() && self.changed.is_empty()
    }
}

impl fmt::Display for NodeDiff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "added={:?} changed={:?} removed={:?} total_nodes={}",
            self.added, self.changed, self.removed, self.total
        )
    }
}
