//! Branch synchronization
//!
//! Brings one language branch into structural parity with the template
//! branch. Both branches are walked in the same deterministic pre-order
//! (edges in declaration order, conditions before default) and matched by
//! position: the Nth template node corresponds to the Nth target node.
//!
//! Per position the synchronizer either creates a tagged clone, updates
//! the tagged mirror it created on an earlier run, or leaves a node it did
//! not create alone and records a warning. Nodes are never deleted.

use std::collections::{HashMap, HashSet};

use serde_json::Value;

use crate::error::Result;
use crate::fields::translatable_fields;
use crate::graph::{preorder, Graph, Node};
use crate::identity::{self, fingerprint, read_tag, strip_tag, CorrespondenceTag, MirrorIndex};
use crate::locate::{LanguageChoice, LanguagePage, Template};
use crate::report::ChangeReport;
use crate::schema::SchemaKind;
use crate::translate::{Translation, TranslationService};

/// What happens to one template position in a target branch
#[derive(Debug, Clone, PartialEq, Eq)]
enum Slot {
    /// Clone the template node under this id
    Create(String),
    /// Rebuild an existing tagged mirror in place
    Update(String),
    /// Occupied by a node the engine did not create; edges still point at it
    Foreign(String),
}

impl Slot {
    fn id(&self) -> &str {
        match self {
            Slot::Create(id) | Slot::Update(id) | Slot::Foreign(id) => id,
        }
    }
}

pub struct BranchSynchronizer<'a> {
    schema: SchemaKind,
    template: &'a Template,
    boundary: HashSet<String>,
    service: &'a TranslationService,
}

impl<'a> BranchSynchronizer<'a> {
    pub fn new(
        schema: SchemaKind,
        page: &LanguagePage,
        template: &'a Template,
        service: &'a TranslationService,
    ) -> Self {
        Self {
            schema,
            template,
            boundary: page.boundary(),
            service,
        }
    }

    /// Synchronize the branch wired to `choice` for language `code`.
    ///
    /// Unwired choices are a no-op. Recoverable problems become warnings in
    /// the returned report.
    pub async fn sync(
        &self,
        graph: &mut Graph,
        choice: &LanguageChoice,
        code: &str,
    ) -> Result<ChangeReport> {
        let mut report = ChangeReport::new();
        let Some(start) = choice.target.as_deref() else {
            tracing::debug!(label = %choice.label, "Choice is unwired; skipping");
            return Ok(report);
        };

        if start == self.template.start || self.boundary.contains(start) {
            report.warn(format!(
                "{} ({}): branch start '{}' is the template branch or the language page; skipped",
                choice.label, code, start
            ));
            return Ok(report);
        }

        report.languages_processed = 1;
        tracing::info!(language = %code, start = %start, "Synchronizing branch");

        let Some(slots) = self.plan(graph, start, code, &choice.label, &mut report) else {
            return Ok(report);
        };

        let mirror_of: HashMap<String, String> = self
            .template
            .order
            .iter()
            .zip(&slots)
            .map(|(tid, slot)| (tid.clone(), slot.id().to_string()))
            .collect();

        for (tid, slot) in self.template.order.iter().zip(&slots) {
            let (id, is_new) = match slot {
                Slot::Foreign(_) => continue,
                Slot::Create(id) => (id, true),
                Slot::Update(id) => (id, false),
            };
            let Some(template_node) = graph.get(tid).cloned() else {
                continue;
            };
            let existing = if is_new { None } else { graph.get(id).cloned() };

            let node = self
                .build_mirror(&template_node, existing.as_ref(), id, code, &mirror_of, &mut report)
                .await;

            if is_new {
                tracing::debug!(node = %id, template = %tid, "Creating mirror node");
                graph.insert(node)?;
                report.nodes_created += 1;
            } else if existing.as_ref() != Some(&node) {
                tracing::debug!(node = %id, template = %tid, "Updating mirror node");
                graph.replace(node)?;
                report.nodes_updated += 1;
            }
        }

        tracing::info!(
            language = %code,
            created = report.nodes_created,
            updated = report.nodes_updated,
            translated = report.strings_translated,
            "Language synchronized"
        );
        Ok(report)
    }

    /// Match every template position to a slot. `None` aborts the language.
    fn plan(
        &self,
        graph: &mut Graph,
        start: &str,
        code: &str,
        label: &str,
        report: &mut ChangeReport,
    ) -> Option<Vec<Slot>> {
        let target_order = preorder(graph, start, &self.boundary);
        let index = MirrorIndex::build(graph);
        let mut claimed: HashSet<String> = HashSet::new();
        let mut slots = Vec::with_capacity(self.template.order.len());

        for (position, tid) in self.template.order.iter().enumerate() {
            let slot = match target_order.get(position) {
                Some(existing) => {
                    let mirrors = graph
                        .get(existing)
                        .and_then(read_tag)
                        .is_some_and(|tag| tag.mirrors(tid, code));
                    if mirrors && claimed.insert(existing.clone()) {
                        Slot::Update(existing.clone())
                    } else if position == 0 {
                        report.warn(format!(
                            "{} ({}): branch start '{}' was not created by this engine; language skipped",
                            label, code, existing
                        ));
                        return None;
                    } else {
                        report.warn(format!(
                            "{} ({}): unexpected existing node '{}' at branch position {}; left untouched",
                            label, code, existing, position
                        ));
                        Slot::Foreign(existing.clone())
                    }
                }
                None if position == 0 => {
                    if let Some(mirror) = index.get(code, tid) {
                        report.warn(format!(
                            "{} ({}): branch start '{}' is missing but '{}' already mirrors the template start; language skipped",
                            label, code, start, mirror
                        ));
                        return None;
                    }
                    // Create it under the wired id so routing stays valid
                    Slot::Create(start.to_string())
                }
                None => {
                    let known: Vec<&String> = index
                        .all(code, tid)
                        .iter()
                        .filter(|id| graph.contains(id) && !self.template.order.contains(id))
                        .collect();
                    let detached = known
                        .iter()
                        .find(|id| !claimed.contains(id.as_str()) && !target_order.contains(id));

                    match (detached, known.first()) {
                        (Some(id), _) => {
                            tracing::debug!(node = %id, template = %tid, "Reusing detached mirror");
                            claimed.insert(id.to_string());
                            Slot::Update(id.to_string())
                        }
                        // Mirrored already, but sitting at another position of this branch
                        (None, Some(id)) => {
                            report.warn(format!(
                                "{} ({}): template node '{}' is already mirrored by '{}' at another branch position; left untouched",
                                label, code, tid, id
                            ));
                            Slot::Foreign(id.to_string())
                        }
                        (None, None) => {
                            // A missing start id is not in the graph yet but is taken
                            let mut id = graph.allocate_id();
                            while id == start {
                                id = graph.allocate_id();
                            }
                            claimed.insert(id.clone());
                            Slot::Create(id)
                        }
                    }
                }
            };
            slots.push(slot);
        }

        Some(slots)
    }

    /// Template clone under `id`, edges remapped, text translated, tagged
    async fn build_mirror(
        &self,
        template_node: &Node,
        existing: Option<&Node>,
        id: &str,
        code: &str,
        mirror_of: &HashMap<String, String>,
        report: &mut ChangeReport,
    ) -> Node {
        let mut node = template_node.clone();
        strip_tag(&mut node);
        node.set_id(id);
        node.rewrite_edges(|edge| mirror_of.get(edge).cloned());

        let previous = existing.and_then(|n| read_tag(n).map(|tag| (n, tag)));
        let mut tag = CorrespondenceTag::new(template_node.id(), code);

        for path in translatable_fields(template_node, self.schema) {
            let Some(Value::String(source)) = template_node.value_at(&path) else {
                continue;
            };
            let key = path.to_string();
            let print = fingerprint(source);

            // Unchanged source: keep the earlier translation as-is
            let reused = previous.as_ref().and_then(|(prev, prev_tag)| {
                if prev_tag.source_of(&key) != Some(print.as_str()) {
                    return None;
                }
                prev.value_at(&path).filter(|v| v.is_string()).cloned()
            });
            if let Some(text) = reused {
                node.set_value_at(&path, text);
                tag.sources.insert(key, print);
                continue;
            }

            match self.service.translate(source, code).await {
                Translation::Translated(text) => {
                    node.set_value_at(&path, Value::String(text));
                    tag.sources.insert(key, print);
                    report.strings_translated += 1;
                }
                Translation::Unchanged => {
                    tag.sources.insert(key, print);
                }
                Translation::Failed(reason) => {
                    report.warn(format!(
                        "translation failed for node '{}' field {} ({}); kept source text: {}",
                        id, key, code, reason
                    ));
                }
            }
        }

        identity::tag(&mut node, &tag);
        node
    }
}
