//! Correspondence tags
//!
//! A localized node carries `configuration._localization` recording which
//! template node it mirrors, for which language, and a fingerprint of each
//! template string it was translated from. Reruns read the tag to decide
//! between cloning and updating, and to skip re-translating unchanged text.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use xxhash_rust::xxh3::xxh3_64;

use crate::graph::{Graph, Node};

/// Configuration key holding the tag
pub const TAG_KEY: &str = "_localization";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorrespondenceTag {
    pub template_node_id: String,
    pub language: String,
    /// Field path → fingerprint of the template text it was translated from
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub sources: BTreeMap<String, String>,
}

impl CorrespondenceTag {
    pub fn new(template_node_id: impl Into<String>, language: impl Into<String>) -> Self {
        Self {
            template_node_id: template_node_id.into(),
            language: language.into(),
            sources: BTreeMap::new(),
        }
    }

    /// Does this tag claim `node` mirrors `template_node_id` in `language`?
    pub fn mirrors(&self, template_node_id: &str, language: &str) -> bool {
        self.template_node_id == template_node_id && self.language == language
    }

    /// Recorded fingerprint for a field, if it was translated before
    pub fn source_of(&self, field: &str) -> Option<&str> {
        self.sources.get(field).map(String::as_str)
    }
}

/// Stable fingerprint of a template string
pub fn fingerprint(text: &str) -> String {
    format!("{:016x}", xxh3_64(text.as_bytes()))
}

/// Attach (or replace) the tag on a node
pub fn tag(node: &mut Node, tag: &CorrespondenceTag) {
    let value = serde_json::to_value(tag).unwrap_or_default();
    node.configuration_mut().insert(TAG_KEY.to_string(), value);
}

/// Read a node's tag; malformed tags read as absent
pub fn read_tag(node: &Node) -> Option<CorrespondenceTag> {
    let raw = node.configuration()?.get(TAG_KEY)?;
    serde_json::from_value(raw.clone()).ok()
}

/// Remove a tag (template nodes must never carry one into a clone)
pub fn strip_tag(node: &mut Node) {
    if node.configuration().is_some_and(|c| c.contains_key(TAG_KEY)) {
        node.configuration_mut().remove(TAG_KEY);
    }
}

/// (language, template node id) → every node tagged as its mirror
#[derive(Debug, Default)]
pub struct MirrorIndex {
    mirrors: HashMap<(String, String), Vec<String>>,
}

impl MirrorIndex {
    /// Index all tagged nodes, in document order
    pub fn build(graph: &Graph) -> Self {
        let mut mirrors: HashMap<(String, String), Vec<String>> = HashMap::new();
        for node in graph.nodes() {
            if let Some(tag) = read_tag(node) {
                mirrors
                    .entry((tag.language, tag.template_node_id))
                    .or_default()
                    .push(node.id().to_string());
            }
        }
        Self { mirrors }
    }

    /// First mirror in document order
    pub fn get(&self, language: &str, template_node_id: &str) -> Option<&str> {
        self.all(language, template_node_id).first().map(String::as_str)
    }

    /// Every mirror of `template_node_id` for `language`
    pub fn all(&self, language: &str, template_node_id: &str) -> &[String] {
        self.mirrors
            .get(&(language.to_string(), template_node_id.to_string()))
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Number of distinct (language, template node) pairs
    pub fn len(&self) -> usize {
        self.mirrors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mirrors.is_empty()
    }
}
