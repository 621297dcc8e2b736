//! In-memory graph built from a localized body
//!
//! The body is `{"starting_node_id": .., "nodes": {id: node}, ..}`. Every
//! key the engine does not understand is kept as-is and written back in
//! its original position.

use std::collections::HashMap;

use serde_json::{Map, Value};

use super::path::FieldPath;
use crate::error::{Result, SislocError};

/// Render an id-like JSON value (string or number) as a node id
pub fn id_from_value(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// One page/step of a workflow
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    id: String,
    /// Always a JSON object
    body: Value,
}

impl Node {
    /// Wrap a raw node object. The id is taken from the graph key, not the body.
    pub fn new(id: impl Into<String>, body: Map<String, Value>) -> Self {
        Self {
            id: id.into(),
            body: Value::Object(body),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn body(&self) -> &Value {
        &self.body
    }

    /// Kind discriminator (`template_id`)
    pub fn kind(&self) -> &str {
        self.body
            .get("template_id")
            .and_then(Value::as_str)
            .unwrap_or("")
    }

    /// Page type (`type`)
    pub fn node_type(&self) -> &str {
        self.body.get("type").and_then(Value::as_str).unwrap_or("")
    }

    pub fn configuration(&self) -> Option<&Map<String, Value>> {
        self.body.get("configuration").and_then(Value::as_object)
    }

    /// String value of a top-level configuration key
    pub fn config_str(&self, key: &str) -> Option<&str> {
        self.configuration()?.get(key)?.as_str()
    }

    /// Mutable configuration object, created (or replacing a non-object) on demand
    pub fn configuration_mut(&mut self) -> &mut Map<String, Value> {
        let body = self.object_mut();
        let slot = body
            .entry("configuration")
            .or_insert_with(|| Value::Object(Map::new()));
        if !slot.is_object() {
            *slot = Value::Object(Map::new());
        }
        match slot {
            Value::Object(map) => map,
            _ => unreachable!("configuration was just made an object"),
        }
    }

    fn object_mut(&mut self) -> &mut Map<String, Value> {
        if !self.body.is_object() {
            self.body = Value::Object(Map::new());
        }
        match &mut self.body {
            Value::Object(map) => map,
            _ => unreachable!("body was just made an object"),
        }
    }

    /// Change the node id, keeping the body's `id` field in step
    pub fn set_id(&mut self, id: impl Into<String>) {
        self.id = id.into();
        let id = Value::String(self.id.clone());
        self.object_mut().insert("id".to_string(), id);
    }

    pub fn value_at(&self, path: &FieldPath) -> Option<&Value> {
        path.get(&self.body)
    }

    pub fn set_value_at(&mut self, path: &FieldPath, value: Value) -> bool {
        path.set(&mut self.body, value)
    }

    /// Outgoing edges in declaration order: each condition result, then the default
    pub fn edges(&self) -> Vec<String> {
        let Some(next) = self.body.get("next").and_then(Value::as_object) else {
            return Vec::new();
        };
        let mut edges = Vec::new();
        if let Some(conditions) = next.get("conditions").and_then(Value::as_array) {
            edges.extend(
                conditions
                    .iter()
                    .filter_map(|cond| cond.get("result"))
                    .filter_map(id_from_value),
            );
        }
        if let Some(default) = next.get("default").and_then(id_from_value) {
            edges.push(default);
        }
        edges
    }

    /// Rewrite every outgoing edge the mapper returns a new id for.
    /// Null and unmapped edges are left untouched.
    pub fn rewrite_edges<F>(&mut self, mut mapper: F)
    where
        F: FnMut(&str) -> Option<String>,
    {
        let Some(next) = self.object_mut().get_mut("next").and_then(Value::as_object_mut) else {
            return;
        };
        let mut remap = |slot: &mut Value| {
            if let Some(new_id) = id_from_value(slot).and_then(|old| mapper(&old)) {
                *slot = Value::String(new_id);
            }
        };
        if let Some(conditions) = next.get_mut("conditions").and_then(Value::as_array_mut) {
            for cond in conditions.iter_mut() {
                if let Some(result) = cond.get_mut("result") {
                    remap(result);
                }
            }
        }
        if let Some(default) = next.get_mut("default") {
            remap(default);
        }
    }
}

/// Whole localized body: ordered nodes plus top-level metadata
#[derive(Debug, Clone)]
pub struct Graph {
    /// Top-level object; the `nodes` slot holds a placeholder until serialization
    root: Map<String, Value>,
    nodes: Vec<Node>,
    index: HashMap<String, usize>,
    next_id: u64,
    /// Low-end cursor used once ids above the largest numeric id run out
    free_scan: u64,
}

impl Graph {
    /// Parse a localized body
    pub fn from_value(value: Value) -> Result<Self> {
        let Value::Object(mut root) = value else {
            return Err(SislocError::ParseError {
                details: "body is not a JSON object".to_string(),
            });
        };

        let raw_nodes = match root.get_mut("nodes") {
            Some(Value::Object(map)) => std::mem::take(map),
            Some(_) => {
                return Err(SislocError::ParseError {
                    details: "'nodes' is not an object".to_string(),
                })
            }
            None => {
                return Err(SislocError::MissingField {
                    field: "nodes".to_string(),
                })
            }
        };

        let mut graph = Self {
            root,
            nodes: Vec::with_capacity(raw_nodes.len()),
            index: HashMap::with_capacity(raw_nodes.len()),
            next_id: 1,
            free_scan: 1,
        };

        for (key, raw) in raw_nodes {
            let Value::Object(body) = raw else {
                return Err(SislocError::ParseError {
                    details: format!("node '{}' is not an object", key),
                });
            };
            graph.push(Node::new(key, body))?;
        }

        Ok(graph)
    }

    fn push(&mut self, node: Node) -> Result<()> {
        if self.index.contains_key(node.id()) {
            return Err(SislocError::DuplicateNodeId {
                id: node.id().to_string(),
            });
        }
        if let Ok(n) = node.id().parse::<u64>() {
            self.next_id = self.next_id.max(n.saturating_add(1));
        }
        self.index.insert(node.id().to_string(), self.nodes.len());
        self.nodes.push(node);
        Ok(())
    }

    /// Serialize back to the body shape, preserving key order
    pub fn to_value(&self) -> Value {
        let nodes: Map<String, Value> = self
            .nodes
            .iter()
            .map(|n| (n.id().to_string(), n.body().clone()))
            .collect();
        let mut root = self.root.clone();
        root.insert("nodes".to_string(), Value::Object(nodes));
        Value::Object(root)
    }

    pub fn starting_node_id(&self) -> Option<String> {
        self.root.get("starting_node_id").and_then(id_from_value)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    pub fn get(&self, id: &str) -> Option<&Node> {
        self.index.get(id).map(|&i| &self.nodes[i])
    }

    /// Nodes in document order
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter()
    }

    pub fn node_ids(&self) -> impl Iterator<Item = &str> {
        self.nodes.iter().map(Node::id)
    }

    /// Add a new node at the end of the document
    pub fn insert(&mut self, mut node: Node) -> Result<()> {
        let id = node.id().to_string();
        node.set_id(id);
        self.push(node)
    }

    /// Replace an existing node's body in place (position is kept)
    pub fn replace(&mut self, node: Node) -> Result<()> {
        let Some(&i) = self.index.get(node.id()) else {
            return Err(SislocError::ParseError {
                details: format!("cannot replace unknown node '{}'", node.id()),
            });
        };
        self.nodes[i] = node;
        Ok(())
    }

    /// Next free id: one above the largest numeric id, skipping taken ones.
    /// When that range is exhausted, the lowest unused number is taken.
    pub fn allocate_id(&mut self) -> String {
        while let Some(after) = self.next_id.checked_add(1) {
            let candidate = self.next_id.to_string();
            self.next_id = after;
            if !self.contains(&candidate) {
                return candidate;
            }
        }
        loop {
            let candidate = self.free_scan.to_string();
            self.free_scan = self.free_scan.saturating_add(1);
            if !self.contains(&candidate) {
                return candidate;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> Value {
        json!({
            "starting_node_id": "1",
            "nodes": {
                "1": {"id": "1", "template_id": "welcome", "next": {"conditions": [
                    {"lval": "reason_id", "rval": 1, "result": "3"},
                    {"lval": "reason_id", "rval": 2, "result": null}
                ], "default": 2}},
                "2": {"id": 2, "template_id": "form", "next": {"conditions": [], "default": "3"}},
                "3": {"id": "3", "template_id": "thanks", "next": null}
            },
            "version": 4
        })
    }

    #[test]
    fn test_roundtrip_preserves_order_and_fields() {
        let value = sample();
        let graph = Graph::from_value(value.clone()).unwrap();
        assert_eq!(graph.to_value(), value);

        let keys: Vec<String> = graph
            .to_value()
            .as_object()
            .unwrap()
            .keys()
            .cloned()
            .collect();
        assert_eq!(keys, vec!["starting_node_id", "nodes", "version"]);
    }

    #[test]
    fn test_edges_declaration_order() {
        let graph = Graph::from_value(sample()).unwrap();
        assert_eq!(graph.get("1").unwrap().edges(), vec!["3", "2"]);
        assert!(graph.get("3").unwrap().edges().is_empty());
    }

    #[test]
    fn test_rewrite_edges_skips_unmapped() {
        let graph = Graph::from_value(sample()).unwrap();
        let mut node = graph.get("1").unwrap().clone();
        node.rewrite_edges(|id| (id == "2").then(|| "20".to_string()));
        assert_eq!(node.edges(), vec!["3", "20"]);
        assert_eq!(node.body()["next"]["conditions"][1]["result"], Value::Null);
    }

    #[test]
    fn test_allocate_id_above_max_numeric() {
        let mut graph = Graph::from_value(sample()).unwrap();
        assert_eq!(graph.allocate_id(), "4");
        assert_eq!(graph.allocate_id(), "5");
    }

    #[test]
    fn test_allocate_id_after_largest_u64() {
        let mut graph = Graph::from_value(json!({"nodes": {
            "1": {"id": "1"},
            "18446744073709551615": {"id": "18446744073709551615"}
        }}))
        .unwrap();
        assert_eq!(graph.allocate_id(), "2");
        assert_eq!(graph.allocate_id(), "3");
        assert!(!graph.contains("2"));
    }

    #[test]
    fn test_insert_rejects_duplicate() {
        let mut graph = Graph::from_value(sample()).unwrap();
        let err = graph.insert(Node::new("2", Map::new())).unwrap_err();
        assert!(matches!(err, SislocError::DuplicateNodeId { .. }));
    }

    #[test]
    fn test_missing_nodes_is_an_error() {
        let err = Graph::from_value(json!({"starting_node_id": "1"})).unwrap_err();
        assert!(matches!(err, SislocError::MissingField { .. }));
    }
}
