//! Persisted resource envelope
//!
//! The API wraps each resource under a schema key (`workflow`,
//! `registration_experience`). The localized body lives in the resource's
//! `body` field, either as JSON text or as a native object. The encoding
//! found on read is the encoding written back; every other field passes
//! through untouched.

use serde_json::{json, Map, Value};

use crate::error::{Result, SislocError};
use crate::graph::Graph;
use crate::schema::{BodyEncoding, SchemaKind};

#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    schema: SchemaKind,
    /// Resource object (without the envelope key)
    resource: Map<String, Value>,
    /// Whether the payload arrived wrapped in the envelope key
    wrapped: bool,
    encoding: BodyEncoding,
}

impl Document {
    /// Accept `{"<envelope>": {...}}` or the bare resource object
    pub fn from_value(value: Value, schema: SchemaKind) -> Result<Self> {
        let Value::Object(mut outer) = value else {
            return Err(SislocError::ParseError {
                details: "document is not a JSON object".to_string(),
            });
        };

        let (resource, wrapped) = match outer.remove(schema.envelope_key()) {
            Some(Value::Object(inner)) => (inner, true),
            Some(_) => {
                return Err(SislocError::ParseError {
                    details: format!("'{}' is not an object", schema.envelope_key()),
                })
            }
            None => (outer, false),
        };

        let encoding = match resource.get(schema.body_field()) {
            Some(Value::String(_)) => BodyEncoding::JsonString,
            Some(Value::Object(_)) => BodyEncoding::JsonObject,
            Some(_) => {
                return Err(SislocError::ParseError {
                    details: format!("'{}' is neither JSON text nor an object", schema.body_field()),
                })
            }
            None => {
                return Err(SislocError::MissingField {
                    field: format!("{}.{}", schema.envelope_key(), schema.body_field()),
                })
            }
        };
        if encoding != schema.body_encoding() {
            tracing::debug!(schema = %schema, ?encoding, "Body encoding differs from the usual one; keeping it");
        }

        Ok(Self {
            schema,
            resource,
            wrapped,
            encoding,
        })
    }

    pub fn parse(text: &str, schema: SchemaKind) -> Result<Self> {
        Self::from_value(serde_json::from_str(text)?, schema)
    }

    pub fn encoding(&self) -> BodyEncoding {
        self.encoding
    }

    /// Resource id, when the payload carries one
    pub fn id(&self) -> Option<String> {
        self.resource.get("id").and_then(crate::graph::id_from_value)
    }

    /// Decode the localized body into a graph
    pub fn graph(&self) -> Result<Graph> {
        let body = self
            .resource
            .get(self.schema.body_field())
            .ok_or_else(|| SislocError::MissingField {
                field: self.schema.body_field().to_string(),
            })?;
        let value = match body {
            Value::String(text) => serde_json::from_str(text).map_err(|e| SislocError::ParseError {
                details: format!("body is not valid JSON text: {}", e),
            })?,
            other => other.clone(),
        };
        Graph::from_value(value)
    }

    /// Replace the localized body, keeping its encoding
    pub fn set_graph(&mut self, graph: &Graph) -> Result<()> {
        let value = graph.to_value();
        let body = match self.encoding {
            BodyEncoding::JsonString => Value::String(serde_json::to_string(&value)?),
            BodyEncoding::JsonObject => value,
        };
        self.resource
            .insert(self.schema.body_field().to_string(), body);
        Ok(())
    }

    /// Payload shape for the API and files: always wrapped
    pub fn to_value(&self) -> Value {
        let mut outer = Map::new();
        outer.insert(
            self.schema.envelope_key().to_string(),
            Value::Object(self.resource.clone()),
        );
        Value::Object(outer)
    }

    /// Same shape the document was read in
    pub fn to_original_shape(&self) -> Value {
        if self.wrapped {
            self.to_value()
        } else {
            Value::Object(self.resource.clone())
        }
    }

    /// Small self-test document: English A→B→C, Spanish wired to a missing
    /// start id, French unwired.
    pub fn sample(schema: SchemaKind) -> Self {
        let body = sample_body(schema);
        let body = match schema.body_encoding() {
            BodyEncoding::JsonString => Value::String(body.to_string()),
            BodyEncoding::JsonObject => body,
        };
        let mut resource = Map::new();
        resource.insert("id".to_string(), json!(1001));
        resource.insert("name".to_string(), json!("Sample"));
        resource.insert(schema.body_field().to_string(), body);
        Self {
            schema,
            resource,
            wrapped: true,
            encoding: schema.body_encoding(),
        }
    }
}

fn sample_body(schema: SchemaKind) -> Value {
    let language_page = match schema {
        SchemaKind::Kiosk => json!({
            "id": "1", "type": "page", "template_id": "choice",
            "labels": {"title": "Choose your language"},
            "configuration": {"data_name": "language", "reasons": [
                {"id": 1, "title": "English"},
                {"id": 2, "title": "Spanish"},
                {"id": 3, "title": "French"}
            ]},
            "next": {"conditions": [
                {"lval": "reason_id", "op": "==", "rval": 1, "rval_type": "integer", "result": "2"},
                {"lval": "reason_id", "op": "==", "rval": 2, "rval_type": "integer", "result": "10"}
            ], "default": null}
        }),
        SchemaKind::Registration => json!({
            "id": "1", "type": "flex_field_page", "template_id": "choice",
            "labels": {"title": "Choose your language"},
            "configuration": {"flex_field": "language", "options": [
                {"id": 1, "label": "English", "value": "en"},
                {"id": 2, "label": "Spanish", "value": "es"},
                {"id": 3, "label": "French", "value": "fr"}
            ]},
            "next": {"conditions": [
                {"lval": "option_id", "op": "==", "rval": 1, "result": "2"},
                {"lval": "option_id", "op": "==", "rval": 2, "result": "10"}
            ], "default": null}
        }),
    };

    json!({
        "starting_node_id": "1",
        "nodes": {
            "1": language_page,
            "2": {"id": "2", "type": "page", "template_id": "photo",
                  "configuration": {"camera": "front", "required": true},
                  "next": {"conditions": [], "default": "3"}},
            "3": {"id": "3", "type": "page", "template_id": "message",
                  "labels": {"title": "Welcome"},
                  "next": {"conditions": [], "default": "4"}},
            "4": {"id": "4", "type": "page", "template_id": "thanks",
                  "configuration": {"timeout": 10},
                  "next": null}
        }
    })
}
