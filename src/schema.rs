//! Schema variants: kiosk workflows and registration experiences
//!
//! All schema-specific knowledge lives here and in [`crate::fields`]:
//! which node is the language page, where its choices and routing live,
//! and how the resource is wrapped for transport. The synchronizer itself
//! only sees [`Node`]s.

use std::fmt;
use std::str::FromStr;

use serde_json::Value;

use crate::error::SislocError;
use crate::graph::{id_from_value, Node};

/// How the localized body is stored inside the resource
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyEncoding {
    /// JSON text inside a string field
    JsonString,
    /// Native JSON object
    JsonObject,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SchemaKind {
    /// Kiosk sign-in workflow
    #[default]
    Kiosk,
    /// Registration experience
    Registration,
}

impl SchemaKind {
    pub fn name(&self) -> &'static str {
        match self {
            SchemaKind::Kiosk => "kiosk",
            SchemaKind::Registration => "registration",
        }
    }

    // ─────────────────────────────────────────────────────────────
    // Transport
    // ─────────────────────────────────────────────────────────────

    /// Key wrapping the resource in API payloads
    pub fn envelope_key(&self) -> &'static str {
        match self {
            SchemaKind::Kiosk => "workflow",
            SchemaKind::Registration => "registration_experience",
        }
    }

    /// Collection segment in API URLs
    pub fn api_segment(&self) -> &'static str {
        match self {
            SchemaKind::Kiosk => "workflows",
            SchemaKind::Registration => "registration_experiences",
        }
    }

    /// Resource field holding the localized body
    pub fn body_field(&self) -> &'static str {
        "body"
    }

    pub fn body_encoding(&self) -> BodyEncoding {
        match self {
            SchemaKind::Kiosk => BodyEncoding::JsonString,
            SchemaKind::Registration => BodyEncoding::JsonObject,
        }
    }

    // ─────────────────────────────────────────────────────────────
    // Language page
    // ─────────────────────────────────────────────────────────────

    /// Page `type` of the language selector
    pub fn language_page_type(&self) -> &'static str {
        match self {
            SchemaKind::Kiosk => "page",
            SchemaKind::Registration => "flex_field_page",
        }
    }

    /// Configuration key that must equal `"language"` on the selector
    pub fn language_marker_key(&self) -> &'static str {
        match self {
            SchemaKind::Kiosk => "data_name",
            SchemaKind::Registration => "flex_field",
        }
    }

    /// Predicate identifying the language selector node
    pub fn is_language_page(&self, node: &Node) -> bool {
        node.node_type() == self.language_page_type()
            && node.config_str(self.language_marker_key()) == Some("language")
    }

    /// Configuration list holding the language choices
    pub fn choices_key(&self) -> &'static str {
        match self {
            SchemaKind::Kiosk => "reasons",
            SchemaKind::Registration => "options",
        }
    }

    /// Display label of one choice entry
    pub fn choice_label(&self, entry: &Value) -> Option<String> {
        let keys: &[&str] = match self {
            SchemaKind::Kiosk => &["title", "label"],
            SchemaKind::Registration => &["label", "title"],
        };
        keys.iter()
            .filter_map(|k| entry.get(*k).and_then(Value::as_str))
            .map(str::trim)
            .find(|s| !s.is_empty())
            .map(str::to_string)
    }

    /// Stable identifier of one choice entry
    pub fn choice_id(&self, entry: &Value) -> Option<String> {
        entry.get("id").and_then(id_from_value)
    }

    /// `lval`s of routing conditions that select on the choice id
    pub fn routing_lvals(&self) -> &'static [&'static str] {
        match self {
            SchemaKind::Kiosk => &["reason_id", "language_id"],
            SchemaKind::Registration => &["option_id"],
        }
    }
}

impl fmt::Display for SchemaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SchemaKind {
    type Err = SislocError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "kiosk" | "workflow" => Ok(SchemaKind::Kiosk),
            "registration" | "registration_experience" => Ok(SchemaKind::Registration),
            other => Err(SislocError::Config {
                reason: format!(
                    "unknown experience type '{}' (expected kiosk or registration)",
                    other
                ),
            }),
        }
    }
}
