//! Field selection: which node attributes are display text
//!
//! This table is the only place where the two schemas differ in what gets
//! translated. Everything a rule does not select is structural and is
//! copied byte-for-byte from the template node. Routing values, choice
//! values and identifiers are never selected, even when they are text.

use serde_json::Value;

use crate::graph::{FieldPath, Node};
use crate::identity::TAG_KEY;
use crate::schema::SchemaKind;

/// User-visible text keys shared by both schemas
const TEXT_KEYS: &[&str] = &[
    "title",
    "message",
    "back",
    "forward",
    "label",
    "placeholder",
    "help",
    "description",
    "error",
    "errors",
    "validation_message",
    "subtitle",
    "hint",
];

/// Kiosk pages that route automatically; their titles are admin-only
const AUTO_ROUTING_KINDS: &[&str] = &["invitecheck", "watchlistcheck", "hostcheck"];

/// Keys that are never display text in kiosk configuration
const KIOSK_NEVER: &[&str] = &["data_name", "name", "value", "id", TAG_KEY];

/// Keys that are never display text in registration configuration
const REGISTRATION_NEVER: &[&str] = &["value", "flex_field", "key", "name", "id", TAG_KEY];

const REGISTRATION_PAGE_KEYS: &[&str] = &["title", "subtitle", "message"];
const REGISTRATION_BUTTON_KEYS: &[&str] = &["text", "label"];
const REGISTRATION_FORM_FIELD_KEYS: &[&str] = &["label", "placeholder", "help_text", "error_message"];

/// Translatable string locations of `node`, in document order, without duplicates
pub fn translatable_fields(node: &Node, schema: SchemaKind) -> Vec<FieldPath> {
    let mut out = Vec::new();
    match schema {
        SchemaKind::Kiosk => kiosk_fields(node, &mut out),
        SchemaKind::Registration => registration_fields(node, &mut out),
    }
    let mut seen = std::collections::HashSet::new();
    out.retain(|p| seen.insert(p.clone()));
    out
}

// ═══════════════════════════════════════════
// KIOSK
// ═══════════════════════════════════════════

fn kiosk_fields(node: &Node, out: &mut Vec<FieldPath>) {
    let auto_routing = AUTO_ROUTING_KINDS.contains(&node.kind());

    let config_keys: Vec<&str> = TEXT_KEYS
        .iter()
        .copied()
        .filter(|k| !(auto_routing && *k == "title"))
        .collect();
    let mut label_keys = config_keys.clone();
    if auto_routing {
        label_keys.push("loading");
    }

    label_fields(node, &label_keys, out);

    if let Some(config) = node.body().get("configuration") {
        let root = FieldPath::root().field("configuration");
        collect_kiosk_config(config, &root, false, &config_keys, out);
    }
}

/// Strings under a text key at any depth; containers under a text key
/// contribute every string they hold.
fn collect_kiosk_config(
    value: &Value,
    path: &FieldPath,
    inherited: bool,
    keys: &[&str],
    out: &mut Vec<FieldPath>,
) {
    match value {
        Value::Object(map) => {
            for (key, child) in map {
                if KIOSK_NEVER.contains(&key.as_str()) {
                    continue;
                }
                let selected = inherited || keys.contains(&key.as_str());
                let child_path = path.field(key);
                if child.is_string() {
                    if selected {
                        out.push(child_path);
                    }
                } else {
                    collect_kiosk_config(child, &child_path, selected, keys, out);
                }
            }
        }
        Value::Array(items) => {
            for (i, item) in items.iter().enumerate() {
                let item_path = path.index(i);
                if item.is_string() {
                    if inherited {
                        out.push(item_path);
                    }
                } else {
                    collect_kiosk_config(item, &item_path, inherited, keys, out);
                }
            }
        }
        _ => {}
    }
}

// ═══════════════════════════════════════════
// REGISTRATION
// ═══════════════════════════════════════════

fn registration_fields(node: &Node, out: &mut Vec<FieldPath>) {
    label_fields(node, TEXT_KEYS, out);

    let Some(config) = node.configuration() else {
        return;
    };
    let root = FieldPath::root().field("configuration");

    // Page-level messages
    for key in REGISTRATION_PAGE_KEYS {
        if config.get(*key).is_some_and(Value::is_string) {
            out.push(root.field(key));
        }
    }
    if let Some(messages) = config.get("messages") {
        collect_all_strings(messages, &root.field("messages"), out);
    }

    // Button texts: {"submit": {"text": ..}} / {"submit": ".."} / [{"text": ..}]
    match config.get("buttons") {
        Some(Value::Object(buttons)) => {
            let base = root.field("buttons");
            for (name, button) in buttons {
                if button.is_string() {
                    out.push(base.field(name));
                } else {
                    string_keys(button, &base.field(name), REGISTRATION_BUTTON_KEYS, out);
                }
            }
        }
        Some(Value::Array(buttons)) => {
            let base = root.field("buttons");
            for (i, button) in buttons.iter().enumerate() {
                string_keys(button, &base.index(i), REGISTRATION_BUTTON_KEYS, out);
            }
        }
        _ => {}
    }

    // Form fields and their option labels
    if let Some(fields) = config.get("form_fields").and_then(Value::as_array) {
        let base = root.field("form_fields");
        for (i, field) in fields.iter().enumerate() {
            let field_path = base.index(i);
            string_keys(field, &field_path, REGISTRATION_FORM_FIELD_KEYS, out);
            if let Some(options) = field.get("options").and_then(Value::as_array) {
                for (j, option) in options.iter().enumerate() {
                    string_keys(option, &field_path.field("options").index(j), &["label"], out);
                }
            }
        }
    }
}

/// Every string inside `value`, skipping non-text keys
fn collect_all_strings(value: &Value, path: &FieldPath, out: &mut Vec<FieldPath>) {
    match value {
        Value::String(_) => out.push(path.clone()),
        Value::Object(map) => {
            for (key, child) in map {
                if !REGISTRATION_NEVER.contains(&key.as_str()) {
                    collect_all_strings(child, &path.field(key), out);
                }
            }
        }
        Value::Array(items) => {
            for (i, item) in items.iter().enumerate() {
                collect_all_strings(item, &path.index(i), out);
            }
        }
        _ => {}
    }
}

// ═══════════════════════════════════════════
// SHARED
// ═══════════════════════════════════════════

fn label_fields(node: &Node, keys: &[&str], out: &mut Vec<FieldPath>) {
    let Some(labels) = node.body().get("labels").and_then(Value::as_object) else {
        return;
    };
    let base = FieldPath::root().field("labels");
    for (key, value) in labels {
        if value.is_string() && keys.contains(&key.as_str()) {
            out.push(base.field(key));
        }
    }
}

/// Direct string children of an object whose key is in `keys`
fn string_keys(value: &Value, path: &FieldPath, keys: &[&str], out: &mut Vec<FieldPath>) {
    let Some(map) = value.as_object() else {
        return;
    };
    for (key, child) in map {
        if child.is_string() && keys.contains(&key.as_str()) {
            out.push(path.field(key));
        }
    }
}
