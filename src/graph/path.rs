//! Field paths into a node body
//!
//! A path is written the way it is recorded in correspondence tags:
//! - `labels.title` (dot notation)
//! - `configuration.fields[0].label` (array index)
//!
//! Wildcards are not supported; the field selector expands them into
//! concrete paths before anything is read or written.

use std::fmt;
use std::str::FromStr;

use serde_json::Value;

use crate::error::SislocError;

/// A parsed path segment
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Segment {
    /// Object field access: .field
    Field(String),
    /// Array index access: [0]
    Index(usize),
}

/// Concrete location of a value inside a node body
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct FieldPath {
    segments: Vec<Segment>,
}

impl FieldPath {
    pub fn root() -> Self {
        Self::default()
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// New path with a field appended
    pub fn field(&self, name: &str) -> Self {
        let mut segments = self.segments.clone();
        segments.push(Segment::Field(name.to_string()));
        Self { segments }
    }

    /// New path with an index appended
    pub fn index(&self, idx: usize) -> Self {
        let mut segments = self.segments.clone();
        segments.push(Segment::Index(idx));
        Self { segments }
    }

    /// Resolve the path against a value
    pub fn get<'v>(&self, value: &'v Value) -> Option<&'v Value> {
        let mut current = value;
        for segment in &self.segments {
            current = match segment {
                Segment::Field(name) => current.get(name)?,
                Segment::Index(idx) => current.get(*idx)?,
            };
        }
        Some(current)
    }

    /// Overwrite the value at an existing location
    ///
    /// Returns false when an intermediate container is missing; paths
    /// never create structure.
    pub fn set(&self, value: &mut Value, new_value: Value) -> bool {
        let mut current = value;
        for segment in &self.segments {
            let next = match segment {
                Segment::Field(name) => current.get_mut(name.as_str()),
                Segment::Index(idx) => current.get_mut(*idx),
            };
            match next {
                Some(v) => current = v,
                None => return false,
            }
        }
        *current = new_value;
        true
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.segments.iter().enumerate() {
            match segment {
                Segment::Field(name) if i == 0 => write!(f, "{}", name)?,
                Segment::Field(name) => write!(f, ".{}", name)?,
                Segment::Index(idx) => write!(f, "[{}]", idx)?,
            }
        }
        Ok(())
    }
}

impl FromStr for FieldPath {
    type Err = SislocError;

    fn from_str(path: &str) -> Result<Self, Self::Err> {
        let invalid = || SislocError::ParseError {
            details: format!("invalid field path '{}'", path),
        };

        if path.is_empty() {
            return Ok(Self::root());
        }

        let mut segments = Vec::new();
        for part in path.split('.') {
            if part.is_empty() {
                return Err(invalid());
            }

            // field[0][1] or field
            let (field, mut rest) = match part.find('[') {
                Some(pos) => (&part[..pos], &part[pos..]),
                None => (part, ""),
            };
            if !field.is_empty() {
                segments.push(Segment::Field(field.to_string()));
            }
            while !rest.is_empty() {
                let close = rest.find(']').ok_or_else(invalid)?;
                if !rest.starts_with('[') {
                    return Err(invalid());
                }
                let idx: usize = rest[1..close].parse().map_err(|_| invalid())?;
                segments.push(Segment::Index(idx));
                rest = &rest[close + 1..];
            }
        }

        Ok(Self { segments })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_display_and_parse_agree() {
        let path = FieldPath::root()
            .field("configuration")
            .field("form_fields")
            .index(2)
            .field("options")
            .index(0)
            .field("label");
        let text = path.to_string();
        assert_eq!(text, "configuration.form_fields[2].options[0].label");
        assert_eq!(text.parse::<FieldPath>().unwrap(), path);
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert!("labels..title".parse::<FieldPath>().is_err());
        assert!("items[x]".parse::<FieldPath>().is_err());
        assert!("items[0".parse::<FieldPath>().is_err());
    }

    #[test]
    fn test_get_and_set() {
        let mut value = json!({"labels": {"title": "Hi"}, "list": [{"a": "x"}]});
        let title: FieldPath = "labels.title".parse().unwrap();
        assert_eq!(title.get(&value), Some(&json!("Hi")));

        assert!(title.set(&mut value, json!("Hola")));
        assert_eq!(value["labels"]["title"], "Hola");

        let nested: FieldPath = "list[0].a".parse().unwrap();
        assert!(nested.set(&mut value, json!("y")));
        assert_eq!(value["list"][0]["a"], "y");
    }

    #[test]
    fn test_set_never_creates_structure() {
        let mut value = json!({"labels": {}});
        let missing: FieldPath = "configuration.title".parse().unwrap();
        assert!(!missing.set(&mut value, json!("x")));
        assert!(value.get("configuration").is_none());
    }
}
