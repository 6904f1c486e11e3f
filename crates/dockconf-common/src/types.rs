//! Option record model shared by templates, configuration entries, and
//! resolved containers.

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Ordered mapping from option name to value.
///
/// Insertion order is preserved so declaration order from the input
/// document survives every merge.
pub type OptionRecord = IndexMap<String, OptionValue>;

/// A single container option value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OptionValue {
    /// Explicit absence (`~` / `null`).
    Null,
    /// Boolean scalar.
    Bool(bool),
    /// Integer scalar.
    Integer(i64),
    /// Floating point scalar.
    Float(f64),
    /// String scalar, possibly containing substitution placeholders.
    String(String),
    /// Ordered list of values.
    List(Vec<OptionValue>),
    /// Nested mapping.
    Mapping(OptionRecord),
}

impl OptionValue {
    /// Short name of the value's shape, used in diagnostics.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Integer(_) => "integer",
            Self::Float(_) => "float",
            Self::String(_) => "string",
            Self::List(_) => "list",
            Self::Mapping(_) => "mapping",
        }
    }

    /// Returns the string slice if this is a string scalar.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the nested record if this is a mapping.
    #[must_use]
    pub const fn as_mapping(&self) -> Option<&OptionRecord> {
        match self {
            Self::Mapping(m) => Some(m),
            _ => None,
        }
    }

    /// Returns `true` for [`OptionValue::Null`].
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }
}

impl fmt::Display for OptionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => Ok(()),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Integer(n) => write!(f, "{n}"),
            Self::Float(n) => write!(f, "{n}"),
            Self::String(s) => f.write_str(s),
            Self::List(_) | Self::Mapping(_) => match serde_json::to_string(self) {
                Ok(json) => f.write_str(&json),
                Err(_) => Err(fmt::Error),
            },
        }
    }
}

impl From<&str> for OptionValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_owned())
    }
}

impl From<String> for OptionValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<bool> for OptionValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for OptionValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<Vec<Self>> for OptionValue {
    fn from(value: Vec<Self>) -> Self {
        Self::List(value)
    }
}

impl From<OptionRecord> for OptionValue {
    fn from(value: OptionRecord) -> Self {
        Self::Mapping(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn yaml_scalars_keep_their_shape() {
        let record: OptionRecord = serde_yaml::from_str(
            "detach: true\nmemory: 512\nratio: 0.5\nimage: nginx\nunset: ~\n",
        )
        .expect("parse");
        assert_eq!(record["detach"], OptionValue::Bool(true));
        assert_eq!(record["memory"], OptionValue::Integer(512));
        assert_eq!(record["ratio"], OptionValue::Float(0.5));
        assert_eq!(record["image"], OptionValue::from("nginx"));
        assert!(record["unset"].is_null());
    }

    #[test]
    fn yaml_mapping_preserves_declaration_order() {
        let record: OptionRecord =
            serde_yaml::from_str("zeta: 1\nalpha: 2\nmid: 3\n").expect("parse");
        let keys: Vec<&str> = record.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["zeta", "alpha", "mid"]);
    }

    #[test]
    fn nested_collections_parse() {
        let record: OptionRecord =
            serde_yaml::from_str("env:\n  A: '1'\nlinks: [db, cache]\n").expect("parse");
        assert_eq!(record["env"].kind(), "mapping");
        assert_eq!(
            record["links"],
            OptionValue::List(vec!["db".into(), "cache".into()])
        );
    }

    #[test]
    fn display_serializes_collections_as_json() {
        let value = OptionValue::List(vec!["a".into(), OptionValue::Integer(1)]);
        assert_eq!(value.to_string(), r#"["a",1]"#);
        assert_eq!(OptionValue::Null.to_string(), "");
    }
}
