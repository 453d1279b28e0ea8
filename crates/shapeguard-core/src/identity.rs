//! # Identity Newtypes
//!
//! Handles for schema nodes and registered schemas. Keeping them distinct
//! means a node index can never be passed where a registry key is
//! expected, and vice versa.

use serde::{Deserialize, Serialize};

use crate::error::SchemaError;

/// Handle of a node inside one schema graph (its arena index).
///
/// Node identity, not structural equality, is what the compiler caches on
/// and what the circular-dependency guard tracks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub usize);

impl NodeId {
    /// The arena index behind this handle.
    pub fn index(self) -> usize {
        self.0
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Registry key of a schema (e.g. `"Node"` for `Node.shape.json`).
///
/// Must be non-empty and free of whitespace and path separators, since ids
/// are derived from file names and typed on the command line.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SchemaId(String);

impl SchemaId {
    /// Validate and wrap a schema identifier.
    pub fn new(id: impl Into<String>) -> Result<Self, SchemaError> {
        let id = id.into();
        let reason = if id.is_empty() {
            Some("must not be empty")
        } else if id.chars().any(char::is_whitespace) {
            Some("must not contain whitespace")
        } else if id.contains(|c| c == '/' || c == '\\') {
            Some("must not contain path separators")
        } else {
            None
        };
        match reason {
            Some(reason) => Err(SchemaError::InvalidSchemaId {
                id,
                reason: reason.to_string(),
            }),
            None => Ok(Self(id)),
        }
    }

    /// The identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for SchemaId {
    type Error = SchemaError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<SchemaId> for String {
    fn from(id: SchemaId) -> Self {
        id.0
    }
}

impl std::borrow::Borrow<str> for SchemaId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SchemaId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_id_display_and_index() {
        let id = NodeId(3);
        assert_eq!(id.to_string(), "#3");
        assert_eq!(id.index(), 3);
    }

    #[test]
    fn schema_id_accepts_plain_names() {
        let id = SchemaId::new("LinkedNode").unwrap();
        assert_eq!(id.as_str(), "LinkedNode");
        assert_eq!(id.to_string(), "LinkedNode");
    }

    #[test]
    fn schema_id_rejects_empty() {
        assert!(matches!(
            SchemaId::new(""),
            Err(SchemaError::InvalidSchemaId { .. })
        ));
    }

    #[test]
    fn schema_id_rejects_whitespace_and_separators() {
        assert!(SchemaId::new("two words").is_err());
        assert!(SchemaId::new("dir/name").is_err());
        assert!(SchemaId::new("dir\\name").is_err());
    }

    #[test]
    fn schema_id_deserialize_validates() {
        let ok: Result<SchemaId, _> = serde_json::from_str("\"Animal\"");
        assert!(ok.is_ok());
        let bad: Result<SchemaId, _> = serde_json::from_str("\"\"");
        assert!(bad.is_err());
    }
}
