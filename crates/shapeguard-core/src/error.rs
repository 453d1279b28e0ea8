//! # Error Types — Schema Construction
//!
//! Errors raised while assembling a schema graph. These signal a broken
//! schema, never bad input data: validation mismatches live in
//! `shapeguard-schema` and are returned as values, not errors.

use thiserror::Error;

use crate::identity::NodeId;

/// Error while building or identifying a schema graph.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    /// A handle does not refer to a node in this graph.
    #[error("node {0} is not part of the schema graph")]
    UnknownNode(NodeId),

    /// A property was added to a node that is not an object.
    #[error("node {0} is not an object node")]
    NotAnObject(NodeId),

    /// An object already declares a property with this key.
    #[error("object node {object} already declares property '{key}'")]
    DuplicateProperty {
        /// The object node.
        object: NodeId,
        /// The repeated property key.
        key: String,
    },

    /// A schema identifier failed validation.
    #[error("invalid schema id '{id}': {reason}")]
    InvalidSchemaId {
        /// The rejected identifier.
        id: String,
        /// Why it was rejected.
        reason: String,
    },
}
