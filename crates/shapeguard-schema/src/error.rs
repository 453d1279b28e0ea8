//! # Error Model
//!
//! Three tiers, kept in separate types so callers cannot confuse them:
//!
//! 1. **Data mismatches**: [`ValidationError`]. Expected outcomes of
//!    validating untrusted input. Returned in a list, never raised.
//! 2. **Limit exhaustion**: [`CircularDependencyLimitReached`]. A cyclic
//!    schema was re-entered more often than the caller allows. Aborts the
//!    whole call; no partial error list is returned.
//! 3. **Build and registry faults**: [`BuildError`], [`RegistryError`].
//!    A broken schema or a missing registration. Not retried.
//!
//! [`AssertError`] is the aggregate raised by the assert wrappers when a
//! validation produced at least one mismatch.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use shapeguard_core::NodeId;

/// Category of a data-level mismatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValidationErrorKind {
    ValueTypeMismatch,
    LiteralMismatch,
    UnionMismatch,
    TupleMismatch,
    PropertyMismatch,
    ObjectMismatch,
    ArrayMismatch,
    EnumMismatch,
}

impl ValidationErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ValueTypeMismatch => "ValueTypeMismatch",
            Self::LiteralMismatch => "LiteralMismatch",
            Self::UnionMismatch => "UnionMismatch",
            Self::TupleMismatch => "TupleMismatch",
            Self::PropertyMismatch => "PropertyMismatch",
            Self::ObjectMismatch => "ObjectMismatch",
            Self::ArrayMismatch => "ArrayMismatch",
            Self::EnumMismatch => "EnumMismatch",
        }
    }
}

impl std::fmt::Display for ValidationErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single mismatch between a value and its schema.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[error("{message}")]
pub struct ValidationError {
    /// Human-readable description, prefixed with the dotted path.
    pub message: String,
    /// Path segments from the root: `Base`, `(Name)`, keys, `[i]`.
    pub path: Vec<String>,
    /// Mismatch category.
    pub kind: ValidationErrorKind,
}

impl ValidationError {
    /// The path joined with `.`, e.g. `Base.(Node).next.(Node).content`.
    pub fn path_string(&self) -> String {
        self.path.join(".")
    }
}

/// Non-empty collection of mismatches from one validation call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors {
    errors: Vec<ValidationError>,
}

impl ValidationErrors {
    /// Returns the number of errors.
    pub fn len(&self) -> usize {
        self.errors.len()
    }

    /// Returns true if there are no errors.
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Returns a slice of all errors, in the order they were found.
    pub fn errors(&self) -> &[ValidationError] {
        &self.errors
    }

    /// Count the errors of one kind.
    pub fn count_of(&self, kind: ValidationErrorKind) -> usize {
        self.errors.iter().filter(|e| e.kind == kind).count()
    }

    /// Consumes self and returns the inner Vec.
    pub fn into_inner(self) -> Vec<ValidationError> {
        self.errors
    }
}

impl From<Vec<ValidationError>> for ValidationErrors {
    fn from(errors: Vec<ValidationError>) -> Self {
        Self { errors }
    }
}

impl std::fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, e) in self.errors.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "  [{}] {}", e.kind, e.message)?;
        }
        Ok(())
    }
}

/// Raised when a cyclic object schema is re-entered more often than the
/// configured limit allows.
///
/// `count` is the number of repeated entries along the aborting path, so a
/// caller can retry with `limit >= count` or reject the input.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("circular dependency limit reached after {count} repeated object entries")]
pub struct CircularDependencyLimitReached {
    pub count: usize,
}

/// Fatal fault while compiling a schema graph.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BuildError {
    /// A handle in the schema does not resolve to a node.
    #[error("schema references unknown node {0}")]
    UnknownNode(NodeId),

    /// A node's placeholder was never filled in.
    #[error("node {0} was never resolved during compilation")]
    Unresolved(NodeId),

    /// A union or intersection reaches itself without passing through an
    /// object, array or tuple, so validation would never reach a leaf.
    #[error("node {0} contains itself through unions and intersections only")]
    CombinatorCycle(NodeId),
}

/// Raised by the assert wrappers.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AssertError {
    /// The value has at least one mismatch.
    #[error("{} validation error(s):\n{}", .0.len(), .0)]
    Invalid(ValidationErrors),

    /// The circular dependency limit aborted validation.
    #[error(transparent)]
    CircularLimit(#[from] CircularDependencyLimitReached),

    /// A typed value could not be converted to JSON before validation.
    #[error("value could not be converted to JSON: {0}")]
    Serialization(String),
}

impl AssertError {
    /// The mismatches, if this is an [`AssertError::Invalid`].
    pub fn validation_errors(&self) -> Option<&ValidationErrors> {
        match self {
            Self::Invalid(errors) => Some(errors),
            _ => None,
        }
    }
}

/// Errors returned by [`crate::SchemaRegistry`] operations.
#[derive(Error, Debug)]
pub enum RegistryError {
    /// No schema is registered under this id.
    #[error("missing schema: '{0}'")]
    MissingSchema(String),

    /// No compiled validator is registered under this id.
    #[error("missing validator: '{0}'")]
    MissingValidator(String),

    /// The schema could not be compiled.
    #[error("failed to compile schema {id}: {source}")]
    Build {
        /// Registry id of the schema.
        id: String,
        /// The build fault.
        source: BuildError,
    },

    /// A schema document could not be read or parsed.
    #[error("failed to load schema {path}: {reason}")]
    SchemaLoad {
        /// Path or identifier of the schema.
        path: String,
        /// Human-readable reason for the failure.
        reason: String,
    },

    /// A document to validate could not be read or parsed.
    #[error("failed to load document {path}: {reason}")]
    DocumentLoad {
        /// Path to the document.
        path: String,
        /// Human-readable reason for the failure.
        reason: String,
    },

    /// Validation aborted on the circular dependency limit.
    #[error(transparent)]
    CircularLimit(#[from] CircularDependencyLimitReached),

    /// An assert through the registry failed.
    #[error(transparent)]
    Assert(#[from] AssertError),

    /// I/O error during file operations.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn error(kind: ValidationErrorKind, message: &str) -> ValidationError {
        ValidationError {
            message: message.to_string(),
            path: vec!["Base".into(), "(Node)".into(), "content".into()],
            kind,
        }
    }

    #[test]
    fn validation_error_display_is_message() {
        let e = error(ValidationErrorKind::ValueTypeMismatch, "Base.x is not a string.");
        assert_eq!(e.to_string(), "Base.x is not a string.");
        assert_eq!(e.path_string(), "Base.(Node).content");
    }

    #[test]
    fn validation_errors_display_lists_each_error() {
        let errors = ValidationErrors::from(vec![
            error(ValidationErrorKind::PropertyMismatch, "first"),
            error(ValidationErrorKind::EnumMismatch, "second"),
        ]);
        let display = errors.to_string();
        assert_eq!(display, "  [PropertyMismatch] first\n  [EnumMismatch] second");
        assert_eq!(errors.count_of(ValidationErrorKind::EnumMismatch), 1);
        assert_eq!(errors.len(), 2);
    }

    #[test]
    fn assert_error_invalid_display_has_count() {
        let err = AssertError::Invalid(ValidationErrors::from(vec![error(
            ValidationErrorKind::UnionMismatch,
            "no match",
        )]));
        assert!(err.to_string().starts_with("1 validation error(s):"));
        assert_eq!(err.validation_errors().map(|e| e.len()), Some(1));
    }

    #[test]
    fn circular_limit_display_carries_count() {
        let err = CircularDependencyLimitReached { count: 4 };
        assert!(err.to_string().contains("after 4 repeated"));
        let wrapped = AssertError::from(err);
        assert_eq!(wrapped.to_string(), err.to_string());
        assert!(wrapped.validation_errors().is_none());
    }

    #[test]
    fn registry_error_display() {
        let err = RegistryError::MissingSchema("Node".into());
        assert_eq!(err.to_string(), "missing schema: 'Node'");
        let err = RegistryError::Build {
            id: "Node".into(),
            source: BuildError::UnknownNode(NodeId(3)),
        };
        assert_eq!(
            err.to_string(),
            "failed to compile schema Node: schema references unknown node #3"
        );
        assert_eq!(
            BuildError::CombinatorCycle(NodeId(0)).to_string(),
            "node #0 contains itself through unions and intersections only"
        );
    }

    #[test]
    fn error_kind_serializes_by_name() {
        let json = serde_json::to_string(&ValidationErrorKind::TupleMismatch).unwrap();
        assert_eq!(json, "\"TupleMismatch\"");
    }
}
