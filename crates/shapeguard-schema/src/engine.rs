//! # Validation Engine
//!
//! Walks a JSON value against a [`CompiledValidator`] and collects every
//! mismatch as a path-annotated [`ValidationError`].
//!
//! ## Paths
//!
//! The root segment is `Base`. Entering an object appends `(Name)`, a
//! property appends its bare key, and array and tuple elements append
//! `[i]`. Segments are kept as a borrowed breadcrumb chain and only turned
//! into a `Vec<String>` when an error is recorded.
//!
//! ## Circular-dependency guard
//!
//! Each call threads an immutable context down the recursion: the chain of
//! object slots entered along the current path, a repeat count and the
//! caller's limit. Re-entering an object already on the chain bumps the
//! count for that subtree only. When the limit is non-zero and the count
//! exceeds it, the whole call aborts with [`CircularDependencyLimitReached`]
//! and no partial error list is returned. A limit of `0` leaves the guard
//! unbounded.

use serde::Serialize;
use serde_json::Value;

use shapeguard_core::ValueKind;

use crate::compile::{Check, CompiledValidator, ObjectCheck, Slot};
use crate::error::{
    AssertError, CircularDependencyLimitReached, ValidationError, ValidationErrorKind,
};

/// Circular dependency limit used by [`CompiledValidator::validate`].
pub const DEFAULT_CIRCULAR_DEPENDENCY_LIMIT: usize = 0;

/// Root path segment.
pub const ROOT_SEGMENT: &str = "Base";

type Outcome = Result<(), CircularDependencyLimitReached>;

impl CompiledValidator {
    /// Validate `value` with the default circular dependency limit.
    ///
    /// An empty list means the value matches.
    pub fn validate(
        &self,
        value: &Value,
    ) -> Result<Vec<ValidationError>, CircularDependencyLimitReached> {
        self.validate_with_limit(value, DEFAULT_CIRCULAR_DEPENDENCY_LIMIT)
    }

    /// Validate `value`, aborting once a cyclic object is re-entered more
    /// than `limit` times along one path (`0` = unbounded).
    ///
    /// # Errors
    ///
    /// Returns [`CircularDependencyLimitReached`] carrying the repeat count
    /// at the point of abort.
    pub fn validate_with_limit(
        &self,
        value: &Value,
        limit: usize,
    ) -> Result<Vec<ValidationError>, CircularDependencyLimitReached> {
        let mut errors = Vec::new();
        let path = Crumb {
            segment: Segment::Name(ROOT_SEGMENT),
            parent: None,
        };
        let context = Circular {
            entered: None,
            count: 0,
            limit,
        };
        match self.check(self.root, value, &path, &mut errors, context) {
            Ok(()) => Ok(errors),
            Err(reached) => {
                tracing::debug!(
                    count = reached.count,
                    limit,
                    root = %self.root_type(),
                    "circular dependency limit reached"
                );
                Err(reached)
            }
        }
    }

    /// Validate and turn a non-empty error list into [`AssertError::Invalid`].
    pub fn assert(&self, value: &Value, limit: usize) -> Result<(), AssertError> {
        let errors = self.validate_with_limit(value, limit)?;
        if errors.is_empty() {
            Ok(())
        } else {
            Err(AssertError::Invalid(errors.into()))
        }
    }

    /// Convert a typed value to JSON, then [`assert`](Self::assert) it.
    pub fn assert_serialize<T: Serialize + ?Sized>(
        &self,
        value: &T,
        limit: usize,
    ) -> Result<(), AssertError> {
        let value =
            serde_json::to_value(value).map_err(|e| AssertError::Serialization(e.to_string()))?;
        self.assert(&value, limit)
    }

    fn check(
        &self,
        slot: Slot,
        value: &Value,
        path: &Crumb<'_>,
        errors: &mut Vec<ValidationError>,
        context: Circular<'_>,
    ) -> Outcome {
        // Slots always come from the same compiled arena.
        let Some(check) = self.checks.get(slot) else {
            return Ok(());
        };
        match check {
            Check::ValueType(kind) => {
                if !kind_matches(*kind, value) {
                    let noun = match kind {
                        ValueKind::String => "a string",
                        ValueKind::Number => "a number",
                        ValueKind::Boolean => "a boolean",
                        ValueKind::Function => "a function",
                        ValueKind::Object => "an object",
                        ValueKind::Null => "null",
                        ValueKind::Undefined => "undefined",
                        ValueKind::Any => "anything",
                    };
                    report(errors, path, ValidationErrorKind::ValueTypeMismatch, |at| {
                        format!("{at} is not {noun}.")
                    });
                }
            }
            Check::Literal { value: expected, rendered } => {
                if !expected.matches(value) {
                    report(errors, path, ValidationErrorKind::LiteralMismatch, |at| {
                        format!("{at} does not match literal {rendered}.")
                    });
                }
            }
            Check::Union {
                members,
                possibilities,
            } => {
                self.check_union(members, possibilities, None, value, path, errors, context)?;
            }
            Check::Intersection { members, declared } => {
                self.check_intersection(members, declared, value, path, errors, context)?;
            }
            Check::Tuple { elements, rendered } => {
                let Value::Array(items) = value else {
                    report(errors, path, ValidationErrorKind::TupleMismatch, |at| {
                        format!("{at} is not an array, but tuple {rendered} is expected.")
                    });
                    return Ok(());
                };
                if items.len() != elements.len() {
                    report(errors, path, ValidationErrorKind::TupleMismatch, |at| {
                        format!(
                            "{at} has {} element(s), but tuple {rendered} is expected.",
                            items.len()
                        )
                    });
                    return Ok(());
                }
                for (i, (element, item)) in elements.iter().zip(items).enumerate() {
                    let at = path.child(Segment::Index(i));
                    self.check(*element, item, &at, errors, context)?;
                }
            }
            Check::Array { element } => {
                let Value::Array(items) = value else {
                    report(errors, path, ValidationErrorKind::ArrayMismatch, |at| {
                        format!("{at} is not an array.")
                    });
                    return Ok(());
                };
                for (i, item) in items.iter().enumerate() {
                    let at = path.child(Segment::Index(i));
                    self.check(*element, item, &at, errors, context)?;
                }
            }
            Check::Enum {
                name,
                values,
                listed,
            } => {
                if !values.iter().any(|v| v.matches(value)) {
                    report(errors, path, ValidationErrorKind::EnumMismatch, |at| {
                        format!(
                            "{at} does not match any member of Enum({name}). Possibilities: {listed}."
                        )
                    });
                }
            }
            Check::Object(object) => {
                self.check_object(slot, object, &[], value, path, errors, context)?;
            }
        }
        Ok(())
    }

    /// Members run on scratch buffers; the first clean member wins.
    #[allow(clippy::too_many_arguments)]
    fn check_union(
        &self,
        members: &[Slot],
        possibilities: &str,
        widened: Option<&[String]>,
        value: &Value,
        path: &Crumb<'_>,
        errors: &mut Vec<ValidationError>,
        context: Circular<'_>,
    ) -> Outcome {
        for member in members {
            let mut scratch = Vec::new();
            self.check_member(*member, widened, value, path, &mut scratch, context)?;
            if scratch.is_empty() {
                return Ok(());
            }
        }
        report(errors, path, ValidationErrorKind::UnionMismatch, |at| {
            format!("{at} does not match any union member. Possibilities: {possibilities}.")
        });
        Ok(())
    }

    /// Every member runs against the same sink. Object members reached
    /// through nested unions and intersections also accept keys declared
    /// by the other objects of the outermost intersection.
    fn check_intersection(
        &self,
        members: &[Slot],
        declared: &[String],
        value: &Value,
        path: &Crumb<'_>,
        errors: &mut Vec<ValidationError>,
        context: Circular<'_>,
    ) -> Outcome {
        for member in members {
            self.check_member(*member, Some(declared), value, path, errors, context)?;
        }
        Ok(())
    }

    /// Check one union or intersection member. `widened` carries the keys of
    /// the enclosing intersection, if any.
    fn check_member(
        &self,
        slot: Slot,
        widened: Option<&[String]>,
        value: &Value,
        path: &Crumb<'_>,
        errors: &mut Vec<ValidationError>,
        context: Circular<'_>,
    ) -> Outcome {
        match self.checks.get(slot) {
            Some(Check::Object(object)) => self.check_object(
                slot,
                object,
                widened.unwrap_or_default(),
                value,
                path,
                errors,
                context,
            ),
            Some(Check::Intersection { members, declared }) => self.check_intersection(
                members,
                widened.unwrap_or(declared.as_slice()),
                value,
                path,
                errors,
                context,
            ),
            Some(Check::Union {
                members,
                possibilities,
            }) => self.check_union(members, possibilities, widened, value, path, errors, context),
            _ => self.check(slot, value, path, errors, context),
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn check_object(
        &self,
        slot: Slot,
        object: &ObjectCheck,
        also_declared: &[String],
        value: &Value,
        path: &Crumb<'_>,
        errors: &mut Vec<ValidationError>,
        context: Circular<'_>,
    ) -> Outcome {
        let Value::Object(map) = value else {
            report(errors, path, ValidationErrorKind::ObjectMismatch, |at| {
                format!("{at} is not an object, but {} is expected.", object.name)
            });
            return Ok(());
        };
        let path = path.child(Segment::Name(&object.segment));

        let frame = Entered {
            slot,
            parent: context.entered,
        };
        let inner = if context.has_entered(slot) {
            let count = context.count + 1;
            if context.limit > 0 && count > context.limit {
                return Err(CircularDependencyLimitReached { count });
            }
            Circular {
                entered: context.entered,
                count,
                limit: context.limit,
            }
        } else {
            Circular {
                entered: Some(&frame),
                count: context.count,
                limit: context.limit,
            }
        };

        for property in &object.properties {
            let at = path.child(Segment::Name(&property.key));
            match map.get(&property.key) {
                Some(field) => self.check(property.slot, field, &at, errors, inner)?,
                None if property.optional => {}
                None => report(errors, &at, ValidationErrorKind::PropertyMismatch, |at| {
                    format!(
                        "{at} is required, but missing; {} is expected.",
                        property.expected
                    )
                }),
            }
        }

        for key in map.keys() {
            if !object.declares(key) && !also_declared.contains(key) {
                report(errors, &path, ValidationErrorKind::PropertyMismatch, |at| {
                    format!("{at} has unknown key '{key}'; {} is expected.", object.name)
                });
            }
        }
        Ok(())
    }
}

/// Primitive predicate behind a `value_type` node.
///
/// JSON carries no functions and no `undefined`, so those kinds never match
/// a present value. The loose `object` kind accepts objects and arrays.
pub fn kind_matches(kind: ValueKind, value: &Value) -> bool {
    match kind {
        ValueKind::Any => true,
        ValueKind::String => value.is_string(),
        ValueKind::Number => value.is_number(),
        ValueKind::Boolean => value.is_boolean(),
        ValueKind::Null => value.is_null(),
        ValueKind::Object => value.is_object() || value.is_array(),
        ValueKind::Function | ValueKind::Undefined => false,
    }
}

fn report(
    errors: &mut Vec<ValidationError>,
    path: &Crumb<'_>,
    kind: ValidationErrorKind,
    message: impl FnOnce(&str) -> String,
) {
    let path = path.to_vec();
    let message = message(&path.join("."));
    errors.push(ValidationError {
        message,
        path,
        kind,
    });
}

#[derive(Debug, Clone, Copy)]
enum Segment<'a> {
    Name(&'a str),
    Index(usize),
}

/// One path segment plus a link to its parent.
#[derive(Debug)]
struct Crumb<'a> {
    segment: Segment<'a>,
    parent: Option<&'a Crumb<'a>>,
}

impl<'a> Crumb<'a> {
    fn child(&'a self, segment: Segment<'a>) -> Crumb<'a> {
        Crumb {
            segment,
            parent: Some(self),
        }
    }

    fn to_vec(&self) -> Vec<String> {
        let mut segments = Vec::new();
        let mut cursor = Some(self);
        while let Some(crumb) = cursor {
            segments.push(match crumb.segment {
                Segment::Name(name) => name.to_string(),
                Segment::Index(i) => format!("[{i}]"),
            });
            cursor = crumb.parent;
        }
        segments.reverse();
        segments
    }
}

/// An object slot entered along the current path.
#[derive(Debug)]
struct Entered<'a> {
    slot: Slot,
    parent: Option<&'a Entered<'a>>,
}

/// Per-call circular-traversal context. Copied, never shared mutably.
#[derive(Debug, Clone, Copy)]
struct Circular<'a> {
    entered: Option<&'a Entered<'a>>,
    count: usize,
    limit: usize,
}

impl Circular<'_> {
    fn has_entered(&self, slot: Slot) -> bool {
        let mut cursor = self.entered;
        while let Some(frame) = cursor {
            if frame.slot == slot {
                return true;
            }
            cursor = frame.parent;
        }
        false
    }
}
