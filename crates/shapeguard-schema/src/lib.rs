//! # shapeguard-schema — Structural Validation
//!
//! Compiles a [`shapeguard_core::Schema`] graph into a reusable
//! [`CompiledValidator`] and runs it against `serde_json::Value` data.
//!
//! ## Pipeline
//!
//! 1. [`compile`] visits every reachable schema node once, reserving a slot
//!    before descending so cyclic schemas terminate.
//! 2. [`CompiledValidator::validate`] walks the value and returns every
//!    mismatch with its path (`Base.(Node).next.(Node).content`).
//! 3. [`CompiledValidator::assert`] turns a non-empty list into a single
//!    [`AssertError`].
//!
//! [`SchemaRegistry`] owns the id → schema → validator mapping and loads
//! schema documents from disk.
//!
//! ## Error tiers
//!
//! Data mismatches are values ([`ValidationError`]). Exceeding the circular
//! dependency limit aborts the call ([`CircularDependencyLimitReached`]).
//! Broken schemas and missing registrations are faults ([`BuildError`],
//! [`RegistryError`]).
//!
//! ## Crate Policy
//!
//! - No global state. The registry is an owned value.
//! - Compiled validators are immutable and `Send + Sync`.
//! - Logging goes through `tracing`; installing a subscriber is the
//!   binary's job.

pub mod compile;
pub mod engine;
pub mod error;
pub mod registry;

pub use compile::{compile, CompiledValidator};
pub use engine::{kind_matches, DEFAULT_CIRCULAR_DEPENDENCY_LIMIT, ROOT_SEGMENT};
pub use error::{
    AssertError, BuildError, CircularDependencyLimitReached, RegistryError, ValidationError,
    ValidationErrorKind, ValidationErrors,
};
pub use registry::{load_document, SchemaRegistry, SCHEMA_SUFFIXES};
