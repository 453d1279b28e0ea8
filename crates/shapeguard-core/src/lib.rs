//! # shapeguard-core — Schema Model
//!
//! Defines the structural schema graph that every other shapeguard crate
//! consumes. A schema describes the expected shape of a JSON value:
//! primitives, literals, named objects with typed and optional properties,
//! arrays, tuples, unions, intersections, and enumerations.
//!
//! ## Key Design Principles
//!
//! 1. **Arena, not pointers.** Nodes live in a flat `Vec` and refer to each
//!    other through [`NodeId`] handles. A property may point back at an
//!    ancestor object, so a schema graph can be cyclic (a linked-list node
//!    type) without `Rc` cycles or unsafe code.
//!
//! 2. **Identity is the handle.** Two structurally identical nodes declared
//!    separately are two different nodes. Compilation caches and the
//!    circular-dependency guard both key on [`NodeId`].
//!
//! 3. **Closed node set.** [`SchemaNode`] is a closed enum. Every consumer
//!    matches it exhaustively, so adding a node kind forces every stage to
//!    handle it.
//!
//! 4. **Serializable.** [`Schema`] round-trips through JSON and YAML with an
//!    internally tagged `kind` field, so schema graphs can be authored as
//!    files and loaded by a registry.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `shapeguard-*` crates (this is the leaf of the DAG).
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod error;
pub mod identity;
pub mod render;
pub mod schema;

// Re-export primary types for ergonomic imports.
pub use error::SchemaError;
pub use identity::{NodeId, SchemaId};
pub use render::render;
pub use schema::{Property, Scalar, Schema, SchemaGraph, SchemaNode, ValueKind};
