//! # Schema Graph
//!
//! The tagged-union node set and the arena that holds it.
//!
//! ## Building a cyclic schema
//!
//! Objects are declared before their properties, so a property can point
//! at its own object (or any ancestor):
//!
//! ```
//! use shapeguard_core::{SchemaGraph, ValueKind};
//!
//! let mut graph = SchemaGraph::new();
//! let node = graph.object("Node");
//! let content = graph.value_type(ValueKind::Any);
//! graph.property(node, "content", content, false).unwrap();
//! graph.property(node, "next", node, true).unwrap();
//! let schema = graph.finish(node).unwrap();
//! assert_eq!(schema.len(), 2);
//! ```
//!
//! ## Serialized form
//!
//! ```json
//! {
//!   "root": 0,
//!   "nodes": [
//!     {"kind": "object", "name": "Node", "properties": {
//!       "content": {"definition": 1},
//!       "next": {"definition": 0, "optional": true}}},
//!     {"kind": "value_type", "type": "any"}
//!   ]
//! }
//! ```

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};

use crate::error::SchemaError;
use crate::identity::NodeId;

/// Primitive categories checked by a `value_type` node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueKind {
    String,
    Number,
    Boolean,
    Null,
    Undefined,
    Any,
    Function,
    /// Loose "is an object" check: any JSON object or array.
    Object,
}

impl ValueKind {
    /// The name used when rendering this kind in diagnostics.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::Null => "null",
            Self::Undefined => "undefined",
            Self::Any => "any",
            Self::Function => "Function",
            Self::Object => "object",
        }
    }
}

impl std::fmt::Display for ValueKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A literal or enum member value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    String(String),
    Number(Number),
}

impl Scalar {
    /// A numeric scalar, or `None` for NaN and infinities.
    pub fn from_f64(value: f64) -> Option<Self> {
        Number::from_f64(value).map(Self::Number)
    }

    /// Strict equality against a JSON value.
    ///
    /// Strings compare by content. Two integers compare exactly; once a
    /// float is involved numbers compare by `f64` value (so `1` and `1.0`
    /// are equal). A scalar never equals a value of another type.
    pub fn matches(&self, value: &Value) -> bool {
        match (self, value) {
            (Self::String(expected), Value::String(actual)) => expected == actual,
            (Self::Number(expected), Value::Number(actual)) => numbers_equal(expected, actual),
            _ => false,
        }
    }
}

fn numbers_equal(a: &Number, b: &Number) -> bool {
    if let (Some(a), Some(b)) = (a.as_i64(), b.as_i64()) {
        return a == b;
    }
    if let (Some(a), Some(b)) = (a.as_u64(), b.as_u64()) {
        return a == b;
    }
    if a.is_f64() || b.is_f64() {
        return matches!((a.as_f64(), b.as_f64()), (Some(a), Some(b)) if a == b);
    }
    // A negative integer against one above `i64::MAX`.
    false
}

impl std::fmt::Display for Scalar {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::String(s) => f.write_str(s),
            // Integral floats print without a fraction: `10`, not `10.0`.
            Self::Number(n) => match n.as_f64() {
                Some(float) if n.is_f64() => write!(f, "{float}"),
                _ => write!(f, "{n}"),
            },
        }
    }
}

impl From<&str> for Scalar {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for Scalar {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<i32> for Scalar {
    fn from(value: i32) -> Self {
        Self::Number(value.into())
    }
}

impl From<i64> for Scalar {
    fn from(value: i64) -> Self {
        Self::Number(value.into())
    }
}

impl From<u64> for Scalar {
    fn from(value: u64) -> Self {
        Self::Number(value.into())
    }
}

/// A declared object property.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Property {
    /// Schema of the property value.
    pub definition: NodeId,
    /// Whether the property may be absent.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub optional: bool,
}

/// One node of a schema graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SchemaNode {
    /// Primitive type check.
    ValueType {
        #[serde(rename = "type")]
        kind: ValueKind,
    },
    /// Exactly this string or number.
    Literal { value: Scalar },
    /// Named object with closed property set, in declaration order.
    Object {
        name: String,
        #[serde(default)]
        properties: IndexMap<String, Property>,
    },
    /// Homogeneous array.
    Array { element: NodeId },
    /// Fixed-arity positional array.
    Tuple { elements: Vec<NodeId> },
    /// Any one member; members are tried in order.
    Union { members: Vec<NodeId> },
    /// Every member at once.
    Intersection { members: Vec<NodeId> },
    /// One of a named set of scalars.
    Enum { name: String, values: Vec<Scalar> },
}

impl SchemaNode {
    /// Short kind tag, as used in the serialized form.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::ValueType { .. } => "value_type",
            Self::Literal { .. } => "literal",
            Self::Object { .. } => "object",
            Self::Array { .. } => "array",
            Self::Tuple { .. } => "tuple",
            Self::Union { .. } => "union",
            Self::Intersection { .. } => "intersection",
            Self::Enum { .. } => "enum",
        }
    }

    /// Handles this node refers to, in declaration order.
    pub fn children(&self) -> Vec<NodeId> {
        match self {
            Self::ValueType { .. } | Self::Literal { .. } | Self::Enum { .. } => Vec::new(),
            Self::Object { properties, .. } => {
                properties.values().map(|p| p.definition).collect()
            }
            Self::Array { element } => vec![*element],
            Self::Tuple { elements } => elements.clone(),
            Self::Union { members } | Self::Intersection { members } => members.clone(),
        }
    }
}

/// Mutable arena used to assemble a schema.
///
/// Every constructor appends one node and returns its handle. Call
/// [`SchemaGraph::finish`] to freeze the graph into a [`Schema`].
#[derive(Debug, Clone, Default)]
pub struct SchemaGraph {
    nodes: Vec<SchemaNode>,
}

impl SchemaGraph {
    /// Create an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an arbitrary node.
    pub fn add(&mut self, node: SchemaNode) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(node);
        id
    }

    pub fn value_type(&mut self, kind: ValueKind) -> NodeId {
        self.add(SchemaNode::ValueType { kind })
    }

    pub fn literal(&mut self, value: impl Into<Scalar>) -> NodeId {
        self.add(SchemaNode::Literal {
            value: value.into(),
        })
    }

    pub fn array(&mut self, element: NodeId) -> NodeId {
        self.add(SchemaNode::Array { element })
    }

    pub fn tuple(&mut self, elements: Vec<NodeId>) -> NodeId {
        self.add(SchemaNode::Tuple { elements })
    }

    pub fn union(&mut self, members: Vec<NodeId>) -> NodeId {
        self.add(SchemaNode::Union { members })
    }

    pub fn intersection(&mut self, members: Vec<NodeId>) -> NodeId {
        self.add(SchemaNode::Intersection { members })
    }

    pub fn enumeration(&mut self, name: impl Into<String>, values: Vec<Scalar>) -> NodeId {
        self.add(SchemaNode::Enum {
            name: name.into(),
            values,
        })
    }

    /// Declare an object with no properties yet.
    ///
    /// Properties are added afterwards with [`SchemaGraph::property`], which
    /// is what allows an object to reference itself.
    pub fn object(&mut self, name: impl Into<String>) -> NodeId {
        self.add(SchemaNode::Object {
            name: name.into(),
            properties: IndexMap::new(),
        })
    }

    /// Add a property to a previously declared object.
    ///
    /// # Errors
    ///
    /// - [`SchemaError::UnknownNode`] if `object` or `definition` is not in this graph.
    /// - [`SchemaError::NotAnObject`] if `object` is not an object node.
    /// - [`SchemaError::DuplicateProperty`] if the key is already declared.
    pub fn property(
        &mut self,
        object: NodeId,
        key: impl Into<String>,
        definition: NodeId,
        optional: bool,
    ) -> Result<(), SchemaError> {
        if definition.index() >= self.nodes.len() {
            return Err(SchemaError::UnknownNode(definition));
        }
        let node = self
            .nodes
            .get_mut(object.index())
            .ok_or(SchemaError::UnknownNode(object))?;
        let SchemaNode::Object { properties, .. } = node else {
            return Err(SchemaError::NotAnObject(object));
        };
        let key = key.into();
        if properties.contains_key(&key) {
            return Err(SchemaError::DuplicateProperty { object, key });
        }
        properties.insert(
            key,
            Property {
                definition,
                optional,
            },
        );
        Ok(())
    }

    /// Number of nodes declared so far.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns true if no node has been declared.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Freeze the graph with `root` as its entry point.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::UnknownNode`] if the root or any handle stored
    /// in a node is outside the arena.
    pub fn finish(self, root: NodeId) -> Result<Schema, SchemaError> {
        let schema = Schema {
            root,
            nodes: self.nodes,
        };
        schema.check_references()?;
        Ok(schema)
    }
}

/// An immutable schema graph with a designated root.
///
/// Built with [`SchemaGraph`] or deserialized from a schema document.
/// Deserialization does not check handles; dangling handles surface when
/// the schema is compiled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    root: NodeId,
    nodes: Vec<SchemaNode>,
}

impl Schema {
    /// The entry node.
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Look up a node by handle.
    pub fn node(&self, id: NodeId) -> Option<&SchemaNode> {
        self.nodes.get(id.index())
    }

    /// All nodes, indexed by handle.
    pub fn nodes(&self) -> &[SchemaNode] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Human-readable description of a node; see [`crate::render`].
    pub fn render(&self, id: NodeId) -> String {
        crate::render::render(self, id)
    }

    /// Verify that the root and every stored handle point into the arena.
    pub fn check_references(&self) -> Result<(), SchemaError> {
        if self.node(self.root).is_none() {
            return Err(SchemaError::UnknownNode(self.root));
        }
        for node in &self.nodes {
            if let Some(dangling) = node.children().into_iter().find(|c| self.node(*c).is_none()) {
                return Err(SchemaError::UnknownNode(dangling));
            }
        }
        Ok(())
    }
}
