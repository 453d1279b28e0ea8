//! # Validator Builder
//!
//! Compiles a [`Schema`] graph into a [`CompiledValidator`]: one check slot
//! per reachable schema node, with every diagnostic string rendered up
//! front so validation never walks the schema graph again.
//!
//! ## Cycles
//!
//! A slot is reserved (and cached under the node's id) *before* the node's
//! children are compiled. A child that leads back to the node receives the
//! reserved slot index. Once the children are done the slot is filled in
//! place, so every index handed out during descent resolves to the finished
//! check. Compilation therefore visits each node exactly once.
//!
//! Objects, arrays and tuples consume one level of the value before their
//! children run, so cycles through them end with the value. Unions and
//! intersections do not. A cycle made only of those is rejected with
//! [`BuildError::CombinatorCycle`].

use std::collections::HashMap;

use shapeguard_core::render::{join_scalars, render_literal};
use shapeguard_core::{NodeId, Scalar, Schema, SchemaNode, ValueKind};

use crate::error::BuildError;

/// Index of a compiled check inside a [`CompiledValidator`].
pub(crate) type Slot = usize;

/// Executable form of one schema node.
#[derive(Debug, Clone)]
pub(crate) enum Check {
    ValueType(ValueKind),
    Literal {
        value: Scalar,
        rendered: String,
    },
    Union {
        members: Vec<Slot>,
        /// Member renderings joined with `", "`.
        possibilities: String,
    },
    Intersection {
        members: Vec<Slot>,
        /// Keys declared by object members, directly or through nested
        /// unions and intersections. An object member accepts these as
        /// known keys.
        declared: Vec<String>,
    },
    Tuple {
        elements: Vec<Slot>,
        rendered: String,
    },
    Object(ObjectCheck),
    Array {
        element: Slot,
    },
    Enum {
        name: String,
        values: Vec<Scalar>,
        listed: String,
    },
}

#[derive(Debug, Clone)]
pub(crate) struct ObjectCheck {
    pub(crate) name: String,
    /// Path segment appended on entry, `(Name)`.
    pub(crate) segment: String,
    pub(crate) properties: Vec<PropertyCheck>,
}

impl ObjectCheck {
    pub(crate) fn declares(&self, key: &str) -> bool {
        self.properties.iter().any(|p| p.key == key)
    }
}

#[derive(Debug, Clone)]
pub(crate) struct PropertyCheck {
    pub(crate) key: String,
    pub(crate) slot: Slot,
    pub(crate) optional: bool,
    /// Rendering of the property's definition, for "missing" diagnostics.
    pub(crate) expected: String,
}

/// An immutable, reusable validator for one schema.
///
/// Cheap to share: wrap it in an `Arc` and validate from any number of
/// threads. See [`CompiledValidator::validate`].
#[derive(Debug, Clone)]
pub struct CompiledValidator {
    pub(crate) checks: Vec<Check>,
    pub(crate) root: Slot,
    root_type: String,
}

impl CompiledValidator {
    /// Number of compiled checks (one per reachable schema node).
    pub fn slot_count(&self) -> usize {
        self.checks.len()
    }

    /// Rendering of the schema's root node, e.g. `Node` or `(string | number)`.
    pub fn root_type(&self) -> &str {
        &self.root_type
    }
}

/// Compile `schema` starting at its root.
///
/// # Errors
///
/// Returns [`BuildError::UnknownNode`] if the graph holds a handle outside
/// its arena. Schemas assembled through `SchemaGraph::finish` never do;
/// deserialized schemas may. Returns [`BuildError::CombinatorCycle`] if a
/// union or intersection contains itself with no object, array or tuple in
/// between.
pub fn compile(schema: &Schema) -> Result<CompiledValidator, BuildError> {
    let mut builder = Builder {
        schema,
        slots: Vec::new(),
        origins: Vec::new(),
        cache: HashMap::new(),
    };
    let root = builder.slot_for(schema.root())?;

    let mut checks = Vec::with_capacity(builder.slots.len());
    for (slot, origin) in builder.slots.into_iter().zip(&builder.origins) {
        checks.push(slot.ok_or(BuildError::Unresolved(*origin))?);
    }
    if let Some(slot) = find_combinator_cycle(&checks) {
        return Err(BuildError::CombinatorCycle(builder.origins[slot]));
    }

    let validator = CompiledValidator {
        checks,
        root,
        root_type: schema.render(schema.root()),
    };
    tracing::debug!(
        slots = validator.slot_count(),
        root = %validator.root_type,
        "compiled schema"
    );
    Ok(validator)
}

struct Builder<'s> {
    schema: &'s Schema,
    /// `None` marks a reserved slot whose check is still being built.
    slots: Vec<Option<Check>>,
    origins: Vec<NodeId>,
    cache: HashMap<NodeId, Slot>,
}

impl<'s> Builder<'s> {
    fn slot_for(&mut self, id: NodeId) -> Result<Slot, BuildError> {
        if let Some(&slot) = self.cache.get(&id) {
            return Ok(slot);
        }
        let schema = self.schema;
        let node = schema.node(id).ok_or(BuildError::UnknownNode(id))?;

        let slot = self.slots.len();
        self.slots.push(None);
        self.origins.push(id);
        self.cache.insert(id, slot);

        let check = self.build(id, node)?;
        self.slots[slot] = Some(check);
        Ok(slot)
    }

    fn slots_for(&mut self, ids: &[NodeId]) -> Result<Vec<Slot>, BuildError> {
        ids.iter().map(|id| self.slot_for(*id)).collect()
    }

    fn build(&mut self, id: NodeId, node: &'s SchemaNode) -> Result<Check, BuildError> {
        let schema = self.schema;
        let check = match node {
            SchemaNode::ValueType { kind } => Check::ValueType(*kind),
            SchemaNode::Literal { value } => Check::Literal {
                value: value.clone(),
                rendered: render_literal(value),
            },
            SchemaNode::Union { members } => Check::Union {
                members: self.slots_for(members)?,
                possibilities: members
                    .iter()
                    .map(|m| schema.render(*m))
                    .collect::<Vec<_>>()
                    .join(", "),
            },
            SchemaNode::Intersection { members } => {
                let mut declared = Vec::new();
                collect_declared_keys(schema, members, &mut declared, &mut vec![id]);
                Check::Intersection {
                    members: self.slots_for(members)?,
                    declared,
                }
            }
            SchemaNode::Tuple { elements } => Check::Tuple {
                elements: self.slots_for(elements)?,
                rendered: schema.render(id),
            },
            SchemaNode::Array { element } => Check::Array {
                element: self.slot_for(*element)?,
            },
            SchemaNode::Enum { name, values } => Check::Enum {
                name: name.clone(),
                values: values.clone(),
                listed: join_scalars(values),
            },
            SchemaNode::Object { name, properties } => {
                let mut checks = Vec::with_capacity(properties.len());
                for (key, property) in properties {
                    checks.push(PropertyCheck {
                        key: key.clone(),
                        slot: self.slot_for(property.definition)?,
                        optional: property.optional,
                        expected: schema.render(property.definition),
                    });
                }
                Check::Object(ObjectCheck {
                    name: name.clone(),
                    segment: format!("({name})"),
                    properties: checks,
                })
            }
        };
        Ok(check)
    }
}

/// Slot of some union or intersection that reaches itself through union
/// and intersection members only.
fn find_combinator_cycle(checks: &[Check]) -> Option<Slot> {
    #[derive(Clone, Copy, PartialEq, Eq)]
    enum Mark {
        Unvisited,
        Active,
        Done,
    }

    fn visit(checks: &[Check], slot: Slot, marks: &mut [Mark]) -> Option<Slot> {
        match marks[slot] {
            Mark::Active => return Some(slot),
            Mark::Done => return None,
            Mark::Unvisited => {}
        }
        marks[slot] = Mark::Active;
        if let Check::Union { members, .. } | Check::Intersection { members, .. } = &checks[slot]
        {
            for member in members {
                if let Some(found) = visit(checks, *member, marks) {
                    return Some(found);
                }
            }
        }
        marks[slot] = Mark::Done;
        None
    }

    let mut marks = vec![Mark::Unvisited; checks.len()];
    (0..checks.len()).find_map(|slot| visit(checks, slot, &mut marks))
}

fn collect_declared_keys(
    schema: &Schema,
    members: &[NodeId],
    keys: &mut Vec<String>,
    seen: &mut Vec<NodeId>,
) {
    for member in members {
        match schema.node(*member) {
            Some(SchemaNode::Object { properties, .. }) => {
                for key in properties.keys() {
                    if !keys.contains(key) {
                        keys.push(key.clone());
                    }
                }
            }
            Some(SchemaNode::Intersection { members } | SchemaNode::Union { members })
                if !seen.contains(member) =>
            {
                seen.push(*member);
                collect_declared_keys(schema, members, keys, seen);
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shapeguard_core::SchemaGraph;

    fn assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn compiled_validator_is_send_and_sync() {
        assert_send_sync::<CompiledValidator>();
    }

    #[test]
    fn self_reference_reuses_reserved_slot() {
        let mut graph = SchemaGraph::new();
        let node = graph.object("Node");
        let any = graph.value_type(ValueKind::Any);
        graph.property(node, "content", any, false).unwrap();
        graph.property(node, "next", node, true).unwrap();
        let schema = graph.finish(node).unwrap();

        let validator = compile(&schema).unwrap();
        assert_eq!(validator.slot_count(), 2);
        let Check::Object(object) = &validator.checks[validator.root] else {
            panic!("root should compile to an object check");
        };
        assert_eq!(object.segment, "(Node)");
        assert_eq!(object.properties[1].key, "next");
        assert_eq!(object.properties[1].slot, validator.root);
        assert_eq!(object.properties[0].expected, "any");
    }

    #[test]
    fn mutual_recursion_terminates() {
        let mut graph = SchemaGraph::new();
        let a = graph.object("A");
        let b = graph.object("B");
        let list_of_b = graph.array(b);
        graph.property(a, "children", list_of_b, false).unwrap();
        graph.property(b, "parent", a, true).unwrap();
        let schema = graph.finish(a).unwrap();

        let validator = compile(&schema).unwrap();
        assert_eq!(validator.slot_count(), 3);
        assert_eq!(validator.root_type(), "A");
    }

    #[test]
    fn shared_node_is_compiled_once() {
        let mut graph = SchemaGraph::new();
        let s = graph.value_type(ValueKind::String);
        let tuple = graph.tuple(vec![s, s, s]);
        let schema = graph.finish(tuple).unwrap();

        let validator = compile(&schema).unwrap();
        assert_eq!(validator.slot_count(), 2);
        assert_eq!(validator.root_type(), "[string,string,string]");
    }

    #[test]
    fn unreachable_nodes_are_not_compiled() {
        let mut graph = SchemaGraph::new();
        let s = graph.value_type(ValueKind::String);
        graph.value_type(ValueKind::Number);
        let schema = graph.finish(s).unwrap();
        assert_eq!(compile(&schema).unwrap().slot_count(), 1);
    }

    #[test]
    fn union_possibilities_are_prerendered() {
        let mut graph = SchemaGraph::new();
        let foo = graph.object("Foo1");
        let bar = graph.object("Foo2");
        let union = graph.union(vec![foo, bar]);
        let schema = graph.finish(union).unwrap();

        let validator = compile(&schema).unwrap();
        match &validator.checks[validator.root] {
            Check::Union { possibilities, .. } => assert_eq!(possibilities, "Foo1, Foo2"),
            other => panic!("expected union, got {other:?}"),
        }
    }

    #[test]
    fn intersection_collects_member_keys() {
        let mut graph = SchemaGraph::new();
        let s = graph.value_type(ValueKind::String);
        let foo1 = graph.object("Foo1");
        let foo2 = graph.object("Foo2");
        let foo3 = graph.object("Foo3");
        graph.property(foo1, "bar", s, false).unwrap();
        graph.property(foo2, "bar2", s, false).unwrap();
        graph.property(foo3, "bar", s, false).unwrap();
        graph.property(foo3, "bar3", s, false).unwrap();
        let inner = graph.intersection(vec![foo2, foo3]);
        let outer = graph.intersection(vec![foo1, inner, s]);
        let schema = graph.finish(outer).unwrap();

        let validator = compile(&schema).unwrap();
        match &validator.checks[validator.root] {
            Check::Intersection { declared, .. } => {
                assert_eq!(declared, &["bar", "bar2", "bar3"]);
            }
            other => panic!("expected intersection, got {other:?}"),
        }
    }

    #[test]
    fn intersection_collects_keys_of_union_members() {
        let mut graph = SchemaGraph::new();
        let s = graph.value_type(ValueKind::String);
        let foo1 = graph.object("Foo1");
        let foo2 = graph.object("Foo2");
        let foo3 = graph.object("Foo3");
        graph.property(foo1, "bar", s, false).unwrap();
        graph.property(foo2, "bar2", s, false).unwrap();
        graph.property(foo3, "bar3", s, false).unwrap();
        let either = graph.union(vec![foo2, foo3]);
        let both = graph.intersection(vec![foo1, either]);
        let schema = graph.finish(both).unwrap();

        let validator = compile(&schema).unwrap();
        match &validator.checks[validator.root] {
            Check::Intersection { declared, .. } => {
                assert_eq!(declared, &["bar", "bar2", "bar3"]);
            }
            other => panic!("expected intersection, got {other:?}"),
        }
    }

    #[test]
    fn self_containing_intersection_is_a_build_fault() {
        let schema: Schema = serde_json::from_value(serde_json::json!({
            "root": 0,
            "nodes": [{"kind": "intersection", "members": [0]}]
        }))
        .unwrap();
        assert_eq!(
            compile(&schema).unwrap_err(),
            BuildError::CombinatorCycle(NodeId(0))
        );
    }

    #[test]
    fn union_intersection_cycle_behind_an_object_is_a_build_fault() {
        let schema: Schema = serde_json::from_value(serde_json::json!({
            "root": 0,
            "nodes": [
                {"kind": "object", "name": "Holder", "properties": {
                    "inner": {"definition": 1}}},
                {"kind": "union", "members": [3, 2]},
                {"kind": "intersection", "members": [1]},
                {"kind": "value_type", "type": "string"}
            ]
        }))
        .unwrap();
        assert!(matches!(
            compile(&schema).unwrap_err(),
            BuildError::CombinatorCycle(NodeId(1) | NodeId(2))
        ));
    }

    #[test]
    fn cycles_through_containers_compile() {
        let schema: Schema = serde_json::from_value(serde_json::json!({
            "root": 0,
            "nodes": [
                {"kind": "union", "members": [1, 2, 3]},
                {"kind": "array", "element": 0},
                {"kind": "tuple", "elements": [0]},
                {"kind": "value_type", "type": "number"}
            ]
        }))
        .unwrap();
        let validator = compile(&schema).unwrap();
        assert_eq!(validator.slot_count(), 4);
    }

    #[test]
    fn dangling_handle_is_a_build_fault() {
        let schema: Schema = serde_json::from_value(serde_json::json!({
            "root": 0,
            "nodes": [{"kind": "array", "element": 4}]
        }))
        .unwrap();
        assert_eq!(
            compile(&schema).unwrap_err(),
            BuildError::UnknownNode(NodeId(4))
        );
    }

    #[test]
    fn dangling_root_is_a_build_fault() {
        let schema: Schema = serde_json::from_value(serde_json::json!({
            "root": 2,
            "nodes": [{"kind": "value_type", "type": "any"}]
        }))
        .unwrap();
        assert_eq!(
            compile(&schema).unwrap_err(),
            BuildError::UnknownNode(NodeId(2))
        );
    }
}
