//! # Type Rendering
//!
//! Converts a schema node into a short, human-readable type description for
//! diagnostics, e.g. `(Foo1 | Foo2)`, `string[]`, `[number,'on']`.
//!
//! Rendering an object uses only its name and never descends into its
//! properties, so a cycle through an object always terminates. A cycle that
//! avoids objects (an array whose element is the array itself) renders the
//! repeated node as `...`.

use crate::identity::NodeId;
use crate::schema::{Scalar, Schema, SchemaNode};

/// Render the node `id` of `schema`.
///
/// A handle outside the graph renders as `<unknown>`.
pub fn render(schema: &Schema, id: NodeId) -> String {
    let mut out = String::new();
    let mut open = Vec::new();
    render_into(schema, id, &mut open, &mut out);
    out
}

fn render_into(schema: &Schema, id: NodeId, open: &mut Vec<NodeId>, out: &mut String) {
    let Some(node) = schema.node(id) else {
        out.push_str("<unknown>");
        return;
    };
    if open.contains(&id) {
        out.push_str("...");
        return;
    }
    open.push(id);
    match node {
        SchemaNode::ValueType { kind } => out.push_str(kind.as_str()),
        SchemaNode::Object { name, .. } => out.push_str(name),
        SchemaNode::Array { element } => {
            render_into(schema, *element, open, out);
            out.push_str("[]");
        }
        SchemaNode::Literal { value } => out.push_str(&render_literal(value)),
        SchemaNode::Union { members } => render_list(schema, members, "(", " | ", ")", open, out),
        SchemaNode::Intersection { members } => {
            render_list(schema, members, "(", " & ", ")", open, out)
        }
        SchemaNode::Tuple { elements } => render_list(schema, elements, "[", ",", "]", open, out),
        SchemaNode::Enum { name, values } => {
            out.push_str(&format!("Enum: {name}({})", join_scalars(values)));
        }
    }
    open.pop();
}

fn render_list(
    schema: &Schema,
    ids: &[NodeId],
    start: &str,
    separator: &str,
    end: &str,
    open: &mut Vec<NodeId>,
    out: &mut String,
) {
    out.push_str(start);
    for (i, id) in ids.iter().enumerate() {
        if i > 0 {
            out.push_str(separator);
        }
        render_into(schema, *id, open, out);
    }
    out.push_str(end);
}

/// Render a literal the way it appears in source: strings quoted.
pub fn render_literal(value: &Scalar) -> String {
    match value {
        Scalar::String(s) => format!("'{s}'"),
        Scalar::Number(_) => value.to_string(),
    }
}

/// Comma-joined enum members, unquoted.
pub fn join_scalars(values: &[Scalar]) -> String {
    values
        .iter()
        .map(Scalar::to_string)
        .collect::<Vec<_>>()
        .join(",")
}
