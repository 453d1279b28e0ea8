//! # Self-Referencing Schema Tests
//!
//! A linked-list node type, `Node { content: any, next?: Node }`, validated
//! against chains of increasing depth. Covers error paths through repeated
//! object entries and the circular dependency limit.

use serde_json::{json, Value};
use shapeguard_core::{Schema, SchemaGraph, ValueKind};
use shapeguard_schema::{
    compile, AssertError, CircularDependencyLimitReached, CompiledValidator, ValidationErrorKind,
};

fn node_schema() -> Schema {
    let mut graph = SchemaGraph::new();
    let node = graph.object("Node");
    let any = graph.value_type(ValueKind::Any);
    graph.property(node, "content", any, false).unwrap();
    graph.property(node, "next", node, true).unwrap();
    graph.finish(node).unwrap()
}

fn validator() -> CompiledValidator {
    compile(&node_schema()).expect("node schema compiles")
}

fn chain(names: &[&str]) -> Value {
    let mut value: Option<Value> = None;
    for name in names.iter().rev() {
        value = Some(match value {
            Some(next) => json!({"content": name, "next": next}),
            None => json!({"content": name}),
        });
    }
    value.unwrap_or(Value::Null)
}

#[test]
fn wrong_object_is_rejected() {
    let err = validator()
        .assert(&json!({"name": "Hello"}), 0)
        .unwrap_err();
    let errors = err.validation_errors().expect("data mismatch, not an abort");
    assert_eq!(errors.count_of(ValidationErrorKind::PropertyMismatch), 2);
    let messages: Vec<&str> = errors.errors().iter().map(|e| e.message.as_str()).collect();
    assert_eq!(
        messages,
        [
            "Base.(Node).content is required, but missing; any is expected.",
            "Base.(Node) has unknown key 'name'; Node is expected.",
        ]
    );
}

#[test]
fn deep_chain_passes_with_default_limit() {
    let value = chain(&["Max", "Luca", "Tara"]);
    assert_eq!(validator().validate(&value), Ok(vec![]));
}

#[test]
fn deep_chain_with_missing_content() {
    let value = json!({
        "content": "Max",
        "next": {"content": "Luca", "next": {}}
    });
    let errors = validator().validate(&value).unwrap();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].kind, ValidationErrorKind::PropertyMismatch);
    assert_eq!(
        errors[0].path,
        ["Base", "(Node)", "next", "(Node)", "next", "(Node)", "content"]
    );
    assert_eq!(
        errors[0].message,
        "Base.(Node).next.(Node).next.(Node).content is required, but missing; any is expected."
    );
}

#[test]
fn deep_chain_exceeds_limit() {
    let value = chain(&["Max", "Luca", "Yo", "Lisa", "Tara"]);
    let result = validator().validate_with_limit(&value, 3);
    assert_eq!(result, Err(CircularDependencyLimitReached { count: 4 }));

    let err = validator().assert(&value, 3).unwrap_err();
    assert!(matches!(err, AssertError::CircularLimit(reached) if reached.count == 4));
}

#[test]
fn deep_chain_within_raised_limit() {
    let value = chain(&["Max", "Luca", "Yo", "Lisa", "Tara"]);
    assert_eq!(validator().validate_with_limit(&value, 20), Ok(vec![]));
}

#[test]
fn limit_abort_discards_collected_errors() {
    // The first node already has an unknown key; the abort still wins.
    let mut value = chain(&["a", "b", "c", "d"]);
    value["extra"] = json!(true);
    assert_eq!(
        validator().validate_with_limit(&value, 2),
        Err(CircularDependencyLimitReached { count: 3 })
    );
}

#[test]
fn limit_equal_to_repeat_count_passes() {
    // Seven levels: six repeated entries after the first.
    let value = chain(&["a", "b", "c", "d", "e", "f", "g"]);
    let v = validator();
    assert_eq!(
        v.validate_with_limit(&value, 5),
        Err(CircularDependencyLimitReached { count: 6 })
    );
    assert_eq!(v.validate_with_limit(&value, 6), Ok(vec![]));
}

#[test]
fn validation_is_repeatable_across_threads() {
    let v = std::sync::Arc::new(validator());
    let value = json!({"content": 1, "next": {"next": {"content": 3}}});
    let expected = v.validate(&value).unwrap();
    assert_eq!(expected.len(), 1);

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let v = std::sync::Arc::clone(&v);
            let value = value.clone();
            std::thread::spawn(move || v.validate(&value).unwrap())
        })
        .collect();
    for handle in handles {
        assert_eq!(handle.join().unwrap(), expected);
    }
}
