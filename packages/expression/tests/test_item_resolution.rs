use pado_expression::{expression_vars, substitute_identifier, EvalContext, Evaluator, Value};
use serde_json::json;

fn snapshot(json: serde_json::Value) -> EvalContext<'static> {
    match Value::from(json) {
        Value::Object(map) => map.into_iter().collect(),
        other => panic!("Expected object snapshot, got {:?}", other),
    }
}

#[test]
fn test_rewritten_item_expression_resolves_against_array() {
    let ctx = snapshot(json!({
        "items": [{"name": "a", "done": true}, {"name": "b", "done": false}]
    }));
    let evaluator = Evaluator::new();

    for (i, expected) in ["a", "b"].iter().enumerate() {
        let rewritten = substitute_identifier("item.name", "item", &format!("items[{}]", i));
        assert_eq!(evaluator.evaluate(&rewritten, &ctx), Value::from(*expected));
    }

    let condition = substitute_identifier("item.done && item.name != 'item'", "item", "items[1]");
    assert_eq!(condition, "items[1].done && items[1].name != 'item'");
    assert_eq!(evaluator.evaluate(&condition, &ctx), Value::Boolean(false));
}

#[test]
fn test_rewritten_expression_depends_on_array() {
    let rewritten = substitute_identifier("item.count > limit", "item", "rows[3]");
    assert_eq!(expression_vars(&rewritten), vec!["rows", "count", "limit"]);
}

#[test]
fn test_nested_arrays() {
    let ctx = snapshot(json!({
        "groups": [{"members": ["x", "y"]}, {"members": ["z"]}]
    }));
    let evaluator = Evaluator::new();

    let outer = substitute_identifier("group.members", "group", "groups[0]");
    let inner = substitute_identifier("member", "member", &format!("{}[1]", outer));
    assert_eq!(inner, "groups[0].members[1]");
    assert_eq!(evaluator.evaluate(&inner, &ctx), Value::from("y"));
    assert_eq!(evaluator.evaluate("groups[1].members.length", &ctx), Value::Number(1.0));
}
