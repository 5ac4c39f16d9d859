//! # Expression evaluation
//!
//! Expressions are tokenized, parsed into an [`Expression`] tree and
//! interpreted against an [`EvalContext`]. Nothing is compiled to host code.
//!
//! ## Failure contract
//!
//! [`Evaluator::evaluate`] never fails: syntax errors, unknown variables and
//! property reads on `null`/`undefined` are logged and collapse into
//! [`Value::Undefined`]. Use [`Evaluator::try_evaluate`] to observe the error.

use crate::ast::{BinaryOp, Expression, UnaryOp};
use crate::context::EvalContext;
use crate::error::{ExprError, ExprResult};
use crate::parser::parse;
use crate::value::Value;
use regex::Regex;
use std::borrow::Cow;
use std::cell::RefCell;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::rc::Rc;
use std::sync::LazyLock;
use tracing::{error, trace};

static INDEXED_ACCESS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([A-Za-z_][A-Za-z0-9_]*)\[(\d+)\]").unwrap());

/// Evaluation switches
#[derive(Debug, Clone, Default)]
pub struct EvalOptions {
    /// Rewrite `name[3]` into a synthetic scalar binding before parsing
    pub rewrite_indices: bool,
}

/// Expression evaluator with a per-instance parse cache
#[derive(Debug, Default)]
pub struct Evaluator {
    options: EvalOptions,
    cache: RefCell<HashMap<String, Rc<Expression>>>,
}

impl Evaluator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: EvalOptions) -> Self {
        Self {
            options,
            cache: RefCell::new(HashMap::new()),
        }
    }

    pub fn options(&self) -> &EvalOptions {
        &self.options
    }

    /// Evaluate `source`, yielding `Value::Undefined` on any failure
    pub fn evaluate(&self, source: &str, ctx: &EvalContext<'_>) -> Value {
        match self.try_evaluate(source, ctx) {
            Ok(value) => value,
            Err(err) => {
                error!(expression = source, error = %err, "Error evaluating expression");
                Value::Undefined
            }
        }
    }

    pub fn try_evaluate(&self, source: &str, ctx: &EvalContext<'_>) -> ExprResult<Value> {
        let cleaned = normalize_expression(source);

        if self.options.rewrite_indices {
            let (rewritten, bindings) = rewrite_indexed_access(&cleaned, ctx);
            if !bindings.is_empty() {
                let mut scope = EvalContext::child(ctx);
                for (name, value) in bindings {
                    scope.set_variable(name, value);
                }
                let expr = self.compile(&rewritten)?;
                return evaluate_expression(&expr, &scope).map(Cow::into_owned);
            }
        }

        let expr = self.compile(&cleaned)?;
        let value = evaluate_expression(&expr, ctx)?.into_owned();
        trace!(expression = source, value = %value, "Evaluated expression");
        Ok(value)
    }

    /// Parse (or fetch from cache) the AST for `source`
    pub fn compile(&self, source: &str) -> ExprResult<Rc<Expression>> {
        if let Some(expr) = self.cache.borrow().get(source) {
            return Ok(Rc::clone(expr));
        }

        let expr = Rc::new(parse(source)?);
        self.cache
            .borrow_mut()
            .insert(source.to_string(), Rc::clone(&expr));
        Ok(expr)
    }
}

/// Trim, drop line breaks and unwrap a single `{…}` placeholder
pub fn normalize_expression(source: &str) -> String {
    let trimmed = source.trim();
    let unwrapped = match trimmed.strip_prefix('{').and_then(|s| s.strip_suffix('}')) {
        Some(inner) => inner,
        None => trimmed,
    };
    unwrapped.replace(['\n', '\r'], " ").trim().to_string()
}

/// Replace `name[3]` with `__temp_name_3` when `name` is an array in scope.
///
/// Returns the rewritten text and the synthetic bindings it introduced.
pub fn rewrite_indexed_access(source: &str, ctx: &EvalContext<'_>) -> (String, Vec<(String, Value)>) {
    let mut output = String::with_capacity(source.len());
    let mut bindings: Vec<(String, Value)> = Vec::new();
    let mut last = 0;

    for caps in INDEXED_ACCESS.captures_iter(source) {
        let (Some(whole), Some(name), Some(index)) = (caps.get(0), caps.get(1), caps.get(2)) else {
            continue;
        };

        // `a.items[0]` and `xitems[0]` are not accesses of `items`
        let preceded_by = source[..whole.start()].chars().next_back();
        if matches!(preceded_by, Some(c) if c == '.' || c == '$' || c.is_alphanumeric() || c == '_') {
            continue;
        }

        let Some(items) = ctx.get_variable(name.as_str()).and_then(Value::as_array) else {
            continue;
        };
        let Ok(position) = index.as_str().parse::<usize>() else {
            continue;
        };

        let temp_name = format!("__temp_{}_{}", name.as_str(), position);
        if !bindings.iter().any(|(existing, _)| existing == &temp_name) {
            bindings.push((temp_name.clone(), items.get(position).cloned().unwrap_or_default()));
        }

        output.push_str(&source[last..whole.start()]);
        output.push_str(&temp_name);
        last = whole.end();
    }

    output.push_str(&source[last..]);
    (output, bindings)
}

/// Interpret an AST node
pub fn evaluate_expression<'c>(expr: &Expression, ctx: &'c EvalContext<'_>) -> ExprResult<Cow<'c, Value>> {
    match expr {
        Expression::Literal { value, .. } => Ok(Cow::Owned(value.clone())),

        Expression::Identifier { name, .. } => ctx
            .get_variable(name)
            .map(Cow::Borrowed)
            .ok_or_else(|| ExprError::undefined_variable(name.clone())),

        Expression::Member { object, property, .. } => {
            let target = evaluate_expression(object, ctx)?;
            member_of(target, property)
        }

        Expression::Index { object, index, .. } => {
            let target = evaluate_expression(object, ctx)?;
            let key = evaluate_expression(index, ctx)?;
            index_of(target, &key)
        }

        Expression::Unary { operator, operand, .. } => {
            let value = evaluate_expression(operand, ctx)?;
            Ok(Cow::Owned(match operator {
                UnaryOp::Not => Value::Boolean(!value.is_truthy()),
                UnaryOp::Negate => Value::Number(-value.to_number()),
                UnaryOp::Plus => Value::Number(value.to_number()),
            }))
        }

        Expression::Binary {
            left,
            operator,
            right,
            ..
        } => match operator {
            // Short-circuit operators return one of their operands
            BinaryOp::And => {
                let left_val = evaluate_expression(left, ctx)?;
                if left_val.is_truthy() {
                    evaluate_expression(right, ctx)
                } else {
                    Ok(left_val)
                }
            }
            BinaryOp::Or => {
                let left_val = evaluate_expression(left, ctx)?;
                if left_val.is_truthy() {
                    Ok(left_val)
                } else {
                    evaluate_expression(right, ctx)
                }
            }
            BinaryOp::Coalesce => {
                let left_val = evaluate_expression(left, ctx)?;
                if left_val.is_nullish() {
                    evaluate_expression(right, ctx)
                } else {
                    Ok(left_val)
                }
            }
            op => {
                let left_val = evaluate_expression(left, ctx)?;
                let right_val = evaluate_expression(right, ctx)?;
                Ok(Cow::Owned(apply_binary(*op, &left_val, &right_val)))
            }
        },

        Expression::Conditional {
            test,
            consequent,
            alternate,
            ..
        } => {
            if evaluate_expression(test, ctx)?.is_truthy() {
                evaluate_expression(consequent, ctx)
            } else {
                evaluate_expression(alternate, ctx)
            }
        }
    }
}

fn member_of<'c>(target: Cow<'c, Value>, property: &str) -> ExprResult<Cow<'c, Value>> {
    match &*target {
        Value::Undefined | Value::Null => {
            return Err(ExprError::invalid_access(property, target.type_name()));
        }
        Value::Array(items) if property == "length" => {
            return Ok(Cow::Owned(Value::Number(items.len() as f64)));
        }
        Value::String(s) if property == "length" => {
            return Ok(Cow::Owned(Value::Number(s.chars().count() as f64)));
        }
        _ => {}
    }

    Ok(match target {
        Cow::Borrowed(value) => value
            .member(property)
            .map(Cow::Borrowed)
            .unwrap_or(Cow::Owned(Value::Undefined)),
        Cow::Owned(value) => Cow::Owned(value.member(property).cloned().unwrap_or_default()),
    })
}

fn index_of<'c>(target: Cow<'c, Value>, key: &Value) -> ExprResult<Cow<'c, Value>> {
    match (&*target, key) {
        (Value::Undefined | Value::Null, _) => {
            return Err(ExprError::invalid_access(key.to_string(), target.type_name()));
        }
        (Value::String(s), Value::Number(n)) => {
            let ch = if *n >= 0.0 && n.fract() == 0.0 {
                s.chars().nth(*n as usize)
            } else {
                None
            };
            return Ok(Cow::Owned(ch.map(|c| Value::String(c.to_string())).unwrap_or_default()));
        }
        (_, Value::String(name)) if name == "length" => return member_of(target, "length"),
        _ => {}
    }

    Ok(match target {
        Cow::Borrowed(value) => value
            .index(key)
            .map(Cow::Borrowed)
            .unwrap_or(Cow::Owned(Value::Undefined)),
        Cow::Owned(value) => Cow::Owned(value.index(key).cloned().unwrap_or_default()),
    })
}

fn apply_binary(op: BinaryOp, left: &Value, right: &Value) -> Value {
    match op {
        BinaryOp::Add => {
            if is_string_like(left) || is_string_like(right) {
                Value::String(format!("{}{}", left, right))
            } else {
                Value::Number(left.to_number() + right.to_number())
            }
        }
        BinaryOp::Subtract => Value::Number(left.to_number() - right.to_number()),
        BinaryOp::Multiply => Value::Number(left.to_number() * right.to_number()),
        BinaryOp::Divide => Value::Number(left.to_number() / right.to_number()),
        BinaryOp::Remainder => Value::Number(left.to_number() % right.to_number()),
        BinaryOp::Equals => Value::Boolean(loose_equals(left, right)),
        BinaryOp::NotEquals => Value::Boolean(!loose_equals(left, right)),
        BinaryOp::StrictEquals => Value::Boolean(left == right),
        BinaryOp::StrictNotEquals => Value::Boolean(left != right),
        BinaryOp::LessThan => Value::Boolean(compare(left, right) == Some(Ordering::Less)),
        BinaryOp::LessThanOrEqual => Value::Boolean(matches!(
            compare(left, right),
            Some(Ordering::Less | Ordering::Equal)
        )),
        BinaryOp::GreaterThan => Value::Boolean(compare(left, right) == Some(Ordering::Greater)),
        BinaryOp::GreaterThanOrEqual => Value::Boolean(matches!(
            compare(left, right),
            Some(Ordering::Greater | Ordering::Equal)
        )),
        // Handled lazily in evaluate_expression
        BinaryOp::And | BinaryOp::Or | BinaryOp::Coalesce => Value::Undefined,
    }
}

fn is_string_like(value: &Value) -> bool {
    matches!(value, Value::String(_) | Value::Array(_) | Value::Object(_))
}

fn loose_equals(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Undefined | Value::Null, Value::Undefined | Value::Null) => true,
        (Value::Undefined | Value::Null, _) | (_, Value::Undefined | Value::Null) => false,
        (Value::Number(_), Value::String(_))
        | (Value::String(_), Value::Number(_))
        | (Value::Boolean(_), _)
        | (_, Value::Boolean(_)) => left.to_number() == right.to_number(),
        _ => left == right,
    }
}

fn compare(left: &Value, right: &Value) -> Option<Ordering> {
    match (left, right) {
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        _ => left.to_number().partial_cmp(&right.to_number()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ctx_from(json: serde_json::Value) -> EvalContext<'static> {
        match Value::from(json) {
            Value::Object(map) => map.into_iter().collect(),
            other => panic!("Expected object, got {:?}", other),
        }
    }

    fn eval(source: &str, ctx: &EvalContext<'_>) -> Value {
        Evaluator::new().evaluate(source, ctx)
    }

    #[test]
    fn test_arithmetic_and_precedence() {
        let ctx = ctx_from(json!({"a": 2, "b": 3}));
        assert_eq!(eval("a + b * 2", &ctx), Value::Number(8.0));
        assert_eq!(eval("(a + b) * 2", &ctx), Value::Number(10.0));
        assert_eq!(eval("b % a", &ctx), Value::Number(1.0));
        assert_eq!(eval("-a + +'4'", &ctx), Value::Number(2.0));
    }

    #[test]
    fn test_string_concatenation() {
        let ctx = ctx_from(json!({"name": "pado", "n": 1}));
        assert_eq!(eval("'hello ' + name", &ctx), Value::from("hello pado"));
        assert_eq!(eval("\"n=\" + n", &ctx), Value::from("n=1"));
        assert_eq!(eval("n + 1 + 'x'", &ctx), Value::from("2x"));
    }

    #[test]
    fn test_comparisons() {
        let ctx = ctx_from(json!({"n": -5, "s": "b"}));
        assert_eq!(eval("n > 0", &ctx), Value::Boolean(false));
        assert_eq!(eval("n < 0", &ctx), Value::Boolean(true));
        assert_eq!(eval("n <= -5", &ctx), Value::Boolean(true));
        assert_eq!(eval("s > 'a'", &ctx), Value::Boolean(true));
        assert_eq!(eval("n == '-5'", &ctx), Value::Boolean(true));
        assert_eq!(eval("n === '-5'", &ctx), Value::Boolean(false));
        assert_eq!(eval("null == undefined", &ctx), Value::Boolean(true));
        assert_eq!(eval("NaN == NaN", &ctx), Value::Boolean(false));
    }

    #[test]
    fn test_logical_operators_return_operands() {
        let ctx = ctx_from(json!({"empty": "", "name": "x", "missing": null}));
        assert_eq!(eval("empty || 'default'", &ctx), Value::from("default"));
        assert_eq!(eval("name && 'yes'", &ctx), Value::from("yes"));
        assert_eq!(eval("missing ?? 'fallback'", &ctx), Value::from("fallback"));
        assert_eq!(eval("empty ?? 'fallback'", &ctx), Value::from(""));
        assert_eq!(eval("!name", &ctx), Value::Boolean(false));
    }

    #[test]
    fn test_short_circuit_skips_failing_operand() {
        let ctx = ctx_from(json!({"flag": false}));
        assert_eq!(eval("flag && unknown.value", &ctx), Value::Boolean(false));
    }

    #[test]
    fn test_ternary() {
        let ctx = ctx_from(json!({"count": 3}));
        assert_eq!(eval("count > 1 ? 'many' : 'one'", &ctx), Value::from("many"));
    }

    #[test]
    fn test_member_and_index_access() {
        let ctx = ctx_from(json!({
            "items": [{"name": "a"}, {"name": "b"}],
            "user": {"tags": ["x", "y", "z"]}
        }));
        assert_eq!(eval("items[1].name", &ctx), Value::from("b"));
        assert_eq!(eval("items.length", &ctx), Value::Number(2.0));
        assert_eq!(eval("user['tags'][2]", &ctx), Value::from("z"));
        assert_eq!(eval("user.tags.length - 1", &ctx), Value::Number(2.0));
        assert_eq!(eval("items[5]", &ctx), Value::Undefined);
        assert_eq!(eval("user.nickname", &ctx), Value::Undefined);
        assert_eq!(eval("'abc'[1]", &ctx), Value::from("b"));
    }

    #[test]
    fn test_failures_collapse_to_undefined() {
        let ctx = ctx_from(json!({"user": null}));
        assert_eq!(eval("user.name", &ctx), Value::Undefined);
        assert_eq!(eval("missing + 1", &ctx), Value::Undefined);
        assert_eq!(eval("a +", &ctx), Value::Undefined);
        assert_eq!(eval("alert('x')", &ctx), Value::Undefined);
    }

    #[test]
    fn test_try_evaluate_reports_errors() {
        let ctx = ctx_from(json!({}));
        let evaluator = Evaluator::new();
        assert_eq!(
            evaluator.try_evaluate("missing", &ctx),
            Err(ExprError::undefined_variable("missing"))
        );
        assert!(matches!(
            evaluator.try_evaluate("a ==", &ctx),
            Err(ExprError::UnexpectedEof { .. })
        ));
    }

    #[test]
    fn test_braced_and_multiline_expressions() {
        let ctx = ctx_from(json!({"count": 1}));
        assert_eq!(eval("{count}", &ctx), Value::Number(1.0));
        assert_eq!(eval("count\n + 1", &ctx), Value::Number(2.0));
    }

    #[test]
    fn test_division_by_zero_is_infinite() {
        let ctx = ctx_from(json!({"n": 1}));
        assert_eq!(eval("n / 0", &ctx), Value::Number(f64::INFINITY));
    }

    #[test]
    fn test_rewrite_indexed_access() {
        let ctx = ctx_from(json!({"items": [10, 20], "other": {"items": [1]}}));
        let (rewritten, bindings) = rewrite_indexed_access("items[1] + other.items[0]", &ctx);
        assert_eq!(rewritten, "__temp_items_1 + other.items[0]");
        assert_eq!(bindings, vec![("__temp_items_1".to_string(), Value::Number(20.0))]);

        let evaluator = Evaluator::with_options(EvalOptions { rewrite_indices: true });
        assert_eq!(evaluator.evaluate("items[0] + items[1]", &ctx), Value::Number(30.0));
    }

    #[test]
    fn test_parse_cache_reuses_ast() {
        let evaluator = Evaluator::new();
        let first = evaluator.compile("a + 1").unwrap();
        let second = evaluator.compile("a + 1").unwrap();
        assert!(Rc::ptr_eq(&first, &second));
    }
}
