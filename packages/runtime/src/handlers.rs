//! Handler modules and the namespace event attributes call into.
//!
//! Templates write `onclick="{increment}"`. After bootstrap the attribute
//! reads `onclick="increment()"`, and [`HandlerRegistry::dispatch`] resolves
//! that call against the exports installed from the page's module scripts.

use crate::error::{DispatchError, DispatchResult};
use pado_compiler::transform::single_expression;
use pado_dom::DomTree;
use pado_expression::{EvalContext, Evaluator, Value};
use regex::Regex;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;
use std::sync::LazyLock;
use tracing::{debug, trace};

static HANDLER_CALL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)^\s*([A-Za-z_$][A-Za-z0-9_$]*)\s*\((.*)\)\s*;?\s*$").unwrap());

pub type Handler = Rc<dyn Fn(&[Value]) -> Value>;

/// One named export of a handler module
#[derive(Clone)]
pub enum Export {
    Function(Handler),
    Value(Value),
}

impl fmt::Debug for Export {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Export::Function(_) => write!(f, "Function(..)"),
            Export::Value(value) => f.debug_tuple("Value").field(value).finish(),
        }
    }
}

/// The exports of a loaded module script
#[derive(Debug, Clone, Default)]
pub struct Module {
    exports: BTreeMap<String, Export>,
}

impl Module {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_function<F>(mut self, name: impl Into<String>, handler: F) -> Self
    where
        F: Fn(&[Value]) -> Value + 'static,
    {
        self.exports.insert(name.into(), Export::Function(Rc::new(handler)));
        self
    }

    pub fn with_value(mut self, name: impl Into<String>, value: Value) -> Self {
        self.exports.insert(name.into(), Export::Value(value));
        self
    }

    pub fn export(&mut self, name: impl Into<String>, export: Export) {
        self.exports.insert(name.into(), export);
    }

    pub fn exports(&self) -> impl Iterator<Item = (&str, &Export)> {
        self.exports.iter().map(|(name, export)| (name.as_str(), export))
    }

    pub fn is_empty(&self) -> bool {
        self.exports.is_empty()
    }
}

/// Globally addressable namespace of installed exports
#[derive(Debug, Default)]
pub struct HandlerRegistry {
    exports: BTreeMap<String, Export>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install every export of `module`; later modules win on name clashes
    pub fn install(&mut self, module: Module) -> usize {
        let count = module.exports.len();
        for (name, export) in module.exports {
            trace!(%name, "Installing export");
            self.exports.insert(name, export);
        }
        count
    }

    pub fn get(&self, name: &str) -> Option<&Export> {
        self.exports.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.exports.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.exports.keys().map(String::as_str)
    }

    pub fn call(&self, name: &str, args: &[Value]) -> DispatchResult<Value> {
        match self.exports.get(name) {
            Some(Export::Function(handler)) => Ok(handler(args)),
            _ => Err(DispatchError::UnknownHandler { name: name.to_string() }),
        }
    }

    /// Evaluate a rewritten handler attribute such as `remove(items[2].id)`
    pub fn dispatch(&self, call: &str, evaluator: &Evaluator, ctx: &EvalContext<'_>) -> DispatchResult<Value> {
        let (name, args) = parse_call(call).ok_or_else(|| DispatchError::MalformedCall { call: call.to_string() })?;
        let values: Vec<Value> = args.iter().map(|arg| evaluator.evaluate(arg, ctx)).collect();
        debug!(%name, args = values.len(), "Dispatching handler");
        self.call(&name, &values)
    }
}

/// Split `name(a, b)` into the callee and its top-level argument sources
pub fn parse_call(call: &str) -> Option<(String, Vec<String>)> {
    let caps = HANDLER_CALL.captures(call)?;
    let name = caps.get(1)?.as_str().to_string();
    let args = split_arguments(caps.get(2).map(|m| m.as_str()).unwrap_or_default());
    Some((name, args))
}

fn split_arguments(source: &str) -> Vec<String> {
    let mut args = Vec::new();
    let mut current = String::new();
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut escaped = false;

    for c in source.chars() {
        if let Some(q) = quote {
            current.push(c);
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == q {
                quote = None;
            }
            continue;
        }
        match c {
            '"' | '\'' => {
                quote = Some(c);
                current.push(c);
            }
            '(' | '[' | '{' => {
                depth += 1;
                current.push(c);
            }
            ')' | ']' | '}' => {
                depth = depth.saturating_sub(1);
                current.push(c);
            }
            ',' if depth == 0 => {
                args.push(current.trim().to_string());
                current.clear();
            }
            _ => current.push(c),
        }
    }

    if !current.trim().is_empty() || !args.is_empty() {
        args.push(current.trim().to_string());
    }
    args
}

/// `onclick="{increment}"` -> `onclick="increment()"` for elements under `scope`.
///
/// Values that already carry a call are kept as written; attributes that are
/// not a single `{…}` token are left alone.
pub fn rewrite_handlers<T: DomTree>(tree: &mut T, scope: T::Node) -> usize {
    let mut rewritten = 0;

    for element in tree.elements(scope) {
        for (name, value) in tree.attributes(element) {
            if !is_event_attribute(&name) {
                continue;
            }
            let Some(inner) = single_expression(&value) else {
                continue;
            };
            let inner = inner.trim();
            let call = if inner.contains('(') {
                inner.to_string()
            } else {
                format!("{}()", inner)
            };
            tree.set_attribute(element, &name, &call);
            rewritten += 1;
        }
    }

    if rewritten > 0 {
        debug!(rewritten, "Rewrote event handler attributes");
    }
    rewritten
}

pub fn is_event_attribute(name: &str) -> bool {
    name.len() > 2 && name.starts_with("on")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pado_dom::Document;
    use std::cell::Cell;

    #[test]
    fn test_parse_call() {
        assert_eq!(parse_call("increment()"), Some(("increment".to_string(), vec![])));
        assert_eq!(
            parse_call("move(items[0], 'a, b', f(x, y))"),
            Some((
                "move".to_string(),
                vec!["items[0]".to_string(), "'a, b'".to_string(), "f(x, y)".to_string()]
            ))
        );
        assert_eq!(parse_call("not a call"), None);
    }

    #[test]
    fn test_rewrite_handlers() {
        let mut doc = Document::parse(
            r#"<button onclick="{increment}">+</button><a onmouseover="{hover(1)}" onclick="plain()" title="{x}"></a>"#,
        );
        let root = doc.root();
        assert_eq!(rewrite_handlers(&mut doc, root), 2);
        assert_eq!(
            doc.to_html(),
            r#"<button onclick="increment()">+</button><a onmouseover="hover(1)" onclick="plain()" title="{x}"></a>"#
        );
    }

    #[test]
    fn test_dispatch_evaluates_arguments() {
        let seen = Rc::new(Cell::new(0.0));
        let sink = Rc::clone(&seen);
        let mut registry = HandlerRegistry::new();
        registry.install(Module::new().with_function("add", move |args: &[Value]| {
            let total: f64 = args.iter().map(Value::to_number).sum();
            sink.set(total);
            Value::Number(total)
        }));

        let ctx: EvalContext = [("n", Value::Number(4.0))].into_iter().collect();
        let result = registry.dispatch("add(n, 2)", &Evaluator::new(), &ctx).unwrap();
        assert_eq!(result, Value::Number(6.0));
        assert_eq!(seen.get(), 6.0);

        let missing = registry.dispatch("nope()", &Evaluator::new(), &ctx);
        assert_eq!(missing, Err(DispatchError::UnknownHandler { name: "nope".to_string() }));
    }
}
