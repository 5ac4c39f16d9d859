//! Variable scopes for evaluation

use crate::value::Value;
use std::collections::HashMap;

/// Name -> value bindings visible to an expression.
///
/// Scopes chain to a parent so per-item loop bindings can shadow the outer
/// snapshot without copying it.
#[derive(Debug, Default)]
pub struct EvalContext<'p> {
    variables: HashMap<String, Value>,
    parent: Option<&'p EvalContext<'p>>,
}

impl<'p> EvalContext<'p> {
    pub fn new() -> Self {
        Self {
            variables: HashMap::new(),
            parent: None,
        }
    }

    /// Create a child scope that falls back to `parent` on lookup misses
    pub fn child(parent: &'p EvalContext<'p>) -> Self {
        Self {
            variables: HashMap::new(),
            parent: Some(parent),
        }
    }

    pub fn set_variable(&mut self, name: impl Into<String>, value: Value) {
        self.variables.insert(name.into(), value);
    }

    pub fn get_variable(&self, name: &str) -> Option<&Value> {
        match self.variables.get(name) {
            Some(value) => Some(value),
            None => self.parent.and_then(|parent| parent.get_variable(name)),
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get_variable(name).is_some()
    }

    /// Names bound directly in this scope (not the parents)
    pub fn local_names(&self) -> impl Iterator<Item = &str> {
        self.variables.keys().map(String::as_str)
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for EvalContext<'_> {
    fn from_iter<T: IntoIterator<Item = (K, Value)>>(iter: T) -> Self {
        let mut ctx = EvalContext::new();
        for (name, value) in iter {
            ctx.set_variable(name, value);
        }
        ctx
    }
}
