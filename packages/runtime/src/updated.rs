use pado_expression::depends_on;
use std::collections::HashSet;

/// Which state keys changed since the last render
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Updated {
    /// Everything is considered changed: initial render and fresh fragments
    All,
    Keys(HashSet<String>),
}

impl Updated {
    pub fn keys<I, K>(keys: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: Into<String>,
    {
        Updated::Keys(keys.into_iter().map(Into::into).collect())
    }

    pub fn contains(&self, name: &str) -> bool {
        match self {
            Updated::All => true,
            Updated::Keys(keys) => keys.contains(name),
        }
    }

    /// Whether a binding depending on `vars` must be re-rendered
    pub fn intersects(&self, vars: &[String]) -> bool {
        match self {
            Updated::All => true,
            Updated::Keys(keys) => depends_on(vars, |name| keys.contains(name)),
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Updated::Keys(keys) if keys.is_empty())
    }
}
