use crate::error::LoadError;
use crate::handlers::Module;
use async_trait::async_trait;
use std::collections::HashMap;

/// Resolves a `<script type="module" src>` reference to its exports
#[async_trait(?Send)]
pub trait ModuleLoader {
    async fn load(&self, src: &str) -> Result<Module, LoadError>;
}

/// Loader for pages without handler modules; every load fails as not found
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopLoader;

#[async_trait(?Send)]
impl ModuleLoader for NoopLoader {
    async fn load(&self, src: &str) -> Result<Module, LoadError> {
        Err(LoadError::not_found(src))
    }
}

/// In-memory modules keyed by their `src`
#[derive(Debug, Default, Clone)]
pub struct StaticModuleLoader {
    modules: HashMap<String, Module>,
}

impl StaticModuleLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_module(mut self, src: impl Into<String>, module: Module) -> Self {
        self.modules.insert(src.into(), module);
        self
    }

    pub fn insert(&mut self, src: impl Into<String>, module: Module) {
        self.modules.insert(src.into(), module);
    }
}

#[async_trait(?Send)]
impl ModuleLoader for StaticModuleLoader {
    async fn load(&self, src: &str) -> Result<Module, LoadError> {
        self.modules.get(src).cloned().ok_or_else(|| LoadError::not_found(src))
    }
}
