//! Handler modules read from disk.
//!
//! Scripts are not executed: a module's exported function names are found
//! by scanning its source, and each becomes a handler that only logs its
//! invocation. That is enough to wire and inspect a page headlessly.

use async_trait::async_trait;
use pado_expression::Value;
use pado_runtime::{LoadError, Module, ModuleLoader};
use regex::Regex;
use std::path::PathBuf;
use std::sync::LazyLock;
use tracing::info;

static EXPORTED_BINDING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\bexport\s+(?:async\s+)?(?:function\s*\*?|const|let|var)\s*([A-Za-z_$][A-Za-z0-9_$]*)").unwrap()
});

static EXPORT_LIST: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\bexport\s*\{([^}]*)\}").unwrap());

pub struct FsModuleLoader {
    base: PathBuf,
}

impl FsModuleLoader {
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self { base: base.into() }
    }

    fn resolve(&self, src: &str) -> PathBuf {
        self.base.join(src.trim_start_matches('/'))
    }
}

#[async_trait(?Send)]
impl ModuleLoader for FsModuleLoader {
    async fn load(&self, src: &str) -> Result<Module, LoadError> {
        let path = self.resolve(src);
        if !path.is_file() {
            return Err(LoadError::not_found(src));
        }
        let source = tokio::fs::read_to_string(&path)
            .await
            .map_err(|err| LoadError::io(src, err))?;

        let mut module = Module::new();
        for name in exported_names(&source) {
            let handler = name.clone();
            module = module.with_function(name, move |args: &[Value]| {
                info!(handler = %handler, args = args.len(), "Handler invoked");
                Value::Undefined
            });
        }
        Ok(module)
    }
}

/// Names exported by a JavaScript module, in order of appearance
pub fn exported_names(source: &str) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    let mut push = |name: &str| {
        if !name.is_empty() && !names.iter().any(|existing| existing == name) {
            names.push(name.to_string());
        }
    };

    for caps in EXPORTED_BINDING.captures_iter(source) {
        if let Some(name) = caps.get(1) {
            push(name.as_str());
        }
    }

    for caps in EXPORT_LIST.captures_iter(source) {
        let list = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
        for entry in list.split(',') {
            // `local as exported` exports the alias
            let exported = entry.split(" as ").last().unwrap_or(entry).trim();
            push(exported);
        }
    }

    names
}
