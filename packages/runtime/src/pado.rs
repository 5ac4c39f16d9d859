use crate::bootstrap::{bootstrap, is_initialized};
use crate::engine::{Engine, EngineOptions, RenderStats};
use crate::error::{DispatchError, DispatchResult};
use crate::handlers::HandlerRegistry;
use crate::loader::{ModuleLoader, NoopLoader};
use crate::updated::Updated;
use pado_compiler::CompiledTemplate;
use pado_dom::DomTree;
use pado_expression::{EvalContext, Value};
use tracing::{debug, instrument};

/// A rendered page: document, compiled template and accumulated state.
///
/// The first [`Pado::render`] bootstraps the document and renders it in
/// full. Every later snapshot is merged into the state and only its keys
/// are re-rendered.
pub struct Pado<T: DomTree, L: ModuleLoader = NoopLoader> {
    tree: T,
    engine: Engine,
    loader: L,
    registry: HandlerRegistry,
    state: EvalContext<'static>,
    rendered: bool,
}

impl<T: DomTree> Pado<T, NoopLoader> {
    pub fn new(tree: T, template: &CompiledTemplate) -> Self {
        Self::with_loader(tree, template, NoopLoader)
    }
}

impl<T: DomTree, L: ModuleLoader> Pado<T, L> {
    pub fn with_loader(tree: T, template: &CompiledTemplate, loader: L) -> Self {
        Self::with_options(tree, template, loader, EngineOptions::default())
    }

    pub fn with_options(tree: T, template: &CompiledTemplate, loader: L, options: EngineOptions) -> Self {
        Self {
            tree,
            engine: Engine::with_options(template, options),
            loader,
            registry: HandlerRegistry::new(),
            state: EvalContext::new(),
            rendered: false,
        }
    }

    /// Apply a state snapshot, bootstrapping the document on first use
    #[instrument(skip_all)]
    pub async fn render<I, K>(&mut self, snapshot: I) -> RenderStats
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        if self.rendered {
            return self.update(snapshot);
        }

        if !is_initialized(&self.tree) {
            bootstrap(&mut self.tree, &self.loader, &mut self.registry).await;
        }
        self.engine.set_rewrite_handlers(true);
        self.merge(snapshot);
        self.rendered = true;
        self.engine.render(&mut self.tree, &self.state, &Updated::All)
    }

    /// Apply a snapshot to an already rendered page without touching modules.
    ///
    /// Before the first [`Pado::render`] this renders everything, but skips
    /// bootstrap.
    pub fn update<I, K>(&mut self, snapshot: I) -> RenderStats
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        let keys = self.merge(snapshot);
        let updated = if self.rendered {
            Updated::keys(keys)
        } else {
            self.rendered = true;
            Updated::All
        };
        debug!(?updated, "Applying snapshot");
        self.engine.render(&mut self.tree, &self.state, &updated)
    }

    /// Call the handler bound to `on<event>` of `node`
    pub fn dispatch(&self, node: T::Node, event: &str) -> DispatchResult<Value> {
        let call = self
            .tree
            .get_attribute(node, &format!("on{}", event))
            .ok_or_else(|| DispatchError::NoHandler { event: event.to_string() })?;
        self.registry.dispatch(&call, self.engine.evaluator(), &self.state)
    }

    fn merge<I, K>(&mut self, snapshot: I) -> Vec<String>
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        let mut keys = Vec::new();
        for (name, value) in snapshot {
            let name = name.into();
            keys.push(name.clone());
            self.state.set_variable(name, value);
        }
        keys
    }

    pub fn state(&self) -> &EvalContext<'static> {
        &self.state
    }

    pub fn registry(&self) -> &HandlerRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut HandlerRegistry {
        &mut self.registry
    }

    pub fn tree(&self) -> &T {
        &self.tree
    }

    pub fn tree_mut(&mut self) -> &mut T {
        &mut self.tree
    }

    pub fn into_tree(self) -> T {
        self.tree
    }
}

/// Snapshot from a JSON object; anything else yields no keys
pub fn snapshot_from_json(json: serde_json::Value) -> Vec<(String, Value)> {
    match json {
        serde_json::Value::Object(map) => map.into_iter().map(|(name, value)| (name, Value::from(value))).collect(),
        _ => Vec::new(),
    }
}
