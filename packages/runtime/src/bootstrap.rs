use crate::handlers::{rewrite_handlers, HandlerRegistry};
use crate::loader::ModuleLoader;
use pado_dom::DomTree;
use tracing::{debug, error, info};

pub const INIT_ATTRIBUTE: &str = "pado-init";

/// Whether the document already went through [`bootstrap`]
pub fn is_initialized<T: DomTree>(tree: &T) -> bool {
    tree.find_element_with_attribute(tree.root(), INIT_ATTRIBUTE).is_some()
}

/// `src` of every `<script type="module">` in the document, in order
pub fn module_sources<T: DomTree>(tree: &T) -> Vec<String> {
    tree.elements(tree.root())
        .into_iter()
        .filter(|node| tree.tag_name(*node).as_deref() == Some("script"))
        .filter(|node| tree.get_attribute(*node, "type").as_deref() == Some("module"))
        .filter_map(|node| tree.get_attribute(node, "src"))
        .filter(|src| !src.is_empty())
        .collect()
}

/// One-time page setup: install handler modules, rewrite event attributes
/// and mark the document.
///
/// A module that fails to load is logged and skipped; the rest of the page
/// still initializes. Returns how many exports were installed.
pub async fn bootstrap<T, L>(tree: &mut T, loader: &L, registry: &mut HandlerRegistry) -> usize
where
    T: DomTree,
    L: ModuleLoader + ?Sized,
{
    let mut installed = 0;

    for src in module_sources(tree) {
        match loader.load(&src).await {
            Ok(module) => {
                let count = registry.install(module);
                debug!(%src, count, "Installed handler module");
                installed += count;
            }
            Err(err) => {
                error!(%src, error = %err, "Failed to load handler module");
            }
        }
    }

    let root = tree.root();
    let rewritten = rewrite_handlers(tree, root);

    let mark = tree
        .find_element_by_tag(root, "body")
        .or_else(|| tree.elements(root).into_iter().next());
    match mark {
        Some(node) => tree.set_attribute(node, INIT_ATTRIBUTE, ""),
        None => debug!("Document has no element to carry the init mark"),
    }

    info!(installed, rewritten, "Bootstrapped document");
    installed
}
