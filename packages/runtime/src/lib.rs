//! Incremental update engine for compiled Pado templates.
//!
//! A [`Pado`] owns a document built from a [`CompiledTemplate`] skeleton and
//! re-renders only what depends on the keys of each state snapshot.
//!
//! ```ignore
//! let template = pado_compiler::compile_template("<p>{count}</p>");
//! let mut page = Pado::new(Document::parse(&template.html), &template);
//! page.render([("count", Value::from(1))]).await;
//! ```
//!
//! [`CompiledTemplate`]: pado_compiler::CompiledTemplate

mod bindings;
pub mod bootstrap;
pub mod engine;
pub mod error;
pub mod handlers;
pub mod loader;
pub mod pado;
pub mod records;
pub mod updated;

pub use bootstrap::{bootstrap, is_initialized, INIT_ATTRIBUTE};
pub use engine::{Engine, EngineOptions, RenderStats};
pub use error::{DispatchError, DispatchResult, LoadError};
pub use handlers::{rewrite_handlers, Export, Handler, HandlerRegistry, Module};
pub use loader::{ModuleLoader, NoopLoader, StaticModuleLoader};
pub use pado::{snapshot_from_json, Pado};
pub use updated::Updated;
