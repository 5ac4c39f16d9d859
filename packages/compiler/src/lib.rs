//! Directive compiler for Pado templates.
//!
//! Turns template source with `{@if}`/`{@loop}` directives and `{expr}`
//! interpolations into a [`CompiledTemplate`]: a skeleton with marker
//! comments plus the condition groups and loop definitions they refer to.

pub mod artifact;
pub mod compiler;
mod directives;
pub mod error;
pub mod id_generator;
pub mod marker;
pub mod style;
pub mod transform;
pub mod validate;

pub use artifact::{Block, BlockKind, CompiledTemplate, ConditionGroup, LoopDefinition};
pub use compiler::{compile, compile_template, CompileOptions, CompileOutput};
pub use error::CompileWarning;
pub use id_generator::{get_document_id, IDGenerator};
pub use marker::Marker;
pub use style::{scope_id, scope_stylesheet};
pub use transform::transform_content;
