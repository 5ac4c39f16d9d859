//! Headless document model used by the Pado runtime and CLI.

pub mod document;
pub mod entities;
pub mod node;
pub mod parser;
pub mod serializer;
pub mod tree;

pub use document::Document;
pub use entities::{decode_entities, escape_attribute, escape_text};
pub use node::{ElementData, ElementKind, NodeData, NodeId, Properties};
pub use tree::DomTree;
