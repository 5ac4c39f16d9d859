//! # DomTree
//!
//! The operations the update engine needs from a host document. The engine
//! only talks to this trait, so any rendering target can sit behind it;
//! [`Document`] is the headless implementation.
//!
//! ## Owned content
//!
//! Nodes inserted with [`DomTree::insert_after`] are owned by the marker they
//! were inserted after. [`DomTree::clear_owned`] removes a marker's owned
//! siblings and, transitively, the content owned by markers among them.
//! Static siblings are never touched. Cleared nodes are freed, so handles to
//! them go stale.

use crate::document::Document;
use crate::node::{ElementKind, NodeData, NodeId};
use std::collections::HashSet;
use std::fmt::Debug;
use std::hash::Hash;
use tracing::trace;

pub trait DomTree {
    type Node: Copy + Eq + Hash + Debug;

    fn root(&self) -> Self::Node;

    /// Comment nodes under `scope` in document order, with their raw text
    fn comments(&self, scope: Self::Node) -> Vec<(Self::Node, String)>;

    /// Element nodes under `scope` in document order
    fn elements(&self, scope: Self::Node) -> Vec<Self::Node>;

    fn element_kind(&self, node: Self::Node) -> Option<ElementKind>;

    fn tag_name(&self, node: Self::Node) -> Option<String>;

    fn attributes(&self, node: Self::Node) -> Vec<(String, String)>;

    fn get_attribute(&self, node: Self::Node, name: &str) -> Option<String>;

    fn set_attribute(&mut self, node: Self::Node, name: &str, value: &str);

    fn remove_attribute(&mut self, node: Self::Node, name: &str);

    /// Replace the children of `node` with parsed markup
    fn set_inner_html(&mut self, node: Self::Node, html: &str);

    fn set_boolean_property(&mut self, node: Self::Node, name: &str, value: bool);

    fn set_value_property(&mut self, node: Self::Node, value: &str);

    fn set_comment(&mut self, node: Self::Node, text: &str);

    /// Parse markup into a detached container node
    fn create_fragment(&mut self, html: &str) -> Self::Node;

    /// Remove every sibling owned by `marker`; returns how many were removed
    fn clear_owned(&mut self, marker: Self::Node) -> usize;

    /// Move all children of `fragment` after `marker`, in order, as owned
    /// content. The emptied fragment is released.
    fn insert_after(&mut self, marker: Self::Node, fragment: Self::Node) -> usize;

    /// Move all children of `fragment` to the end of `target`, releasing `fragment`
    fn append_fragment(&mut self, target: Self::Node, fragment: Self::Node);

    fn is_attached(&self, node: Self::Node) -> bool;

    /// Whether `node` sits somewhere below `ancestor`
    fn is_descendant(&self, ancestor: Self::Node, node: Self::Node) -> bool;

    fn find_element_with_attribute(&self, scope: Self::Node, name: &str) -> Option<Self::Node> {
        self.elements(scope)
            .into_iter()
            .find(|node| self.get_attribute(*node, name).is_some())
    }

    fn find_element_by_tag(&self, scope: Self::Node, tag: &str) -> Option<Self::Node> {
        self.elements(scope)
            .into_iter()
            .find(|node| self.tag_name(*node).as_deref() == Some(tag))
    }
}

impl DomTree for Document {
    type Node = NodeId;

    fn root(&self) -> NodeId {
        Document::root(self)
    }

    fn comments(&self, scope: NodeId) -> Vec<(NodeId, String)> {
        self.descendants(scope)
            .into_iter()
            .filter_map(|id| self.data(id).as_comment().map(|text| (id, text.to_string())))
            .collect()
    }

    fn elements(&self, scope: NodeId) -> Vec<NodeId> {
        self.descendants(scope)
            .into_iter()
            .filter(|id| self.element(*id).is_some())
            .collect()
    }

    fn element_kind(&self, node: NodeId) -> Option<ElementKind> {
        self.element(node).map(|element| element.kind())
    }

    fn tag_name(&self, node: NodeId) -> Option<String> {
        self.element(node).map(|element| element.tag.clone())
    }

    fn attributes(&self, node: NodeId) -> Vec<(String, String)> {
        self.element(node)
            .map(|element| element.attributes.clone())
            .unwrap_or_default()
    }

    fn get_attribute(&self, node: NodeId, name: &str) -> Option<String> {
        self.element(node)
            .and_then(|element| element.get_attribute(name))
            .map(str::to_string)
    }

    fn set_attribute(&mut self, node: NodeId, name: &str, value: &str) {
        if let Some(element) = self.element_mut(node) {
            element.set_attribute(name, value);
        }
    }

    fn remove_attribute(&mut self, node: NodeId, name: &str) {
        if let Some(element) = self.element_mut(node) {
            element.remove_attribute(name);
        }
    }

    fn set_inner_html(&mut self, node: NodeId, html: &str) {
        Document::set_inner_html(self, node, html);
    }

    fn set_boolean_property(&mut self, node: NodeId, name: &str, value: bool) {
        if let Some(element) = self.element_mut(node) {
            element.properties.flags.insert(name.to_string(), value);
        }
    }

    fn set_value_property(&mut self, node: NodeId, value: &str) {
        if let Some(element) = self.element_mut(node) {
            element.properties.value = Some(value.to_string());
        }
    }

    fn set_comment(&mut self, node: NodeId, text: &str) {
        if let Some(NodeData::Comment(existing)) = self.data_mut(node) {
            *existing = text.to_string();
        }
    }

    fn create_fragment(&mut self, html: &str) -> NodeId {
        Document::create_fragment(self, html)
    }

    fn clear_owned(&mut self, marker: NodeId) -> usize {
        let mut owners: HashSet<NodeId> = HashSet::from([marker]);
        let mut removed = 0;

        for sibling in self.following_siblings(marker) {
            if self.owner(sibling).is_some_and(|owner| owners.contains(&owner)) {
                owners.insert(sibling);
                self.remove(sibling);
                removed += 1;
            }
        }

        trace!(?marker, removed, "Cleared owned content");
        removed
    }

    fn insert_after(&mut self, marker: NodeId, fragment: NodeId) -> usize {
        let children = self.children(fragment).to_vec();
        let mut anchor = marker;

        for child in &children {
            // Content already owned by a nested marker keeps its owner
            if self.owner(*child).is_none() {
                self.set_owner(*child, Some(marker));
            }
            Document::insert_after(self, anchor, *child);
            anchor = *child;
        }

        release_fragment(self, fragment);
        children.len()
    }

    fn append_fragment(&mut self, target: NodeId, fragment: NodeId) {
        for child in self.children(fragment).to_vec() {
            self.append_child(target, child);
        }
        release_fragment(self, fragment);
    }

    fn is_attached(&self, node: NodeId) -> bool {
        Document::is_attached(self, node)
    }

    fn is_descendant(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = self.parent(node);
        while let Some(parent) = current {
            if parent == ancestor {
                return true;
            }
            current = self.parent(parent);
        }
        false
    }
}

/// Free a fragment container once its children have moved out
fn release_fragment(doc: &mut Document, fragment: NodeId) {
    if matches!(doc.data(fragment), NodeData::Fragment) && doc.children(fragment).is_empty() {
        doc.remove(fragment);
    }
}
