use crate::node::{ElementData, NodeData, NodeId};
use crate::{parser, serializer};

#[derive(Debug, Clone)]
struct Node {
    data: NodeData,
    generation: u32,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    /// Marker comment whose render step inserted this node
    owner: Option<NodeId>,
}

impl Node {
    fn new(data: NodeData, generation: u32) -> Self {
        Self {
            data,
            generation,
            parent: None,
            children: Vec::new(),
            owner: None,
        }
    }
}

static STALE: NodeData = NodeData::Fragment;

/// Arena-backed document tree.
///
/// Moving a node (`detach`, `append_child`, `insert_after`) keeps it alive.
/// Removing it (`remove`, `remove_children`) frees its whole subtree for
/// reuse. A stale `NodeId` reads as an empty detached fragment and writes
/// through it are ignored.
#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<Node>,
    free: Vec<usize>,
    root: NodeId,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    pub fn new() -> Self {
        Self {
            nodes: vec![Node::new(NodeData::Root, 0)],
            free: Vec::new(),
            root: NodeId { index: 0, generation: 0 },
        }
    }

    /// Parse a full document (or any markup) under a fresh root
    pub fn parse(html: &str) -> Self {
        let mut doc = Self::new();
        let root = doc.root;
        parser::parse_into(&mut doc, root, html);
        doc
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.index).filter(|node| node.generation == id.generation)
    }

    fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id.index).filter(|node| node.generation == id.generation)
    }

    /// Whether `id` still refers to a node that has not been removed
    pub fn contains(&self, id: NodeId) -> bool {
        self.node(id).is_some()
    }

    pub fn data(&self, id: NodeId) -> &NodeData {
        self.node(id).map(|node| &node.data).unwrap_or(&STALE)
    }

    pub fn data_mut(&mut self, id: NodeId) -> Option<&mut NodeData> {
        self.node_mut(id).map(|node| &mut node.data)
    }

    pub fn element(&self, id: NodeId) -> Option<&ElementData> {
        self.data(id).as_element()
    }

    pub fn element_mut(&mut self, id: NodeId) -> Option<&mut ElementData> {
        self.data_mut(id).and_then(NodeData::as_element_mut)
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).and_then(|node| node.parent)
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.node(id).map(|node| node.children.as_slice()).unwrap_or(&[])
    }

    pub fn owner(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).and_then(|node| node.owner)
    }

    pub fn set_owner(&mut self, id: NodeId, owner: Option<NodeId>) {
        if let Some(node) = self.node_mut(id) {
            node.owner = owner;
        }
    }

    /// Slots in the arena, live or free
    pub fn capacity(&self) -> usize {
        self.nodes.len()
    }

    /// Nodes that have not been removed, detached ones included
    pub fn live_nodes(&self) -> usize {
        self.nodes.len() - self.free.len()
    }

    pub fn create_node(&mut self, data: NodeData) -> NodeId {
        match self.free.pop() {
            Some(index) => {
                let generation = self.nodes[index].generation;
                self.nodes[index] = Node::new(data, generation);
                NodeId { index, generation }
            }
            None => {
                let index = self.nodes.len();
                self.nodes.push(Node::new(data, 0));
                NodeId { index, generation: 0 }
            }
        }
    }

    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.create_node(NodeData::Element(ElementData::new(tag)))
    }

    pub fn create_text(&mut self, text: impl Into<String>) -> NodeId {
        self.create_node(NodeData::Text(text.into()))
    }

    pub fn create_comment(&mut self, text: impl Into<String>) -> NodeId {
        self.create_node(NodeData::Comment(text.into()))
    }

    /// Parse `html` into a detached fragment container
    pub fn create_fragment(&mut self, html: &str) -> NodeId {
        let fragment = self.create_node(NodeData::Fragment);
        parser::parse_into(self, fragment, html);
        fragment
    }

    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        if !self.contains(parent) || !self.contains(child) {
            return;
        }
        self.detach(child);
        self.nodes[child.index].parent = Some(parent);
        self.nodes[parent.index].children.push(child);
    }

    /// Insert `child` as the sibling right after `reference`.
    ///
    /// Returns false when `reference` has no parent.
    pub fn insert_after(&mut self, reference: NodeId, child: NodeId) -> bool {
        if reference == child || !self.contains(child) {
            return false;
        }
        let Some(parent) = self.parent(reference) else {
            return false;
        };
        self.detach(child);
        let position = self.position_in_parent(reference).map(|i| i + 1).unwrap_or(0);
        self.nodes[child.index].parent = Some(parent);
        self.nodes[parent.index].children.insert(position, child);
        true
    }

    /// Unlink `id` from its parent; the node stays usable
    pub fn detach(&mut self, id: NodeId) {
        let Some(parent) = self.node_mut(id).and_then(|node| node.parent.take()) else {
            return;
        };
        if let Some(parent) = self.node_mut(parent) {
            parent.children.retain(|child| *child != id);
        }
    }

    /// Detach `id` and free it together with its descendants
    pub fn remove(&mut self, id: NodeId) {
        if id == self.root || !self.contains(id) {
            return;
        }
        self.detach(id);
        self.release(id);
    }

    /// Free every child of `id` and its subtree
    pub fn remove_children(&mut self, id: NodeId) {
        let Some(node) = self.node_mut(id) else {
            return;
        };
        let children = std::mem::take(&mut node.children);
        for child in children {
            self.release(child);
        }
    }

    fn release(&mut self, id: NodeId) {
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            let Some(node) = self.node_mut(current) else {
                continue;
            };
            stack.append(&mut node.children);
            node.data = NodeData::Fragment;
            node.parent = None;
            node.owner = None;
            node.generation = node.generation.wrapping_add(1);
            self.free.push(current.index);
        }
    }

    pub fn position_in_parent(&self, id: NodeId) -> Option<usize> {
        let parent = self.parent(id)?;
        self.children(parent).iter().position(|child| *child == id)
    }

    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.parent(id)?;
        let position = self.position_in_parent(id)?;
        self.children(parent).get(position + 1).copied()
    }

    pub fn following_siblings(&self, id: NodeId) -> Vec<NodeId> {
        match (self.parent(id), self.position_in_parent(id)) {
            (Some(parent), Some(position)) => self.children(parent)[position + 1..].to_vec(),
            _ => Vec::new(),
        }
    }

    /// Descendants of `scope` in document order, `scope` excluded
    pub fn descendants(&self, scope: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(scope).iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            out.push(id);
            stack.extend(self.children(id).iter().rev().copied());
        }
        out
    }

    /// Whether `id` is reachable from the document root
    pub fn is_attached(&self, id: NodeId) -> bool {
        let mut current = id;
        loop {
            if current == self.root {
                return true;
            }
            match self.parent(current) {
                Some(parent) => current = parent,
                None => return false,
            }
        }
    }

    /// Replace the children of `id` with parsed `html`
    pub fn set_inner_html(&mut self, id: NodeId, html: &str) {
        self.remove_children(id);
        parser::parse_into(self, id, html);
    }

    pub fn inner_html(&self, id: NodeId) -> String {
        let mut out = String::new();
        for child in self.children(id) {
            serializer::write_node(self, *child, &mut out);
        }
        out
    }

    pub fn outer_html(&self, id: NodeId) -> String {
        let mut out = String::new();
        serializer::write_node(self, id, &mut out);
        out
    }

    pub fn to_html(&self) -> String {
        self.inner_html(self.root)
    }

    pub fn text_content(&self, id: NodeId) -> String {
        match self.data(id) {
            NodeData::Text(text) => text.clone(),
            NodeData::Comment(_) | NodeData::Doctype(_) => String::new(),
            _ => self
                .children(id)
                .iter()
                .map(|child| self.text_content(*child))
                .collect(),
        }
    }

    /// First element with `tag` under `scope`
    pub fn find_by_tag(&self, scope: NodeId, tag: &str) -> Option<NodeId> {
        self.descendants(scope)
            .into_iter()
            .find(|id| self.element(*id).is_some_and(|element| element.tag == tag))
    }

    pub fn elements_with_attribute(&self, scope: NodeId, name: &str) -> Vec<NodeId> {
        self.descendants(scope)
            .into_iter()
            .filter(|id| self.element(*id).is_some_and(|element| element.has_attribute(name)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_after_and_detach() {
        let mut doc = Document::parse("<ul><li>a</li><li>c</li></ul>");
        let ul = doc.find_by_tag(doc.root(), "ul").unwrap();
        let first = doc.children(ul)[0];

        let fragment = doc.create_fragment("<li>b</li>");
        let li = doc.children(fragment)[0];
        assert!(doc.insert_after(first, li));
        assert_eq!(doc.to_html(), "<ul><li>a</li><li>b</li><li>c</li></ul>");
        assert!(doc.children(fragment).is_empty());

        doc.detach(first);
        assert!(!doc.is_attached(first));
        assert_eq!(doc.to_html(), "<ul><li>b</li><li>c</li></ul>");
    }

    #[test]
    fn test_descendants_are_document_ordered() {
        let doc = Document::parse("<div><p>1</p><span>2</span></div><hr>");
        let tags: Vec<String> = doc
            .descendants(doc.root())
            .into_iter()
            .filter_map(|id| doc.element(id).map(|element| element.tag.clone()))
            .collect();
        assert_eq!(tags, vec!["div", "p", "span", "hr"]);
    }

    #[test]
    fn test_removed_slots_are_reused() {
        let mut doc = Document::parse("<p>old</p>");
        let p = doc.find_by_tag(doc.root(), "p").unwrap();
        let capacity = doc.capacity();

        for n in 0..1000 {
            doc.set_inner_html(p, &format!("<b>{}</b>", n));
        }
        assert_eq!(doc.inner_html(p), "<b>999</b>");
        assert!(doc.capacity() <= capacity + 1);
        assert_eq!(doc.live_nodes(), 4);
    }

    #[test]
    fn test_stale_handles_are_inert() {
        let mut doc = Document::parse("<div><hr></div>");
        let div = doc.find_by_tag(doc.root(), "div").unwrap();
        let hr = doc.children(div)[0];

        doc.remove(hr);
        let reused = doc.create_text("y");
        assert_eq!(reused.index(), hr.index());
        assert_ne!(reused, hr);

        assert!(!doc.contains(hr));
        assert!(doc.children(hr).is_empty());
        assert!(doc.element(hr).is_none());
        doc.append_child(hr, reused);
        assert!(doc.parent(reused).is_none());
        assert_eq!(doc.to_html(), "<div></div>");
    }

    #[test]
    fn test_inner_html_roundtrip() {
        let mut doc = Document::parse("<p>old</p>");
        let p = doc.find_by_tag(doc.root(), "p").unwrap();
        doc.set_inner_html(p, "a <b>bold</b> move");
        assert_eq!(doc.inner_html(p), "a <b>bold</b> move");
        assert_eq!(doc.text_content(p), "a bold move");
    }
}
