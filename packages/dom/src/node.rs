use std::collections::BTreeMap;

/// Handle into a [`Document`](crate::Document) arena.
///
/// Slots are recycled; the generation tells a handle to a removed node apart
/// from the node that reuses its slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId {
    pub(crate) index: usize,
    pub(crate) generation: u32,
}

impl NodeId {
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn generation(&self) -> u32 {
        self.generation
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum NodeData {
    /// Document root
    Root,
    /// Detached container produced by fragment parsing
    Fragment,
    Element(ElementData),
    Text(String),
    Comment(String),
    Doctype(String),
}

impl NodeData {
    pub fn as_element(&self) -> Option<&ElementData> {
        match self {
            NodeData::Element(element) => Some(element),
            _ => None,
        }
    }

    pub fn as_element_mut(&mut self) -> Option<&mut ElementData> {
        match self {
            NodeData::Element(element) => Some(element),
            _ => None,
        }
    }

    pub fn as_comment(&self) -> Option<&str> {
        match self {
            NodeData::Comment(text) => Some(text),
            _ => None,
        }
    }
}

/// Element state: markup attributes plus live properties
#[derive(Debug, Clone, PartialEq)]
pub struct ElementData {
    pub tag: String,
    /// Source order is preserved
    pub attributes: Vec<(String, String)>,
    pub properties: Properties,
}

impl ElementData {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into().to_ascii_lowercase(),
            attributes: Vec::new(),
            properties: Properties::default(),
        }
    }

    pub fn kind(&self) -> ElementKind {
        ElementKind::from_tag(&self.tag)
    }

    pub fn get_attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn has_attribute(&self, name: &str) -> bool {
        self.get_attribute(name).is_some()
    }

    /// Overwrite in place, keeping the attribute's position
    pub fn set_attribute(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        match self.attributes.iter_mut().find(|(key, _)| key == name) {
            Some((_, existing)) => *existing = value,
            None => self.attributes.push((name.to_string(), value)),
        }
    }

    pub fn remove_attribute(&mut self, name: &str) -> Option<String> {
        let position = self.attributes.iter().position(|(key, _)| key == name)?;
        Some(self.attributes.remove(position).1)
    }
}

/// DOM properties that live apart from the serialized attributes
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Properties {
    pub value: Option<String>,
    pub flags: BTreeMap<String, bool>,
}

/// Capability tag for an element, resolved from its tag name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementKind {
    Input,
    TextArea,
    Select,
    Button,
    Other,
}

impl ElementKind {
    pub fn from_tag(tag: &str) -> Self {
        match tag.to_ascii_lowercase().as_str() {
            "input" => ElementKind::Input,
            "textarea" => ElementKind::TextArea,
            "select" => ElementKind::Select,
            "button" => ElementKind::Button,
            _ => ElementKind::Other,
        }
    }

    /// Whether the element exposes `name` as a boolean DOM property
    pub fn supports_boolean_property(&self, name: &str) -> bool {
        match name {
            "checked" => matches!(self, ElementKind::Input),
            "disabled" => !matches!(self, ElementKind::Other),
            "readonly" => matches!(self, ElementKind::Input | ElementKind::TextArea),
            _ => false,
        }
    }

    pub fn supports_value_property(&self) -> bool {
        matches!(self, ElementKind::Input | ElementKind::TextArea | ElementKind::Select)
    }
}

/// Elements that never have children or a closing tag
pub fn is_void_element(tag: &str) -> bool {
    matches!(
        tag,
        "area" | "base" | "br" | "col" | "embed" | "hr" | "img" | "input" | "link" | "meta" | "source" | "track" | "wbr"
    )
}

/// Elements whose content is raw text, not markup
pub fn is_raw_text_element(tag: &str) -> bool {
    matches!(tag, "script" | "style")
}
