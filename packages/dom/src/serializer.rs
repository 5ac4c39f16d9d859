use crate::document::Document;
use crate::entities::{escape_attribute, escape_text};
use crate::node::{is_raw_text_element, is_void_element, NodeData, NodeId};

/// Append the markup for `id` and its subtree to `out`
pub fn write_node(doc: &Document, id: NodeId, out: &mut String) {
    match doc.data(id) {
        NodeData::Root | NodeData::Fragment => {
            for child in doc.children(id) {
                write_node(doc, *child, out);
            }
        }
        NodeData::Element(element) => {
            out.push('<');
            out.push_str(&element.tag);
            for (name, value) in &element.attributes {
                out.push(' ');
                out.push_str(name);
                out.push_str("=\"");
                out.push_str(&escape_attribute(value));
                out.push('"');
            }
            out.push('>');

            if is_void_element(&element.tag) {
                return;
            }

            let raw = is_raw_text_element(&element.tag);
            for child in doc.children(id) {
                match doc.data(*child) {
                    NodeData::Text(text) if raw => out.push_str(text),
                    _ => write_node(doc, *child, out),
                }
            }

            out.push_str("</");
            out.push_str(&element.tag);
            out.push('>');
        }
        NodeData::Text(text) => out.push_str(&escape_text(text)),
        NodeData::Comment(text) => {
            out.push_str("<!--");
            out.push_str(text);
            out.push_str("-->");
        }
        NodeData::Doctype(text) => {
            out.push_str("<!");
            out.push_str(text);
            out.push('>');
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::Document;

    #[test]
    fn test_serialize_escapes_attributes_and_text() {
        let mut doc = Document::new();
        let root = doc.root();
        let div = doc.create_element("div");
        doc.element_mut(div).unwrap().set_attribute("title", "a \"b\" & c");
        let text = doc.create_text("x < y");
        doc.append_child(root, div);
        doc.append_child(div, text);
        assert_eq!(doc.to_html(), r#"<div title="a &quot;b&quot; &amp; c">x &lt; y</div>"#);
    }

    #[test]
    fn test_serialize_document_preserves_structure() {
        let source = r#"<!DOCTYPE html><html><head><style>a > b { color: red }</style></head><body><!--loop:x--><input value="1"><br></body></html>"#;
        assert_eq!(Document::parse(source).to_html(), source);
    }
}
