//! Lenient HTML fragment parser.
//!
//! Covers what compiled templates contain: elements, quoted, unquoted and
//! bare attributes, comments, doctypes, void and self-closing elements, raw
//! text in `script`/`style`. Unbalanced end tags are dropped and unclosed
//! elements are closed at end of input. It never fails.

use crate::document::Document;
use crate::entities::decode_entities;
use crate::node::{is_raw_text_element, is_void_element, ElementData, NodeData, NodeId};

pub(crate) fn parse_into(doc: &mut Document, parent: NodeId, html: &str) {
    let mut parser = HtmlParser {
        source: html,
        pos: 0,
        stack: vec![parent],
    };
    parser.run(doc);
}

struct HtmlParser<'src> {
    source: &'src str,
    pos: usize,
    /// Open elements; the bottom entry is the insertion parent
    stack: Vec<NodeId>,
}

impl<'src> HtmlParser<'src> {
    fn run(&mut self, doc: &mut Document) {
        while self.pos < self.source.len() {
            let rest = &self.source[self.pos..];
            match rest.find('<') {
                Some(0) => self.parse_markup(doc),
                Some(offset) => {
                    self.push_text(doc, &rest[..offset]);
                    self.pos += offset;
                }
                None => {
                    self.push_text(doc, rest);
                    self.pos = self.source.len();
                }
            }
        }
    }

    fn current(&self) -> NodeId {
        self.stack[self.stack.len() - 1]
    }

    fn push_text(&mut self, doc: &mut Document, raw: &str) {
        if raw.is_empty() {
            return;
        }
        let text = doc.create_text(decode_entities(raw));
        doc.append_child(self.current(), text);
    }

    fn parse_markup(&mut self, doc: &mut Document) {
        let rest = &self.source[self.pos..];

        if let Some(body) = rest.strip_prefix("<!--") {
            let (text, consumed) = match body.find("-->") {
                Some(end) => (&body[..end], 4 + end + 3),
                None => (body, rest.len()),
            };
            let comment = doc.create_comment(text);
            doc.append_child(self.current(), comment);
            self.pos += consumed;
            return;
        }

        if let Some(body) = rest.strip_prefix("<!") {
            let end = body.find('>').unwrap_or(body.len());
            let doctype = doc.create_node(NodeData::Doctype(body[..end].trim().to_string()));
            doc.append_child(self.current(), doctype);
            self.pos += (2 + end + 1).min(rest.len());
            return;
        }

        if let Some(body) = rest.strip_prefix("</") {
            let end = body.find('>').unwrap_or(body.len());
            let name = body[..end].trim().to_ascii_lowercase();
            self.close_element(doc, &name);
            self.pos += (2 + end + 1).min(rest.len());
            return;
        }

        let starts_tag = rest[1..].chars().next().is_some_and(|c| c.is_ascii_alphabetic());
        if !starts_tag {
            self.push_text(doc, "<");
            self.pos += 1;
            return;
        }

        self.parse_start_tag(doc);
    }

    fn close_element(&mut self, doc: &Document, name: &str) {
        // Never pop the insertion parent
        let open = self.stack[1..].iter().rposition(|id| {
            doc.element(*id).is_some_and(|element| element.tag == name)
        });
        if let Some(index) = open {
            self.stack.truncate(index + 1);
        }
    }

    fn parse_start_tag(&mut self, doc: &mut Document) {
        let bytes = self.source.as_bytes();
        let mut i = self.pos + 1;
        let name_start = i;
        while i < bytes.len() && !bytes[i].is_ascii_whitespace() && bytes[i] != b'>' && bytes[i] != b'/' {
            i += 1;
        }
        let mut element = ElementData::new(&self.source[name_start..i]);
        let mut self_closing = false;

        loop {
            while i < bytes.len() && bytes[i].is_ascii_whitespace() {
                i += 1;
            }
            if i >= bytes.len() {
                break;
            }
            match bytes[i] {
                b'>' => {
                    i += 1;
                    break;
                }
                b'/' if bytes.get(i + 1) == Some(&b'>') => {
                    self_closing = true;
                    i += 2;
                    break;
                }
                b'/' => {
                    i += 1;
                    continue;
                }
                _ => {}
            }

            let attr_start = i;
            while i < bytes.len() && !bytes[i].is_ascii_whitespace() && !matches!(bytes[i], b'=' | b'>') {
                if bytes[i] == b'/' && bytes.get(i + 1) == Some(&b'>') {
                    break;
                }
                i += 1;
            }
            let name = self.source[attr_start..i].to_ascii_lowercase();

            let mut lookahead = i;
            while lookahead < bytes.len() && bytes[lookahead].is_ascii_whitespace() {
                lookahead += 1;
            }

            let value = if bytes.get(lookahead) == Some(&b'=') {
                i = lookahead + 1;
                while i < bytes.len() && bytes[i].is_ascii_whitespace() {
                    i += 1;
                }
                match bytes.get(i) {
                    Some(&quote @ (b'"' | b'\'')) => {
                        let value_start = i + 1;
                        let value_end = self.source[value_start..]
                            .find(quote as char)
                            .map(|offset| value_start + offset)
                            .unwrap_or(bytes.len());
                        i = (value_end + 1).min(bytes.len());
                        decode_entities(&self.source[value_start..value_end])
                    }
                    _ => {
                        let value_start = i;
                        while i < bytes.len() && !bytes[i].is_ascii_whitespace() && bytes[i] != b'>' {
                            i += 1;
                        }
                        decode_entities(&self.source[value_start..i])
                    }
                }
            } else {
                String::new()
            };

            if !name.is_empty() && !element.has_attribute(&name) {
                element.attributes.push((name, value));
            }
        }

        self.pos = i;
        let tag = element.tag.clone();
        let id = doc.create_node(NodeData::Element(element));
        doc.append_child(self.current(), id);

        if self_closing || is_void_element(&tag) {
            return;
        }

        if is_raw_text_element(&tag) {
            self.parse_raw_text(doc, id, &tag);
            return;
        }

        self.stack.push(id);
    }

    fn parse_raw_text(&mut self, doc: &mut Document, element: NodeId, tag: &str) {
        let rest = &self.source[self.pos..];
        let closing = format!("</{}", tag);
        let end = rest.to_ascii_lowercase().find(&closing).unwrap_or(rest.len());

        if end > 0 {
            let text = doc.create_text(&rest[..end]);
            doc.append_child(element, text);
        }

        let after = &rest[end..];
        let consumed = after.find('>').map(|i| i + 1).unwrap_or(after.len());
        self.pos += end + consumed;
    }
}

#[cfg(test)]
mod tests {
    use crate::{Document, NodeData};

    #[test]
    fn test_parse_attributes() {
        let doc = Document::parse(r#"<input type=checkbox checked pado-checked="flag" data-x='a"b'>"#);
        let input = doc.find_by_tag(doc.root(), "input").unwrap();
        let element = doc.element(input).unwrap();
        assert_eq!(element.get_attribute("type"), Some("checkbox"));
        assert_eq!(element.get_attribute("checked"), Some(""));
        assert_eq!(element.get_attribute("pado-checked"), Some("flag"));
        assert_eq!(element.get_attribute("data-x"), Some("a\"b"));
    }

    #[test]
    fn test_parse_comments_and_doctype() {
        let doc = Document::parse("<!DOCTYPE html><body><!-- if:abc --><p>x</p></body>");
        let children = doc.children(doc.root());
        assert_eq!(doc.data(children[0]), &NodeData::Doctype("DOCTYPE html".to_string()));
        let body = doc.find_by_tag(doc.root(), "body").unwrap();
        let comment = doc.children(body)[0];
        assert_eq!(doc.data(comment).as_comment(), Some(" if:abc "));
    }

    #[test]
    fn test_raw_text_elements_keep_markup() {
        let doc = Document::parse("<script>if (a < b) { go('</p>') }</script><p>after</p>");
        let script = doc.find_by_tag(doc.root(), "script").unwrap();
        assert_eq!(doc.text_content(script), "if (a < b) { go('</p>') }");
        assert!(doc.find_by_tag(doc.root(), "p").is_some());
    }

    #[test]
    fn test_unbalanced_tags_are_tolerated() {
        let doc = Document::parse("<div><span>a</div></p>b");
        assert_eq!(doc.to_html(), "<div><span>a</span></div>b");
    }

    #[test]
    fn test_text_entities_decoded() {
        let doc = Document::parse("<p>a &amp; b &lt; c</p>");
        let p = doc.find_by_tag(doc.root(), "p").unwrap();
        assert_eq!(doc.text_content(p), "a & b < c");
        assert_eq!(doc.inner_html(p), "a &amp; b &lt; c");
    }

    #[test]
    fn test_self_closing_and_void() {
        let doc = Document::parse("<div/><br><img src=x.png/>tail");
        let div = doc.find_by_tag(doc.root(), "div").unwrap();
        assert!(doc.children(div).is_empty());
        assert_eq!(doc.children(doc.root()).len(), 4);
    }
}
