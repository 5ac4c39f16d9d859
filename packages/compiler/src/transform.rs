//! Attribute and text interpolation rewriting.
//!
//! - `name={expr}` / `name="{expr}"` becomes `pado-name="expr"`. Event
//!   handler attributes (`on*`) keep their braces for the runtime rewrite.
//! - A leaf element whose only content is text containing `{…}` gets that
//!   text moved into `pado-text` and its body emptied.
//! - Any other text run containing `{…}` is wrapped in a `<span pado-text>`.
//!
//! The scan is markup-aware: quotes and brace groups are skipped as units, so
//! `{a > b}` never ends a tag and `{x<y}` never starts one. A `{` that never
//! closes is an ordinary character.

use pado_dom::node::{is_raw_text_element, is_void_element};
use pado_expression::{brace_group_end, template_expressions};

/// Rewrite every tag and leaf text run in `content`
pub fn transform_content(content: &str) -> String {
    let mut out = String::with_capacity(content.len() + 32);
    let bytes = content.as_bytes();
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'<' if content[i..].starts_with("<!--") => {
                let end = content[i + 4..]
                    .find("-->")
                    .map(|offset| i + 4 + offset + 3)
                    .unwrap_or(bytes.len());
                out.push_str(&content[i..end]);
                i = end;
            }
            b'<' if bytes.get(i + 1).is_some_and(|b| b.is_ascii_alphabetic()) => {
                let Some(tag_end) = find_tag_end(content, i) else {
                    out.push_str(&content[i..]);
                    break;
                };
                let tag = rewrite_tag(&content[i..tag_end]);
                i = tag_end;

                if is_raw_text_element(&tag.name) {
                    out.push_str(&tag.source);
                    let body_end = find_closing_tag(content, i, &tag.name).unwrap_or(bytes.len());
                    out.push_str(&content[i..body_end]);
                    i = body_end;
                    continue;
                }

                // Content here is replaced at render time anyway
                if tag.has_text_binding && !tag.self_closing && !is_void_element(&tag.name) {
                    out.push_str(&tag.source);
                    let body_end = find_closing_tag(content, i, &tag.name).unwrap_or(i);
                    out.push_str(&content[i..body_end]);
                    i = body_end;
                    continue;
                }

                let is_leaf_candidate = !tag.self_closing && !is_void_element(&tag.name);
                if is_leaf_candidate {
                    if let Some(text_end) = leaf_text_end(content, i, &tag.name) {
                        let text = &content[i..text_end];
                        if has_binding_token(text) {
                            let binding = format!(" pado-text=\"{}\"", escape_html(text.trim()));
                            out.push_str(&insert_attribute(&tag.source, &binding));
                            i = text_end;
                            continue;
                        }
                    }
                }

                out.push_str(&tag.source);
            }
            b'<' if content[i..].starts_with("</") => {
                let end = content[i..].find('>').map(|offset| i + offset + 1).unwrap_or(bytes.len());
                out.push_str(&content[i..end]);
                i = end;
            }
            b'<' => {
                out.push('<');
                i += 1;
            }
            _ => {
                let end = text_run_end(content, i);
                push_text(&mut out, &content[i..end]);
                i = end;
            }
        }
    }

    out
}

/// End of the text starting at `start`: the next `<` outside a brace group
fn text_run_end(content: &str, start: usize) -> usize {
    let bytes = content.as_bytes();
    let mut i = start;
    while i < bytes.len() {
        match bytes[i] {
            b'{' => i = skip_braces(content, i).unwrap_or(i + 1),
            b'<' => break,
            _ => i += 1,
        }
    }
    i.min(bytes.len())
}

/// Text with interpolations that is not the sole body of an element gets a
/// `<span>` carrying the binding; surrounding whitespace stays outside
fn push_text(out: &mut String, text: &str) {
    if !has_binding_token(text) {
        out.push_str(text);
        return;
    }

    let body = text.trim();
    let leading = &text[..text.len() - text.trim_start().len()];
    let trailing = &text[text.trim_end().len()..];
    out.push_str(leading);
    out.push_str(&format!("<span pado-text=\"{}\"></span>", escape_html(body)));
    out.push_str(trailing);
}

/// A `{…}` group that is not a leftover directive such as `{@if(..)}` or `{/if}`
fn has_binding_token(text: &str) -> bool {
    template_expressions(text)
        .into_iter()
        .any(|expr| !expr.starts_with(['@', '/']))
}

/// HTML-escape text for storage in an attribute
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Inner text of `raw` when it is exactly one `{expr}` group
pub fn single_expression(raw: &str) -> Option<&str> {
    let trimmed = raw.trim();
    if trimmed.starts_with('{') && trimmed.ends_with('}') && skip_braces(trimmed, 0) == Some(trimmed.len()) {
        Some(&trimmed[1..trimmed.len() - 1])
    } else {
        None
    }
}

/// Index just past the `}` matching the `{` at `start`, if it closes
pub(crate) fn skip_braces(source: &str, start: usize) -> Option<usize> {
    brace_group_end(source, start)
}

struct RewrittenTag {
    name: String,
    source: String,
    self_closing: bool,
    has_text_binding: bool,
}

fn find_tag_end(content: &str, start: usize) -> Option<usize> {
    let bytes = content.as_bytes();
    let mut quote: Option<u8> = None;
    let mut i = start + 1;

    while i < bytes.len() {
        let b = bytes[i];
        match quote {
            Some(q) if b == q => quote = None,
            Some(_) => {}
            None => match b {
                b'"' | b'\'' => quote = Some(b),
                b'{' => {
                    i = skip_braces(content, i).unwrap_or(i + 1);
                    continue;
                }
                b'>' => return Some(i + 1),
                _ => {}
            },
        }
        i += 1;
    }

    None
}

fn rewrite_tag(source: &str) -> RewrittenTag {
    let bytes = source.as_bytes();
    let mut i = 1;
    while i < bytes.len() && !bytes[i].is_ascii_whitespace() && bytes[i] != b'>' && bytes[i] != b'/' {
        i += 1;
    }

    let name = source[1..i].to_ascii_lowercase();
    let mut out = String::with_capacity(source.len() + 8);
    out.push_str(&source[..i]);
    let mut self_closing = false;
    let mut has_text_binding = false;

    loop {
        let gap_start = i;
        while i < bytes.len() && bytes[i].is_ascii_whitespace() {
            i += 1;
        }
        if i >= bytes.len() || bytes[i] == b'>' || source[i..].starts_with("/>") {
            self_closing = source[i..].starts_with("/>");
            out.push_str(&source[gap_start..]);
            break;
        }
        if bytes[i] == b'/' {
            i += 1;
            out.push_str(&source[gap_start..i]);
            continue;
        }

        let name_start = i;
        while i < bytes.len()
            && !bytes[i].is_ascii_whitespace()
            && bytes[i] != b'='
            && bytes[i] != b'>'
            && !(bytes[i] == b'/' && bytes.get(i + 1) == Some(&b'>'))
        {
            i += 1;
        }
        let attr_name = &source[name_start..i];
        if attr_name.eq_ignore_ascii_case("pado-text") {
            has_text_binding = true;
        }

        let mut j = i;
        while j < bytes.len() && bytes[j].is_ascii_whitespace() {
            j += 1;
        }
        if bytes.get(j) != Some(&b'=') {
            out.push_str(&source[gap_start..i]);
            continue;
        }

        j += 1;
        while j < bytes.len() && bytes[j].is_ascii_whitespace() {
            j += 1;
        }

        let (raw, after, quoted) = match (bytes.get(j), skip_braces(source, j)) {
            (Some(&q @ (b'"' | b'\'')), _) => {
                let value_end = source[j + 1..]
                    .find(q as char)
                    .map(|offset| j + 1 + offset)
                    .unwrap_or(bytes.len());
                (&source[j + 1..value_end], (value_end + 1).min(bytes.len()), true)
            }
            (Some(&b'{'), Some(end)) => (&source[j..end], end, false),
            _ => {
                let mut end = j;
                while end < bytes.len() && !bytes[end].is_ascii_whitespace() && bytes[end] != b'>' {
                    end += 1;
                }
                (&source[j..end], end, false)
            }
        };

        let lowered = attr_name.to_ascii_lowercase();
        let gap = &source[gap_start..name_start];
        match single_expression(raw) {
            Some(expr) if !lowered.starts_with("on") && !lowered.starts_with("pado-") => {
                out.push_str(gap);
                out.push_str(&format!("pado-{}=\"{}\"", attr_name, escape_attribute(expr.trim())));
            }
            Some(_) if lowered.starts_with("on") && !quoted => {
                out.push_str(gap);
                out.push_str(&format!("{}=\"{}\"", attr_name, escape_attribute(raw)));
            }
            _ => out.push_str(&source[gap_start..after]),
        }
        i = after;
    }

    RewrittenTag {
        name,
        source: out,
        self_closing,
        has_text_binding,
    }
}

fn escape_attribute(value: &str) -> String {
    value.replace('&', "&amp;").replace('"', "&quot;")
}

/// End of the text run at `start` if it is directly followed by `</name>`
fn leaf_text_end(content: &str, start: usize, name: &str) -> Option<usize> {
    let bytes = content.as_bytes();
    let mut i = start;
    while i < bytes.len() {
        match bytes[i] {
            b'{' => i = skip_braces(content, i).unwrap_or(i + 1),
            b'<' => break,
            _ => i += 1,
        }
    }

    is_closing_tag(content, i, name).then_some(i)
}

fn is_closing_tag(content: &str, at: usize, name: &str) -> bool {
    let Some(rest) = content.get(at..).and_then(|s| s.strip_prefix("</")) else {
        return false;
    };
    let Some(candidate) = rest.get(..name.len()) else {
        return false;
    };
    candidate.eq_ignore_ascii_case(name)
        && rest[name.len()..]
            .chars()
            .next()
            .is_some_and(|c| c == '>' || c.is_whitespace())
}

fn find_closing_tag(content: &str, start: usize, name: &str) -> Option<usize> {
    let mut search = start;
    while let Some(offset) = content[search..].find("</") {
        let at = search + offset;
        if is_closing_tag(content, at, name) {
            return Some(at);
        }
        search = at + 2;
    }
    None
}

fn insert_attribute(tag_source: &str, attribute: &str) -> String {
    match tag_source.strip_suffix('>') {
        Some(head) => format!("{}{}>", head, attribute),
        None => tag_source.to_string(),
    }
}
