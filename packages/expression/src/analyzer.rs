//! Textual dependency extraction and item-placeholder substitution.
//!
//! `expression_vars` is deliberately conservative: it works on raw text and
//! reports every identifier-shaped run outside string literals, property
//! names included. Over-reporting only costs a re-render.

use regex::Regex;
use std::sync::LazyLock;

static STRING_LITERAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""(?:[^"\\]|\\.)*"|'(?:[^'\\]|\\.)*'"#).unwrap());

static IDENTIFIER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b[A-Za-z_][A-Za-z0-9_]*\b").unwrap());

const RESERVED: &[&str] = &["true", "false", "null", "undefined", "NaN", "Infinity"];
const PLACEHOLDER_PREFIX: &str = "__STR";

/// Unique identifiers referenced by `expression`, in first-occurrence order
pub fn expression_vars(expression: &str) -> Vec<String> {
    let mut counter = 0usize;
    let masked = STRING_LITERAL.replace_all(expression, |_: &regex::Captures| {
        let placeholder = format!(" {}{}__ ", PLACEHOLDER_PREFIX, counter);
        counter += 1;
        placeholder
    });

    let mut vars: Vec<String> = Vec::new();
    for found in IDENTIFIER.find_iter(&masked) {
        let name = found.as_str();
        if RESERVED.contains(&name) || name.starts_with(PLACEHOLDER_PREFIX) {
            continue;
        }
        if !vars.iter().any(|existing| existing == name) {
            vars.push(name.to_string());
        }
    }
    vars
}

/// Union of the variables of every `{…}` token in a text template
pub fn template_vars(template: &str) -> Vec<String> {
    let mut vars: Vec<String> = Vec::new();
    for expr in template_expressions(template) {
        for name in expression_vars(expr) {
            if !vars.contains(&name) {
                vars.push(name);
            }
        }
    }
    vars
}

/// Index just past the `}` closing the `{` at `start`.
///
/// Quoted strings are skipped, so `{s == '}'}` is one group. `None` when
/// `start` is not a `{` or the group never closes.
pub fn brace_group_end(source: &str, start: usize) -> Option<usize> {
    let bytes = source.as_bytes();
    if bytes.get(start) != Some(&b'{') {
        return None;
    }

    let mut depth = 0usize;
    let mut quote: Option<u8> = None;
    let mut i = start;

    while i < bytes.len() {
        let b = bytes[i];
        match quote {
            Some(q) => {
                if b == b'\\' {
                    i += 1;
                } else if b == q {
                    quote = None;
                }
            }
            None => match b {
                b'"' | b'\'' | b'`' => quote = Some(b),
                b'{' => depth += 1,
                b'}' => {
                    depth -= 1;
                    if depth == 0 {
                        return Some(i + 1);
                    }
                }
                _ => {}
            },
        }
        i += 1;
    }

    None
}

/// Byte ranges of the `{…}` tokens of a text template, braces included.
/// An unclosed or empty `{` is plain text.
fn template_tokens(template: &str) -> Vec<(usize, usize)> {
    let mut tokens = Vec::new();
    let mut search = 0;

    while let Some(offset) = template[search..].find('{') {
        let start = search + offset;
        match brace_group_end(template, start) {
            Some(end) if end - start > 2 => {
                tokens.push((start, end));
                search = end;
            }
            _ => search = start + 1,
        }
    }

    tokens
}

/// Inner text of every `{…}` token, in order
pub fn template_expressions(template: &str) -> Vec<&str> {
    template_tokens(template)
        .into_iter()
        .map(|(start, end)| &template[start + 1..end - 1])
        .collect()
}

/// Replace every `{…}` token with `render(inner)`
pub fn replace_template_tokens<F>(template: &str, mut render: F) -> String
where
    F: FnMut(&str) -> String,
{
    let mut out = String::with_capacity(template.len());
    let mut last = 0;
    for (start, end) in template_tokens(template) {
        out.push_str(&template[last..start]);
        out.push_str(&render(&template[start + 1..end - 1]));
        last = end;
    }
    out.push_str(&template[last..]);
    out
}

/// Whether any of `vars` satisfies `is_updated`
pub fn depends_on<F>(vars: &[String], is_updated: F) -> bool
where
    F: Fn(&str) -> bool,
{
    vars.iter().any(|name| is_updated(name))
}

/// Replace free occurrences of the identifier `name` with `replacement`.
///
/// String literal contents and property names (`x.item`) are left alone.
pub fn substitute_identifier(expression: &str, name: &str, replacement: &str) -> String {
    let chars: Vec<char> = expression.chars().collect();
    let mut output = String::with_capacity(expression.len());
    let mut last_significant: Option<char> = None;
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];

        if c == '"' || c == '\'' {
            let start = i;
            i += 1;
            while i < chars.len() && chars[i] != c {
                if chars[i] == '\\' {
                    i += 1;
                }
                i += 1;
            }
            i = (i + 1).min(chars.len());
            output.extend(&chars[start..i]);
            last_significant = Some(c);
            continue;
        }

        if c.is_ascii_digit() {
            // Numbers swallow trailing letters so `1e5` never yields `e5`
            let start = i;
            while i < chars.len() && (chars[i].is_ascii_alphanumeric() || chars[i] == '.' || chars[i] == '_') {
                i += 1;
            }
            output.extend(&chars[start..i]);
            last_significant = Some('0');
            continue;
        }

        if is_ident_start(c) {
            let start = i;
            while i < chars.len() && is_ident_continue(chars[i]) {
                i += 1;
            }
            let word: String = chars[start..i].iter().collect();
            if word == name && last_significant != Some('.') {
                output.push_str(replacement);
            } else {
                output.push_str(&word);
            }
            last_significant = Some('a');
            continue;
        }

        if !c.is_whitespace() {
            last_significant = Some(c);
        }
        output.push(c);
        i += 1;
    }

    output
}

/// Apply [`substitute_identifier`] inside every `{…}` token of a text template
pub fn substitute_in_template(template: &str, name: &str, replacement: &str) -> String {
    replace_template_tokens(template, |inner| format!("{{{}}}", substitute_identifier(inner, name, replacement)))
}

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_' || c == '$'
}

fn is_ident_continue(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '$'
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vars_in_order_without_duplicates() {
        assert_eq!(expression_vars("a + b * a"), vec!["a", "b"]);
        assert_eq!(expression_vars("n > 0 ? x : y"), vec!["n", "x", "y"]);
    }

    #[test]
    fn test_vars_skip_reserved_literals() {
        assert_eq!(expression_vars("flag === true || value == null"), vec!["flag", "value"]);
        assert!(expression_vars("NaN + Infinity + undefined").is_empty());
    }

    #[test]
    fn test_vars_skip_string_contents() {
        assert_eq!(expression_vars("name + ' is here'"), vec!["name"]);
        assert_eq!(expression_vars(r#"status == "done \"really\"""#), vec!["status"]);
    }

    #[test]
    fn test_vars_are_conservative_about_properties() {
        assert_eq!(expression_vars("user.name"), vec!["user", "name"]);
    }

    #[test]
    fn test_vars_ignore_number_tails() {
        assert_eq!(expression_vars("1e5 + x"), vec!["x"]);
    }

    #[test]
    fn test_template_vars() {
        assert_eq!(template_expressions("Hi {first} {last}!"), vec!["first", "last"]);
        assert_eq!(template_vars("{a + b} and {b}"), vec!["a", "b"]);
        assert!(template_vars("plain text").is_empty());
    }

    #[test]
    fn test_substitute_identifier() {
        assert_eq!(substitute_identifier("item.name", "item", "items[0]"), "items[0].name");
        assert_eq!(substitute_identifier("item", "item", "items[1]"), "items[1]");
        assert_eq!(substitute_identifier("items.length", "item", "x"), "items.length");
        assert_eq!(substitute_identifier("other.item", "item", "x"), "other.item");
        assert_eq!(substitute_identifier("'item' + item", "item", "x"), "'item' + x");
        assert_eq!(substitute_identifier("item . item", "item", "x"), "x . item");
    }

    #[test]
    fn test_substitute_in_template_only_touches_tokens() {
        assert_eq!(
            substitute_in_template("item: {item.name}", "item", "list[2]"),
            "item: {list[2].name}"
        );
    }

    #[test]
    fn test_template_tokens_skip_strings() {
        let template = "{s == '}' ? 'yes' : 'no'} and {b}";
        assert_eq!(template_expressions(template), vec!["s == '}' ? 'yes' : 'no'", "b"]);
        assert_eq!(
            substitute_in_template("{s == '}' ? s : 'no'}", "s", "list[0]"),
            "{list[0] == '}' ? list[0] : 'no'}"
        );
    }

    #[test]
    fn test_unclosed_and_empty_braces_are_text() {
        assert_eq!(template_expressions("a { b {c}"), vec!["c"]);
        assert!(template_expressions("{} {").is_empty());
        assert_eq!(replace_template_tokens("a { b {c}", |_| "1".to_string()), "a { b 1");
    }

    #[test]
    fn test_brace_group_end() {
        assert_eq!(brace_group_end("{a}", 0), Some(3));
        assert_eq!(brace_group_end("x{ {a: 1} }y", 1), Some(11));
        assert_eq!(brace_group_end(r#"{"}"}"#, 0), Some(5));
        assert_eq!(brace_group_end("{ a", 0), None);
        assert_eq!(brace_group_end("a}", 0), None);
    }

    #[test]
    fn test_replace_template_tokens() {
        let rendered = replace_template_tokens("{a} + {b} = ?", |expr| expr.to_uppercase());
        assert_eq!(rendered, "A + B = ?");
    }

    #[test]
    fn test_depends_on() {
        let vars = vec!["a".to_string(), "b".to_string()];
        assert!(depends_on(&vars, |name| name == "b"));
        assert!(!depends_on(&vars, |name| name == "c"));
    }
}
