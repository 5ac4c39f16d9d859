//! Scoped class names shared by a template and its sibling stylesheet.
//!
//! Both sides derive the same id from the path with its extension removed,
//! so `page.pado` and `page.module.scss` agree on `_title_<id>`.

use regex::Regex;
use std::sync::LazyLock;

static SCOPED_EXTENSION: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\.(pado|ts|module\.scss)$").unwrap());

static PADO_CLASS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#"pado-class="([^"]+)""#).unwrap());

static CLASS_SELECTOR: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\.([a-zA-Z][a-zA-Z0-9_-]*)").unwrap());

/// Six-character base-36 id for `path`
pub fn scope_id(path: &str) -> String {
    let base = SCOPED_EXTENSION.replace(path, "");
    let mut hash: i32 = 0;
    for unit in base.encode_utf16() {
        hash = (hash << 5).wrapping_sub(hash).wrapping_add(unit as i32);
    }
    let mut id = to_base36((hash as i64).unsigned_abs());
    id.truncate(6);
    id
}

fn to_base36(mut n: u64) -> String {
    const DIGITS: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    let mut out = Vec::new();
    loop {
        out.push(DIGITS[(n % 36) as usize]);
        n /= 36;
        if n == 0 {
            break;
        }
    }
    out.reverse();
    String::from_utf8_lossy(&out).into_owned()
}

/// `pado-class="styles.title"` -> `class="_title_<id>"`
pub fn rewrite_scoped_classes(html: &str, scope_id: &str) -> String {
    PADO_CLASS
        .replace_all(html, |caps: &regex::Captures| {
            let reference = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
            let prop = reference.rsplit('.').next().unwrap_or(reference).trim();
            format!("class=\"_{}_{}\"", prop, scope_id)
        })
        .into_owned()
}

/// Rename `.class` selectors to `._class_<id>`; declaration blocks are left alone
pub fn scope_stylesheet(css: &str, scope_id: &str) -> String {
    let mut out = String::with_capacity(css.len() + 16);
    let mut segment_start = 0;

    for (i, c) in css.char_indices() {
        match c {
            '{' => {
                let prelude = &css[segment_start..i];
                out.push_str(&CLASS_SELECTOR.replace_all(prelude, |caps: &regex::Captures| {
                    let class = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
                    format!("._{}_{}", class, scope_id)
                }));
                out.push('{');
                segment_start = i + 1;
            }
            '}' => {
                out.push_str(&css[segment_start..=i]);
                segment_start = i + 1;
            }
            _ => {}
        }
    }

    out.push_str(&css[segment_start..]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scope_id_ignores_extension() {
        assert_eq!(scope_id("src/app/page.pado"), "kdhp4o");
        assert_eq!(scope_id("src/app/page.module.scss"), "kdhp4o");
        assert_eq!(scope_id("src/app/page.ts"), "kdhp4o");
        assert_eq!(scope_id("a"), "2p");
    }

    #[test]
    fn test_rewrite_scoped_classes() {
        assert_eq!(
            rewrite_scoped_classes(r#"<div pado-class="styles.title"></div>"#, "abc"),
            r#"<div class="_title_abc"></div>"#
        );
    }

    #[test]
    fn test_scope_stylesheet_only_touches_selectors() {
        let css = ".title, .box > p { background: url(a.png); margin: .5em } @media (min-width: 1px) { .box { color: red } }";
        assert_eq!(
            scope_stylesheet(css, "x1"),
            "._title_x1, ._box_x1 > p { background: url(a.png); margin: .5em } @media (min-width: 1px) { ._box_x1 { color: red } }"
        );
    }
}
