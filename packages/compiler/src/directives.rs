//! Directive scanning for `{@if}` chains and `{@loop}` blocks.
//!
//! The scanner walks the source left to right. For every opener it finds the
//! matching closer with a same-kind depth counter, compiles the body first
//! (so nested directives are already markers), records the block and splices
//! a marker comment in its place. An opener without a closer, or with a
//! header that cannot be parsed, is left in the output as plain text.

use crate::artifact::{Block, BlockKind, ConditionGroup, LoopDefinition};
use crate::error::CompileWarning;
use crate::id_generator::IDGenerator;
use crate::marker::Marker;
use crate::transform::transform_content;
use regex::Regex;
use std::sync::LazyLock;
use tracing::{debug, warn};

static LOOP_HEADER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s+(.+?)\s+as\s+([A-Za-z_$][A-Za-z0-9_$]*)\s*$").unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DirectiveKind {
    If,
    Loop,
}

impl DirectiveKind {
    fn opener(&self) -> &'static str {
        match self {
            DirectiveKind::If => "{@if",
            DirectiveKind::Loop => "{@loop",
        }
    }

    fn closer(&self) -> &'static str {
        match self {
            DirectiveKind::If => "{/if}",
            DirectiveKind::Loop => "{/loop}",
        }
    }

    fn keyword(&self) -> &'static str {
        match self {
            DirectiveKind::If => "if",
            DirectiveKind::Loop => "loop",
        }
    }
}

pub(crate) struct DirectiveCompiler<'a> {
    ids: &'a mut IDGenerator,
    pub conditions: Vec<ConditionGroup>,
    pub loops: Vec<LoopDefinition>,
    pub warnings: Vec<CompileWarning>,
}

impl<'a> DirectiveCompiler<'a> {
    pub fn new(ids: &'a mut IDGenerator) -> Self {
        Self {
            ids,
            conditions: Vec::new(),
            loops: Vec::new(),
            warnings: Vec::new(),
        }
    }

    /// Replace every balanced directive in `content` with its marker
    pub fn process(&mut self, content: &str) -> String {
        let mut result = String::with_capacity(content.len());
        let mut cursor = 0;

        while let Some((start, kind)) = find_next_opener(content, cursor) {
            result.push_str(&content[cursor..start]);

            let compiled = match kind {
                DirectiveKind::If => self.compile_if(content, start),
                DirectiveKind::Loop => self.compile_loop(content, start),
            };

            match compiled {
                Some((marker, end)) => {
                    result.push_str(&marker.to_comment());
                    cursor = end;
                }
                None => {
                    let skip = start + kind.opener().len();
                    result.push_str(&content[start..skip]);
                    cursor = skip;
                }
            }
        }

        result.push_str(&content[cursor..]);
        result
    }

    fn compile_if(&mut self, content: &str, start: usize) -> Option<(Marker, usize)> {
        let Some((close_start, end)) = find_block_end(content, start, DirectiveKind::If) else {
            self.report(CompileWarning::unmatched("if", start));
            return None;
        };

        let Some((condition, header_end)) = parse_condition_header(content, start + "{@if".len()) else {
            let header = first_line(&content[start..close_start]);
            self.report(CompileWarning::malformed("if", header, start));
            return None;
        };

        let group_name = self.ids.next_condition();
        let body = self.process(&content[header_end..close_start]);
        let blocks = self.split_branches(&group_name, condition, &body);

        debug!(group = %group_name, blocks = blocks.len(), "Compiled condition group");
        self.conditions.push(ConditionGroup {
            group_name: group_name.clone(),
            blocks,
        });

        Some((Marker::Condition(group_name), end))
    }

    fn compile_loop(&mut self, content: &str, start: usize) -> Option<(Marker, usize)> {
        let Some((close_start, end)) = find_block_end(content, start, DirectiveKind::Loop) else {
            self.report(CompileWarning::unmatched("loop", start));
            return None;
        };

        let header_start = start + "{@loop".len();
        let parsed = content[header_start..close_start].find('}').and_then(|offset| {
            let header = &content[header_start..header_start + offset];
            let caps = LOOP_HEADER.captures(header)?;
            let array_expr = caps.get(1)?.as_str().trim().to_string();
            let item_name = caps.get(2)?.as_str().to_string();
            Some((array_expr, item_name, header_start + offset + 1))
        });

        let Some((array_expr, item_name, header_end)) = parsed else {
            let header = first_line(&content[start..close_start]);
            self.report(CompileWarning::malformed("loop", header, start));
            return None;
        };

        let name = self.ids.next_loop();
        let body = self.process(&content[header_end..close_start]);

        debug!(loop_name = %name, array = %array_expr, item = %item_name, "Compiled loop");
        self.loops.push(LoopDefinition {
            name: name.clone(),
            array_expr,
            item_name,
            content: transform_content(body.trim()),
        });

        Some((Marker::Loop(name), end))
    }

    /// Split an `if` body (nested directives already compiled) into blocks
    fn split_branches(&mut self, group_name: &str, condition: String, body: &str) -> Vec<Block> {
        let mut blocks = Vec::new();
        let mut kind = BlockKind::If;
        let mut current_condition = Some(condition);
        let mut segment_start = 0;
        let mut search = 0;

        while kind != BlockKind::Else {
            let Some((at, branch)) = find_branch(body, search) else {
                break;
            };

            let next = match branch {
                Branch::Else => Some((BlockKind::Else, None, at + "{@else}".len())),
                Branch::ElseIf => parse_condition_header(body, at + "{@elseif".len())
                    .map(|(cond, header_end)| (BlockKind::Elseif, Some(cond), header_end)),
            };

            match next {
                Some((next_kind, next_condition, header_end)) => {
                    blocks.push(make_block(kind, current_condition.take(), &body[segment_start..at]));
                    kind = next_kind;
                    current_condition = next_condition;
                    segment_start = header_end;
                    search = header_end;
                }
                None => {
                    let header = first_line(&body[at..]);
                    self.report(CompileWarning::malformed("elseif", header, at));
                    search = at + "{@elseif".len();
                }
            }
        }

        if kind == BlockKind::Else {
            if let Some((at, branch)) = find_branch(body, segment_start) {
                let branch = match branch {
                    Branch::Else => "{@else}",
                    Branch::ElseIf => "{@elseif}",
                };
                warn!(group = %group_name, position = at, "Branch after {{@else}} kept as content");
                self.warnings.push(CompileWarning::BranchAfterElse {
                    branch: branch.to_string(),
                    group: group_name.to_string(),
                });
            }
        }

        blocks.push(make_block(kind, current_condition, &body[segment_start..]));
        blocks
    }

    fn report(&mut self, warning: CompileWarning) {
        warn!(%warning, "Directive left unprocessed");
        self.warnings.push(warning);
    }
}

fn make_block(kind: BlockKind, condition: Option<String>, content: &str) -> Block {
    Block::new(kind, condition, transform_content(content.trim()))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Branch {
    ElseIf,
    Else,
}

fn find_branch(body: &str, from: usize) -> Option<(usize, Branch)> {
    let mut search = from;
    while let Some(offset) = body[search..].find("{@else") {
        let at = search + offset;
        let rest = &body[at + "{@else".len()..];
        if rest.starts_with('}') {
            return Some((at, Branch::Else));
        }
        if let Some(after) = rest.strip_prefix("if") {
            if after.trim_start().starts_with('(') {
                return Some((at, Branch::ElseIf));
            }
        }
        search = at + 1;
    }
    None
}

/// Position of the earliest `{@if (` or `{@loop ` at or after `from`
fn find_next_opener(content: &str, from: usize) -> Option<(usize, DirectiveKind)> {
    let next_if = find_opener(content, from, DirectiveKind::If);
    let next_loop = find_opener(content, from, DirectiveKind::Loop);
    match (next_if, next_loop) {
        (Some(a), Some(b)) if b < a => Some((b, DirectiveKind::Loop)),
        (Some(a), _) => Some((a, DirectiveKind::If)),
        (None, Some(b)) => Some((b, DirectiveKind::Loop)),
        (None, None) => None,
    }
}

fn find_opener(content: &str, from: usize, kind: DirectiveKind) -> Option<usize> {
    let mut search = from;
    while let Some(offset) = content[search..].find(kind.opener()) {
        let at = search + offset;
        if is_opener_at(content, at, kind) {
            return Some(at);
        }
        search = at + 1;
    }
    None
}

fn is_opener_at(content: &str, at: usize, kind: DirectiveKind) -> bool {
    let Some(rest) = content[at..].strip_prefix(kind.opener()) else {
        return false;
    };
    match kind {
        DirectiveKind::If => rest.trim_start().starts_with('('),
        DirectiveKind::Loop => rest.starts_with(char::is_whitespace),
    }
}

/// Start of the matching closer and the index just past it
fn find_block_end(content: &str, start: usize, kind: DirectiveKind) -> Option<(usize, usize)> {
    let closer = kind.closer();
    let mut depth = 1usize;
    let mut pos = start + kind.opener().len();

    while let Some(offset) = content[pos..].find('{') {
        let at = pos + offset;
        if is_opener_at(content, at, kind) {
            depth += 1;
            pos = at + kind.opener().len();
        } else if content[at..].starts_with(closer) {
            depth -= 1;
            if depth == 0 {
                return Some((at, at + closer.len()));
            }
            pos = at + closer.len();
        } else {
            pos = at + 1;
        }
    }

    debug!(directive = kind.keyword(), position = start, "No matching closer");
    None
}

/// Parse `(<expr>)}` after a directive keyword; parentheses inside string
/// literals are ignored. Returns the trimmed expression and the index after `}`.
fn parse_condition_header(content: &str, from: usize) -> Option<(String, usize)> {
    let bytes = content.as_bytes();
    let mut i = from;
    while i < bytes.len() && bytes[i].is_ascii_whitespace() {
        i += 1;
    }
    if bytes.get(i) != Some(&b'(') {
        return None;
    }

    let expr_start = i + 1;
    let mut depth = 0usize;
    let mut quote: Option<u8> = None;
    let mut expr_end = None;

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
                b'"' | b'\'' => quote = Some(b),
                b'(' => depth += 1,
                b')' => {
                    depth -= 1;
                    if depth == 0 {
                        expr_end = Some(i);
                        break;
                    }
                }
                _ => {}
            },
        }
        i += 1;
    }

    let expr_end = expr_end?;
    let mut j = expr_end + 1;
    while j < bytes.len() && bytes[j].is_ascii_whitespace() {
        j += 1;
    }
    if bytes.get(j) != Some(&b'}') {
        return None;
    }

    let condition = content[expr_start..expr_end].trim();
    if condition.is_empty() {
        return None;
    }
    Some((condition.to_string(), j + 1))
}

fn first_line(text: &str) -> String {
    text.lines().next().unwrap_or_default().chars().take(80).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(source: &str) -> (String, Vec<ConditionGroup>, Vec<LoopDefinition>, Vec<CompileWarning>) {
        let mut ids = IDGenerator::from_seed("t");
        let mut compiler = DirectiveCompiler::new(&mut ids);
        let html = compiler.process(source);
        (html, compiler.conditions, compiler.loops, compiler.warnings)
    }

    #[test]
    fn test_if_elseif_else_chain() {
        let (html, conditions, _, warnings) = run("{@if(n>0)}pos{@elseif(n<0)}neg{@else}zero{/if}");
        assert_eq!(html, "<!-- if:t_if_0 -->");
        assert!(warnings.is_empty());

        let blocks = &conditions[0].blocks;
        assert_eq!(blocks.len(), 3);
        assert_eq!(blocks[0], Block::new(BlockKind::If, Some("n>0".to_string()), "pos"));
        assert_eq!(blocks[1], Block::new(BlockKind::Elseif, Some("n<0".to_string()), "neg"));
        assert_eq!(blocks[2], Block::new(BlockKind::Else, None, "zero"));
    }

    #[test]
    fn test_nested_if_is_compiled_first() {
        let (html, conditions, _, _) = run("<div>{@if(a)}A{@if(b)}B{/if}{@else}C{/if}</div>");
        assert_eq!(html, "<div><!-- if:t_if_0 --></div>");
        assert_eq!(conditions.len(), 2);

        // Names are assigned at the opener, records are pushed innermost first
        assert_eq!(conditions[0].group_name, "t_if_1");
        assert_eq!(conditions[0].blocks[0].content, "B");
        assert_eq!(conditions[1].group_name, "t_if_0");
        assert_eq!(conditions[1].blocks[0].content, "A<!-- if:t_if_1 -->");
        assert_eq!(conditions[1].blocks[1], Block::new(BlockKind::Else, None, "C"));
    }

    #[test]
    fn test_loop_header_and_body() {
        let (html, _, loops, _) = run("<ul>{@loop user.items as item}<li>{item.name}</li>{/loop}</ul>");
        assert_eq!(html, "<ul><!-- loop:t_loop_0 --></ul>");
        assert_eq!(
            loops[0],
            LoopDefinition {
                name: "t_loop_0".to_string(),
                array_expr: "user.items".to_string(),
                item_name: "item".to_string(),
                content: r#"<li pado-text="{item.name}"></li>"#.to_string(),
            }
        );
    }

    #[test]
    fn test_if_inside_loop_and_loop_inside_if() {
        let source = "{@loop rows as row}{@if(row.ok)}ok{/if}{/loop}{@if(show)}{@loop xs as x}{x}{/loop}{/if}";
        let (html, conditions, loops, _) = run(source);
        assert_eq!(html, "<!-- loop:t_loop_0 --><!-- if:t_if_1 -->");
        assert_eq!(loops[0].content, "<!-- if:t_if_0 -->");
        assert_eq!(conditions[0].blocks[0].condition.as_deref(), Some("row.ok"));
        assert_eq!(conditions[1].blocks[0].content, "<!-- loop:t_loop_1 -->");
        assert_eq!(loops[1].content, r#"<span pado-text="{x}"></span>"#);
    }

    #[test]
    fn test_condition_with_parens_and_strings() {
        let (_, conditions, _, _) = run("{@if ((a + 1) * 2 > 3 && s != ')')}x{/if}");
        assert_eq!(conditions[0].blocks[0].condition.as_deref(), Some("(a + 1) * 2 > 3 && s != ')'"));
    }

    #[test]
    fn test_unmatched_opener_left_unprocessed() {
        let (html, conditions, _, warnings) = run("<p>{@if(a)}never closed</p>{@if(b)}ok{/if}");
        assert_eq!(html, "<p>{@if(a)}never closed</p><!-- if:t_if_0 -->");
        assert_eq!(conditions.len(), 1);
        assert_eq!(conditions[0].blocks[0].condition.as_deref(), Some("b"));
        assert_eq!(warnings, vec![CompileWarning::unmatched("if", 3)]);
    }

    #[test]
    fn test_malformed_loop_header_left_unprocessed() {
        let (html, _, loops, warnings) = run("{@loop items}x{/loop}");
        assert_eq!(html, "{@loop items}x{/loop}");
        assert!(loops.is_empty());
        assert!(matches!(warnings[0], CompileWarning::MalformedHeader { .. }));
    }

    #[test]
    fn test_stray_branches_are_ignored() {
        let (html, conditions, _, _) = run("before{@else}after{/if}");
        assert_eq!(html, "before{@else}after{/if}");
        assert!(conditions.is_empty());
    }

    #[test]
    fn test_branch_after_else_stays_in_else_content() {
        let (_, conditions, _, warnings) = run("{@if(a)}1{@else}2{@elseif(b)}3{/if}");
        let blocks = &conditions[0].blocks;
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[1].content, "2{@elseif(b)}3");
        assert!(matches!(warnings[0], CompileWarning::BranchAfterElse { .. }));
    }

    #[test]
    fn test_sibling_directives_numbered_in_source_order() {
        let (html, _, _, _) = run("{@if(a)}a{/if}{@loop xs as x}x{/loop}{@if(b)}b{/if}");
        assert_eq!(html, "<!-- if:t_if_0 --><!-- loop:t_loop_0 --><!-- if:t_if_1 -->");
    }
}
