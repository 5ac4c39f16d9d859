//! # Update engine
//!
//! One render pass walks a scope in four steps: conditions, loops, text
//! bindings, attribute bindings. Each step only touches what depends on an
//! updated key. Content inserted for a condition branch or a loop item gets
//! its own full pass before it is attached, so it never shows a raw binding.

use crate::bindings::{render_attribute_bindings, render_text_bindings};
use crate::handlers::rewrite_handlers;
use crate::records::Records;
use crate::updated::Updated;
use pado_compiler::{BlockKind, CompiledTemplate, Marker};
use pado_dom::DomTree;
use pado_expression::{EvalContext, EvalOptions, Evaluator, Value};
use tracing::{debug, instrument, warn};

#[derive(Debug, Clone, Default)]
pub struct EngineOptions {
    /// Rewrite `name[i]` into temporaries before evaluating
    pub rewrite_indices: bool,
}

/// Counts for one render pass
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RenderStats {
    pub conditions: usize,
    pub loops: usize,
    pub text_bindings: usize,
    pub attribute_bindings: usize,
}

pub struct Engine {
    records: Records,
    evaluator: Evaluator,
    rewrite_fragment_handlers: bool,
}

impl Engine {
    pub fn new(template: &CompiledTemplate) -> Self {
        Self::with_options(template, EngineOptions::default())
    }

    pub fn with_options(template: &CompiledTemplate, options: EngineOptions) -> Self {
        Self {
            records: Records::from_template(template),
            evaluator: Evaluator::with_options(EvalOptions {
                rewrite_indices: options.rewrite_indices,
            }),
            rewrite_fragment_handlers: false,
        }
    }

    pub fn evaluator(&self) -> &Evaluator {
        &self.evaluator
    }

    pub fn records(&self) -> &Records {
        &self.records
    }

    /// Apply the handler attribute rewrite to every fragment created from now on
    pub fn set_rewrite_handlers(&mut self, enabled: bool) {
        self.rewrite_fragment_handlers = enabled;
    }

    #[instrument(skip_all)]
    pub fn render<T: DomTree>(&mut self, tree: &mut T, ctx: &EvalContext<'_>, updated: &Updated) -> RenderStats {
        let root = tree.root();
        let stats = self.render_scope(tree, root, ctx, updated);
        debug!(?stats, "Render pass complete");
        stats
    }

    /// Run the four steps over everything under `scope`
    pub fn render_scope<T: DomTree>(
        &mut self,
        tree: &mut T,
        scope: T::Node,
        ctx: &EvalContext<'_>,
        updated: &Updated,
    ) -> RenderStats {
        if updated.is_empty() {
            return RenderStats::default();
        }

        RenderStats {
            conditions: self.render_conditions(tree, scope, ctx, updated),
            loops: self.render_loops(tree, scope, ctx, updated),
            text_bindings: render_text_bindings(tree, scope, ctx, updated, &self.evaluator),
            attribute_bindings: render_attribute_bindings(tree, scope, ctx, updated, &self.evaluator),
        }
    }

    fn render_conditions<T: DomTree>(
        &mut self,
        tree: &mut T,
        scope: T::Node,
        ctx: &EvalContext<'_>,
        updated: &Updated,
    ) -> usize {
        let mut rendered = 0;

        for (marker_node, text) in tree.comments(scope) {
            let Some(Marker::Condition(name)) = Marker::parse(&text) else {
                continue;
            };
            // Removed by an enclosing condition earlier in this pass
            if !tree.is_descendant(scope, marker_node) {
                continue;
            }
            let Some(entry) = self.records.condition(&name) else {
                warn!(group = %name, "No condition group for marker");
                continue;
            };
            if !updated.intersects(&entry.vars) {
                continue;
            }

            let chosen = entry.group.blocks.iter().find(|block| match block.kind {
                BlockKind::Else => true,
                BlockKind::If | BlockKind::Elseif => block
                    .condition
                    .as_deref()
                    .is_some_and(|condition| self.evaluator.evaluate(condition, ctx).is_truthy()),
            });

            tree.clear_owned(marker_node);
            if let Some(block) = chosen {
                debug!(group = %name, kind = ?block.kind, "Rendering branch");
                if !block.content.trim().is_empty() {
                    let fragment = self.instantiate(tree, &block.content, ctx);
                    tree.insert_after(marker_node, fragment);
                }
            } else {
                debug!(group = %name, "No branch matched");
            }
            rendered += 1;
        }

        rendered
    }

    fn render_loops<T: DomTree>(
        &mut self,
        tree: &mut T,
        scope: T::Node,
        ctx: &EvalContext<'_>,
        updated: &Updated,
    ) -> usize {
        let mut rendered = 0;

        for (marker_node, text) in tree.comments(scope) {
            let Some(Marker::Loop(name)) = Marker::parse(&text) else {
                continue;
            };
            if !tree.is_descendant(scope, marker_node) {
                continue;
            }
            let Some(entry) = self.records.loop_entry(&name) else {
                warn!(name = %name, "No loop definition for marker");
                continue;
            };
            if !updated.intersects(&entry.vars) {
                continue;
            }

            let def = &entry.def;
            let items = match self.evaluator.evaluate(&def.array_expr, ctx) {
                Value::Array(items) => items,
                other => {
                    warn!(name = %name, array = %def.array_expr, found = other.type_name(), "Loop source is not an array");
                    continue;
                }
            };

            tree.clear_owned(marker_node);
            let accumulated = tree.create_fragment("");
            let instance_key = format!("{}[", def.array_expr.trim());

            for (index, item) in items.into_iter().enumerate() {
                let markup = self.records.item_markup(&name, def, index);
                let mut item_ctx = EvalContext::child(ctx);
                item_ctx.set_variable("index", Value::from(index));
                item_ctx.set_variable(format!("{}{}]", instance_key, index), item.clone());
                item_ctx.set_variable(def.item_name.clone(), item);

                let fragment = self.instantiate(tree, &markup, &item_ctx);
                tree.append_fragment(accumulated, fragment);
            }

            let inserted = tree.insert_after(marker_node, accumulated);
            debug!(name = %name, inserted, "Rendered loop");
            rendered += 1;
        }

        rendered
    }

    /// Parse `html` into a detached fragment and give it a full pass
    fn instantiate<T: DomTree>(&mut self, tree: &mut T, html: &str, ctx: &EvalContext<'_>) -> T::Node {
        let fragment = tree.create_fragment(html);
        if self.rewrite_fragment_handlers {
            rewrite_handlers(tree, fragment);
        }
        self.render_scope(tree, fragment, ctx, &Updated::All);
        fragment
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pado_compiler::compile_template;
    use pado_dom::Document;

    fn setup(source: &str) -> (Engine, Document) {
        let template = compile_template(source);
        (Engine::new(&template), Document::parse(&template.html))
    }

    fn state(pairs: &[(&str, Value)]) -> EvalContext<'static> {
        pairs.iter().map(|(name, value)| (*name, value.clone())).collect()
    }

    #[test]
    fn test_condition_chain_picks_first_truthy_branch() {
        let (mut engine, mut doc) =
            setup("<div>{@if(n > 0)}<b>pos</b>{@elseif(n < 0)}<b>neg</b>{@else}<b>zero</b>{/if}</div>");

        engine.render(&mut doc, &state(&[("n", Value::Number(-5.0))]), &Updated::All);
        assert_eq!(doc.to_html(), "<div><!-- if:page_if_0 --><b>neg</b></div>");

        engine.render(&mut doc, &state(&[("n", Value::Number(0.0))]), &Updated::keys(["n"]));
        assert_eq!(doc.to_html(), "<div><!-- if:page_if_0 --><b>zero</b></div>");
    }

    #[test]
    fn test_condition_without_match_clears_content() {
        let (mut engine, mut doc) = setup("<p>{@if(show)}<i>on</i>{/if}tail</p>");

        engine.render(&mut doc, &state(&[("show", Value::Boolean(true))]), &Updated::All);
        assert_eq!(doc.to_html(), "<p><!-- if:page_if_0 --><i>on</i>tail</p>");

        engine.render(&mut doc, &state(&[("show", Value::Boolean(false))]), &Updated::keys(["show"]));
        assert_eq!(doc.to_html(), "<p><!-- if:page_if_0 -->tail</p>");
    }

    #[test]
    fn test_unrelated_update_leaves_condition_alone() {
        let (mut engine, mut doc) = setup("{@if(a)}<i>{b}</i>{/if}");
        engine.render(&mut doc, &state(&[("a", Value::Boolean(true)), ("b", Value::from("x"))]), &Updated::All);

        let stats = engine.render(&mut doc, &state(&[("a", Value::Boolean(false))]), &Updated::keys(["c"]));
        assert_eq!(stats, RenderStats::default());
        assert_eq!(doc.to_html(), r#"<!-- if:page_if_0 --><i pado-text="{b}">x</i>"#);
    }

    #[test]
    fn test_loop_renders_items_in_order() {
        let (mut engine, mut doc) = setup("<ul>{@loop items as item}<li>{item}</li>{/loop}</ul>");
        let items = Value::from(vec!["a", "b"]);

        engine.render(&mut doc, &state(&[("items", items)]), &Updated::All);
        assert_eq!(
            doc.to_html(),
            r#"<ul><!-- loop:page_loop_0 --><li pado-text="{items[0]}">a</li><li pado-text="{items[1]}">b</li></ul>"#
        );

        engine.render(&mut doc, &state(&[("items", Value::from(vec!["c"]))]), &Updated::keys(["items"]));
        assert_eq!(doc.to_html(), r#"<ul><!-- loop:page_loop_0 --><li pado-text="{items[0]}">c</li></ul>"#);
    }

    #[test]
    fn test_loop_over_non_array_is_skipped() {
        let (mut engine, mut doc) = setup("<ul>{@loop items as item}<li>{item}</li>{/loop}</ul>");
        engine.render(&mut doc, &state(&[("items", Value::from(vec![1, 2]))]), &Updated::All);

        let stats = engine.render(&mut doc, &state(&[("items", Value::Number(3.0))]), &Updated::keys(["items"]));
        assert_eq!(stats.loops, 0);
        assert_eq!(doc.elements_with_attribute(doc.root(), "pado-text").len(), 2);
    }

    #[test]
    fn test_loop_items_see_index() {
        let (mut engine, mut doc) = setup("{@loop xs as x}<i>{index}:{x}</i>{/loop}");
        engine.render(&mut doc, &state(&[("xs", Value::from(vec!["p", "q"]))]), &Updated::All);
        assert_eq!(
            doc.to_html(),
            r#"<!-- loop:page_loop_0 --><i pado-text="{0}:{xs[0]}">0:p</i><i pado-text="{1}:{xs[1]}">1:q</i>"#
        );
    }

    #[test]
    fn test_nested_condition_in_loop_updates_per_item() {
        let (mut engine, mut doc) = setup("{@loop todos as todo}{@if(todo.done)}<s>done</s>{@else}<span>open</span>{/if}{/loop}");
        let todos = |first: bool| {
            let item = |done: bool| {
                Value::Object([("done".to_string(), Value::Boolean(done))].into_iter().collect())
            };
            Value::Array(vec![item(first), item(false)])
        };

        engine.render(&mut doc, &state(&[("todos", todos(true))]), &Updated::All);
        assert_eq!(
            doc.to_html(),
            "<!-- loop:page_loop_0 -->\
             <!-- if:page_if_0@page_loop_0[0] --><s>done</s>\
             <!-- if:page_if_0@page_loop_0[1] --><span>open</span>"
        );

        engine.render(&mut doc, &state(&[("todos", todos(false))]), &Updated::keys(["todos"]));
        assert_eq!(
            doc.to_html(),
            "<!-- loop:page_loop_0 -->\
             <!-- if:page_if_0@page_loop_0[0] --><span>open</span>\
             <!-- if:page_if_0@page_loop_0[1] --><span>open</span>"
        );
    }
}
