//! Condition and loop records, including the ones derived for loop items.
//!
//! A directive nested in a loop body exists once in the compiled template but
//! once per item in the document. Instantiating item `i` of loop instance `L`
//! renames every nested marker `X` to `X@L[i]` and registers a copy of `X`'s
//! record with the item placeholder replaced by `array[i]`. Later partial
//! updates then resolve those markers against the outer state alone.

use pado_compiler::{Block, CompiledTemplate, ConditionGroup, LoopDefinition, Marker};
use pado_dom::{Document, DomTree};
use pado_expression::{substitute_identifier, substitute_in_template};
use std::collections::HashMap;
use std::rc::Rc;
use tracing::{trace, warn};

use crate::handlers::is_event_attribute;

#[derive(Debug)]
pub struct ConditionEntry {
    pub group: ConditionGroup,
    pub vars: Vec<String>,
}

#[derive(Debug)]
pub struct LoopEntry {
    pub def: LoopDefinition,
    pub vars: Vec<String>,
}

/// Placeholder substitution for one loop item
#[derive(Debug, Clone)]
struct ItemScope {
    /// `None` once an inner loop shadows the item name
    item: Option<String>,
    replacement: String,
    /// Literal for `index`; `None` inside nested loop bodies, which bind their own
    index: Option<usize>,
    instance: String,
}

impl ItemScope {
    fn expression(&self, source: &str) -> String {
        let mut out = match &self.item {
            Some(item) => substitute_identifier(source, item, &self.replacement),
            None => source.to_string(),
        };
        if let Some(index) = self.literal_index() {
            out = substitute_identifier(&out, "index", &index);
        }
        out
    }

    fn template(&self, source: &str) -> String {
        let mut out = match &self.item {
            Some(item) => substitute_in_template(source, item, &self.replacement),
            None => source.to_string(),
        };
        if let Some(index) = self.literal_index() {
            out = substitute_in_template(&out, "index", &index);
        }
        out
    }

    fn literal_index(&self) -> Option<String> {
        match (&self.item, self.index) {
            (Some(item), Some(_)) if item == "index" => None,
            (_, index) => index.map(|i| i.to_string()),
        }
    }

    /// Scope for the body of a nested loop binding `inner_item`
    fn nested(&self, inner_item: &str) -> Option<ItemScope> {
        let item = self.item.clone().filter(|item| item != inner_item)?;
        Some(ItemScope {
            item: Some(item),
            replacement: self.replacement.clone(),
            index: None,
            instance: self.instance.clone(),
        })
    }
}

#[derive(Debug, Default)]
pub struct Records {
    conditions: HashMap<String, Rc<ConditionEntry>>,
    loops: HashMap<String, Rc<LoopEntry>>,
    item_markup: HashMap<String, String>,
}

impl Records {
    pub fn from_template(template: &CompiledTemplate) -> Self {
        let mut records = Records::default();
        for group in &template.conditions {
            records.insert_condition(group.clone());
        }
        for def in &template.loops {
            records.insert_loop(def.clone());
        }
        records
    }

    pub fn condition(&self, name: &str) -> Option<Rc<ConditionEntry>> {
        self.conditions.get(name).cloned()
    }

    pub fn loop_entry(&self, name: &str) -> Option<Rc<LoopEntry>> {
        self.loops.get(name).cloned()
    }

    pub fn insert_condition(&mut self, group: ConditionGroup) {
        let vars = group.vars();
        self.conditions
            .insert(group.group_name.clone(), Rc::new(ConditionEntry { group, vars }));
    }

    pub fn insert_loop(&mut self, def: LoopDefinition) {
        let vars = pado_expression::expression_vars(&def.array_expr);
        self.loops.insert(def.name.clone(), Rc::new(LoopEntry { def, vars }));
    }

    pub fn condition_count(&self) -> usize {
        self.conditions.len()
    }

    pub fn loop_count(&self) -> usize {
        self.loops.len()
    }

    /// Body markup of item `index` for the loop whose marker is named `marker_name`
    pub fn item_markup(&mut self, marker_name: &str, def: &LoopDefinition, index: usize) -> String {
        let instance = format!("{}[{}]", marker_name, index);
        if let Some(markup) = self.item_markup.get(&instance) {
            return markup.clone();
        }

        let scope = ItemScope {
            item: Some(def.item_name.clone()),
            replacement: indexed_access(&def.array_expr, index),
            index: Some(index),
            instance: instance.clone(),
        };
        let markup = self.derive_markup(&def.content, &scope);
        self.item_markup.insert(instance, markup.clone());
        markup
    }

    fn derive_markup(&mut self, html: &str, scope: &ItemScope) -> String {
        let mut doc = Document::parse(html);
        let root = doc.root();

        for element in DomTree::elements(&doc, root) {
            for (name, value) in doc.attributes(element) {
                let rewritten = if name == "pado-text" || is_event_attribute(&name) {
                    scope.template(&value)
                } else if name.starts_with("pado-") && name != "pado-init" {
                    scope.expression(&value)
                } else {
                    continue;
                };
                if rewritten != value {
                    DomTree::set_attribute(&mut doc, element, &name, &rewritten);
                }
            }
        }

        for (node, text) in DomTree::comments(&doc, root) {
            let Some(marker) = Marker::parse(&text) else {
                continue;
            };
            let derived = self.derive_record(&marker, scope);
            DomTree::set_comment(&mut doc, node, &format!(" {} ", marker.renamed(derived)));
        }

        doc.to_html()
    }

    /// Register the per-item copy of `marker`'s record and return its name
    fn derive_record(&mut self, marker: &Marker, scope: &ItemScope) -> String {
        let name = format!("{}@{}", marker.name(), scope.instance);

        match marker {
            Marker::Condition(base) => {
                if self.conditions.contains_key(&name) {
                    return name;
                }
                let Some(entry) = self.condition(base) else {
                    warn!(group = %base, "Nested marker has no condition record");
                    return base.clone();
                };
                let mut blocks = Vec::with_capacity(entry.group.blocks.len());
                for block in &entry.group.blocks {
                    blocks.push(Block {
                        kind: block.kind,
                        condition: block.condition.as_deref().map(|c| scope.expression(c)),
                        content: self.derive_markup(&block.content, scope),
                    });
                }
                self.insert_condition(ConditionGroup {
                    group_name: name.clone(),
                    blocks,
                });
            }
            Marker::Loop(base) => {
                if self.loops.contains_key(&name) {
                    return name;
                }
                let Some(entry) = self.loop_entry(base) else {
                    warn!(name = %base, "Nested marker has no loop record");
                    return base.clone();
                };
                let def = &entry.def;
                let content = match scope.nested(&def.item_name) {
                    Some(inner) => self.derive_markup(&def.content, &inner),
                    None => def.content.clone(),
                };
                self.insert_loop(LoopDefinition {
                    name: name.clone(),
                    array_expr: scope.expression(&def.array_expr),
                    item_name: def.item_name.clone(),
                    content,
                });
            }
        }

        trace!(%name, "Derived record");
        name
    }
}

/// `items` -> `items[2]`; anything but a plain path is parenthesized first
fn indexed_access(array_expr: &str, index: usize) -> String {
    let expr = array_expr.trim();
    let simple = expr
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '$' | '.' | '[' | ']'));
    if simple {
        format!("{}[{}]", expr, index)
    } else {
        format!("({})[{}]", expr, index)
    }
}
