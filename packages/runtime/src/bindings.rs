use crate::updated::Updated;
use pado_dom::{DomTree, ElementKind};
use pado_expression::{expression_vars, replace_template_tokens, template_expressions, EvalContext, Evaluator, Value};
use tracing::{debug, trace};

const TEXT_ATTRIBUTE: &str = "pado-text";
const BINDING_PREFIX: &str = "pado-";

/// `pado-*` names that are not attribute bindings
const NON_BINDINGS: &[&str] = &["text", "init", "if", "elseif", "else"];

const BOOLEAN_ATTRIBUTES: &[&str] = &["checked", "disabled", "readonly"];

/// Re-render `pado-text` templates that reference an updated key.
///
/// An element whose tokens all miss the update is left untouched. Otherwise
/// every token is evaluated and the result replaces the element's content.
pub fn render_text_bindings<T: DomTree>(
    tree: &mut T,
    scope: T::Node,
    ctx: &EvalContext<'_>,
    updated: &Updated,
    evaluator: &Evaluator,
) -> usize {
    let mut rendered = 0;

    for element in tree.elements(scope) {
        let Some(template) = tree.get_attribute(element, TEXT_ATTRIBUTE) else {
            continue;
        };
        let hit = template_expressions(&template)
            .into_iter()
            .any(|expr| updated.intersects(&expression_vars(expr)));
        if !hit {
            continue;
        }

        let text = replace_template_tokens(&template, |expr| match evaluator.evaluate(expr, ctx) {
            Value::Undefined => String::new(),
            value => value.to_string(),
        });
        trace!(template = %template, text = %text, "Text binding");
        tree.set_inner_html(element, &text);
        rendered += 1;
    }

    rendered
}

/// Re-evaluate `pado-<attr>` bindings that reference an updated key
pub fn render_attribute_bindings<T: DomTree>(
    tree: &mut T,
    scope: T::Node,
    ctx: &EvalContext<'_>,
    updated: &Updated,
    evaluator: &Evaluator,
) -> usize {
    let mut rendered = 0;

    for element in tree.elements(scope) {
        for (name, expression) in tree.attributes(element) {
            let Some(target) = name.strip_prefix(BINDING_PREFIX) else {
                continue;
            };
            if target.is_empty() || NON_BINDINGS.contains(&target) {
                continue;
            }
            if !updated.intersects(&expression_vars(&expression)) {
                continue;
            }

            let value = evaluator.evaluate(&expression, ctx);
            if value.is_undefined() {
                debug!(attribute = %target, expression = %expression, "Binding is undefined, skipping");
                continue;
            }
            apply_attribute(tree, element, target, &value);
            rendered += 1;
        }
    }

    rendered
}

fn apply_attribute<T: DomTree>(tree: &mut T, element: T::Node, target: &str, value: &Value) {
    let kind = tree.element_kind(element).unwrap_or(ElementKind::Other);

    if BOOLEAN_ATTRIBUTES.contains(&target) {
        let on = value.is_truthy();
        if on {
            tree.set_attribute(element, target, "");
        } else {
            tree.remove_attribute(element, target);
        }
        if kind.supports_boolean_property(target) {
            tree.set_boolean_property(element, target, on);
        }
        return;
    }

    if target == "value" && kind.supports_value_property() {
        tree.set_value_property(element, &value.to_string());
        return;
    }

    tree.set_attribute(element, target, &value.to_string());
}

#[cfg(test)]
mod tests {
    use super::*;
    use pado_dom::Document;

    fn ctx(pairs: &[(&str, Value)]) -> EvalContext<'static> {
        pairs.iter().map(|(name, value)| (*name, value.clone())).collect()
    }

    #[test]
    fn test_text_binding_renders_all_tokens() {
        let mut doc = Document::parse(r#"<p pado-text="{a} and {b}"></p>"#);
        let root = doc.root();
        let state = ctx(&[("a", Value::from(1)), ("b", Value::from("two"))]);

        assert_eq!(render_text_bindings(&mut doc, root, &state, &Updated::keys(["b"]), &Evaluator::new()), 1);
        assert_eq!(doc.to_html(), r#"<p pado-text="{a} and {b}">1 and two</p>"#);
    }

    #[test]
    fn test_text_binding_untouched_without_overlap() {
        let mut doc = Document::parse(r#"<p pado-text="{a}">old</p>"#);
        let root = doc.root();
        let state = ctx(&[("a", Value::from(1))]);

        assert_eq!(render_text_bindings(&mut doc, root, &state, &Updated::keys(["z"]), &Evaluator::new()), 0);
        assert_eq!(doc.to_html(), r#"<p pado-text="{a}">old</p>"#);
    }

    #[test]
    fn test_undefined_renders_empty() {
        let mut doc = Document::parse(r#"<p pado-text="[{missing}]"></p>"#);
        let root = doc.root();
        render_text_bindings(&mut doc, root, &ctx(&[]), &Updated::All, &Evaluator::new());
        assert_eq!(doc.to_html(), r#"<p pado-text="[{missing}]">[]</p>"#);
    }

    #[test]
    fn test_checked_toggles_property_and_attribute() {
        let mut doc = Document::parse(r#"<input type="checkbox" pado-checked="done">"#);
        let root = doc.root();
        let input = doc.find_by_tag(root, "input").unwrap();

        render_attribute_bindings(&mut doc, root, &ctx(&[("done", Value::Boolean(true))]), &Updated::All, &Evaluator::new());
        let element = doc.element(input).unwrap();
        assert!(element.has_attribute("checked"));
        assert_eq!(element.properties.flags.get("checked"), Some(&true));

        render_attribute_bindings(&mut doc, root, &ctx(&[("done", Value::Boolean(false))]), &Updated::All, &Evaluator::new());
        let element = doc.element(input).unwrap();
        assert!(!element.has_attribute("checked"));
        assert_eq!(element.properties.flags.get("checked"), Some(&false));
    }

    #[test]
    fn test_disabled_on_div_sets_attribute_only() {
        let mut doc = Document::parse(r#"<div pado-disabled="busy"></div>"#);
        let root = doc.root();
        let div = doc.find_by_tag(root, "div").unwrap();

        render_attribute_bindings(&mut doc, root, &ctx(&[("busy", Value::Boolean(true))]), &Updated::All, &Evaluator::new());
        let element = doc.element(div).unwrap();
        assert!(element.has_attribute("disabled"));
        assert!(element.properties.flags.is_empty());
    }

    #[test]
    fn test_value_and_generic_attributes() {
        let mut doc = Document::parse(r#"<input pado-value="name"><a pado-href="'/u/' + id"></a>"#);
        let root = doc.root();
        let state = ctx(&[("name", Value::from("Ann")), ("id", Value::from(7))]);

        assert_eq!(render_attribute_bindings(&mut doc, root, &state, &Updated::All, &Evaluator::new()), 2);
        let input = doc.find_by_tag(root, "input").unwrap();
        assert_eq!(doc.element(input).unwrap().properties.value.as_deref(), Some("Ann"));
        assert!(doc.to_html().contains(r#"<a pado-href="'/u/' + id" href="/u/7"></a>"#));
    }

    #[test]
    fn test_undefined_binding_is_skipped() {
        let mut doc = Document::parse(r#"<a pado-title="nope"></a>"#);
        let root = doc.root();
        assert_eq!(render_attribute_bindings(&mut doc, root, &ctx(&[]), &Updated::All, &Evaluator::new()), 0);
        assert_eq!(doc.to_html(), r#"<a pado-title="nope"></a>"#);
    }
}
