use crate::artifact::CompiledTemplate;
use crate::error::CompileWarning;
use pado_expression::{parse, template_expressions};
use regex::Regex;
use std::sync::LazyLock;

static BINDING_ATTRIBUTE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#"\bpado-([a-zA-Z][\w-]*)="([^"]*)""#).unwrap());

/// Parse every expression in `template`, reporting the ones that fail
pub fn validate_template(template: &CompiledTemplate) -> Vec<CompileWarning> {
    let mut warnings = Vec::new();

    check_markup(&template.html, "template", &mut warnings);

    for group in &template.conditions {
        for block in &group.blocks {
            if let Some(condition) = &block.condition {
                check(condition, &format!("condition {}", group.group_name), &mut warnings);
            }
            check_markup(&block.content, &group.group_name, &mut warnings);
        }
    }

    for def in &template.loops {
        check(&def.array_expr, &format!("loop {}", def.name), &mut warnings);
        check_markup(&def.content, &def.name, &mut warnings);
    }

    warnings
}

fn check_markup(markup: &str, location: &str, warnings: &mut Vec<CompileWarning>) {
    for caps in BINDING_ATTRIBUTE.captures_iter(markup) {
        let (Some(name), Some(value)) = (caps.get(1), caps.get(2)) else {
            continue;
        };
        let value = value.as_str().replace("&quot;", "\"").replace("&amp;", "&");
        let location = format!("{} (pado-{})", location, name.as_str());

        match name.as_str() {
            "init" => {}
            "text" => {
                let text = value.replace("&lt;", "<").replace("&gt;", ">").replace("&#39;", "'");
                for expr in template_expressions(&text) {
                    check(expr, &location, warnings);
                }
            }
            _ => check(&value, &location, warnings),
        }
    }
}

fn check(expression: &str, location: &str, warnings: &mut Vec<CompileWarning>) {
    if let Err(error) = parse(expression.trim()) {
        warnings.push(CompileWarning::invalid_expression(expression, location, error));
    }
}
