use crate::artifact::CompiledTemplate;
use crate::directives::DirectiveCompiler;
use crate::error::CompileWarning;
use crate::id_generator::IDGenerator;
use crate::style::{rewrite_scoped_classes, scope_id};
use crate::transform::transform_content;
use crate::validate::validate_template;
use tracing::{debug, instrument, warn};

/// Options for template compilation
#[derive(Debug, Clone)]
pub struct CompileOptions {
    /// Template path; seeds group/loop names and the style scope id
    pub path: Option<String>,
    /// Rewrite `pado-class="styles.x"` into scoped class names
    pub style_scope: bool,
    /// Parse every expression and report failures as warnings
    pub validate_expressions: bool,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            path: None,
            style_scope: true,
            validate_expressions: false,
        }
    }
}

impl CompileOptions {
    pub fn with_path(path: impl Into<String>) -> Self {
        Self {
            path: Some(path.into()),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone)]
pub struct CompileOutput {
    pub template: CompiledTemplate,
    pub warnings: Vec<CompileWarning>,
}

/// Compile template source into its skeleton and side tables.
///
/// Never fails: structural problems are reported in `warnings` and the
/// offending text is kept as-is.
#[instrument(skip(source, options), fields(path = options.path.as_deref().unwrap_or("<anonymous>")))]
pub fn compile(source: &str, options: &CompileOptions) -> CompileOutput {
    let mut ids = match &options.path {
        Some(path) => IDGenerator::new(path),
        None => IDGenerator::from_seed("page"),
    };

    let mut directives = DirectiveCompiler::new(&mut ids);
    let skeleton = directives.process(source);
    let mut warnings = std::mem::take(&mut directives.warnings);

    let mut template = CompiledTemplate {
        html: transform_content(&skeleton),
        conditions: std::mem::take(&mut directives.conditions),
        loops: std::mem::take(&mut directives.loops),
        styles: None,
    };

    if let (true, Some(path)) = (options.style_scope, &options.path) {
        apply_style_scope(&mut template, &scope_id(path));
    }

    if options.validate_expressions {
        for warning in validate_template(&template) {
            warn!(%warning, "Invalid expression");
            warnings.push(warning);
        }
    }

    debug!(
        conditions = template.conditions.len(),
        loops = template.loops.len(),
        warnings = warnings.len(),
        "Compiled template"
    );

    CompileOutput { template, warnings }
}

/// Compile with default options and no path
pub fn compile_template(source: &str) -> CompiledTemplate {
    compile(source, &CompileOptions::default()).template
}

fn apply_style_scope(template: &mut CompiledTemplate, scope: &str) {
    template.html = rewrite_scoped_classes(&template.html, scope);
    for group in &mut template.conditions {
        for block in &mut group.blocks {
            block.content = rewrite_scoped_classes(&block.content, scope);
        }
    }
    for def in &mut template.loops {
        def.content = rewrite_scoped_classes(&def.content, scope);
    }
}
