use super::compile::template_key;
use crate::config::Config;
use crate::loader::FsModuleLoader;
use anyhow::{bail, Context, Result};
use clap::Args;
use colored::Colorize;
use pado_compiler::{compile as compile_source, CompileOptions, CompiledTemplate};
use pado_dom::Document;
use pado_expression::Value;
use pado_runtime::{snapshot_from_json, EngineOptions, Pado};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Debug, Args)]
pub struct RenderArgs {
    /// Template to render: a .pado source or a compiled .json artifact
    pub template: String,

    /// JSON file holding the initial state object
    #[arg(long)]
    pub vars: Option<String>,
}

pub async fn render(args: RenderArgs, cwd: &str) -> Result<()> {
    let config = Config::load(cwd)?;
    let path = PathBuf::from(cwd).join(&args.template);
    let template = load_template(&path, &config, cwd)?;

    let snapshot = match &args.vars {
        Some(vars) => read_snapshot(&PathBuf::from(cwd).join(vars))?,
        None => Vec::new(),
    };
    debug!(keys = snapshot.len(), "Loaded initial state");

    let base = path.parent().map(Path::to_path_buf).unwrap_or_else(|| PathBuf::from(cwd));
    let options = EngineOptions {
        rewrite_indices: config.rewrite_indices,
    };
    let mut page = Pado::with_options(
        Document::parse(&template.html),
        &template,
        FsModuleLoader::new(base),
        options,
    );
    page.render(snapshot).await;

    println!("{}", page.tree().to_html());
    Ok(())
}

fn load_template(path: &Path, config: &Config, cwd: &str) -> Result<CompiledTemplate> {
    let source = fs::read_to_string(path).with_context(|| format!("Cannot read template {}", path.display()))?;

    if path.extension().and_then(|s| s.to_str()) == Some("json") {
        return CompiledTemplate::from_json(&source).with_context(|| format!("Invalid artifact {}", path.display()));
    }

    let options = CompileOptions {
        path: Some(template_key(path, cwd)),
        style_scope: config.style_scope,
        validate_expressions: false,
    };
    let output = compile_source(&source, &options);
    for warning in &output.warnings {
        eprintln!("{} {}", "warning:".yellow(), warning);
    }
    Ok(output.template)
}

fn read_snapshot(path: &Path) -> Result<Vec<(String, Value)>> {
    let content = fs::read_to_string(path).with_context(|| format!("Cannot read state file {}", path.display()))?;
    let json: serde_json::Value = serde_json::from_str(&content)?;
    if !json.is_object() {
        bail!("State file {} must contain a JSON object", path.display());
    }
    Ok(snapshot_from_json(json))
}
