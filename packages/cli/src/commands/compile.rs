use crate::config::Config;
use anyhow::{anyhow, Result};
use clap::Args;
use colored::Colorize;
use pado_compiler::{compile as compile_source, scope_id, scope_stylesheet, CompileOptions, CompileWarning};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

pub const TEMPLATE_EXTENSION: &str = "pado";

/// Stylesheets scoped alongside a template, by extension
const STYLESHEET_EXTENSIONS: &[&str] = &["module.scss", "module.css"];

#[derive(Debug, Args)]
pub struct CompileArgs {
    /// File or directory to compile (defaults to the configured srcDir)
    pub path: Option<String>,

    /// Output to stdout instead of files
    #[arg(long)]
    pub stdout: bool,

    /// Output directory (overrides config)
    #[arg(short, long)]
    pub out_dir: Option<String>,

    /// Parse every expression and report the invalid ones
    #[arg(long)]
    pub validate: bool,
}

pub fn compile(args: CompileArgs, cwd: &str) -> Result<()> {
    let config = Config::load(cwd)?;
    let root = match &args.path {
        Some(path) => PathBuf::from(cwd).join(path),
        None => config.get_src_dir(cwd),
    };

    if !root.exists() {
        return Err(anyhow!("Source path does not exist: {:?}", root));
    }

    let (files, base) = if root.is_file() {
        let base = root.parent().map(Path::to_path_buf).unwrap_or_else(|| PathBuf::from(cwd));
        (vec![root.clone()], base)
    } else {
        (find_templates(&root), root.clone())
    };

    if !args.stdout {
        println!("{}", "Compiling Pado templates...".bright_blue().bold());
    }

    if files.is_empty() {
        println!("{}", "No .pado files found".yellow());
        return Ok(());
    }

    let mut success_count = 0;
    let mut error_count = 0;

    for file in &files {
        let relative_path = file.strip_prefix(&base).unwrap_or(file);
        match compile_file(file, &args, &base, &config, cwd) {
            Ok((output_path, warnings)) => {
                success_count += 1;
                if !args.stdout {
                    println!("  {} {} → {}", "✓".green(), relative_path.display(), output_path);
                }
                for warning in warnings {
                    eprintln!("    {} {}", "warning:".yellow(), warning);
                }
            }
            Err(e) => {
                error_count += 1;
                eprintln!("  {} {} - {}", "✗".red(), relative_path.display(), e.to_string().red());
            }
        }
    }

    if args.stdout {
        return Ok(());
    }

    println!();
    if error_count == 0 {
        println!("{} Compiled {} files successfully", "✓".green(), success_count);
    } else {
        println!("{} Compiled {} files, {} errors", "!".yellow(), success_count, error_count);
    }

    Ok(())
}

fn find_templates(dir: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(dir)
        .follow_links(true)
        .into_iter()
        .filter_map(|e| e.ok())
        .map(|entry| entry.into_path())
        .filter(|path| path.extension().and_then(|s| s.to_str()) == Some(TEMPLATE_EXTENSION))
        .collect();
    files.sort();
    files
}

/// Path used to seed ids: relative to the working directory, `/`-separated
pub fn template_key(file: &Path, cwd: &str) -> String {
    file.strip_prefix(cwd)
        .unwrap_or(file)
        .to_string_lossy()
        .replace('\\', "/")
}

fn compile_file(
    file_path: &Path,
    args: &CompileArgs,
    base: &Path,
    config: &Config,
    cwd: &str,
) -> Result<(String, Vec<CompileWarning>)> {
    let source = fs::read_to_string(file_path)?;
    let key = template_key(file_path, cwd);

    let options = CompileOptions {
        path: Some(key.clone()),
        style_scope: config.style_scope,
        validate_expressions: args.validate,
    };
    let output = compile_source(&source, &options);
    let mut template = output.template;

    if config.style_scope {
        if let Some(css) = sibling_stylesheet(file_path)? {
            template.styles = Some(scope_stylesheet(&css, &scope_id(&key)));
        }
    }

    let json = template.to_json()?;

    if args.stdout {
        println!("{}", json);
        return Ok(("stdout".to_string(), output.warnings));
    }

    let relative_path = file_path.strip_prefix(base).unwrap_or(file_path);
    let out_dir = match &args.out_dir {
        Some(out) => PathBuf::from(cwd).join(out),
        None => config.get_out_dir(cwd),
    };
    let output_file = out_dir.join(relative_path).with_extension("json");

    if let Some(parent) = output_file.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(&output_file, json)?;

    let display = output_file
        .strip_prefix(cwd)
        .unwrap_or(&output_file)
        .display()
        .to_string();
    Ok((display, output.warnings))
}

fn sibling_stylesheet(file_path: &Path) -> Result<Option<String>> {
    for extension in STYLESHEET_EXTENSIONS {
        let candidate = file_path.with_extension(extension);
        if candidate.is_file() {
            return Ok(Some(fs::read_to_string(candidate)?));
        }
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_template_key_is_relative_to_cwd() {
        let file = Path::new("/work/site/src/app/page.pado");
        assert_eq!(template_key(file, "/work/site"), "src/app/page.pado");
        assert_eq!(template_key(file, "/elsewhere"), "/work/site/src/app/page.pado");
    }

    #[test]
    fn test_stylesheet_shares_the_template_scope() {
        assert_eq!(
            Path::new("src/app/page.pado").with_extension("module.scss"),
            Path::new("src/app/page.module.scss")
        );
        assert_eq!(scope_id("src/app/page.pado"), scope_id("src/app/page.module.scss"));
    }
}
