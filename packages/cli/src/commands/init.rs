use crate::config::{Config, DEFAULT_CONFIG_NAME};
use anyhow::Result;
use clap::Args;
use colored::Colorize;
use std::fs;
use std::path::PathBuf;

const EXAMPLE_TEMPLATE: &str = r#"<body>
  <h1>{title}</h1>
  <button onclick={increment}>Clicked {count} times</button>
  {@if(count > 10)}
    <p>That's a lot of clicks</p>
  {/if}
  <script type="module" src="./page.js"></script>
</body>
"#;

const EXAMPLE_MODULE: &str = r#"export function increment() {}
"#;

#[derive(Debug, Args)]
pub struct InitArgs {
    /// Source directory
    #[arg(short, long, default_value = "src")]
    pub src_dir: String,

    /// Force overwrite existing config
    #[arg(short, long)]
    pub force: bool,
}

pub fn init(args: InitArgs, cwd: &str) -> Result<()> {
    let config_path = PathBuf::from(cwd).join(DEFAULT_CONFIG_NAME);

    if config_path.exists() && !args.force {
        println!("{} {} already exists", "!".yellow(), DEFAULT_CONFIG_NAME.bright_white());
        println!("Use --force to overwrite");
        return Ok(());
    }

    println!("{}", "Initializing Pado project...".bright_blue().bold());

    let app_dir = PathBuf::from(cwd).join(&args.src_dir).join("app");
    if !app_dir.exists() {
        fs::create_dir_all(&app_dir)?;
        println!("  {} Created {}/app/", "✓".green(), args.src_dir);
    }

    for (name, content) in [("page.pado", EXAMPLE_TEMPLATE), ("page.js", EXAMPLE_MODULE)] {
        let file = app_dir.join(name);
        if !file.exists() {
            fs::write(&file, content)?;
            println!("  {} Created {}/app/{}", "✓".green(), args.src_dir, name);
        }
    }

    let config = Config {
        src_dir: args.src_dir.clone(),
        ..Config::default()
    };
    fs::write(&config_path, serde_json::to_string_pretty(&config)?)?;
    println!("  {} Created {}", "✓".green(), DEFAULT_CONFIG_NAME);

    println!();
    println!("Next: {}", "pado compile".bright_white());
    Ok(())
}
