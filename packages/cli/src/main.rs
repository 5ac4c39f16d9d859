mod commands;
mod config;
mod loader;

use clap::{Parser, Subcommand};
use colored::Colorize;
use commands::{compile, init, render, CompileArgs, InitArgs, RenderArgs};
use tracing_subscriber::EnvFilter;

/// Pado CLI - compile and render reactive HTML templates
#[derive(Parser, Debug)]
#[command(name = "pado")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Log engine decisions to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Initialize a new Pado project
    Init(InitArgs),

    /// Compile .pado templates to JSON artifacts
    Compile(CompileArgs),

    /// Render a template headlessly and print the HTML
    Render(RenderArgs),
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match std::env::current_dir() {
        Ok(dir) => {
            let cwd = dir.display().to_string();
            match cli.command {
                Command::Init(args) => init(args, &cwd),
                Command::Compile(args) => compile(args, &cwd),
                Command::Render(args) => render(args, &cwd).await,
            }
        }
        Err(err) => Err(anyhow::anyhow!("Cannot get current directory: {}", err)),
    };

    if let Err(err) = result {
        eprintln!();
        eprintln!("{} {}", "Error:".red().bold(), err);
        eprintln!();
        std::process::exit(1);
    }
}
