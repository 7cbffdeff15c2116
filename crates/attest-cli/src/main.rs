//! Attest CLI - Command-line interface for grounded compliance decisions.

use anyhow::Context;
use attest_cli::commands;
use attest_cli::repl;
use attest_cli::{build_engine, AppConfig, Cli, Command, Formatter};
use clap::Parser;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    init_tracing(cli.verbose);

    // Load config, then apply flag overrides
    let config_path = match cli.config {
        Some(path) => path,
        None => AppConfig::default_path()?,
    };
    let mut config = AppConfig::load(&config_path)
        .with_context(|| format!("Failed to load {}", config_path.display()))?;

    if let Some(corpus) = cli.corpus {
        config.corpus.path = Some(corpus);
    }
    if let Some(model) = cli.model {
        config.ollama.model = model;
    }

    // Determine output format
    let format = cli.format.map(Into::into).unwrap_or(config.settings.format);

    // Determine color setting
    let color_enabled = !cli.no_color && config.settings.color;

    // Create formatter
    let formatter = Formatter::new(format, color_enabled);

    match cli.command {
        Some(Command::Config(args)) => {
            commands::execute_config(args, &config, &config_path, &formatter)?;
        }
        command => {
            let engine = build_engine(&config).context("Failed to start the decision engine")?;

            match command {
                None | Some(Command::Repl) => {
                    repl::run_repl(&engine, &config, &formatter).await?;
                }
                Some(Command::Ask(args)) => {
                    commands::execute_ask(&args.text(), args.evidence, &engine, &formatter).await?;
                }
                Some(Command::Retrieve(args)) => {
                    commands::execute_retrieve(&args.text(), args.top_k, &engine, &formatter).await?;
                }
                Some(Command::Config(_)) => {}
            }
        }
    }

    Ok(())
}

/// Log to stderr; `RUST_LOG` wins over `--verbose`.
fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .init();
}
