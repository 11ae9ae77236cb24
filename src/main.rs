//! b64shell - Base64 utility with an offline app-shell cache
//!
//! CLI entry point that dispatches to subcommands.

use b64shell::cli::{commands, Cli, Commands};
use b64shell::config::{Config, ConfigManager, StatePaths};
use b64shell::error::B64Result;
use clap::Parser;
use console::style;
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", style("Error:").red().bold(), e);
            if let Some(hint) = e.hint() {
                eprintln!("{} {}", style("Hint:").yellow(), hint);
            }
            ExitCode::FAILURE
        }
    }
}

async fn run() -> B64Result<()> {
    let cli = Cli::parse();

    let config_manager = match cli.config {
        Some(ref path) => ConfigManager::with_path(path.clone()),
        None => ConfigManager::new(),
    };
    let config = config_manager.load().await?;

    init_logging(cli.verbose, &config);
    debug!("Using config {}", config_manager.path().display());

    let paths = match cli.state_dir {
        Some(ref dir) => StatePaths::new(dir.clone()),
        None => StatePaths::default(),
    };

    match cli.command {
        Commands::Encode(args) => commands::encode(args, &config).await,
        Commands::Decode(args) => commands::decode(args, &config).await,
        Commands::Preview(args) => commands::preview(args, &config).await,
        Commands::Worker(args) => commands::worker(args, &config, &paths).await,
        Commands::Cache(args) => commands::cache(args, &config, &paths).await,
        Commands::Config(args) => commands::config(args, &config, &config_manager).await,
    }
}

/// 0 = warn, 1 = info, 2+ = debug; logs go to stderr
fn init_logging(verbose: u8, config: &Config) {
    let filter = match verbose {
        0 => EnvFilter::new("b64shell=warn"),
        1 => EnvFilter::new("b64shell=info"),
        _ => EnvFilter::new("b64shell=debug"),
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .without_time();

    if config.general.log_format == "json" {
        builder.json().init();
    } else {
        builder.init();
    }
}
