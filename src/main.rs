//! pkgstore - package archival and resolution cache
//!
//! CLI entry point that dispatches to subcommands.

use clap::Parser;
use console::style;
use pkgstore::cli::{Cli, Commands, LogFormat};
use pkgstore::config::ConfigManager;
use pkgstore::error::StoreResult;
use std::process::ExitCode;
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

fn init_logging(verbose: u8, format: LogFormat) {
    // 0 = warn (spinners only), 1 = info, 2+ = debug
    let filter = match verbose {
        0 => EnvFilter::new("pkgstore=warn"),
        1 => EnvFilter::new("pkgstore=info"),
        _ => EnvFilter::new("pkgstore=debug"),
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .without_time();

    match format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

async fn run() -> StoreResult<()> {
    let cli = Cli::parse();

    let config_manager = match cli.config {
        Some(ref path) => ConfigManager::with_path(path.clone()),
        None => ConfigManager::new(),
    };
    let config = config_manager.load().await?;

    let log_format = cli
        .log_format
        .unwrap_or_else(|| LogFormat::from_config(&config.general.log_format));
    init_logging(cli.verbose, log_format);

    // Commands that read the mirror or the archive store need the cache tree
    let needs_cache = !matches!(cli.command, Commands::Config(_) | Commands::Branches);
    if needs_cache {
        ConfigManager::ensure_cache_dirs(&config).await?;
    }

    match cli.command {
        Commands::Checkout(args) => pkgstore::cli::commands::checkout(args, &config).await,
        Commands::Resolve(args) => pkgstore::cli::commands::resolve(args, &config).await,
        Commands::Locations(args) => pkgstore::cli::commands::locations(args, &config).await,
        Commands::Cat(args) => pkgstore::cli::commands::cat(args, &config).await,
        Commands::Exec(args) => pkgstore::cli::commands::exec(args, &config).await,
        Commands::Branches => pkgstore::cli::commands::branches(&config).await,
        Commands::Config(args) => {
            pkgstore::cli::commands::config(args, &config, &config_manager).await
        }
    }
}
