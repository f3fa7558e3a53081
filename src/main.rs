//! Shelter - Offline-First Application Shell Cache
//!
//! CLI entry point that dispatches to subcommands.

use clap::Parser;
use console::style;
use shelter::cli::{Cli, Commands};
use shelter::config::ConfigManager;
use shelter::error::ShelterResult;
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

async fn run() -> ShelterResult<()> {
    let cli = Cli::parse();

    // Init command doesn't need config loading
    if let Commands::Init(args) = cli.command {
        return shelter::cli::commands::init(args).await;
    }

    let config_manager = if let Some(ref path) = cli.config {
        ConfigManager::with_path(path.clone())
    } else {
        ConfigManager::new()
    };

    // Find local config unless --no-local is set
    let local_config_path = if cli.no_local {
        None
    } else {
        let cwd = std::env::current_dir()
            .map_err(|e| shelter::error::ShelterError::io("getting current directory", e))?;
        ConfigManager::find_local_config(&cwd)
    };

    let config = config_manager
        .load_merged(local_config_path.as_deref())
        .await?;

    // Initialize logging: 0 = warn (spinners only), 1 = info, 2+ = debug
    let verbose = cli.verbose.max(u8::from(config.general.verbose));
    let filter = match verbose {
        0 => EnvFilter::new("shelter=warn"),
        1 => EnvFilter::new("shelter=info"),
        _ => EnvFilter::new("shelter=debug"),
    };

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time();
    if config.general.log_format == "json" {
        subscriber.json().init();
    } else {
        subscriber.init();
    }

    if let Some(ref path) = local_config_path {
        debug!("Using local config from {}", path.display());
    }

    // Ensure state directories exist
    ConfigManager::ensure_state_dirs().await?;

    // Dispatch to command
    match cli.command {
        Commands::Init(_) => unreachable!("Init handled above"),
        Commands::Sync(args) => shelter::cli::commands::sync(args, &config).await,
        Commands::Fetch(args) => shelter::cli::commands::fetch(args, &config).await,
        Commands::Offline(args) => shelter::cli::commands::offline(args, &config).await,
        Commands::Message(args) => shelter::cli::commands::message(args, &config).await,
        Commands::Status(args) => shelter::cli::commands::status(args, &config).await,
        Commands::Clear(args) => shelter::cli::commands::clear(args, &config).await,
        Commands::Config(args) => shelter::cli::commands::config(args, &config).await,
    }
}
