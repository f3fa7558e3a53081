//! CLI argument definitions using clap derive

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Shelter - Offline-first application shell cache
///
/// Mirrors a build-produced resource manifest into a durable local cache
/// and resolves requests against it, cache-first.
#[derive(Parser, Debug)]
#[command(name = "shelter")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Configuration file path
    #[arg(short, long, global = true, env = "SHELTER_CONFIG")]
    pub config: Option<PathBuf>,

    /// Skip local .shelter.toml discovery
    #[arg(long, global = true)]
    pub no_local: bool,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Stage the shell and reconcile the cache against the manifest
    Sync(SyncArgs),

    /// Resolve one request through the interception policy
    Fetch(FetchArgs),

    /// Download every manifest resource still missing from the cache
    Offline(OfflineArgs),

    /// Deliver a raw worker message
    Message(MessageArgs),

    /// Show manifest, snapshot, and store state
    Status(StatusArgs),

    /// Wipe the content, staging, and snapshot stores
    Clear(ClearArgs),

    /// Show or edit configuration
    Config(ConfigArgs),

    /// Initialize a project-local .shelter.toml config
    Init(InitArgs),
}

/// Arguments for the sync command
#[derive(Parser, Debug)]
pub struct SyncArgs {
    /// Manifest JSON path (overrides manifest.path from config)
    #[arg(short, long)]
    pub manifest: Option<PathBuf>,

    /// Keep stores in memory only, nothing touches disk
    #[arg(long)]
    pub ephemeral: bool,
}

/// Arguments for the fetch command
#[derive(Parser, Debug)]
pub struct FetchArgs {
    /// Request URL to resolve
    pub url: String,

    /// Request method
    #[arg(short = 'X', long, default_value = "GET")]
    pub method: String,

    /// Manifest JSON path (overrides manifest.path from config)
    #[arg(short, long)]
    pub manifest: Option<PathBuf>,

    /// Write the response body to a file
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// Arguments for the offline command
#[derive(Parser, Debug)]
pub struct OfflineArgs {
    /// Manifest JSON path (overrides manifest.path from config)
    #[arg(short, long)]
    pub manifest: Option<PathBuf>,
}

/// Arguments for the message command
#[derive(Parser, Debug)]
pub struct MessageArgs {
    /// Message text (recognized: skip-waiting, download-offline)
    pub text: String,

    /// Manifest JSON path (overrides manifest.path from config)
    #[arg(short, long)]
    pub manifest: Option<PathBuf>,
}

/// Arguments for the status command
#[derive(Parser, Debug)]
pub struct StatusArgs {
    /// Manifest JSON path (overrides manifest.path from config)
    #[arg(short, long)]
    pub manifest: Option<PathBuf>,

    /// Output format
    #[arg(short, long, default_value = "table")]
    pub format: OutputFormat,
}

/// Arguments for the clear command
#[derive(Parser, Debug)]
pub struct ClearArgs {
    /// Skip confirmation prompt
    #[arg(short, long)]
    pub yes: bool,
}

/// Arguments for the config command
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    /// Subcommand for config
    #[command(subcommand)]
    pub action: Option<ConfigAction>,
}

/// Config subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Show configuration file path
    Path,

    /// Initialize default configuration
    Init {
        /// Overwrite existing configuration
        #[arg(short, long)]
        force: bool,
    },

    /// Set a configuration value
    Set {
        /// Configuration key (e.g., network.origin)
        key: String,
        /// Value to set
        value: String,
        /// Write to project-local .shelter.toml instead of global config
        #[arg(long)]
        local: bool,
    },
}

/// Arguments for the init command
#[derive(Parser, Debug)]
pub struct InitArgs {
    /// Overwrite existing .shelter.toml
    #[arg(short, long)]
    pub force: bool,

    /// Target directory (defaults to current directory)
    #[arg(short, long)]
    pub path: Option<PathBuf>,
}

/// Output format for the status command
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable table
    Table,
    /// JSON output
    Json,
    /// Simple key=value lines
    Plain,
}
