//! CLI argument definitions using clap derive

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// pkgstore - package archival and resolution cache
///
/// Resolves packages to immutable, content-addressed snapshots of a git
/// mirror and serves files out of them.
#[derive(Parser, Debug)]
#[command(name = "pkgstore")]
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
    #[arg(short, long, global = true, env = "PKGSTORE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Log line format (defaults to general.log_format)
    #[arg(long, global = true)]
    pub log_format: Option<LogFormat>,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Archive a subdirectory of a branch
    Checkout(CheckoutArgs),

    /// Find the main revision of a package
    Resolve(ResolveArgs),

    /// List the locations of a package
    Locations(LocationsArgs),

    /// Print a file from a package's main revision
    Cat(CatArgs),

    /// Run a command inside a package's main revision
    Exec(ExecArgs),

    /// List branches of the mirror
    Branches,

    /// Show or initialize configuration
    Config(ConfigArgs),
}

/// Arguments for the checkout command
#[derive(Parser, Debug)]
pub struct CheckoutArgs {
    /// Branch of the mirror
    pub branch: String,

    /// Subdirectory to archive (defaults to the repository root)
    #[arg(short, long, default_value = ".")]
    pub path: String,

    /// Output format
    #[arg(short, long, default_value = "table")]
    pub format: OutputFormat,
}

/// Arguments for the resolve command
#[derive(Parser, Debug)]
pub struct ResolveArgs {
    /// Package id, e.g. problems/sum
    pub target: String,

    /// Only search this location
    #[arg(short, long)]
    pub location: Option<String>,

    /// Output format
    #[arg(short, long, default_value = "table")]
    pub format: OutputFormat,
}

/// Arguments for the locations command
#[derive(Parser, Debug)]
pub struct LocationsArgs {
    /// Package id
    pub target: String,

    /// Output format
    #[arg(short, long, default_value = "table")]
    pub format: OutputFormat,
}

/// Arguments for the cat command
#[derive(Parser, Debug)]
pub struct CatArgs {
    /// Package id
    pub target: String,

    /// File path inside the archive
    pub file: String,

    /// Only search this location
    #[arg(short, long)]
    pub location: Option<String>,
}

/// Arguments for the exec command
#[derive(Parser, Debug)]
pub struct ExecArgs {
    /// Package id
    pub target: String,

    /// Only search this location
    #[arg(short, long)]
    pub location: Option<String>,

    /// Command and arguments to run
    #[arg(last = true, required = true)]
    pub command: Vec<String>,
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
}

/// Output format for reporting commands
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable table
    Table,
    /// JSON output
    Json,
}

/// Log line format
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

impl LogFormat {
    /// Parse the `general.log_format` config value, defaulting to text
    pub fn from_config(value: &str) -> Self {
        if value.eq_ignore_ascii_case("json") {
            Self::Json
        } else {
            Self::Text
        }
    }
}
