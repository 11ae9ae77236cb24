//! CLI argument definitions using clap derive

use crate::net::Method;
use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// b64shell - Base64 encoder/decoder with an offline app-shell cache
///
/// Encodes and decodes Base64 and Data URIs, and simulates the versioned
/// offline cache that keeps the app usable without a network.
#[derive(Parser, Debug)]
#[command(name = "b64shell")]
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
    #[arg(short, long, global = true, env = "B64SHELL_CONFIG")]
    pub config: Option<PathBuf>,

    /// Directory holding the registration and cache stores
    #[arg(long, global = true, env = "B64SHELL_STATE_DIR")]
    pub state_dir: Option<PathBuf>,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Encode text or a file as Base64
    Encode(EncodeArgs),

    /// Decode Base64 or a Data URI
    Decode(DecodeArgs),

    /// Show how a Data URI would be previewed
    Preview(PreviewArgs),

    /// Drive the offline cache worker lifecycle
    Worker(WorkerArgs),

    /// Inspect or clear cache stores
    Cache(CacheArgs),

    /// Show or initialize configuration
    Config(ConfigArgs),
}

/// Arguments for the encode command
#[derive(Parser, Debug)]
pub struct EncodeArgs {
    /// Text to encode (reads stdin when omitted)
    #[arg(conflicts_with = "file")]
    pub text: Option<String>,

    /// Encode the raw bytes of a file
    #[arg(short, long)]
    pub file: Option<PathBuf>,

    /// Wrap the result in a Data URI with this MIME type
    #[arg(short, long)]
    pub mime: Option<String>,
}

/// Arguments for the decode command
#[derive(Parser, Debug)]
pub struct DecodeArgs {
    /// Base64 string or Data URI (reads stdin when omitted)
    pub input: Option<String>,

    /// Write the decoded bytes to a file instead of printing text
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// Arguments for the preview command
#[derive(Parser, Debug)]
pub struct PreviewArgs {
    /// Data URI (reads stdin when omitted)
    pub input: Option<String>,

    /// Output format
    #[arg(short, long, default_value = "table")]
    pub format: OutputFormat,
}

/// Arguments for the worker command
#[derive(Parser, Debug)]
pub struct WorkerArgs {
    #[command(subcommand)]
    pub action: WorkerAction,
}

/// Worker subcommands
#[derive(Subcommand, Debug)]
pub enum WorkerAction {
    /// Register the configured version: install, then activate when possible
    Update,

    /// Activate the waiting worker now
    Activate,

    /// Send a request through the active worker
    Fetch {
        /// Absolute URL
        url: String,

        /// HTTP method
        #[arg(short, long, default_value = "GET")]
        method: Method,

        /// Treat the request as a top-level navigation
        #[arg(long)]
        document: bool,

        /// Simulate a dead network
        #[arg(long)]
        offline: bool,

        /// Write the response body to a file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Post a JSON message, e.g. '{"type":"SKIP_WAITING"}'
    Message {
        /// JSON payload
        payload: String,
    },

    /// Open or close simulated pages
    Client {
        #[command(subcommand)]
        action: ClientAction,
    },

    /// Show active and waiting workers and open clients
    Status {
        /// Output format
        #[arg(short, long, default_value = "table")]
        format: OutputFormat,
    },
}

/// Client subcommands
#[derive(Subcommand, Debug)]
pub enum ClientAction {
    /// Open a page (defaults to the app origin)
    Open {
        /// Page URL
        url: Option<String>,
    },

    /// Close a page by id
    Close {
        /// Client id
        id: uuid::Uuid,
    },
}

/// Arguments for the cache command
#[derive(Parser, Debug)]
pub struct CacheArgs {
    #[command(subcommand)]
    pub action: CacheAction,
}

/// Cache subcommands
#[derive(Subcommand, Debug)]
pub enum CacheAction {
    /// List cache stores
    List {
        /// Output format
        #[arg(short, long, default_value = "table")]
        format: OutputFormat,
    },

    /// List entries of one store
    Show {
        /// Store name, e.g. base64-app-v1.0.0
        name: String,

        /// Output format
        #[arg(short, long, default_value = "table")]
        format: OutputFormat,
    },

    /// Delete every cache store
    Clear {
        /// Skip confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
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

/// Output format for listings
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable table
    Table,
    /// JSON output
    Json,
    /// Simple text (one per line)
    Plain,
}
