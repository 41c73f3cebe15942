//! CLI argument definitions.

use clap::{Parser, Subcommand};
use portal_core::StorageBackend;

/// Command-line client for the portal backend.
#[derive(Parser, Debug)]
#[command(name = "portal")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Backend base URL (overrides the config file)
    #[arg(long, env = "PORTAL_BASE_URL", global = true)]
    pub base_url: Option<String>,

    /// Where the session is kept: file or keyring (overrides the config file)
    #[arg(long, env = "PORTAL_STORAGE", global = true)]
    pub storage: Option<StorageBackend>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Output logs as JSON
    #[arg(long, global = true)]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Log in and store the session
    Login {
        /// Account email (prompted for when omitted)
        #[arg(long)]
        email: Option<String>,
    },
    /// Forget the stored session
    Logout,
    /// Show whether a session is stored
    Status,
    /// Print the stored user profile as JSON
    Whoami,
    /// Send an authorized GET request and print the JSON response
    Get {
        /// API path, e.g. /api/documents/
        path: String,
    },
}
