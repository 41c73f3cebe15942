//! portal - command-line client for the portal backend.
//!
//! Logs in against the backend, keeps the session in durable storage, and
//! sends authorized requests with whatever token that storage holds.

mod cli;
mod commands;

use std::io;

use anyhow::Result;
use clap::Parser;
use portal_core::Config;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::{Cli, Commands};

/// Initialize the tracing subscriber for logging.
/// RUST_LOG takes precedence over the -v count.
fn init_tracing(verbosity: u8, json: bool) {
    let level = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    if json {
        tracing_subscriber::registry()
            .with(fmt::layer().json().with_writer(io::stderr))
            .with(filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(fmt::layer().with_target(false).with_writer(io::stderr))
            .with(filter)
            .init();
    }
}

/// Config file values, with command-line and environment overrides applied
fn resolve_config(cli: &Cli) -> Config {
    let config = Config::load().unwrap_or_else(|e| {
        warn!(error = %e, "Failed to load config, using defaults");
        Config::default()
    });
    config.with_overrides(cli.base_url.clone(), cli.storage)
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.json_logs);

    let config = resolve_config(&cli);
    info!(base_url = config.base_url(), storage = %config.storage, "Portal client starting");

    match cli.command {
        Commands::Login { email } => commands::login(&config, email).await,
        Commands::Logout => commands::logout(&config),
        Commands::Status => commands::status(&config),
        Commands::Whoami => commands::whoami(&config),
        Commands::Get { ref path } => commands::get(&config, path).await,
    }
}
