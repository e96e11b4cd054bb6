// SPDX-FileCopyrightText: 2026 Etymon Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Etymon - ephemeral-state runtime for the etymology service.
//!
//! This is the binary entry point: `serve` runs the HTTP gateway and
//! `reconcile` migrates pending lookup history into durable storage.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

mod reconcile;
mod serve;
mod shutdown;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use etymon_config::EtymonConfig;

/// Etymon - rate limiting, autocomplete and history reconciliation.
#[derive(Parser, Debug)]
#[command(name = "etymon", version, about, long_about = None)]
struct Cli {
    /// Load configuration from this file instead of the standard locations.
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Serve the HTTP gateway.
    Serve,
    /// Migrate pending lookup history into durable storage.
    Reconcile {
        /// Report pending entries per user without changing anything.
        #[arg(long)]
        dry_run: bool,
        /// Print the run summary as JSON.
        #[arg(long)]
        json: bool,
    },
}

fn load_config(path: Option<&PathBuf>) -> EtymonConfig {
    let loaded = match path {
        Some(path) => etymon_config::load_and_validate_path(path),
        None => etymon_config::load_and_validate(),
    };
    match loaded {
        Ok(config) => config,
        Err(errors) => {
            etymon_config::render_errors(&errors);
            std::process::exit(1);
        }
    }
}

fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("etymon={log_level},warn")));

    // Logs go to stderr so `reconcile --json` output stays parseable.
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_names(false)
        .init();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_ref());
    init_tracing(&config.service.log_level);

    let result = match cli.command {
        Commands::Serve => serve::run_serve(config).await,
        Commands::Reconcile { dry_run, json } => reconcile::run_reconcile(config, dry_run, json)
            .await
            .map(|_| ()),
    };

    if let Err(e) = result {
        tracing::error!(error = %e, "etymon exited with error");
        eprintln!("etymon: {e}");
        std::process::exit(1);
    }
}
