// SPDX-FileCopyrightText: 2026 Tgrelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! tgrelay - a Telegram channel monitor with idempotent relay.
//!
//! This is the binary entry point. `serve` runs the connection supervisor
//! and retention cleaner; the remaining subcommands are the thin admin seam
//! over the shared repository.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

use clap::{Parser, Subcommand};

mod admin;
mod doctor;
mod serve;
mod status;

/// tgrelay - a Telegram channel monitor with idempotent relay.
#[derive(Parser, Debug)]
#[command(name = "tgrelay", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the monitor: connection supervisor plus retention cleaner.
    Serve,
    /// Show connection status and control state.
    Status {
        /// Output structured JSON for scripting.
        #[arg(long)]
        json: bool,
    },
    /// Check configuration, database, and account settings.
    Doctor,
    /// Enable monitoring.
    Enable,
    /// Disable monitoring.
    Disable,
    /// Request a soft restart of the account connection.
    Restart,
    /// Show the latest error events.
    Logs {
        /// Maximum number of events to show.
        #[arg(long, default_value_t = 50)]
        limit: i64,
    },
    /// Manage relay keywords.
    #[command(subcommand)]
    Keyword(KeywordCommand),
}

#[derive(Subcommand, Debug)]
enum KeywordCommand {
    /// Add a keyword (idempotent under normalization).
    Add { keyword: String },
    /// List keywords, optionally filtered by substring.
    List {
        #[arg(long)]
        query: Option<String>,
    },
    /// Delete a keyword by id.
    Delete { id: i64 },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match tgrelay_config::load_and_validate() {
        Ok(config) => config,
        Err(errors) => {
            tgrelay_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    let result = match cli.command {
        Commands::Serve => serve::run_serve(config).await,
        Commands::Status { json } => status::run_status(&config, json).await,
        Commands::Doctor => doctor::run_doctor(&config).await,
        Commands::Enable => admin::run_set_enabled(&config, true).await,
        Commands::Disable => admin::run_set_enabled(&config, false).await,
        Commands::Restart => admin::run_restart(&config).await,
        Commands::Logs { limit } => admin::run_logs(&config, limit).await,
        Commands::Keyword(command) => match command {
            KeywordCommand::Add { keyword } => admin::run_keyword_add(&config, &keyword).await,
            KeywordCommand::List { query } => {
                admin::run_keyword_list(&config, query.as_deref()).await
            }
            KeywordCommand::Delete { id } => admin::run_keyword_delete(&config, id).await,
        },
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
