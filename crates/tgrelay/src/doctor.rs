// SPDX-FileCopyrightText: 2026 Tgrelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `tgrelay doctor` command implementation.
//!
//! Offline checks only: configuration, database, and account settings.
//! Nothing here talks to Telegram.

use tgrelay_config::model::TgrelayConfig;
use tgrelay_core::RelayError;
use tgrelay_monitor::supervisor::validate_account;
use tgrelay_storage::SqliteRepository;

/// Run the `tgrelay doctor` command. Exits non-zero via the caller when any
/// check fails.
pub async fn run_doctor(config: &TgrelayConfig) -> Result<(), RelayError> {
    let mut failures = 0u32;

    println!();
    println!("  tgrelay doctor");
    println!("  {}", "-".repeat(35));

    // Config already loaded and validated, or we would not be here.
    println!("    [ok]   configuration loads and validates");

    match check_database(config).await {
        Ok(()) => println!(
            "    [ok]   database opens at {}",
            config.storage.database_path
        ),
        Err(e) => {
            failures += 1;
            println!("    [fail] database: {e}");
        }
    }

    match validate_account(&config.telegram) {
        Ok(account) => {
            println!(
                "    [ok]   account configured (api_id {}, session `{}`, target `{}`)",
                account.api_id,
                account.session_file.display(),
                account.target_title
            );
        }
        Err(e) => {
            failures += 1;
            println!("    [fail] account: {e}");
        }
    }

    println!();

    if failures == 0 {
        Ok(())
    } else {
        Err(RelayError::Config(format!("{failures} doctor check(s) failed")))
    }
}

async fn check_database(config: &TgrelayConfig) -> Result<(), RelayError> {
    let repo = SqliteRepository::new(config.storage.clone());
    repo.initialize().await?;
    repo.close().await
}
