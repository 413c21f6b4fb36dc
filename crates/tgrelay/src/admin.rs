// SPDX-FileCopyrightText: 2026 Tgrelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Admin seam subcommands: enable/disable/restart controls, error-log
//! listing, and keyword management. Each opens the shared repository,
//! performs one operation, and checkpoints.

use tgrelay_config::model::TgrelayConfig;
use tgrelay_core::RelayError;
use tgrelay_storage::{SqliteRepository, queries};

async fn open_repo(config: &TgrelayConfig) -> Result<SqliteRepository, RelayError> {
    let repo = SqliteRepository::new(config.storage.clone());
    repo.initialize().await?;
    Ok(repo)
}

pub async fn run_set_enabled(config: &TgrelayConfig, enabled: bool) -> Result<(), RelayError> {
    let repo = open_repo(config).await?;
    queries::control::control_set_enabled(repo.db()?, enabled).await?;
    repo.close().await?;
    println!(
        "monitoring {}",
        if enabled { "enabled" } else { "disabled" }
    );
    Ok(())
}

pub async fn run_restart(config: &TgrelayConfig) -> Result<(), RelayError> {
    let repo = open_repo(config).await?;
    queries::control::control_request_restart(repo.db()?).await?;
    repo.close().await?;
    println!("soft restart requested");
    Ok(())
}

pub async fn run_logs(config: &TgrelayConfig, limit: i64) -> Result<(), RelayError> {
    let repo = open_repo(config).await?;
    let events = queries::events::error_latest(repo.db()?, limit).await?;
    repo.close().await?;

    if events.is_empty() {
        println!("no error events");
        return Ok(());
    }
    for event in events {
        println!("[{}] #{} {}", event.created_at, event.id, event.message);
    }
    Ok(())
}

pub async fn run_keyword_add(config: &TgrelayConfig, keyword: &str) -> Result<(), RelayError> {
    let repo = open_repo(config).await?;
    let inserted = queries::keywords::keyword_add(repo.db()?, keyword).await?;
    repo.close().await?;
    if inserted {
        println!("keyword added");
    } else {
        println!("an equivalent keyword already exists");
    }
    Ok(())
}

pub async fn run_keyword_list(
    config: &TgrelayConfig,
    query: Option<&str>,
) -> Result<(), RelayError> {
    let repo = open_repo(config).await?;
    let keywords = queries::keywords::keyword_list(repo.db()?, query).await?;
    repo.close().await?;

    if keywords.is_empty() {
        println!("no keywords");
        return Ok(());
    }
    for keyword in keywords {
        println!("#{} {} (added {})", keyword.id, keyword.keyword, keyword.created_at);
    }
    Ok(())
}

pub async fn run_keyword_delete(config: &TgrelayConfig, id: i64) -> Result<(), RelayError> {
    let repo = open_repo(config).await?;
    let deleted = queries::keywords::keyword_delete(repo.db()?, id).await?;
    repo.close().await?;
    if deleted {
        println!("keyword #{id} deleted");
    } else {
        println!("no keyword with id {id}");
    }
    Ok(())
}
