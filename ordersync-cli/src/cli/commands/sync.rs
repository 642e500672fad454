//! Handlers for the reconciliation commands.

use std::time::Duration;

use anyhow::Result;
use colored::*;

use super::open_store;
use crate::api::{RateFeedClient, SheetsClient};
use crate::config::Config;
use crate::services::reconcile;

/// Run the blocking polling loop: one pass, sleep, repeat forever.
///
/// A pass runs to completion (including all network and storage round
/// trips) before the next tick; a failed pass is logged and retried on
/// the next one.
pub async fn handle_run(config: &Config, interval: Option<u64>) -> Result<()> {
    let pool = open_store(config).await?;
    let sheet = SheetsClient::new(&config.sheet);
    let rates = RateFeedClient::new(&config.rates);

    let interval = Duration::from_secs(interval.unwrap_or(config.sync.interval_secs));
    log::info!(
        "Starting reconciliation loop for spreadsheet {} every {}s",
        config.sheet.spreadsheet_id,
        interval.as_secs()
    );

    loop {
        match reconcile::run_pass(&pool, &sheet, &rates, &config.sync).await {
            Ok(summary) if summary.is_noop() => log::debug!("Pass complete: no changes"),
            Ok(summary) => log::info!("Pass complete: {summary}"),
            Err(err) => log::error!("Pass aborted: {err}"),
        }
        tokio::time::sleep(interval).await;
    }
}

/// Run exactly one pass and report what it did.
pub async fn handle_sync(config: &Config) -> Result<()> {
    let pool = open_store(config).await?;
    let sheet = SheetsClient::new(&config.sheet);
    let rates = RateFeedClient::new(&config.rates);

    let summary = reconcile::run_pass(&pool, &sheet, &rates, &config.sync).await?;
    println!("{} {}", "Synced:".green().bold(), summary);

    Ok(())
}

/// Create the schema and exit. Connecting already runs the idempotent
/// schema setup, so this is just a connectivity check with a friendly
/// message.
pub async fn handle_init(config: &Config) -> Result<()> {
    open_store(config).await?;
    println!("{}", "Database ready".green());

    Ok(())
}
