//! Command handlers.

pub mod orders;
pub mod sync;

use anyhow::{Context, Result};
use sqlx::SqlitePool;

use crate::config::Config;
use crate::store;

/// Open the configured database, creating the schema if needed.
pub async fn open_store(config: &Config) -> Result<SqlitePool> {
    let url = config
        .database_url()
        .context("No database URL configured")?;
    store::connect(url).await
}
