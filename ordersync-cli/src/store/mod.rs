//! SQLite-backed order storage.

pub mod orders;

use std::str::FromStr;

use anyhow::{Context, Result};
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};

/// Open the database (creating the file if missing) and make sure the
/// schema exists.
///
/// The pool is the scoped-acquisition construct around every store use:
/// each operation borrows a connection and releases it on every exit
/// path, normal or error. A single connection is enough for the one
/// reconciliation process this design assumes, and keeps SQLite writers
/// from contending.
pub async fn connect(url: &str) -> Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str(url)
        .with_context(|| format!("Invalid database URL: {url}"))?
        .create_if_missing(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await
        .context("Failed to open database")?;

    orders::init_schema(&pool).await?;

    Ok(pool)
}

#[cfg(test)]
pub(crate) async fn test_pool() -> SqlitePool {
    connect("sqlite::memory:").await.expect("in-memory pool")
}
