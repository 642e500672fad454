//! Runtime configuration.
//!
//! Everything the process needs is read once at startup into an explicit
//! [`Config`] and passed into component constructors. Secrets can be kept
//! out of the file and supplied through the environment instead
//! (`ORDERSYNC_DATABASE_URL`, `ORDERSYNC_SHEETS_API_KEY`).

use std::env;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

pub const CONFIG_PATH_ENV: &str = "ORDERSYNC_CONFIG";
pub const DATABASE_URL_ENV: &str = "ORDERSYNC_DATABASE_URL";
pub const SHEETS_API_KEY_ENV: &str = "ORDERSYNC_SHEETS_API_KEY";

const DEFAULT_CONFIG_PATH: &str = "ordersync.toml";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub database: DatabaseConfig,
    pub sheet: SheetConfig,
    #[serde(default)]
    pub rates: RatesConfig,
    #[serde(default)]
    pub sync: SyncConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DatabaseConfig {
    /// sqlx connection URL, e.g. `sqlite://orders.db`.
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SheetConfig {
    /// Spreadsheet document id.
    pub spreadsheet_id: String,
    /// A1-notation range holding the order rows (header excluded).
    #[serde(default = "default_range")]
    pub range: String,
    /// API key for the values endpoint.
    #[serde(default)]
    pub api_key: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RatesConfig {
    /// Daily currency table endpoint.
    #[serde(default = "default_feed_url")]
    pub feed_url: String,
    /// Record id of the source currency within the feed.
    #[serde(default = "default_currency_code")]
    pub currency_code: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SyncConfig {
    /// Seconds to sleep between reconciliation passes.
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
    /// When the sheet returns no values payload at all, wipe the stored
    /// orders (`true`, the historical behavior) or leave them untouched
    /// and wait for the source to come back (`false`).
    #[serde(default = "default_clear_when_absent")]
    pub clear_when_absent: bool,
    /// What to do with a row that fails coercion or date parsing.
    #[serde(default)]
    pub on_invalid_row: InvalidRowPolicy,
}

/// Policy for source rows that fail validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvalidRowPolicy {
    /// Abort the whole pass before any mutation.
    Fail,
    /// Log the row and reconcile the rest.
    Skip,
}

impl Default for InvalidRowPolicy {
    fn default() -> Self {
        InvalidRowPolicy::Fail
    }
}

impl Default for RatesConfig {
    fn default() -> Self {
        Self {
            feed_url: default_feed_url(),
            currency_code: default_currency_code(),
        }
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
            clear_when_absent: default_clear_when_absent(),
            on_invalid_row: InvalidRowPolicy::default(),
        }
    }
}

fn default_range() -> String {
    "Sheet1!A2:D1000".to_string()
}

fn default_feed_url() -> String {
    "https://www.cbr.ru/scripts/XML_daily.asp".to_string()
}

fn default_currency_code() -> String {
    // USD record id in the CBR daily table.
    "R01235".to_string()
}

fn default_interval_secs() -> u64 {
    8
}

fn default_clear_when_absent() -> bool {
    true
}

impl Config {
    /// Load configuration from a TOML file and apply environment overrides.
    ///
    /// Resolution order for the file path: explicit argument, then the
    /// `ORDERSYNC_CONFIG` variable, then `ordersync.toml` in the working
    /// directory. Missing credentials are a fatal startup error.
    pub fn load(path: Option<&Path>) -> Result<Config> {
        let path: PathBuf = match path {
            Some(p) => p.to_path_buf(),
            None => env::var(CONFIG_PATH_ENV)
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH)),
        };

        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let mut config = Config::from_toml(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Parse a TOML document into a config, without touching the
    /// environment or validating credentials.
    pub fn from_toml(content: &str) -> Result<Config> {
        toml::from_str(content).context("Invalid configuration")
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(url) = env::var(DATABASE_URL_ENV) {
            self.database.url = Some(url);
        }
        if let Ok(key) = env::var(SHEETS_API_KEY_ENV) {
            self.sheet.api_key = Some(key);
        }
    }

    fn validate(&self) -> Result<()> {
        if self.database_url().is_none() {
            anyhow::bail!(
                "No database URL configured: set [database] url or {}",
                DATABASE_URL_ENV
            );
        }
        if self.sheet.api_key.as_deref().unwrap_or("").is_empty() {
            anyhow::bail!(
                "No spreadsheet API key configured: set [sheet] api_key or {}",
                SHEETS_API_KEY_ENV
            );
        }
        if self.sheet.spreadsheet_id.is_empty() {
            anyhow::bail!("[sheet] spreadsheet_id must not be empty");
        }
        Ok(())
    }

    pub fn database_url(&self) -> Option<&str> {
        self.database.url.as_deref().filter(|u| !u.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_config_gets_defaults() {
        let config = Config::from_toml(
            r#"
            [sheet]
            spreadsheet_id = "abc123"
            "#,
        )
        .unwrap();

        assert_eq!(config.sheet.range, "Sheet1!A2:D1000");
        assert_eq!(config.rates.currency_code, "R01235");
        assert_eq!(config.sync.interval_secs, 8);
        assert!(config.sync.clear_when_absent);
        assert_eq!(config.sync.on_invalid_row, InvalidRowPolicy::Fail);
        assert!(config.database_url().is_none());
    }

    #[test]
    fn test_full_config_round_trip() {
        let config = Config::from_toml(
            r#"
            [database]
            url = "sqlite://orders.db"

            [sheet]
            spreadsheet_id = "abc123"
            range = "Orders!A2:D500"
            api_key = "k-123"

            [rates]
            feed_url = "http://localhost:9000/daily.xml"
            currency_code = "R01239"

            [sync]
            interval_secs = 60
            clear_when_absent = false
            on_invalid_row = "skip"
            "#,
        )
        .unwrap();

        assert_eq!(config.database_url(), Some("sqlite://orders.db"));
        assert_eq!(config.sheet.range, "Orders!A2:D500");
        assert_eq!(config.rates.currency_code, "R01239");
        assert_eq!(config.sync.interval_secs, 60);
        assert!(!config.sync.clear_when_absent);
        assert_eq!(config.sync.on_invalid_row, InvalidRowPolicy::Skip);
    }

    #[test]
    fn test_load_reads_explicit_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ordersync.toml");
        std::fs::write(
            &path,
            r#"
            [database]
            url = "sqlite://orders.db"

            [sheet]
            spreadsheet_id = "abc123"
            api_key = "k-123"
            "#,
        )
        .unwrap();

        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.sheet.spreadsheet_id, "abc123");
        assert_eq!(config.database_url(), Some("sqlite://orders.db"));
    }

    #[test]
    fn test_load_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(Config::load(Some(&dir.path().join("nope.toml"))).is_err());
    }

    #[test]
    fn test_invalid_row_policy_rejects_unknown_value() {
        let result = Config::from_toml(
            r#"
            [sheet]
            spreadsheet_id = "abc123"

            [sync]
            on_invalid_row = "ignore"
            "#,
        );
        assert!(result.is_err());
    }
}
