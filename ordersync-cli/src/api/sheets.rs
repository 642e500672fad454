//! Spreadsheet row source.

use async_trait::async_trait;
use serde::Deserialize;

use crate::config::SheetConfig;
use crate::error::SyncError;

/// Abstract provider of the current external row set.
///
/// `Ok(None)` is the distinguished "no values at all" signal (source not
/// configured or not ready), distinct from `Ok(Some(vec![]))`, a present
/// but empty row set.
#[async_trait]
pub trait SheetSource: Send + Sync {
    async fn fetch_rows(&self) -> Result<Option<Vec<Vec<String>>>, SyncError>;
}

/// Google Sheets `values.get` client.
pub struct SheetsClient {
    http: reqwest::Client,
    spreadsheet_id: String,
    range: String,
    api_key: String,
}

/// Response shape of the values endpoint. The `values` field is omitted
/// entirely when the range holds no data.
#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Option<Vec<Vec<serde_json::Value>>>,
}

impl SheetsClient {
    pub fn new(config: &SheetConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            spreadsheet_id: config.spreadsheet_id.clone(),
            range: config.range.clone(),
            api_key: config.api_key.clone().unwrap_or_default(),
        }
    }

    fn values_url(&self) -> String {
        format!(
            "https://sheets.googleapis.com/v4/spreadsheets/{}/values/{}",
            self.spreadsheet_id, self.range
        )
    }
}

#[async_trait]
impl SheetSource for SheetsClient {
    async fn fetch_rows(&self) -> Result<Option<Vec<Vec<String>>>, SyncError> {
        let response = self
            .http
            .get(self.values_url())
            .query(&[("majorDimension", "ROWS"), ("key", self.api_key.as_str())])
            .send()
            .await
            .map_err(|e| SyncError::SourceUnavailable(format!("sheet request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SyncError::SourceUnavailable(format!(
                "sheet request returned {status}"
            )));
        }

        let range: ValueRange = response.json().await.map_err(|e| {
            SyncError::SourceUnavailable(format!("sheet response was not valid JSON: {e}"))
        })?;

        Ok(range.values.map(|rows| {
            rows.into_iter()
                .map(|row| row.into_iter().map(cell_to_string).collect())
                .collect()
        }))
    }
}

/// Normalize a JSON cell to the textual form the reconciler coerces.
fn cell_to_string(cell: serde_json::Value) -> String {
    match cell {
        serde_json::Value::String(s) => s,
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_absent_values_field_deserializes_to_none() {
        let range: ValueRange = serde_json::from_str(
            r#"{"range": "Sheet1!A2:D1000", "majorDimension": "ROWS"}"#,
        )
        .unwrap();
        assert!(range.values.is_none());
    }

    #[test]
    fn test_empty_values_field_is_present_but_empty() {
        let range: ValueRange =
            serde_json::from_str(r#"{"range": "Sheet1!A2:D1000", "values": []}"#).unwrap();
        assert_eq!(range.values, Some(vec![]));
    }

    #[test]
    fn test_cell_to_string() {
        assert_eq!(cell_to_string(json!("01.02.2025")), "01.02.2025");
        assert_eq!(cell_to_string(json!(42)), "42");
        assert_eq!(cell_to_string(json!(49.99)), "49.99");
        assert_eq!(cell_to_string(serde_json::Value::Null), "");
    }
}
