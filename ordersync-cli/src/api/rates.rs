//! Exchange-rate feed client.
//!
//! The feed is a daily currency table: one XML document whose record
//! elements carry an `ID` attribute plus `Nominal` and `Value` children,
//! the value using a comma as decimal separator.

use async_trait::async_trait;
use roxmltree::{Document, Node};

use crate::config::RatesConfig;
use crate::error::SyncError;

/// Provider of the conversion rate used for one whole pass.
#[async_trait]
pub trait RateSource: Send + Sync {
    /// Target-currency value of one unit of the source currency.
    async fn unit_rate(&self) -> Result<f64, SyncError>;
}

/// HTTP client for a CBR-style daily rate table.
pub struct RateFeedClient {
    http: reqwest::Client,
    feed_url: String,
    currency_code: String,
}

impl RateFeedClient {
    pub fn new(config: &RatesConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            feed_url: config.feed_url.clone(),
            currency_code: config.currency_code.clone(),
        }
    }
}

#[async_trait]
impl RateSource for RateFeedClient {
    async fn unit_rate(&self) -> Result<f64, SyncError> {
        let response = self
            .http
            .get(&self.feed_url)
            .send()
            .await
            .map_err(|e| SyncError::SourceUnavailable(format!("rate feed request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SyncError::SourceUnavailable(format!(
                "rate feed returned {status}"
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| SyncError::SourceUnavailable(format!("rate feed body unreadable: {e}")))?;

        rate_from_xml(&body, &self.currency_code)
    }
}

/// Extract `Value / Nominal` for the record whose `ID` matches `code`.
///
/// A missing record is an explicit [`SyncError::RateNotFound`], never a
/// silent absent value.
pub fn rate_from_xml(xml: &str, code: &str) -> Result<f64, SyncError> {
    let doc = Document::parse(xml)
        .map_err(|e| SyncError::SourceUnavailable(format!("rate feed returned malformed XML: {e}")))?;

    let record = doc
        .root_element()
        .children()
        .filter(|n| n.is_element())
        .find(|n| n.attribute("ID") == Some(code))
        .ok_or_else(|| SyncError::RateNotFound(code.to_string()))?;

    let nominal: f64 = child_text(&record, "Nominal")?
        .trim()
        .parse()
        .map_err(|_| malformed(code, "Nominal"))?;
    if nominal <= 0.0 {
        return Err(malformed(code, "Nominal"));
    }

    // Locale-specific decimal separator: comma becomes period before parsing.
    let value: f64 = child_text(&record, "Value")?
        .trim()
        .replace(',', ".")
        .parse()
        .map_err(|_| malformed(code, "Value"))?;

    Ok(value / nominal)
}

fn child_text<'a>(record: &Node<'a, '_>, name: &str) -> Result<&'a str, SyncError> {
    record
        .children()
        .find(|n| n.has_tag_name(name))
        .and_then(|n| n.text())
        .ok_or_else(|| {
            SyncError::SourceUnavailable(format!("rate record is missing <{name}>"))
        })
}

fn malformed(code: &str, field: &str) -> SyncError {
    SyncError::SourceUnavailable(format!("rate record {code} has a malformed <{field}>"))
}

#[cfg(test)]
mod tests {
    use super::*;

    const FEED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
        <ValCurs Date="07.08.2026" name="Foreign Currency Market">
            <Valute ID="R01235">
                <NumCode>840</NumCode>
                <CharCode>USD</CharCode>
                <Nominal>1</Nominal>
                <Name>US Dollar</Name>
                <Value>93,2519</Value>
            </Valute>
            <Valute ID="R01375">
                <NumCode>156</NumCode>
                <CharCode>CNY</CharCode>
                <Nominal>10</Nominal>
                <Name>Yuan</Name>
                <Value>128,9060</Value>
            </Valute>
        </ValCurs>"#;

    #[test]
    fn test_rate_for_unit_nominal() {
        let rate = rate_from_xml(FEED, "R01235").unwrap();
        assert_eq!(rate, 93.2519);
    }

    #[test]
    fn test_rate_divides_by_nominal() {
        let rate = rate_from_xml(FEED, "R01375").unwrap();
        assert!((rate - 12.8906).abs() < 1e-9);
    }

    #[test]
    fn test_unknown_code_is_rate_not_found() {
        let err = rate_from_xml(FEED, "R99999").unwrap_err();
        assert!(matches!(err, SyncError::RateNotFound(code) if code == "R99999"));
    }

    #[test]
    fn test_malformed_document_is_source_unavailable() {
        let err = rate_from_xml("<ValCurs><Valute", "R01235").unwrap_err();
        assert!(matches!(err, SyncError::SourceUnavailable(_)));
    }

    #[test]
    fn test_missing_value_child_is_source_unavailable() {
        let feed = r#"<ValCurs><Valute ID="R01235"><Nominal>1</Nominal></Valute></ValCurs>"#;
        let err = rate_from_xml(feed, "R01235").unwrap_err();
        assert!(matches!(err, SyncError::SourceUnavailable(_)));
    }

    #[test]
    fn test_zero_nominal_is_source_unavailable() {
        let feed = r#"<ValCurs><Valute ID="R01235"><Nominal>0</Nominal><Value>93,0</Value></Valute></ValCurs>"#;
        let err = rate_from_xml(feed, "R01235").unwrap_err();
        assert!(matches!(err, SyncError::SourceUnavailable(_)));
    }
}
