//! Data types carried through the reconciliation pipeline.

use chrono::NaiveDate;

use crate::error::SyncError;

/// Wire and display format for delivery dates.
pub const DATE_FORMAT: &str = "%d.%m.%Y";

/// One coerced spreadsheet row.
///
/// The delivery date stays raw text here: change detection compares it
/// byte-for-byte against the store's `DD.MM.YYYY` rendering, so parsing
/// happens only once a row is actually staged for insert or update.
#[derive(Debug, Clone, PartialEq)]
pub struct SheetRow {
    pub number: i64,
    pub order_num: i64,
    pub price_usd: f64,
    pub delivery_time: String,
}

/// A fully typed order ready to be written.
#[derive(Debug, Clone, PartialEq)]
pub struct Order {
    pub number: i64,
    pub order_num: i64,
    pub price_usd: f64,
    pub price_rub: f64,
    pub delivery_time: NaiveDate,
}

/// The comparable projection of a stored order, delivery date formatted
/// exactly as the sheet carries it.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredOrder {
    pub number: i64,
    pub order_num: i64,
    pub price_usd: f64,
    pub delivery_time: String,
}

/// A complete stored row, as listed by the CLI.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderRecord {
    pub number: i64,
    pub order_num: i64,
    pub price_usd: f64,
    pub price_rub: f64,
    pub delivery_time: NaiveDate,
    pub delivery_completed: bool,
}

impl SheetRow {
    /// Whether this row is identical to its stored counterpart.
    ///
    /// Prices round-trip SQLite REAL columns as IEEE doubles, so exact
    /// comparison is the right equality here.
    pub fn matches(&self, stored: &StoredOrder) -> bool {
        self.number == stored.number
            && self.order_num == stored.order_num
            && self.price_usd == stored.price_usd
            && self.delivery_time == stored.delivery_time
    }

    /// Finish typing the row: parse the delivery date and derive the
    /// converted price from the pass-wide unit rate.
    pub fn into_order(self, index: usize, rate: f64) -> Result<Order, SyncError> {
        let delivery_time = parse_delivery_date(index, &self.delivery_time)?;
        Ok(Order {
            number: self.number,
            order_num: self.order_num,
            price_usd: self.price_usd,
            price_rub: self.price_usd * rate,
            delivery_time,
        })
    }
}

/// Parse a `DD.MM.YYYY` delivery date.
pub fn parse_delivery_date(index: usize, text: &str) -> Result<NaiveDate, SyncError> {
    NaiveDate::parse_from_str(text, DATE_FORMAT).map_err(|_| {
        SyncError::invalid_row(index, format!("invalid delivery date {text:?}, expected DD.MM.YYYY"))
    })
}
