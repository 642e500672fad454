//! Clients for the external collaborators: the exchange-rate feed and
//! the spreadsheet values endpoint.

pub mod rates;
pub mod sheets;

pub use rates::{RateFeedClient, RateSource};
pub use sheets::{SheetSource, SheetsClient};
