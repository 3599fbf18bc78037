//! Raw OHLCVT input record.

use chrono::{DateTime, Utc};

/// Number of columns in a headerless OHLCVT row.
pub const COLUMN_COUNT: usize = 7;

/// Column names in file order.
pub const COLUMNS: [&str; COLUMN_COUNT] =
    ["timestamp", "open", "high", "low", "close", "volume", "trades"];

#[derive(Debug, Clone, PartialEq)]
pub struct RawRow {
    /// Epoch seconds.
    pub timestamp: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
    pub trades: u64,
}

impl RawRow {
    pub fn date(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.timestamp, 0)
    }
}
