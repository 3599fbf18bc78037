//! Output candle and its JSON tuple encoding.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::ser::{Serialize, SerializeTuple, Serializer};

#[derive(Debug, Clone, PartialEq)]
pub struct Candle {
    pub date: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Candle {
    /// ISO-8601 UTC with second precision, e.g. `2021-01-01T00:00:00Z`.
    pub fn date_string(&self) -> String {
        self.date.to_rfc3339_opts(SecondsFormat::Secs, true)
    }
}

/// Serialized as `[date, open, high, low, close, volume]`.
impl Serialize for Candle {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut tuple = serializer.serialize_tuple(6)?;
        tuple.serialize_element(&self.date_string())?;
        tuple.serialize_element(&self.open)?;
        tuple.serialize_element(&self.high)?;
        tuple.serialize_element(&self.low)?;
        tuple.serialize_element(&self.close)?;
        tuple.serialize_element(&self.volume)?;
        tuple.end()
    }
}
