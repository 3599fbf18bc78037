//! Row to candle conversion: bucket, fold, filter, sort.

use crate::domain::candle::Candle;
use crate::domain::error::ConvertError;
use crate::domain::raw_row::RawRow;
use crate::domain::timeframe::Timeframe;
use chrono::DateTime;
use std::collections::BTreeMap;

/// Running OHLCV fold for one bucket.
#[derive(Debug, Clone)]
struct Bucket {
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    volume: f64,
}

impl Bucket {
    fn start(row: &RawRow) -> Self {
        Self {
            open: row.open,
            high: row.high,
            low: row.low,
            close: row.close,
            volume: row.volume,
        }
    }

    fn is_finite(&self) -> bool {
        [self.open, self.high, self.low, self.close, self.volume]
            .iter()
            .all(|v| v.is_finite())
    }

    fn absorb(&mut self, row: &RawRow) {
        self.high = self.high.max(row.high);
        self.low = self.low.min(row.low);
        self.close = row.close;
        self.volume += row.volume;
    }
}

/// Folds rows into candles.
///
/// With a timeframe, rows are grouped into epoch-aligned buckets of that
/// width. Without one, each distinct timestamp becomes its own candle. Open
/// and close follow file order inside a bucket. Candles whose volume is not
/// positive, or with any non-finite field (a volume sum can overflow), are
/// dropped, and the result is sorted by date.
pub fn convert(rows: &[RawRow], timeframe: Option<Timeframe>) -> Result<Vec<Candle>, ConvertError> {
    let mut buckets: BTreeMap<i64, Bucket> = BTreeMap::new();

    for row in rows {
        let key = match timeframe {
            Some(tf) => tf.bucket_start(row.timestamp),
            None => row.timestamp,
        };
        buckets
            .entry(key)
            .and_modify(|b| b.absorb(row))
            .or_insert_with(|| Bucket::start(row));
    }

    let mut candles = Vec::with_capacity(buckets.len());
    for (start, bucket) in buckets {
        if !bucket.is_finite() || bucket.volume <= 0.0 {
            continue;
        }
        let date = DateTime::from_timestamp(start, 0)
            .ok_or(ConvertError::TimestampOutOfRange { timestamp: start })?;
        candles.push(Candle {
            date,
            open: bucket.open,
            high: bucket.high,
            low: bucket.low,
            close: bucket.close,
            volume: bucket.volume,
        });
    }

    Ok(candles)
}
