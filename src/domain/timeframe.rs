//! Candle timeframe measured in whole minutes.

use crate::domain::error::ConvertError;
use std::fmt;
use std::str::FromStr;

const MINUTES_PER_HOUR: u32 = 60;
const MINUTES_PER_DAY: u32 = 1440;
const MINUTES_PER_WEEK: u32 = 10_080;

/// 1970-01-01 was a Thursday; the first Monday is four days later.
const FIRST_MONDAY: i64 = 4 * 86_400;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timeframe {
    minutes: u32,
}

impl Timeframe {
    /// Returns `None` for zero.
    pub fn from_minutes(minutes: u32) -> Option<Self> {
        (minutes > 0).then_some(Self { minutes })
    }

    pub fn minutes(&self) -> u32 {
        self.minutes
    }

    pub fn seconds(&self) -> i64 {
        i64::from(self.minutes) * 60
    }

    /// Start of the bucket containing `timestamp`.
    ///
    /// Buckets are aligned to the Unix epoch, except whole-week timeframes,
    /// which start on Monday 00:00 UTC.
    pub fn bucket_start(&self, timestamp: i64) -> i64 {
        let width = self.seconds();
        let origin = if self.minutes % MINUTES_PER_WEEK == 0 {
            FIRST_MONDAY
        } else {
            0
        };
        (timestamp - origin).div_euclid(width) * width + origin
    }

    /// Checks that candles of `self` can be built from candles of `source`.
    pub fn ensure_resamplable_from(&self, source: Timeframe) -> Result<(), ConvertError> {
        if self.minutes < source.minutes {
            return Err(ConvertError::InvalidTimeframe {
                value: self.to_string(),
                reason: format!("smaller than source timeframe {source}"),
            });
        }
        if self.minutes % source.minutes != 0 {
            return Err(ConvertError::InvalidTimeframe {
                value: self.to_string(),
                reason: format!("not a multiple of source timeframe {source}"),
            });
        }
        Ok(())
    }
}

impl fmt::Display for Timeframe {
    /// Unit chosen by magnitude: under an hour in minutes, under a day in
    /// hours, otherwise days. Falls back to a smaller unit when the chosen
    /// one does not divide evenly.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let m = self.minutes;
        if m >= MINUTES_PER_DAY && m % MINUTES_PER_DAY == 0 {
            write!(f, "{}d", m / MINUTES_PER_DAY)
        } else if m >= MINUTES_PER_HOUR && m % MINUTES_PER_HOUR == 0 {
            write!(f, "{}h", m / MINUTES_PER_HOUR)
        } else {
            write!(f, "{}m", m)
        }
    }
}

impl FromStr for Timeframe {
    type Err = ConvertError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: &str| ConvertError::InvalidTimeframe {
            value: s.to_string(),
            reason: reason.to_string(),
        };

        let trimmed = s.trim();
        let split = trimmed
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(trimmed.len());
        let (digits, unit) = trimmed.split_at(split);
        if digits.is_empty() {
            return Err(invalid("expected a number followed by m, h, d or w"));
        }
        let count: u32 = digits.parse().map_err(|_| invalid("number out of range"))?;

        let scale = match unit {
            "" | "m" => 1,
            "h" => MINUTES_PER_HOUR,
            "d" => MINUTES_PER_DAY,
            "w" => MINUTES_PER_WEEK,
            _ => return Err(invalid("unknown unit (expected m, h, d or w)")),
        };

        let minutes = count
            .checked_mul(scale)
            .ok_or_else(|| invalid("number out of range"))?;
        Timeframe::from_minutes(minutes).ok_or_else(|| invalid("must be greater than zero"))
    }
}
