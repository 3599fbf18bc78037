//! Candle sink port trait.

use crate::domain::candle::Candle;
use crate::domain::error::ConvertError;
use std::path::Path;

pub trait CandlePort {
    /// Writes `candles` to `path`, replacing any existing file.
    fn write_candles(&self, candles: &[Candle], path: &Path) -> Result<(), ConvertError>;
}
