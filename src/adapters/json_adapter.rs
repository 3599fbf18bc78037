//! JSON candle file adapter: an array of `[date, open, high, low, close, volume]`.

use crate::domain::candle::Candle;
use crate::domain::error::ConvertError;
use crate::ports::candle_port::CandlePort;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

#[derive(Debug, Default, Clone, Copy)]
pub struct JsonAdapter;

impl JsonAdapter {
    pub fn new() -> Self {
        Self
    }

    pub fn write_to<W: Write>(candles: &[Candle], writer: W) -> Result<(), ConvertError> {
        let mut writer = BufWriter::new(writer);
        serde_json::to_writer(&mut writer, candles)?;
        writer.flush()?;
        Ok(())
    }

    pub fn to_json_string(candles: &[Candle]) -> Result<String, ConvertError> {
        Ok(serde_json::to_string(candles)?)
    }
}

impl CandlePort for JsonAdapter {
    fn write_candles(&self, candles: &[Candle], path: &Path) -> Result<(), ConvertError> {
        let file = File::create(path)?;
        Self::write_to(candles, file)
    }
}
