#![allow(dead_code)]

use candleconv::domain::candle::Candle;
use candleconv::domain::error::ConvertError;
pub use candleconv::domain::raw_row::RawRow;
use candleconv::ports::candle_port::CandlePort;
use candleconv::ports::row_port::RowPort;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

pub const T0: i64 = 1_609_459_200;

pub struct MockRowPort {
    pub rows: HashMap<PathBuf, Vec<RawRow>>,
    pub errors: HashMap<PathBuf, String>,
    pub reads: RefCell<Vec<PathBuf>>,
}

impl MockRowPort {
    pub fn new() -> Self {
        Self {
            rows: HashMap::new(),
            errors: HashMap::new(),
            reads: RefCell::new(Vec::new()),
        }
    }

    pub fn with_rows(mut self, path: &str, rows: Vec<RawRow>) -> Self {
        self.rows.insert(PathBuf::from(path), rows);
        self
    }

    pub fn with_error(mut self, path: &str, reason: &str) -> Self {
        self.errors.insert(PathBuf::from(path), reason.to_string());
        self
    }
}

impl RowPort for MockRowPort {
    fn read_rows(&self, path: &Path) -> Result<Vec<RawRow>, ConvertError> {
        self.reads.borrow_mut().push(path.to_path_buf());
        if let Some(reason) = self.errors.get(path) {
            return Err(ConvertError::Parse {
                line: 1,
                reason: reason.clone(),
            });
        }
        Ok(self.rows.get(path).cloned().unwrap_or_default())
    }
}

/// Captures written candles instead of touching the filesystem.
pub struct RecordingCandlePort {
    pub written: RefCell<Vec<(PathBuf, Vec<Candle>)>>,
}

impl RecordingCandlePort {
    pub fn new() -> Self {
        Self {
            written: RefCell::new(Vec::new()),
        }
    }
}

impl CandlePort for RecordingCandlePort {
    fn write_candles(&self, candles: &[Candle], path: &Path) -> Result<(), ConvertError> {
        self.written
            .borrow_mut()
            .push((path.to_path_buf(), candles.to_vec()));
        Ok(())
    }
}

pub fn make_row(timestamp: i64, close: f64, volume: f64) -> RawRow {
    RawRow {
        timestamp,
        open: close - 1.0,
        high: close + 2.0,
        low: close - 2.0,
        close,
        volume,
        trades: 1,
    }
}

/// One row per minute starting at `T0`, closes rising by one.
pub fn minute_rows(count: usize) -> Vec<RawRow> {
    (0..count)
        .map(|i| make_row(T0 + 60 * i as i64, 100.0 + i as f64, 1.0 + i as f64))
        .collect()
}

pub fn to_csv(rows: &[RawRow]) -> String {
    rows.iter()
        .map(|r| {
            format!(
                "{},{},{},{},{},{},{}\n",
                r.timestamp, r.open, r.high, r.low, r.close, r.volume, r.trades
            )
        })
        .collect()
}

pub fn write_file(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, content).unwrap();
    path
}

pub fn file_names(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}
