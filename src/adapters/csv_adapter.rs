//! Headerless OHLCVT CSV file adapter.

use crate::domain::error::ConvertError;
use crate::domain::raw_row::{COLUMN_COUNT, COLUMNS, RawRow};
use crate::ports::row_port::RowPort;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::str::FromStr;

/// Reads `timestamp,open,high,low,close,volume,trades` rows with no header.
#[derive(Debug, Default, Clone, Copy)]
pub struct CsvAdapter;

impl CsvAdapter {
    pub fn new() -> Self {
        Self
    }

    /// Parses every row from `reader`.
    ///
    /// Rows with an empty or non-finite field are skipped. Any other malformed row
    /// aborts the whole read with the offending line number.
    pub fn parse_rows<R: Read>(reader: R) -> Result<Vec<RawRow>, ConvertError> {
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let mut rows = Vec::new();
        let mut null_rows = 0usize;

        for result in rdr.records() {
            let record = result.map_err(malformed_text)?;
            let line = record.position().map(|p| p.line()).unwrap_or(0);

            if record.len() != COLUMN_COUNT {
                return Err(ConvertError::Parse {
                    line,
                    reason: format!("expected {} columns, found {}", COLUMN_COUNT, record.len()),
                });
            }
            if record.iter().any(str::is_empty) {
                null_rows += 1;
                continue;
            }

            let timestamp: i64 = parse_field(&record, 0, line)?;
            let open: f64 = parse_field(&record, 1, line)?;
            let high: f64 = parse_field(&record, 2, line)?;
            let low: f64 = parse_field(&record, 3, line)?;
            let close: f64 = parse_field(&record, 4, line)?;
            let volume: f64 = parse_field(&record, 5, line)?;
            let trades: u64 = parse_field(&record, 6, line)?;

            if [open, high, low, close, volume].iter().any(|v| !v.is_finite()) {
                null_rows += 1;
                continue;
            }

            let row = RawRow {
                timestamp,
                open,
                high,
                low,
                close,
                volume,
                trades,
            };
            if row.date().is_none() {
                return Err(ConvertError::Parse {
                    line,
                    reason: format!("timestamp {timestamp} is out of range"),
                });
            }
            rows.push(row);
        }

        if null_rows > 0 {
            tracing::debug!(null_rows, "skipped rows with empty or non-finite fields");
        }
        Ok(rows)
    }
}

/// Invalid UTF-8 is a malformed row like any other; everything else stays a CSV error.
fn malformed_text(err: csv::Error) -> ConvertError {
    let utf8 = match err.kind() {
        csv::ErrorKind::Utf8 { pos, err: utf8_err } => {
            Some((pos.as_ref().map(|p| p.line()).unwrap_or(0), utf8_err.field()))
        }
        _ => None,
    };
    match utf8 {
        Some((line, field)) => ConvertError::Parse {
            line,
            reason: format!(
                "invalid UTF-8 in {} column",
                COLUMNS.get(field).copied().unwrap_or("unknown")
            ),
        },
        None => ConvertError::Csv(err),
    }
}

fn parse_field<T: FromStr>(record: &csv::StringRecord, index: usize, line: u64) -> Result<T, ConvertError> {
    let raw = record.get(index).unwrap_or_default();
    raw.parse().map_err(|_| ConvertError::Parse {
        line,
        reason: format!("invalid {} value {:?}", COLUMNS[index], raw),
    })
}

impl RowPort for CsvAdapter {
    fn read_rows(&self, path: &Path) -> Result<Vec<RawRow>, ConvertError> {
        let file = File::open(path)?;
        Self::parse_rows(file)
    }
}
