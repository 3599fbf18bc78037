//! Output file naming from Kraken-style `<ASSET><FIAT>_<minutes>.csv` names.

use crate::domain::error::PatternMismatch;
use crate::domain::timeframe::Timeframe;
use std::fmt;

pub const INPUT_EXTENSION: &str = "csv";
pub const OUTPUT_EXTENSION: &str = "json";

/// Asset pair and timeframe recovered from an input file name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputName {
    pub asset: String,
    pub fiat: String,
    pub timeframe: Timeframe,
}

impl OutputName {
    /// Same pair, different timeframe.
    pub fn with_timeframe(&self, timeframe: Timeframe) -> Self {
        Self {
            timeframe,
            ..self.clone()
        }
    }

    pub fn file_name(&self) -> String {
        format!("{self}.{OUTPUT_EXTENSION}")
    }
}

impl fmt::Display for OutputName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}-{}", self.asset, self.fiat, self.timeframe)
    }
}

/// Splits `BTCEUR_60.csv` with fiat `EUR` into asset `BTC` and a 60-minute
/// timeframe.
pub fn derive_output_name(file_name: &str, fiat: &str) -> Result<OutputName, PatternMismatch> {
    let stem = file_name
        .strip_suffix(INPUT_EXTENSION)
        .and_then(|s| s.strip_suffix('.'))
        .ok_or_else(|| PatternMismatch::new(file_name, "missing .csv extension"))?;

    let (pair, minutes) = stem
        .rsplit_once('_')
        .ok_or_else(|| PatternMismatch::new(file_name, "no _<minutes> suffix"))?;

    if fiat.is_empty() {
        return Err(PatternMismatch::new(file_name, "empty fiat symbol"));
    }
    let asset = pair
        .strip_suffix(fiat)
        .ok_or_else(|| PatternMismatch::new(file_name, format!("pair does not end in {fiat}")))?;
    if asset.is_empty() {
        return Err(PatternMismatch::new(file_name, "empty base asset"));
    }

    if minutes.is_empty() || !minutes.bytes().all(|b| b.is_ascii_digit()) {
        return Err(PatternMismatch::new(
            file_name,
            format!("timeframe {minutes:?} is not a whole number of minutes"),
        ));
    }
    let timeframe = minutes
        .parse()
        .ok()
        .and_then(Timeframe::from_minutes)
        .ok_or_else(|| PatternMismatch::new(file_name, format!("invalid timeframe {minutes}")))?;

    Ok(OutputName {
        asset: asset.to_string(),
        fiat: fiat.to_string(),
        timeframe,
    })
}
