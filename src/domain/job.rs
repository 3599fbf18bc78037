//! Conversion jobs: one input file, one target timeframe, one output file.

use crate::domain::error::ConvertError;
use crate::domain::naming::OutputName;
use crate::domain::timeframe::Timeframe;
use std::path::{Path, PathBuf};

pub const DEFAULT_FIAT: &str = "EUR";

/// Resolved run settings, after merging flags, config file and defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub fiat: String,
    pub timeframes: Vec<Timeframe>,
    pub output: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            fiat: DEFAULT_FIAT.to_string(),
            timeframes: Vec::new(),
            output: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionJob {
    pub input_path: PathBuf,
    pub fiat: String,
    /// Timeframe encoded in the input file name, when known.
    pub source: Option<Timeframe>,
    /// Bucket width to aggregate into; `None` maps rows 1:1.
    pub resample_to: Option<Timeframe>,
    pub output_path: PathBuf,
}

impl ConversionJob {
    /// Builds one job per requested timeframe, or a single 1:1 job when none
    /// is requested, writing derived file names into `output_dir`.
    pub fn for_named_input(
        input_path: &Path,
        name: &OutputName,
        targets: &[Timeframe],
        output_dir: &Path,
    ) -> Result<Vec<Self>, ConvertError> {
        if targets.is_empty() {
            return Ok(vec![Self {
                input_path: input_path.to_path_buf(),
                fiat: name.fiat.clone(),
                source: Some(name.timeframe),
                resample_to: None,
                output_path: output_dir.join(name.file_name()),
            }]);
        }

        targets
            .iter()
            .map(|&target| {
                target.ensure_resamplable_from(name.timeframe)?;
                Ok(Self {
                    input_path: input_path.to_path_buf(),
                    fiat: name.fiat.clone(),
                    source: Some(name.timeframe),
                    resample_to: (target != name.timeframe).then_some(target),
                    output_path: output_dir.join(name.with_timeframe(target).file_name()),
                })
            })
            .collect()
    }
}
