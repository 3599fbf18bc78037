//! Domain error types.

/// A file name that does not encode `<ASSET><FIAT>_<minutes>.csv`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{name} does not match <ASSET><FIAT>_<minutes>.csv: {reason}")]
pub struct PatternMismatch {
    pub name: String,
    pub reason: String,
}

impl PatternMismatch {
    pub fn new(name: &str, reason: impl Into<String>) -> Self {
        Self {
            name: name.to_string(),
            reason: reason.into(),
        }
    }
}

/// Top-level error type for candleconv.
#[derive(Debug, thiserror::Error)]
pub enum ConvertError {
    #[error("{path} is neither a file nor a directory")]
    NotAFile { path: String },

    #[error(transparent)]
    PatternMismatch(#[from] PatternMismatch),

    #[error("parse error on line {line}: {reason}")]
    Parse { line: u64, reason: String },

    #[error("timestamp {timestamp} is outside the representable date range")]
    TimestampOutOfRange { timestamp: i64 },

    #[error("invalid timeframe {value:?}: {reason}")]
    InvalidTimeframe { value: String, reason: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("invalid config value {key}: {reason}")]
    ConfigInvalid { key: String, reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<&ConvertError> for std::process::ExitCode {
    fn from(err: &ConvertError) -> Self {
        let code: u8 = match err {
            ConvertError::Io(_) | ConvertError::Csv(_) | ConvertError::Json(_) => 1,
            ConvertError::ConfigParse { .. } | ConvertError::ConfigInvalid { .. } => 2,
            ConvertError::NotAFile { .. } => 3,
            ConvertError::PatternMismatch(_) => 4,
            ConvertError::Parse { .. } | ConvertError::TimestampOutOfRange { .. } => 5,
            ConvertError::InvalidTimeframe { .. } => 6,
        };
        std::process::ExitCode::from(code)
    }
}
