//! Domain error types.

use chrono::NaiveDate;

/// Top-level error type for zonetrader.
#[derive(Debug, thiserror::Error)]
pub enum ZonetraderError {
    #[error("data error: {reason}")]
    Data { reason: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("invalid zone table for {code}: {reason}")]
    ZoneConfig { code: String, reason: String },

    #[error("invalid bar for {code} on {date}: {reason}")]
    InvalidBar {
        code: String,
        date: NaiveDate,
        reason: String,
    },

    #[error("no data for {code}")]
    NoData { code: String },

    #[error("insufficient data for {code}: have {bars} bars, need {minimum}")]
    InsufficientData {
        code: String,
        bars: usize,
        minimum: usize,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<&ZonetraderError> for std::process::ExitCode {
    fn from(err: &ZonetraderError) -> Self {
        let code: u8 = match err {
            ZonetraderError::Io(_) => 1,
            ZonetraderError::ConfigParse { .. }
            | ZonetraderError::ConfigMissing { .. }
            | ZonetraderError::ConfigInvalid { .. } => 2,
            ZonetraderError::Data { .. } => 3,
            ZonetraderError::ZoneConfig { .. } => 4,
            ZonetraderError::NoData { .. }
            | ZonetraderError::InsufficientData { .. }
            | ZonetraderError::InvalidBar { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}
