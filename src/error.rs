use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("Unsupported time range mode '{0}': expected 'relative' or 'month'")]
    InvalidTimeRangeMode(String),

    #[error("Invalid relative range value '{0}': expected a non-negative number of months")]
    InvalidRelativeValue(String),

    #[error("Invalid month label '{0}': expected '<MonthName> <Year>'")]
    InvalidMonthLabel(String),

    #[error("Date calculation error: {0}")]
    DateError(String),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ReportError>;
