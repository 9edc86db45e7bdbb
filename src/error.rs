//! Error type shared by the library

use thiserror::Error;

/// Errors raised while building a run. The waterfall itself never fails once
/// an engine has been constructed.
#[derive(Debug, Error)]
pub enum FidcError {
    #[error("invalid assumption: {field} ({reason})")]
    InvalidAssumption { field: String, reason: String },

    #[error("invalid curve: {0}")]
    InvalidCurve(String),

    #[error("no curve supplied for floating coupons or a curve-priced asset rate")]
    MissingCurve,

    #[error("date out of range: {0}")]
    DateOutOfRange(String),

    #[error("could not parse date '{value}': {source}")]
    DateParse {
        value: String,
        #[source]
        source: chrono::ParseError,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl FidcError {
    pub fn invalid_assumption(field: &str, reason: impl Into<String>) -> Self {
        FidcError::InvalidAssumption {
            field: field.to_string(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, FidcError>;
