use thiserror::Error;

/// Report encoding errors
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ReportError {
    /// Input does not fit the report's fixed bit widths
    #[error("Malformed report input ({field}): {reason}")]
    MalformedInput { field: &'static str, reason: String },
}

impl ReportError {
    pub fn malformed(field: &'static str, reason: impl Into<String>) -> Self {
        ReportError::MalformedInput {
            field,
            reason: reason.into(),
        }
    }
}

pub type ReportResult<T> = Result<T, ReportError>;
