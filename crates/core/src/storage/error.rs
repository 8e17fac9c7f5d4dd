use crate::domain::ValidationError;
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum StoreError {
    NotFound { ticker: String },
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::NotFound { ticker } => write!(f, "no report for ticker {ticker}"),
        }
    }
}

impl std::error::Error for StoreError {}

/// Whole-batch ingestion failure. The store is unchanged when this is returned.
#[derive(Debug, Clone, PartialEq)]
pub enum IngestError {
    /// Strict mode and at least one record failed validation.
    Strict { errors: Vec<ValidationError> },
    /// The input was not a sequence of records at all.
    Malformed { detail: String },
}

impl IngestError {
    pub fn validation_errors(&self) -> &[ValidationError] {
        match self {
            IngestError::Strict { errors } => errors,
            IngestError::Malformed { .. } => &[],
        }
    }
}

impl fmt::Display for IngestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IngestError::Strict { errors } => {
                write!(
                    f,
                    "strict ingest rejected batch: {} validation error(s)",
                    errors.len()
                )?;
                if let Some(first) = errors.first() {
                    write!(f, "; first: {first}")?;
                }
                Ok(())
            }
            IngestError::Malformed { detail } => write!(f, "malformed ingest batch: {detail}"),
        }
    }
}

impl std::error::Error for IngestError {}
