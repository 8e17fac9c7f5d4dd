use serde::Serialize;
use std::fmt;

/// A single field-level problem found while validating a raw report record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationError {
    /// Position of the record in its ingestion batch.
    pub index: usize,
    /// Normalized ticker, when the record had a usable one.
    pub ticker: Option<String>,
    /// Dotted field path, e.g. `basic_info.current_price` or `news[1].title`.
    pub field: String,
    pub reason: String,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.ticker {
            Some(ticker) => write!(
                f,
                "record #{} ({ticker}): {}: {}",
                self.index, self.field, self.reason
            ),
            None => write!(f, "record #{}: {}: {}", self.index, self.field, self.reason),
        }
    }
}

impl std::error::Error for ValidationError {}
