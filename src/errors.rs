use thiserror::Error;

use crate::ledger::SummaryField;

/// Error type that captures common ledger failures.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("Persistence error: {0}")]
    Persistence(String),
    #[error("Validation failed: {0}")]
    Validation(String),
    #[error("Summary field `{0}` is derived and cannot be set directly")]
    ReadOnlyField(SummaryField),
    #[error("Unknown summary field: {0}")]
    UnknownField(String),
    #[error("Duplicate item id: {0}")]
    DuplicateId(String),
}
