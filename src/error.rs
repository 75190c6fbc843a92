use thiserror::Error;

/// Boxed error returned by source adapters. Kept opaque so adapters can surface
/// whatever their storage layer produces.
pub type AdapterError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("Source '{source_name}' is unavailable: {cause}")]
    SourceUnavailable {
        source_name: String,
        #[source]
        cause: AdapterError,
    },

    #[error("Invalid filter: {0}")]
    InvalidFilter(String),

    #[error("Invalid limit {0}: must not be negative")]
    InvalidLimit(i64),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Category totals ({category_total}) do not match {against} ({expected}), difference {difference}")]
    TotalsMismatch {
        against: String,
        category_total: f64,
        expected: f64,
        difference: f64,
    },

    #[error("Date calculation error: {0}")]
    DateError(String),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// A source row that could not be turned into a canonical record.
///
/// Never returned to callers of the engine: the merge stage logs and drops it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MalformedRow {
    #[error("{source_name} row has no id")]
    MissingId { source_name: &'static str },

    #[error("{source_name} row '{record_id}' has no date")]
    MissingDate {
        source_name: &'static str,
        record_id: String,
    },
}

pub type Result<T> = std::result::Result<T, LedgerError>;
