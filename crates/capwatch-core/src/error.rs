use thiserror::Error;

use crate::data_source::SourceError;

/// Validation errors for user-supplied and provider-supplied values.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("symbol cannot be empty")]
    EmptySymbol,
    #[error("symbol length {len} exceeds max {max}")]
    SymbolTooLong { len: usize, max: usize },
    #[error("symbol must start with an ASCII letter: '{ch}'")]
    SymbolInvalidStart { ch: char },
    #[error("symbol contains invalid character '{ch}' at index {index}")]
    SymbolInvalidChar { ch: char, index: usize },

    #[error("page index is 1-based and must be greater than zero")]
    ZeroPage,
    #[error("page size must be greater than zero")]
    ZeroPageSize,

    #[error("unix timestamp {value} is out of range")]
    TimestampOutOfRange { value: i64 },
}

/// Bulk-resource failures that cross the pipeline boundary.
///
/// Per-symbol failures never show up here; they are absorbed by the fetcher as
/// missing values.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PipelineError {
    #[error("symbol directory could not be loaded: {0}")]
    DirectoryUnavailable(SourceError),

    #[error("no market cap could be fetched for any of {attempted} ranked symbols: {last_error}")]
    RankingUnavailable {
        attempted: usize,
        last_error: SourceError,
    },

    #[error("pipeline session has shut down")]
    SessionClosed,
}

/// Configuration errors raised while reading the environment.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing API key; set {key}")]
    MissingApiKey { key: &'static str },

    #[error("invalid value for {key}: '{value}'")]
    InvalidValue { key: &'static str, value: String },
}
