//! Error types for ingestro-core

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in ingestro-core
///
/// Validation failures are not errors: they are recorded per cell in
/// [`DataRow::errors`](crate::table::DataRow::errors).
#[derive(Debug, Error)]
pub enum Error {
    /// Input is larger than the configured limit
    #[error("input of {size} bytes exceeds the {max} byte limit")]
    SizeExceeded { size: u64, max: u64 },

    /// Input has no content at all
    #[error("input is empty")]
    EmptyInput,

    /// Input is not valid JSON
    #[error("invalid JSON: {0}")]
    Decode(#[source] serde_json::Error),

    /// Top-level JSON value is not an array
    #[error("JSON must be an array")]
    NotAnArray,

    /// Top-level array has no elements
    #[error("array contains no data")]
    EmptyArray,

    /// A record is not a flat object
    #[error("record {index} is not a flat object: nested objects/arrays are not supported")]
    UnsupportedShape { index: usize },

    /// Failed to read a file
    #[error("failed to read file '{path}': {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Column does not exist in the table
    #[error("column '{0}' not found")]
    UnknownColumn(String),

    /// Text could not be turned into a cell edit
    #[error("invalid cell input '{input}': {message}")]
    InvalidCellInput { input: String, message: String },

    /// Export format name not recognised
    #[error("unsupported export format '{0}' (expected json or csv)")]
    UnsupportedFormat(String),

    /// Directory traversal error
    #[error("failed to traverse directory: {0}")]
    WalkDir(#[from] walkdir::Error),

    /// CSV writer error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Whether this error came from rejecting the input payload itself
    pub fn is_input_rejection(&self) -> bool {
        matches!(
            self,
            Error::SizeExceeded { .. }
                | Error::EmptyInput
                | Error::Decode(_)
                | Error::NotAnArray
                | Error::EmptyArray
                | Error::UnsupportedShape { .. }
        )
    }
}
