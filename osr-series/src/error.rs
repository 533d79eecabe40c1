/// Error types for series loading
use thiserror::Error;

/// Main error type for loading per-year series.
///
/// Only [`SeriesError::Configuration`] escapes the public loaders. The other
/// variants are raised while reading and are recovered into an unavailable
/// series or a recorded [`crate::year_series::RowIssue`].
#[derive(Error, Debug)]
pub enum SeriesError {
    /// The per-year file is missing or unreadable
    #[error("No data for {source_name} {year}: {reason}")]
    SourceUnavailable {
        source_name: String,
        year: i32,
        reason: String,
    },

    /// A row failed schema validation
    #[error("Malformed row at line {line}: {reason}")]
    MalformedRow { line: u64, reason: String },

    /// The caller asked for something that cannot exist
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Failed to parse CSV data
    #[error("Failed to parse CSV: {0}")]
    CsvParse(#[from] csv::Error),

    /// Failed to read a source file
    #[error("Failed to read source file: {0}")]
    Io(#[from] std::io::Error),
}

/// Type alias for Results using SeriesError
pub type Result<T> = std::result::Result<T, SeriesError>;
