use osr_series::SeriesError;
use thiserror::Error;

/// Errors raised by the engine. All of them are caller mistakes; missing
/// or thin data never produces one.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Lag of {0} days is outside 0..=364")]
    InvalidLag(i64),

    #[error("Percentile {0} is outside 0..=100")]
    InvalidPercentile(f64),

    #[error("Counting mode {mode:?} needs a group size on every report, {missing} lack one")]
    UnsupportedCountingMode { mode: String, missing: usize },

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error(transparent)]
    Series(#[from] SeriesError),
}

pub type Result<T> = std::result::Result<T, EngineError>;
