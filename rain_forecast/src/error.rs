//! Error types for the rain_forecast crate

use polars::prelude::PolarsError;
use rain_math::MathError;
use thiserror::Error;

/// Custom error types for the rain_forecast crate
#[derive(Debug, Error)]
pub enum ForecastError {
    /// Not enough records after the cutoff to form a train/validation split
    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    /// Training values have zero spread, so scaling cannot be inverted
    #[error("Degenerate input: {0}")]
    DegenerateInput(String),

    /// Window generation produced no supervised examples
    #[error("Insufficient windows: {0}")]
    InsufficientWindow(String),

    /// Predictions and observations disagree in shape
    #[error("Shape mismatch: expected {expected} values, got {actual}")]
    ShapeMismatch { expected: usize, actual: usize },

    /// Error related to data validation or processing
    #[error("Data error: {0}")]
    DataError(String),

    /// Error from invalid parameters
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Error loading or validating configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Error from IO operations
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Error from Polars operations
    #[error("Polars error: {0}")]
    PolarsError(String),

    /// Error from CSV parsing
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    /// Error encoding or decoding persisted artifacts
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl ForecastError {
    /// Whether the error only concerns the station being processed.
    ///
    /// Station-local errors are collected by the batch runner; everything
    /// else aborts the run.
    pub fn is_station_local(&self) -> bool {
        matches!(
            self,
            ForecastError::InsufficientData(_)
                | ForecastError::DegenerateInput(_)
                | ForecastError::InsufficientWindow(_)
                | ForecastError::DataError(_)
        )
    }
}

/// Result type with our custom error
pub type Result<T> = std::result::Result<T, ForecastError>;

impl From<PolarsError> for ForecastError {
    fn from(err: PolarsError) -> Self {
        ForecastError::PolarsError(err.to_string())
    }
}

impl From<MathError> for ForecastError {
    fn from(err: MathError) -> Self {
        match err {
            MathError::LengthMismatch { left, right } => ForecastError::ShapeMismatch {
                expected: right,
                actual: left,
            },
            MathError::InsufficientData(msg) => ForecastError::InsufficientData(msg),
            MathError::InvalidInput(msg) => ForecastError::InvalidParameter(msg),
        }
    }
}

impl From<serde_json::Error> for ForecastError {
    fn from(err: serde_json::Error) -> Self {
        ForecastError::Serialization(err.to_string())
    }
}

impl From<bincode::Error> for ForecastError {
    fn from(err: bincode::Error) -> Self {
        ForecastError::Serialization(err.to_string())
    }
}

impl From<toml::de::Error> for ForecastError {
    fn from(err: toml::de::Error) -> Self {
        ForecastError::Config(err.to_string())
    }
}
