//! # Rain Math
//!
//! Numeric primitives shared by the rainfall forecasting pipeline.
//! This crate provides the error metrics used to score forecasts and the
//! index arithmetic behind supervised past/future windows.

use thiserror::Error;

pub mod metrics;
pub mod windows;

pub use windows::WindowShape;

/// Errors that can occur in forecasting math
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MathError {
    #[error("Insufficient data for calculation: {0}")]
    InsufficientData(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Length mismatch: left has {left} values, right has {right}")]
    LengthMismatch { left: usize, right: usize },
}

/// Result type for forecasting math operations
pub type Result<T> = std::result::Result<T, MathError>;
