//! # Rain Forecast
//!
//! A Rust library for forecasting monthly rainfall per weather station.
//!
//! ## Features
//!
//! - Station series loading from CSV (polars) or memory
//! - Cutoff-based train/validation splitting
//! - Standard and min-max scaling fitted on training data only
//! - Sliding past/future window generation
//! - LSTM forecaster trained with backpropagation through time
//! - RMSE/MAE evaluation against the held-out tail
//! - Per-station result store and a read interface for dashboards
//! - Batch runner that isolates per-station data failures
//!
//! ## Quick Start
//!
//! ```rust
//! use chrono::NaiveDate;
//! use rain_forecast::{FittedScaler, ScalerKind, TimeSeries, WindowSet};
//!
//! # fn main() -> rain_forecast::error::Result<()> {
//! let start = NaiveDate::from_ymd_opt(2000, 1, 15).unwrap();
//! let values: Vec<f64> = (0..36).map(|i| (i % 12) as f64 * 5.0).collect();
//! let series = TimeSeries::monthly(start, values)?;
//!
//! let split = rain_forecast::split::split(&series, start, 6)?;
//! let scaler = FittedScaler::fit(ScalerKind::Standard, &split.train.values())?;
//! let windows = WindowSet::generate(&scaler.forward(&split.train.values()), 12, 6)?;
//! assert_eq!(windows.len(), 30 - 12 - 6 + 1);
//! # Ok(())
//! # }
//! ```
//!
//! Full runs go through [`pipeline::run_batch`] with an [`LstmForecaster`]
//! and a [`ResultStore`].

pub mod config;
pub mod dashboard;
pub mod data;
pub mod error;
pub mod evaluate;
pub mod models;
pub mod pipeline;
pub mod scaler;
pub mod split;
pub mod store;
pub mod window;

// Re-export commonly used types
pub use crate::config::PipelineConfig;
pub use crate::data::{CsvSeriesLoader, InMemorySource, Observation, SeriesSource, TimeSeries};
pub use crate::error::ForecastError;
pub use crate::evaluate::{EvalInput, EvaluationResult};
pub use crate::models::{
    Forecaster, LstmConfig, LstmForecaster, TrainedForecaster, TrainedLstm, TrainingMetrics,
};
pub use crate::pipeline::{run_batch, run_station, BatchReport};
pub use crate::scaler::{FittedScaler, ScalerKind};
pub use crate::split::SplitResult;
pub use crate::store::{ResultBundle, ResultStore, StationResults};
pub use crate::window::{Window, WindowSet};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
