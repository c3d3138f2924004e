//! Per-station pipeline and the batch runner over all configured stations

use crate::config::PipelineConfig;
use crate::data::SeriesSource;
use crate::error::{ForecastError, Result};
use crate::evaluate::{evaluate, evaluate_with_input, EvalInput};
use crate::models::{Forecaster, TrainedForecaster};
use crate::scaler::FittedScaler;
use crate::split::{split, split_at_date};
use crate::store::{ResultBundle, ResultStore, StationResults};
use crate::window::WindowSet;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{info, warn};

/// A station that was skipped, with the reason
#[derive(Debug)]
pub struct StationFailure {
    pub station: String,
    pub error: ForecastError,
}

/// Outcome of a batch run
#[derive(Debug)]
pub struct BatchReport<M> {
    /// Completed stations, keyed by station identifier
    pub bundles: BTreeMap<String, ResultBundle<M>>,
    /// Stations that failed with a station-local error
    pub failures: Vec<StationFailure>,
}

impl<M> BatchReport<M> {
    pub fn succeeded(&self) -> usize {
        self.bundles.len()
    }

    pub fn failed(&self) -> usize {
        self.failures.len()
    }

    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

impl<M> Default for BatchReport<M> {
    fn default() -> Self {
        Self {
            bundles: BTreeMap::new(),
            failures: Vec::new(),
        }
    }
}

/// Run load, split, scale, window, train and evaluate for one station.
///
/// The scaler is fitted on the training region only; the validation region
/// is never seen before evaluation.
pub fn run_station<S, F>(
    config: &PipelineConfig,
    station: &str,
    source: &S,
    forecaster: &F,
) -> Result<ResultBundle<F::Trained>>
where
    S: SeriesSource + ?Sized,
    F: Forecaster,
{
    let shape = config.window_shape()?;

    let series = source.load(station)?;
    info!(station, records = series.len(), "loaded series");

    let parts = match config.validation_start {
        Some(start) => split_at_date(&series, config.cutoff, start)?,
        None => split(&series, config.cutoff, shape.n_future)?,
    };
    if parts.retained() < shape.span() {
        return Err(ForecastError::InsufficientData(format!(
            "{} records on or after {}, need at least n_past + n_future = {}",
            parts.retained(),
            config.cutoff,
            shape.span()
        )));
    }
    if parts.validation.len() != shape.n_future {
        return Err(ForecastError::InsufficientData(format!(
            "validation region holds {} records, horizon is {}",
            parts.validation.len(),
            shape.n_future
        )));
    }
    info!(
        station,
        train = parts.train.len(),
        validation = parts.validation.len(),
        "split series"
    );

    let train_values = parts.train.values();
    let scaler = FittedScaler::fit(config.scaler, &train_values)?;
    info!(
        station,
        kind = %scaler.kind(),
        center = scaler.center(),
        scale = scaler.scale(),
        "fitted scaler"
    );

    let windows = WindowSet::generate(&scaler.forward(&train_values), shape.n_past, shape.n_future)?;
    info!(station, windows = windows.len(), "generated windows");

    let (model, training) = forecaster.train(&windows, config.epochs)?;
    if let Some(last) = training.last() {
        info!(
            station,
            epochs = training.len(),
            loss = last.loss,
            accuracy = last.accuracy,
            "trained model"
        );
    }

    let evaluation = match config.eval_input {
        EvalInput::ValidationTail => evaluate(&model, &scaler, &parts.validation)?,
        EvalInput::PrecedingWindow => {
            let start = train_values.len().saturating_sub(shape.n_past);
            evaluate_with_input(&model, &scaler, &train_values[start..], &parts.validation)?
        }
    };
    info!(station, rmse = evaluation.rmse, mae = evaluation.mae, "evaluated model");

    let results = StationResults {
        station: station.to_string(),
        model_name: model.name().to_string(),
        shape,
        cutoff: config.cutoff,
        scaler,
        training,
        evaluation,
        train_series: parts.train,
        validation_series: parts.validation,
    };
    Ok(ResultBundle { model, results })
}

/// Run every configured station in order.
///
/// Station-local failures are recorded and the batch moves on. Any other
/// error aborts the run. Bundles are persisted as they complete when a
/// store is given.
pub fn run_batch<S, F>(
    config: &PipelineConfig,
    source: &S,
    forecaster: &F,
    store: Option<&ResultStore>,
) -> Result<BatchReport<F::Trained>>
where
    S: SeriesSource + ?Sized,
    F: Forecaster,
    F::Trained: Serialize,
{
    config.validate()?;
    let mut report = BatchReport::default();

    for station in &config.stations {
        match run_station(config, station, source, forecaster) {
            Ok(bundle) => {
                if let Some(store) = store {
                    store.save(&bundle)?;
                }
                report.bundles.insert(station.clone(), bundle);
            }
            Err(error) if error.is_station_local() => {
                warn!(station = %station, %error, "skipping station");
                report.failures.push(StationFailure {
                    station: station.clone(),
                    error,
                });
            }
            Err(error) => return Err(error),
        }
    }

    info!(
        succeeded = report.succeeded(),
        failed = report.failed(),
        "batch finished"
    );
    Ok(report)
}
