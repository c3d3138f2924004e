//! Evaluation of a trained model against the held-out validation region

use crate::data::TimeSeries;
use crate::error::{ForecastError, Result};
use crate::models::TrainedForecaster;
use crate::scaler::FittedScaler;
use chrono::NaiveDate;
use rain_math::metrics::{mean_absolute_error, root_mean_squared_error};
use serde::{Deserialize, Serialize};
use std::fmt;

/// What the model is fed when predicting the validation region
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EvalInput {
    /// The validation values themselves, `n_future` long
    #[default]
    ValidationTail,
    /// The `n_past` training values immediately before the validation region
    PrecedingWindow,
}

/// Predictions and observations aligned to the validation timestamps
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationResult {
    /// Model output in millimetres
    pub predictions: Vec<f64>,
    /// Observed rainfall in millimetres
    pub validation: Vec<f64>,
    /// Timestamps shared by `predictions` and `validation`
    pub timestamps: Vec<NaiveDate>,
    /// Root mean squared error over the whole horizon
    pub rmse: f64,
    /// Mean absolute error over the whole horizon
    pub mae: f64,
}

impl EvaluationResult {
    pub fn len(&self) -> usize {
        self.predictions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.predictions.is_empty()
    }

    /// `validation - predictions` at each timestamp
    pub fn difference(&self) -> Vec<f64> {
        self.validation
            .iter()
            .zip(self.predictions.iter())
            .map(|(v, p)| v - p)
            .collect()
    }
}

impl fmt::Display for EvaluationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Validation Metrics:")?;
        writeln!(f, "  Horizon: {} months", self.len())?;
        writeln!(f, "  RMSE:    {:.4} mm", self.rmse)?;
        writeln!(f, "  MAE:     {:.4} mm", self.mae)?;
        Ok(())
    }
}

/// Root mean squared error over two flattened, equally long series
pub fn compute_rmse(predictions: &[f64], validation: &[f64]) -> Result<f64> {
    Ok(root_mean_squared_error(predictions, validation)?)
}

/// Evaluate by feeding the validation values back to the model.
///
/// The validation tail is scaled with the training scaler, passed to the
/// model as its input window, and the output is mapped back to millimetres.
pub fn evaluate<M>(model: &M, scaler: &FittedScaler, validation: &TimeSeries) -> Result<EvaluationResult>
where
    M: TrainedForecaster + ?Sized,
{
    evaluate_with_input(model, scaler, &validation.values(), validation)
}

/// Evaluate with an explicit raw (unscaled) input window.
///
/// A prediction whose length differs from the validation region is an
/// internal invariant violation and is reported as `ShapeMismatch`; nothing
/// is truncated or padded.
pub fn evaluate_with_input<M>(
    model: &M,
    scaler: &FittedScaler,
    input: &[f64],
    validation: &TimeSeries,
) -> Result<EvaluationResult>
where
    M: TrainedForecaster + ?Sized,
{
    if validation.is_empty() {
        return Err(ForecastError::InsufficientData(
            "Validation region is empty".to_string(),
        ));
    }

    let scaled_input = scaler.forward(input);
    let raw = model.predict(&scaled_input)?;
    let predictions = scaler.inverse(&raw);
    if predictions.iter().any(|p| !p.is_finite()) {
        return Err(ForecastError::DegenerateInput(format!(
            "{} produced non-finite predictions",
            model.name()
        )));
    }
    let observed = validation.values();

    if predictions.len() != observed.len() {
        return Err(ForecastError::ShapeMismatch {
            expected: observed.len(),
            actual: predictions.len(),
        });
    }

    let rmse = compute_rmse(&predictions, &observed)?;
    let mae = mean_absolute_error(&predictions, &observed)?;

    Ok(EvaluationResult {
        predictions,
        validation: observed,
        timestamps: validation.timestamps(),
        rmse,
        mae,
    })
}
