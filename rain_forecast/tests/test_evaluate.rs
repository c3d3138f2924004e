use approx::assert_relative_eq;
use chrono::NaiveDate;
use pretty_assertions::assert_eq;
use rain_forecast::error::{ForecastError, Result};
use rain_forecast::evaluate::{compute_rmse, evaluate, evaluate_with_input};
use rain_forecast::{FittedScaler, ScalerKind, TimeSeries, TrainedForecaster};

/// Returns its input unchanged
#[derive(Debug)]
struct Echo;

impl TrainedForecaster for Echo {
    fn predict(&self, past: &[f64]) -> Result<Vec<f64>> {
        Ok(past.to_vec())
    }

    fn horizon(&self) -> usize {
        0
    }

    fn name(&self) -> &str {
        "echo"
    }
}

/// Predicts a fixed scaled value for every month
#[derive(Debug)]
struct Constant {
    value: f64,
    horizon: usize,
}

impl TrainedForecaster for Constant {
    fn predict(&self, _past: &[f64]) -> Result<Vec<f64>> {
        Ok(vec![self.value; self.horizon])
    }

    fn horizon(&self) -> usize {
        self.horizon
    }

    fn name(&self) -> &str {
        "constant"
    }
}

fn validation_series() -> TimeSeries {
    let start = NaiveDate::from_ymd_opt(2017, 1, 15).unwrap();
    TimeSeries::monthly(start, vec![40.0, 65.0, 12.0, 90.0, 33.0, 51.0]).unwrap()
}

fn scaler() -> FittedScaler {
    FittedScaler::fit(ScalerKind::Standard, &[10.0, 30.0, 50.0, 70.0, 90.0]).unwrap()
}

#[test]
fn test_perfect_model_has_zero_error() {
    let validation = validation_series();
    let result = evaluate(&Echo, &scaler(), &validation).unwrap();

    assert_eq!(result.len(), 6);
    assert_eq!(result.timestamps, validation.timestamps());
    assert_relative_eq!(result.rmse, 0.0, epsilon = 1e-9);
    assert_relative_eq!(result.mae, 0.0, epsilon = 1e-9);
}

#[test]
fn test_predictions_are_returned_in_millimetres() {
    let scaler = scaler();
    let model = Constant { value: 0.0, horizon: 6 };
    let result = evaluate(&model, &scaler, &validation_series()).unwrap();

    // Scaled zero is the training mean
    for prediction in &result.predictions {
        assert_relative_eq!(*prediction, 50.0, epsilon = 1e-9);
    }

    let expected_mae = [10.0, 15.0, 38.0, 40.0, 17.0, 1.0].iter().sum::<f64>() / 6.0;
    assert_relative_eq!(result.mae, expected_mae, epsilon = 1e-9);
}

#[test]
fn test_rmse_matches_manual_computation() {
    let predictions = [1.0, 2.0, 3.0, 4.0];
    let validation = [2.0, 2.0, 5.0, 0.0];

    let rmse = compute_rmse(&predictions, &validation).unwrap();
    assert_relative_eq!(rmse, (21.0_f64 / 4.0).sqrt(), epsilon = 1e-12);
}

#[test]
fn test_difference_is_validation_minus_prediction() {
    let model = Constant { value: 0.0, horizon: 6 };
    let result = evaluate(&model, &scaler(), &validation_series()).unwrap();

    assert_eq!(result.difference(), vec![-10.0, 15.0, -38.0, 40.0, -17.0, 1.0]);
}

#[test]
fn test_wrong_prediction_length_is_a_shape_mismatch() {
    let model = Constant { value: 0.0, horizon: 4 };
    let result = evaluate(&model, &scaler(), &validation_series());

    match result {
        Err(ForecastError::ShapeMismatch { expected, actual }) => {
            assert_eq!(expected, 6);
            assert_eq!(actual, 4);
        }
        other => panic!("Expected ShapeMismatch, got {:?}", other),
    }
}

#[test]
fn test_explicit_input_window() {
    let model = Constant { value: 1.0, horizon: 6 };
    let input = [10.0, 20.0, 30.0];
    let result = evaluate_with_input(&model, &scaler(), &input, &validation_series()).unwrap();

    assert_eq!(result.len(), 6);
    assert!(result.rmse.is_finite());
}

#[test]
fn test_non_finite_predictions_are_rejected() {
    let model = Constant {
        value: f64::NAN,
        horizon: 6,
    };
    let result = evaluate(&model, &scaler(), &validation_series());

    assert!(matches!(result, Err(ForecastError::DegenerateInput(_))));
}

#[test]
fn test_empty_validation() {
    let empty = TimeSeries::new(Vec::new()).unwrap();
    let result = evaluate(&Echo, &scaler(), &empty);

    assert!(matches!(result, Err(ForecastError::InsufficientData(_))));
}

#[test]
fn test_display_reports_metrics() {
    let result = evaluate(&Echo, &scaler(), &validation_series()).unwrap();
    let text = result.to_string();

    assert!(text.contains("RMSE"));
    assert!(text.contains("Horizon: 6 months"));
}
