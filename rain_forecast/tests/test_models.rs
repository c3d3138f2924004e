use pretty_assertions::assert_eq;
use rain_forecast::error::ForecastError;
use rain_forecast::{
    Forecaster, LstmConfig, LstmForecaster, TrainedForecaster, WindowSet,
};

fn seasonal_windows(n_past: usize, n_future: usize) -> WindowSet {
    let values: Vec<f64> = (0..72)
        .map(|i| (i as f64 * std::f64::consts::TAU / 12.0).sin())
        .collect();
    WindowSet::generate(&values, n_past, n_future).unwrap()
}

fn small_config() -> LstmConfig {
    LstmConfig::default()
        .with_hidden_units(8)
        .with_batch_size(8)
        .with_seed(7)
}

#[test]
fn test_metrics_have_one_entry_per_epoch() {
    let forecaster = LstmForecaster::new(small_config()).unwrap();
    let (_, metrics) = forecaster.train(&seasonal_windows(12, 3), 5).unwrap();

    assert_eq!(metrics.len(), 5);
    assert_eq!(metrics.epochs()[4].epoch, 5);
    for epoch in metrics.epochs() {
        assert!(epoch.loss.is_finite());
        assert!((0.0..=1.0).contains(&epoch.accuracy));
    }
}

#[test]
fn test_training_is_deterministic_for_a_seed() {
    let windows = seasonal_windows(12, 3);
    let forecaster = LstmForecaster::new(small_config()).unwrap();

    let (first_model, first_metrics) = forecaster.train(&windows, 3).unwrap();
    let (second_model, second_metrics) = forecaster.train(&windows, 3).unwrap();

    assert_eq!(first_model, second_model);
    assert_eq!(first_metrics, second_metrics);
}

#[test]
fn test_loss_decreases_on_a_seasonal_pattern() {
    let config = small_config().with_dropout(0.0).with_learning_rate(0.01);
    let forecaster = LstmForecaster::new(config).unwrap();
    let (_, metrics) = forecaster.train(&seasonal_windows(12, 3), 60).unwrap();

    let losses = metrics.losses();
    let first = losses[0];
    let last = losses[losses.len() - 1];
    assert!(last < first, "loss went from {} to {}", first, last);
}

#[test]
fn test_prediction_horizon_and_input_lengths() {
    let forecaster = LstmForecaster::new(small_config()).unwrap();
    let (model, _) = forecaster.train(&seasonal_windows(12, 3), 2).unwrap();

    assert_eq!(model.horizon(), 3);
    assert_eq!(model.trained_shape().n_past, 12);
    assert_eq!(model.hidden_units(), 8);

    // Shorter and longer inputs than the training window are both accepted
    assert_eq!(model.predict(&[0.5; 3]).unwrap().len(), 3);
    assert_eq!(model.predict(&[0.5; 24]).unwrap().len(), 3);
    assert!(matches!(
        model.predict(&[]),
        Err(ForecastError::InvalidParameter(_))
    ));
}

#[test]
fn test_invalid_configuration() {
    assert!(LstmForecaster::new(LstmConfig::default().with_hidden_units(0)).is_err());
    assert!(LstmForecaster::new(LstmConfig::default().with_dropout(1.0)).is_err());
    assert!(LstmForecaster::new(LstmConfig::default().with_learning_rate(0.0)).is_err());
    assert!(LstmForecaster::new(LstmConfig::default().with_batch_size(0)).is_err());
}

#[test]
fn test_training_rejects_zero_epochs() {
    let forecaster = LstmForecaster::new(small_config()).unwrap();
    assert!(matches!(
        forecaster.train(&seasonal_windows(12, 3), 0),
        Err(ForecastError::InvalidParameter(_))
    ));
}
