use chrono::NaiveDate;
use pretty_assertions::assert_eq;
use rain_forecast::error::ForecastError;
use rain_forecast::evaluate::evaluate;
use rain_forecast::models::Forecaster;
use rain_forecast::{
    FittedScaler, LstmConfig, LstmForecaster, ResultBundle, ResultStore, ScalerKind,
    StationResults, TimeSeries, TrainedLstm, WindowSet,
};
use serde::{Serialize, Serializer};
use std::fs;
use tempfile::TempDir;

/// Model whose encoding always fails
struct Unencodable;

impl Serialize for Unencodable {
    fn serialize<S: Serializer>(&self, _serializer: S) -> Result<S::Ok, S::Error> {
        Err(serde::ser::Error::custom("cannot encode"))
    }
}

fn create_bundle(station: &str) -> ResultBundle<TrainedLstm> {
    let start = NaiveDate::from_ymd_opt(2010, 1, 15).unwrap();
    let values: Vec<f64> = (0..30).map(|i| 20.0 + ((i * 5) % 12) as f64 * 4.0).collect();
    let train = TimeSeries::monthly(start, values[..26].to_vec()).unwrap();
    let validation = TimeSeries::monthly(
        train.last().unwrap().timestamp + chrono::Months::new(1),
        values[26..].to_vec(),
    )
    .unwrap();

    let scaler = FittedScaler::fit(ScalerKind::Standard, &train.values()).unwrap();
    let windows = WindowSet::generate(&scaler.forward(&train.values()), 6, 4).unwrap();
    let forecaster = LstmForecaster::new(LstmConfig::default().with_hidden_units(4)).unwrap();
    let (model, training) = forecaster.train(&windows, 2).unwrap();
    let evaluation = evaluate(&model, &scaler, &validation).unwrap();

    ResultBundle {
        results: StationResults {
            station: station.to_string(),
            model_name: forecaster.name().to_string(),
            shape: windows.shape(),
            cutoff: start,
            scaler,
            training,
            evaluation,
            train_series: train,
            validation_series: validation,
        },
        model,
    }
}

#[test]
fn test_save_and_load_bundle() {
    let dir = TempDir::new().unwrap();
    let store = ResultStore::new(dir.path());
    let bundle = create_bundle("oxford");

    store.save(&bundle).unwrap();
    assert!(store.model_path("oxford").unwrap().exists());
    assert!(store.results_path("oxford").unwrap().exists());

    let loaded: ResultBundle<TrainedLstm> = store.load("oxford").unwrap();
    assert_eq!(loaded.results, bundle.results);
    assert_eq!(loaded.model, bundle.model);
}

#[test]
fn test_loaded_model_predicts_like_the_original() {
    use rain_forecast::TrainedForecaster;

    let dir = TempDir::new().unwrap();
    let store = ResultStore::new(dir.path());
    let bundle = create_bundle("manston");
    store.save_model("manston", &bundle.model).unwrap();

    let model: TrainedLstm = store.load_model("manston").unwrap();
    let input = [0.1, -0.4, 1.2, 0.3, -0.9, 0.0];
    assert_eq!(model.predict(&input).unwrap(), bundle.model.predict(&input).unwrap());
}

#[test]
fn test_stations_lists_stored_results() {
    let dir = TempDir::new().unwrap();
    let store = ResultStore::new(dir.path());
    assert!(store.stations().unwrap().is_empty());

    for station in ["oxford", "cambridge"] {
        store.save_bundle(station, &create_bundle(station)).unwrap();
    }

    assert_eq!(store.stations().unwrap(), vec!["cambridge", "oxford"]);
}

#[test]
fn test_saving_again_replaces_results() {
    let dir = TempDir::new().unwrap();
    let store = ResultStore::new(dir.path());
    let mut bundle = create_bundle("heathrow");
    store.save(&bundle).unwrap();

    bundle.results.model_name = "replacement".to_string();
    store.save(&bundle).unwrap();

    let results = store.load_results("heathrow").unwrap();
    assert_eq!(results.model_name, "replacement");
    assert_eq!(store.stations().unwrap(), vec!["heathrow"]);
}

#[test]
fn test_bundle_must_match_station() {
    let dir = TempDir::new().unwrap();
    let store = ResultStore::new(dir.path());

    let result = store.save_bundle("oxford", &create_bundle("lowestoft"));
    assert!(matches!(result, Err(ForecastError::InvalidParameter(_))));
}

#[test]
fn test_invalid_station_identifiers() {
    let dir = TempDir::new().unwrap();
    let store = ResultStore::new(dir.path());

    assert!(store.model_path("").is_err());
    assert!(store.results_path("../escape").is_err());
}

#[test]
fn test_missing_station_is_an_io_error() {
    let dir = TempDir::new().unwrap();
    let store = ResultStore::new(dir.path());

    assert!(matches!(
        store.load_results("nowhere"),
        Err(ForecastError::IoError(_))
    ));
}

#[test]
fn test_failed_write_leaves_no_files() {
    let dir = TempDir::new().unwrap();
    let store = ResultStore::new(dir.path());

    let result = store.save_model("oxford", &Unencodable);
    assert!(matches!(result, Err(ForecastError::Serialization(_))));

    let leftovers: Vec<_> = fs::read_dir(dir.path().join("models")).unwrap().collect();
    assert!(leftovers.is_empty());
    assert!(!store.model_path("oxford").unwrap().exists());
}

#[test]
fn test_failed_write_keeps_previous_artifact() {
    let dir = TempDir::new().unwrap();
    let store = ResultStore::new(dir.path());
    let bundle = create_bundle("oxford");
    store.save_model("oxford", &bundle.model).unwrap();

    assert!(store.save_model("oxford", &Unencodable).is_err());

    let model: TrainedLstm = store.load_model("oxford").unwrap();
    assert_eq!(model, bundle.model);
    assert_eq!(fs::read_dir(dir.path().join("models")).unwrap().count(), 1);
}
