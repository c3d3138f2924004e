//! Persistence of per-station models and results
//!
//! Layout under the store root:
//!
//! ```text
//! models/<station>.bin    trained model (bincode)
//! results/<station>.json  StationResults (JSON)
//! ```

use crate::data::TimeSeries;
use crate::error::{ForecastError, Result};
use crate::evaluate::EvaluationResult;
use crate::models::TrainingMetrics;
use crate::scaler::FittedScaler;
use chrono::NaiveDate;
use rain_math::WindowShape;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::info;

const MODELS_DIR: &str = "models";
const RESULTS_DIR: &str = "results";

/// Everything about a station's run except the model itself
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StationResults {
    pub station: String,
    pub model_name: String,
    pub shape: WindowShape,
    pub cutoff: NaiveDate,
    /// Scaler fitted on `train_series`
    pub scaler: FittedScaler,
    pub training: TrainingMetrics,
    pub evaluation: EvaluationResult,
    pub train_series: TimeSeries,
    pub validation_series: TimeSeries,
}

/// Immutable outcome of one station's pipeline run
#[derive(Debug, Clone, PartialEq)]
pub struct ResultBundle<M> {
    pub model: M,
    pub results: StationResults,
}

impl<M> ResultBundle<M> {
    pub fn station(&self) -> &str {
        &self.results.station
    }

    pub fn rmse(&self) -> f64 {
        self.results.evaluation.rmse
    }
}

/// File-backed store with one model artifact and one results artifact per station
#[derive(Debug, Clone)]
pub struct ResultStore {
    root: PathBuf,
}

impl ResultStore {
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn model_path(&self, station: &str) -> Result<PathBuf> {
        check_station(station)?;
        Ok(self.root.join(MODELS_DIR).join(format!("{}.bin", station)))
    }

    pub fn results_path(&self, station: &str) -> Result<PathBuf> {
        check_station(station)?;
        Ok(self.root.join(RESULTS_DIR).join(format!("{}.json", station)))
    }

    /// Persist a trained model
    pub fn save_model<M: Serialize>(&self, station: &str, model: &M) -> Result<PathBuf> {
        let path = self.model_path(station)?;
        write_atomically(&path, |writer| Ok(bincode::serialize_into(writer, model)?))?;
        Ok(path)
    }

    /// Persist the results part of a bundle
    pub fn save_bundle<M>(&self, station: &str, bundle: &ResultBundle<M>) -> Result<PathBuf> {
        if bundle.station() != station {
            return Err(ForecastError::InvalidParameter(format!(
                "Bundle for '{}' cannot be stored as '{}'",
                bundle.station(),
                station
            )));
        }

        let path = self.results_path(station)?;
        write_atomically(&path, |writer| {
            Ok(serde_json::to_writer_pretty(writer, &bundle.results)?)
        })?;
        Ok(path)
    }

    /// Persist both the model and the results of a bundle
    pub fn save<M: Serialize>(&self, bundle: &ResultBundle<M>) -> Result<()> {
        let station = bundle.station();
        let model_path = self.save_model(station, &bundle.model)?;
        let results_path = self.save_bundle(station, bundle)?;
        info!(
            station,
            model = %model_path.display(),
            results = %results_path.display(),
            "stored station results"
        );
        Ok(())
    }

    pub fn load_model<M: DeserializeOwned>(&self, station: &str) -> Result<M> {
        let file = File::open(self.model_path(station)?)?;
        Ok(bincode::deserialize_from(BufReader::new(file))?)
    }

    pub fn load_results(&self, station: &str) -> Result<StationResults> {
        let file = File::open(self.results_path(station)?)?;
        Ok(serde_json::from_reader(BufReader::new(file))?)
    }

    /// Reconstruct a stored bundle without retraining or re-evaluating
    pub fn load<M: DeserializeOwned>(&self, station: &str) -> Result<ResultBundle<M>> {
        Ok(ResultBundle {
            model: self.load_model(station)?,
            results: self.load_results(station)?,
        })
    }

    /// Stations with stored results, sorted
    pub fn stations(&self) -> Result<Vec<String>> {
        let dir = self.root.join(RESULTS_DIR);
        if !dir.exists() {
            return Ok(Vec::new());
        }

        let mut stations = Vec::new();
        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            if path.extension().and_then(|ext| ext.to_str()) == Some("json") {
                if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                    stations.push(stem.to_string());
                }
            }
        }
        stations.sort();
        Ok(stations)
    }
}

fn check_station(station: &str) -> Result<()> {
    if station.is_empty()
        || station == "."
        || station == ".."
        || station.contains(['/', '\\'])
    {
        return Err(ForecastError::InvalidParameter(format!(
            "'{}' is not a usable station identifier",
            station
        )));
    }
    Ok(())
}

/// Write through a sibling temporary file, then rename over `path`.
///
/// The temporary file is removed if writing fails.
fn write_atomically<F>(path: &Path, write: F) -> Result<()>
where
    F: FnOnce(&mut dyn Write) -> Result<()>,
{
    let parent = path.parent().unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(parent)?;

    let mut tmp = NamedTempFile::new_in(parent)?;
    {
        let mut writer = BufWriter::new(&mut tmp);
        write(&mut writer)?;
        writer.flush()?;
    }

    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}
