//! Pipeline configuration
//!
//! Configuration is read from TOML. Every field has a default, so a file
//! only needs the keys it overrides:
//!
//! ```toml
//! cutoff = "2000-01-15"
//! epochs = 200
//! stations = ["heathrow", "oxford"]
//!
//! [lstm]
//! hidden_units = 32
//! ```

use crate::error::{ForecastError, Result};
use crate::evaluate::EvalInput;
use crate::models::LstmConfig;
use crate::scaler::ScalerKind;
use chrono::NaiveDate;
use rain_math::WindowShape;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Stations processed when no list is configured
pub const DEFAULT_STATIONS: [&str; 6] = [
    "cambridge",
    "eastbourne",
    "heathrow",
    "lowestoft",
    "manston",
    "oxford",
];

/// Settings for one batch run over a set of stations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Earliest usable record; older history is discarded
    pub cutoff: NaiveDate,
    /// Date-based validation boundary; count-based when unset
    pub validation_start: Option<NaiveDate>,
    /// Months of history fed to the model
    pub n_past: usize,
    /// Forecast horizon in months
    pub n_future: usize,
    /// Training epochs per station
    pub epochs: usize,
    /// Station identifiers to process
    pub stations: Vec<String>,
    /// Directory holding one `<station>.csv` per station
    pub data_dir: PathBuf,
    /// Root of the result store
    pub output_dir: PathBuf,
    /// Name of the rainfall column in the station files
    pub value_column: String,
    pub scaler: ScalerKind,
    pub eval_input: EvalInput,
    pub lstm: LstmConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            cutoff: NaiveDate::from_ymd_opt(2000, 1, 15).expect("2000-01-15 is a valid date"),
            validation_start: None,
            n_past: 120,
            n_future: 24,
            epochs: 500,
            stations: DEFAULT_STATIONS.iter().map(|s| s.to_string()).collect(),
            data_dir: PathBuf::from("data/clean"),
            output_dir: PathBuf::from("results"),
            value_column: "rain_mm".to_string(),
            scaler: ScalerKind::default(),
            eval_input: EvalInput::default(),
            lstm: LstmConfig::default(),
        }
    }
}

impl PipelineConfig {
    /// Parse a configuration from TOML text and validate it
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: Self = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Read a configuration file
    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|e| {
            ForecastError::Config(format!(
                "Failed to read config file {}: {}",
                path.display(),
                e
            ))
        })?;
        Self::from_toml_str(&contents)
    }

    /// Render the configuration as TOML
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| ForecastError::Config(e.to_string()))
    }

    /// Past/future window lengths
    pub fn window_shape(&self) -> Result<WindowShape> {
        Ok(WindowShape::new(self.n_past, self.n_future)?)
    }

    /// Check that the settings describe a runnable pipeline
    pub fn validate(&self) -> Result<()> {
        if self.n_past == 0 || self.n_future == 0 {
            return Err(ForecastError::Config(format!(
                "n_past and n_future must be positive (got {} and {})",
                self.n_past, self.n_future
            )));
        }
        if self.epochs == 0 {
            return Err(ForecastError::Config(
                "epochs must be positive".to_string(),
            ));
        }
        if self.stations.is_empty() {
            return Err(ForecastError::Config(
                "at least one station is required".to_string(),
            ));
        }
        if let Some(start) = self.validation_start {
            if start <= self.cutoff {
                return Err(ForecastError::Config(format!(
                    "validation_start ({}) must come after cutoff ({})",
                    start, self.cutoff
                )));
            }
        }
        self.lstm.validate()
    }
}
