//! Monthly rainfall series and the loaders that produce them

use crate::error::{ForecastError, Result};
use chrono::{Datelike, NaiveDate};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// One monthly rainfall record
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    /// Date of the record, conventionally the 15th of the month
    pub timestamp: NaiveDate,
    /// Rainfall in millimetres
    pub value: f64,
}

impl Observation {
    pub fn new(timestamp: NaiveDate, value: f64) -> Self {
        Self { timestamp, value }
    }
}

/// Time-ordered rainfall records for a single station.
///
/// Timestamps are strictly increasing and values finite; construction
/// rejects anything else.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Observation>", into = "Vec<Observation>")]
pub struct TimeSeries {
    observations: Vec<Observation>,
}

impl TryFrom<Vec<Observation>> for TimeSeries {
    type Error = ForecastError;

    fn try_from(observations: Vec<Observation>) -> Result<Self> {
        Self::new(observations)
    }
}

impl From<TimeSeries> for Vec<Observation> {
    fn from(series: TimeSeries) -> Self {
        series.observations
    }
}

impl TimeSeries {
    /// Create a series, checking that timestamps strictly increase and
    /// every value is finite
    pub fn new(observations: Vec<Observation>) -> Result<Self> {
        if let Some(bad) = observations.iter().find(|o| !o.value.is_finite()) {
            return Err(ForecastError::DataError(format!(
                "Non-finite rainfall value {} at {}",
                bad.value, bad.timestamp
            )));
        }

        if let Some(pair) = observations
            .windows(2)
            .find(|pair| pair[1].timestamp <= pair[0].timestamp)
        {
            return Err(ForecastError::DataError(format!(
                "Timestamps must be strictly increasing: {} is followed by {}",
                pair[0].timestamp, pair[1].timestamp
            )));
        }

        Ok(Self { observations })
    }

    /// Create a series from parallel timestamp and value vectors
    pub fn from_parts(timestamps: Vec<NaiveDate>, values: Vec<f64>) -> Result<Self> {
        if timestamps.len() != values.len() {
            return Err(ForecastError::DataError(format!(
                "Got {} timestamps but {} values",
                timestamps.len(),
                values.len()
            )));
        }

        Self::new(
            timestamps
                .into_iter()
                .zip(values)
                .map(|(timestamp, value)| Observation::new(timestamp, value))
                .collect(),
        )
    }

    /// Build `len` consecutive monthly records starting at `start`
    pub fn monthly(start: NaiveDate, values: Vec<f64>) -> Result<Self> {
        let timestamps = (0..values.len())
            .map(|i| {
                start
                    .checked_add_months(chrono::Months::new(i as u32))
                    .ok_or_else(|| {
                        ForecastError::DataError(format!("Date overflow {} months after {}", i, start))
                    })
            })
            .collect::<Result<Vec<_>>>()?;

        Self::from_parts(timestamps, values)
    }

    pub fn observations(&self) -> &[Observation] {
        &self.observations
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    /// Rainfall values in time order
    pub fn values(&self) -> Vec<f64> {
        self.observations.iter().map(|o| o.value).collect()
    }

    /// Timestamps in time order
    pub fn timestamps(&self) -> Vec<NaiveDate> {
        self.observations.iter().map(|o| o.timestamp).collect()
    }

    pub fn first(&self) -> Option<&Observation> {
        self.observations.first()
    }

    pub fn last(&self) -> Option<&Observation> {
        self.observations.last()
    }

    /// Records at or after `cutoff`
    pub fn since(&self, cutoff: NaiveDate) -> Self {
        Self {
            observations: self
                .observations
                .iter()
                .filter(|o| o.timestamp >= cutoff)
                .copied()
                .collect(),
        }
    }

    /// Records in `[start, end)`, clamped to the series length
    pub fn slice(&self, start: usize, end: usize) -> Self {
        let end = end.min(self.len());
        let start = start.min(end);
        Self {
            observations: self.observations[start..end].to_vec(),
        }
    }

    /// Concatenate two series; `other` must start after `self` ends
    pub fn concat(&self, other: &Self) -> Result<Self> {
        let mut observations = self.observations.clone();
        observations.extend_from_slice(&other.observations);
        Self::new(observations)
    }

    /// Consecutive record pairs that are more than one calendar month apart
    pub fn month_gaps(&self) -> Vec<(NaiveDate, NaiveDate)> {
        let month_index = |d: NaiveDate| d.year() as i64 * 12 + d.month0() as i64;

        self.observations
            .windows(2)
            .filter(|pair| month_index(pair[1].timestamp) - month_index(pair[0].timestamp) > 1)
            .map(|pair| (pair[0].timestamp, pair[1].timestamp))
            .collect()
    }
}

/// Anything that can hand out a station's rainfall series
pub trait SeriesSource {
    /// Load the full record for one station
    fn load(&self, station: &str) -> Result<TimeSeries>;
}

/// Series held in memory, keyed by station identifier
#[derive(Debug, Clone, Default)]
pub struct InMemorySource {
    series: HashMap<String, TimeSeries>,
}

impl InMemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a station's series
    pub fn insert(&mut self, station: impl Into<String>, series: TimeSeries) {
        self.series.insert(station.into(), series);
    }

    /// Builder form of [`InMemorySource::insert`]
    pub fn with_series(mut self, station: impl Into<String>, series: TimeSeries) -> Self {
        self.insert(station, series);
        self
    }
}

impl SeriesSource for InMemorySource {
    fn load(&self, station: &str) -> Result<TimeSeries> {
        self.series
            .get(station)
            .cloned()
            .ok_or_else(|| ForecastError::DataError(format!("No series for station '{}'", station)))
    }
}

/// Loader for the cleaned per-station CSV files (`<data_dir>/<station>.csv`)
#[derive(Debug, Clone)]
pub struct CsvSeriesLoader {
    data_dir: PathBuf,
    value_column: String,
}

impl CsvSeriesLoader {
    /// Create a loader reading the `rain_mm` column
    pub fn new<P: Into<PathBuf>>(data_dir: P) -> Self {
        Self {
            data_dir: data_dir.into(),
            value_column: "rain_mm".to_string(),
        }
    }

    /// Read a differently named rainfall column
    pub fn with_value_column(mut self, value_column: impl Into<String>) -> Self {
        self.value_column = value_column.into();
        self
    }

    /// File backing a station
    pub fn path_for(&self, station: &str) -> PathBuf {
        self.data_dir.join(format!("{}.csv", station))
    }

    /// Load a series from one CSV file
    pub fn from_csv<P: AsRef<Path>>(path: P, value_column: &str) -> Result<TimeSeries> {
        let file = File::open(path)?;
        let df = CsvReader::new(file)
            .infer_schema(None)
            .has_header(true)
            .finish()?;

        Self::from_dataframe(&df, value_column)
    }

    /// Extract a series from an already loaded DataFrame
    pub fn from_dataframe(df: &DataFrame, value_column: &str) -> Result<TimeSeries> {
        let time_column = Self::detect_time_column(df)?;
        let value_column = Self::detect_value_column(df, value_column)?;

        // Dates and datetimes both render with a YYYY-MM-DD prefix
        let dates = df.column(&time_column)?.cast(&DataType::Utf8)?;
        let values = df.column(&value_column)?.cast(&DataType::Float64)?;

        let timestamps = dates
            .utf8()?
            .into_iter()
            .enumerate()
            .map(|(row, raw)| {
                let raw = raw.ok_or_else(|| {
                    ForecastError::DataError(format!("Missing timestamp at row {}", row))
                })?;
                parse_date(raw).ok_or_else(|| {
                    ForecastError::DataError(format!("Unparseable timestamp '{}' at row {}", raw, row))
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let values = values
            .f64()?
            .into_iter()
            .enumerate()
            .map(|(row, value)| {
                value.ok_or_else(|| {
                    ForecastError::DataError(format!(
                        "Missing or non-numeric '{}' at row {}",
                        value_column, row
                    ))
                })
            })
            .collect::<Result<Vec<_>>>()?;

        TimeSeries::from_parts(timestamps, values)
    }

    /// Detect the time column in a DataFrame
    fn detect_time_column(df: &DataFrame) -> Result<String> {
        df.get_column_names()
            .into_iter()
            .find(|name| {
                let lower = name.to_lowercase();
                lower.contains("timestamp") || lower.contains("date") || lower.contains("time")
            })
            .map(|name| name.to_string())
            .ok_or_else(|| ForecastError::DataError("No time column found in data".to_string()))
    }

    /// Use the configured value column, falling back to the first rain-like column
    fn detect_value_column(df: &DataFrame, preferred: &str) -> Result<String> {
        let names = df.get_column_names();

        if names.iter().any(|name| *name == preferred) {
            return Ok(preferred.to_string());
        }

        names
            .into_iter()
            .find(|name| name.to_lowercase().contains("rain"))
            .map(|name| name.to_string())
            .ok_or_else(|| {
                ForecastError::DataError(format!("No '{}' or rainfall column found in data", preferred))
            })
    }
}

impl SeriesSource for CsvSeriesLoader {
    fn load(&self, station: &str) -> Result<TimeSeries> {
        let path = self.path_for(station);
        debug!(station, path = %path.display(), "reading station file");

        let series = Self::from_csv(&path, &self.value_column)?;
        for (before, after) in series.month_gaps() {
            warn!(station, %before, %after, "gap in monthly record");
        }

        Ok(series)
    }
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    let prefix = raw.trim().get(..10)?;
    NaiveDate::parse_from_str(prefix, "%Y-%m-%d").ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, 15).unwrap()
    }

    #[test]
    fn test_rejects_unordered_timestamps() {
        let result = TimeSeries::from_parts(vec![date(2000, 2), date(2000, 1)], vec![1.0, 2.0]);
        assert!(matches!(result, Err(ForecastError::DataError(_))));

        let result = TimeSeries::from_parts(vec![date(2000, 1), date(2000, 1)], vec![1.0, 2.0]);
        assert!(matches!(result, Err(ForecastError::DataError(_))));
    }

    #[test]
    fn test_rejects_non_finite_values() {
        for bad in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            let result = TimeSeries::monthly(date(2000, 1), vec![1.0, bad, 3.0]);
            assert!(matches!(result, Err(ForecastError::DataError(_))));
        }
    }

    #[test]
    fn test_monthly_builder_and_since() {
        let series = TimeSeries::monthly(date(1999, 11), vec![1.0, 2.0, 3.0, 4.0]).unwrap();
        assert_eq!(series.last().unwrap().timestamp, date(2000, 2));

        let recent = series.since(date(2000, 1));
        assert_eq!(recent.values(), vec![3.0, 4.0]);
    }

    #[test]
    fn test_month_gaps() {
        let series = TimeSeries::from_parts(
            vec![date(2000, 1), date(2000, 2), date(2000, 5)],
            vec![1.0, 2.0, 3.0],
        )
        .unwrap();
        assert_eq!(series.month_gaps(), vec![(date(2000, 2), date(2000, 5))]);
    }

    #[test]
    fn test_parse_date_accepts_datetimes() {
        assert_eq!(parse_date("2000-01-15"), Some(date(2000, 1)));
        assert_eq!(parse_date("2000-01-15 00:00:00"), Some(date(2000, 1)));
        assert_eq!(parse_date("15/01/2000"), None);
        assert_eq!(parse_date("2000"), None);
    }

    #[test]
    fn test_serde_revalidates() {
        let json = r#"[{"timestamp":"2000-02-15","value":1.0},{"timestamp":"2000-01-15","value":2.0}]"#;
        assert!(serde_json::from_str::<TimeSeries>(json).is_err());
    }
}
