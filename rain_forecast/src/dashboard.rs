//! Read interface for a dashboard over stored results
//!
//! Everything here works from persisted [`StationResults`]; nothing is
//! retrained or re-evaluated.

use crate::error::Result;
use crate::store::{ResultStore, StationResults};
use chrono::NaiveDate;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::File;
use std::path::Path;
use tracing::warn;

/// Column names of the plot frame
pub const DATE_COLUMN: &str = "date";
pub const RAIN_COLUMN: &str = "rain (mm)";
pub const TYPE_COLUMN: &str = "type";

/// Whether a plotted value was observed or forecast
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeriesKind {
    Historic,
    Predicted,
}

impl SeriesKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SeriesKind::Historic => "historic",
            SeriesKind::Predicted => "predicted",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlotPoint {
    pub date: NaiveDate,
    pub rain_mm: f64,
    pub kind: SeriesKind,
}

/// Station location as listed in the coordinates file
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}

#[derive(Debug, Deserialize)]
struct LocationRecord {
    #[serde(rename = "Station")]
    station: String,
    #[serde(rename = "Lat")]
    lat: f64,
    #[serde(rename = "Lon")]
    lon: f64,
}

/// Training history followed by the forecast over the validation dates
pub fn plot_points(results: &StationResults) -> Vec<PlotPoint> {
    let historic = results.train_series.observations().iter().map(|o| PlotPoint {
        date: o.timestamp,
        rain_mm: o.value,
        kind: SeriesKind::Historic,
    });

    let evaluation = &results.evaluation;
    let predicted = evaluation
        .timestamps
        .iter()
        .zip(evaluation.predictions.iter())
        .map(|(&date, &rain_mm)| PlotPoint {
            date,
            rain_mm,
            kind: SeriesKind::Predicted,
        });

    historic.chain(predicted).collect()
}

/// Long-format frame with `date`, `rain (mm)` and `type` columns
pub fn plot_frame(points: &[PlotPoint]) -> Result<DataFrame> {
    let dates: Vec<String> = points.iter().map(|p| p.date.format("%Y-%m-%d").to_string()).collect();
    let values: Vec<f64> = points.iter().map(|p| p.rain_mm).collect();
    let kinds: Vec<&str> = points.iter().map(|p| p.kind.as_str()).collect();

    let df = DataFrame::new(vec![
        Series::new(DATE_COLUMN, dates),
        Series::new(RAIN_COLUMN, values),
        Series::new(TYPE_COLUMN, kinds),
    ])?;
    Ok(df)
}

pub fn write_plot_csv<P: AsRef<Path>>(path: P, frame: &mut DataFrame) -> Result<()> {
    let mut file = File::create(path)?;
    CsvWriter::new(&mut file).has_header(true).finish(frame)?;
    Ok(())
}

/// Read station coordinates keyed by lower-cased station name
pub fn read_coordinates<P: AsRef<Path>>(path: P) -> Result<BTreeMap<String, Coordinates>> {
    let mut reader = csv::Reader::from_path(path)?;
    let mut coordinates = BTreeMap::new();

    for record in reader.deserialize() {
        let record: LocationRecord = record?;
        coordinates.insert(
            record.station.trim().to_lowercase(),
            Coordinates {
                lat: record.lat,
                lon: record.lon,
            },
        );
    }

    Ok(coordinates)
}

/// Dashboard view of one station
#[derive(Debug, Clone, PartialEq)]
pub struct StationView {
    pub station: String,
    pub rmse: f64,
    pub coordinates: Option<Coordinates>,
    pub points: Vec<PlotPoint>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DashboardData {
    pub stations: Vec<StationView>,
    /// Stations whose stored results could not be read
    pub skipped: Vec<String>,
}

impl DashboardData {
    /// Assemble views for `stations` from stored results.
    ///
    /// A station with missing or unreadable results is logged and listed in
    /// `skipped`; the remaining stations are still shown.
    pub fn from_store(
        store: &ResultStore,
        stations: &[String],
        coordinates: &BTreeMap<String, Coordinates>,
    ) -> Self {
        let mut data = Self::default();

        for station in stations {
            match store.load_results(station) {
                Ok(results) => data.stations.push(StationView {
                    station: station.clone(),
                    rmse: results.evaluation.rmse,
                    coordinates: coordinates.get(&station.to_lowercase()).copied(),
                    points: plot_points(&results),
                }),
                Err(error) => {
                    warn!(station = %station, %error, "skipping unreadable station");
                    data.skipped.push(station.clone());
                }
            }
        }

        data
    }

    pub fn get(&self, station: &str) -> Option<&StationView> {
        self.stations.iter().find(|view| view.station == station)
    }
}
