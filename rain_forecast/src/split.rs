//! Train/validation splitting of a station's record

use crate::data::TimeSeries;
use crate::error::{ForecastError, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A series divided into a training region and a trailing validation region
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SplitResult {
    /// Records from the cutoff up to the validation boundary
    pub train: TimeSeries,
    /// Held-out tail used only for evaluation
    pub validation: TimeSeries,
}

impl SplitResult {
    /// Number of records retained after the cutoff
    pub fn retained(&self) -> usize {
        self.train.len() + self.validation.len()
    }
}

/// Split off the last `n_future` records as validation.
///
/// Records strictly before `cutoff` are discarded first. The remainder must
/// hold at least `n_future + 1` records so that training is non-empty.
pub fn split(series: &TimeSeries, cutoff: NaiveDate, n_future: usize) -> Result<SplitResult> {
    if n_future == 0 {
        return Err(ForecastError::InvalidParameter(
            "n_future must be positive".to_string(),
        ));
    }

    let retained = series.since(cutoff);
    if retained.len() < n_future + 1 {
        return Err(ForecastError::InsufficientData(format!(
            "{} records on or after {}, need at least {}",
            retained.len(),
            cutoff,
            n_future + 1
        )));
    }

    let boundary = retained.len() - n_future;
    Ok(SplitResult {
        train: retained.slice(0, boundary),
        validation: retained.slice(boundary, retained.len()),
    })
}

/// Split at a calendar boundary instead of by count.
///
/// Training covers `cutoff <= t < validation_start` and validation covers
/// `t >= validation_start`. Both sides must be non-empty.
pub fn split_at_date(
    series: &TimeSeries,
    cutoff: NaiveDate,
    validation_start: NaiveDate,
) -> Result<SplitResult> {
    if validation_start <= cutoff {
        return Err(ForecastError::InvalidParameter(format!(
            "validation start {} must come after cutoff {}",
            validation_start, cutoff
        )));
    }

    let retained = series.since(cutoff);
    let boundary = retained
        .observations()
        .iter()
        .position(|o| o.timestamp >= validation_start)
        .unwrap_or(retained.len());

    if boundary == 0 || boundary == retained.len() {
        return Err(ForecastError::InsufficientData(format!(
            "{} training and {} validation records around {}",
            boundary,
            retained.len() - boundary,
            validation_start
        )));
    }

    Ok(SplitResult {
        train: retained.slice(0, boundary),
        validation: retained.slice(boundary, retained.len()),
    })
}
