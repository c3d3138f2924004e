//! Normalization fitted on training values and reused for everything else
//!
//! A [`FittedScaler`] is produced once per station from the training region.
//! The same instance scales validation inputs and maps model outputs back to
//! millimetres; it is never refit on validation data.

use crate::error::{ForecastError, Result};
use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;
use std::fmt;

/// Spread below which a training series counts as constant
const MIN_SCALE: f64 = 1e-12;

/// Normalization family
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ScalerKind {
    /// Zero mean, unit (population) variance
    #[default]
    Standard,
    /// Map the training range onto `[0, 1]`
    MinMax,
}

impl fmt::Display for ScalerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScalerKind::Standard => write!(f, "standard"),
            ScalerKind::MinMax => write!(f, "min-max"),
        }
    }
}

/// Fitted affine transform `x -> (x - center) / scale`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FittedScaler {
    kind: ScalerKind,
    center: f64,
    scale: f64,
}

impl FittedScaler {
    /// Fit on training values only.
    ///
    /// Fails with `DegenerateInput` when the values have no spread, since
    /// the inverse transform would be undefined.
    pub fn fit(kind: ScalerKind, train_values: &[f64]) -> Result<Self> {
        if train_values.is_empty() {
            return Err(ForecastError::InsufficientData(
                "Cannot fit a scaler on an empty training series".to_string(),
            ));
        }

        let (center, scale) = match kind {
            ScalerKind::Standard => {
                let mean = train_values.iter().mean();
                let std_dev = train_values.iter().population_std_dev();
                (mean, std_dev)
            }
            ScalerKind::MinMax => {
                let min = Statistics::min(train_values.iter());
                let max = Statistics::max(train_values.iter());
                (min, max - min)
            }
        };

        // Also catches NaN spread from non-finite inputs
        if !(scale >= MIN_SCALE) || !scale.is_finite() {
            return Err(ForecastError::DegenerateInput(format!(
                "{} scaling needs spread in the training values (got {})",
                kind, scale
            )));
        }

        Ok(Self { kind, center, scale })
    }

    pub fn kind(&self) -> ScalerKind {
        self.kind
    }

    /// Mean for standard scaling, minimum for min-max
    pub fn center(&self) -> f64 {
        self.center
    }

    /// Standard deviation for standard scaling, range for min-max
    pub fn scale(&self) -> f64 {
        self.scale
    }

    /// Map physical values into the model domain
    pub fn forward(&self, values: &[f64]) -> Vec<f64> {
        values
            .iter()
            .map(|&x| (x - self.center) / self.scale)
            .collect()
    }

    /// Map model-domain values back to physical units
    pub fn inverse(&self, scaled: &[f64]) -> Vec<f64> {
        scaled
            .iter()
            .map(|&x| x * self.scale + self.center)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_standard_uses_population_std() {
        let scaler = FittedScaler::fit(ScalerKind::Standard, &[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]).unwrap();
        assert_relative_eq!(scaler.center(), 5.0, epsilon = 1e-12);
        assert_relative_eq!(scaler.scale(), 2.0, epsilon = 1e-12);

        let scaled = scaler.forward(&[5.0, 9.0]);
        assert_relative_eq!(scaled[0], 0.0, epsilon = 1e-12);
        assert_relative_eq!(scaled[1], 2.0, epsilon = 1e-12);
    }

    #[test]
    fn test_min_max_range() {
        let scaler = FittedScaler::fit(ScalerKind::MinMax, &[10.0, 30.0, 20.0]).unwrap();
        assert_eq!(scaler.forward(&[10.0, 20.0, 30.0]), vec![0.0, 0.5, 1.0]);
    }

    #[test]
    fn test_degenerate_inputs() {
        for kind in [ScalerKind::Standard, ScalerKind::MinMax] {
            assert!(matches!(
                FittedScaler::fit(kind, &[3.0; 10]),
                Err(ForecastError::DegenerateInput(_))
            ));
            assert!(matches!(
                FittedScaler::fit(kind, &[]),
                Err(ForecastError::InsufficientData(_))
            ));
        }
        assert!(matches!(
            FittedScaler::fit(ScalerKind::Standard, &[1.0, f64::NAN]),
            Err(ForecastError::DegenerateInput(_))
        ));
    }
}
