//! Error metrics for comparing forecasts with observations
//!
//! All metrics operate over flattened slices and require both sides to have
//! the same non-zero length.

use crate::{MathError, Result};

fn check_lengths(left: &[f64], right: &[f64]) -> Result<()> {
    if left.len() != right.len() {
        return Err(MathError::LengthMismatch {
            left: left.len(),
            right: right.len(),
        });
    }
    if left.is_empty() {
        return Err(MathError::InsufficientData(
            "Cannot compute a metric over empty series".to_string(),
        ));
    }
    Ok(())
}

/// Mean squared error between two equally long series
pub fn mean_squared_error(left: &[f64], right: &[f64]) -> Result<f64> {
    check_lengths(left, right)?;

    let sum: f64 = left
        .iter()
        .zip(right.iter())
        .map(|(a, b)| (a - b).powi(2))
        .sum();

    Ok(sum / left.len() as f64)
}

/// Root mean squared error, `sqrt(mean((left - right)^2))`.
///
/// Symmetric in its arguments and zero for identical inputs.
pub fn root_mean_squared_error(left: &[f64], right: &[f64]) -> Result<f64> {
    Ok(mean_squared_error(left, right)?.sqrt())
}

/// Mean absolute error between two equally long series
pub fn mean_absolute_error(left: &[f64], right: &[f64]) -> Result<f64> {
    check_lengths(left, right)?;

    let sum: f64 = left
        .iter()
        .zip(right.iter())
        .map(|(a, b)| (a - b).abs())
        .sum();

    Ok(sum / left.len() as f64)
}

/// Index of the largest value; the first one wins on ties.
///
/// Returns `None` for an empty slice or when a NaN is present.
pub fn argmax(values: &[f64]) -> Option<usize> {
    if values.iter().any(|v| v.is_nan()) {
        return None;
    }

    let mut best: Option<(usize, f64)> = None;
    for (i, &v) in values.iter().enumerate() {
        match best {
            Some((_, current)) if v <= current => {}
            _ => best = Some((i, v)),
        }
    }
    best.map(|(i, _)| i)
}

/// Whether two equally long series peak at the same position
pub fn peaks_agree(predicted: &[f64], actual: &[f64]) -> Result<bool> {
    check_lengths(predicted, actual)?;
    Ok(matches!(
        (argmax(predicted), argmax(actual)),
        (Some(p), Some(a)) if p == a
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_regression_metrics() {
        let actual = [10.0, 20.0, 30.0, 40.0, 50.0];
        let predicted = [12.0, 18.0, 33.0, 37.0, 52.0];

        assert_relative_eq!(mean_absolute_error(&actual, &predicted).unwrap(), 2.4);
        assert_relative_eq!(mean_squared_error(&actual, &predicted).unwrap(), 6.0);
        assert_relative_eq!(
            root_mean_squared_error(&actual, &predicted).unwrap(),
            6.0_f64.sqrt()
        );
    }

    #[test]
    fn test_rmse_identity_and_symmetry() {
        let x = [3.5, -1.0, 0.0, 12.25];
        let y = [1.0, 2.0, 3.0, 4.0];

        assert_eq!(root_mean_squared_error(&x, &x).unwrap(), 0.0);
        assert_relative_eq!(
            root_mean_squared_error(&x, &y).unwrap(),
            root_mean_squared_error(&y, &x).unwrap()
        );
    }

    #[test]
    fn test_metric_errors() {
        let empty: [f64; 0] = [];
        assert!(matches!(
            mean_squared_error(&empty, &empty),
            Err(MathError::InsufficientData(_))
        ));
        assert_eq!(
            root_mean_squared_error(&[1.0, 2.0], &[1.0]),
            Err(MathError::LengthMismatch { left: 2, right: 1 })
        );
    }

    #[test]
    fn test_argmax_and_peaks() {
        assert_eq!(argmax(&[1.0, 5.0, 5.0, 2.0]), Some(1));
        assert_eq!(argmax(&[]), None);
        assert_eq!(argmax(&[1.0, f64::NAN]), None);

        assert!(peaks_agree(&[0.1, 0.9, 0.2], &[10.0, 30.0, 5.0]).unwrap());
        assert!(!peaks_agree(&[0.9, 0.1, 0.2], &[10.0, 30.0, 5.0]).unwrap());
    }
}
