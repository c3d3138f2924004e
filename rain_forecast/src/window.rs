//! Supervised past/future windows over a scaled series

use crate::error::{ForecastError, Result};
use rain_math::WindowShape;
use serde::{Deserialize, Serialize};

/// One supervised training example
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Window {
    /// Model input, `n_past` values
    pub past: Vec<f64>,
    /// Target, `n_future` values
    pub future: Vec<f64>,
}

/// Ordered training examples sharing one [`WindowShape`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowSet {
    shape: WindowShape,
    windows: Vec<Window>,
}

impl WindowSet {
    /// Slide a window of `n_past + n_future` values across `values` with stride 1.
    ///
    /// Windows are emitted in increasing start order. Fails with
    /// `InsufficientWindow` when no window fits, since a model cannot be
    /// trained on zero examples.
    pub fn generate(values: &[f64], n_past: usize, n_future: usize) -> Result<Self> {
        let shape = WindowShape::new(n_past, n_future)?;

        let windows: Vec<Window> = shape
            .pairs(values)
            .map(|(past, future)| Window {
                past: past.to_vec(),
                future: future.to_vec(),
            })
            .collect();

        if windows.is_empty() {
            return Err(ForecastError::InsufficientWindow(format!(
                "{} values cannot hold a window of {} past and {} future values ({} windows)",
                values.len(),
                n_past,
                n_future,
                values.len() as i64 - shape.span() as i64 + 1
            )));
        }

        Ok(Self { shape, windows })
    }

    pub fn shape(&self) -> WindowShape {
        self.shape
    }

    pub fn n_past(&self) -> usize {
        self.shape.n_past
    }

    pub fn n_future(&self) -> usize {
        self.shape.n_future
    }

    pub fn len(&self) -> usize {
        self.windows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }

    pub fn windows(&self) -> &[Window] {
        &self.windows
    }

    pub fn get(&self, index: usize) -> Option<&Window> {
        self.windows.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Window> {
        self.windows.iter()
    }
}

impl<'a> IntoIterator for &'a WindowSet {
    type Item = &'a Window;
    type IntoIter = std::slice::Iter<'a, Window>;

    fn into_iter(self) -> Self::IntoIter {
        self.windows.iter()
    }
}
