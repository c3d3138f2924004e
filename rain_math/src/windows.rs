//! Past/future window arithmetic
//!
//! A supervised example is a run of `n_past` consecutive values followed by
//! the `n_future` values that come after it. Windows slide with stride 1.

use crate::{MathError, Result};
use serde::{Deserialize, Serialize};

/// Lengths of the past (input) and future (target) halves of a window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowShape {
    /// Number of historical values fed to a model
    pub n_past: usize,
    /// Number of values a model must predict
    pub n_future: usize,
}

impl WindowShape {
    /// Create a new window shape; both halves must be non-empty
    pub fn new(n_past: usize, n_future: usize) -> Result<Self> {
        if n_past == 0 || n_future == 0 {
            return Err(MathError::InvalidInput(format!(
                "Window halves must be non-empty (n_past={}, n_future={})",
                n_past, n_future
            )));
        }
        Ok(Self { n_past, n_future })
    }

    /// Total span of one window
    pub fn span(&self) -> usize {
        self.n_past + self.n_future
    }

    /// Number of stride-1 windows that fit in a series of length `len`.
    ///
    /// `len - n_past - n_future + 1`, clamped at zero.
    pub fn count(&self, len: usize) -> usize {
        (len + 1).saturating_sub(self.span())
    }

    /// Iterate over `(past, future)` slice pairs in increasing start order
    pub fn pairs<'a>(&self, values: &'a [f64]) -> impl Iterator<Item = (&'a [f64], &'a [f64])> {
        let n_past = self.n_past;
        let span = self.span();
        (0..self.count(values.len())).map(move |i| {
            let window = &values[i..i + span];
            window.split_at(n_past)
        })
    }
}
