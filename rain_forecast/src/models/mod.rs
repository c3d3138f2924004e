//! Trainable sequence models
//!
//! A [`Forecaster`] turns a [`WindowSet`] into a [`TrainedForecaster`],
//! which maps a past window to a future window. Windowing and evaluation
//! only talk to these traits, so the model family can be swapped.

use crate::error::Result;
use crate::window::WindowSet;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

/// Diagnostics recorded at the end of one training epoch
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EpochMetrics {
    /// 1-based epoch number
    pub epoch: usize,
    /// Mean squared error averaged over the epoch's batches
    pub loss: f64,
    /// Fraction of windows whose predicted peak month matches the target's
    pub accuracy: f64,
}

/// Per-epoch training history, one entry per epoch
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrainingMetrics {
    epochs: Vec<EpochMetrics>,
}

impl TrainingMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the next epoch
    pub fn push(&mut self, loss: f64, accuracy: f64) {
        let epoch = self.epochs.len() + 1;
        self.epochs.push(EpochMetrics {
            epoch,
            loss,
            accuracy,
        });
    }

    pub fn len(&self) -> usize {
        self.epochs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.epochs.is_empty()
    }

    pub fn epochs(&self) -> &[EpochMetrics] {
        &self.epochs
    }

    pub fn losses(&self) -> Vec<f64> {
        self.epochs.iter().map(|e| e.loss).collect()
    }

    pub fn accuracies(&self) -> Vec<f64> {
        self.epochs.iter().map(|e| e.accuracy).collect()
    }

    /// Metrics of the last epoch, if any
    pub fn last(&self) -> Option<&EpochMetrics> {
        self.epochs.last()
    }
}

/// Trained model, used read-only for prediction
pub trait TrainedForecaster: Debug {
    /// Predict the future window that follows `past`
    fn predict(&self, past: &[f64]) -> Result<Vec<f64>>;

    /// Number of values returned by [`TrainedForecaster::predict`]
    fn horizon(&self) -> usize;

    /// Name of the model
    fn name(&self) -> &str;
}

/// Model family that can be trained on supervised windows
pub trait Forecaster: Debug {
    /// The type of trained model produced
    type Trained: TrainedForecaster;

    /// Train a fresh model for `epochs` passes over `windows`
    fn train(&self, windows: &WindowSet, epochs: usize) -> Result<(Self::Trained, TrainingMetrics)>;

    /// Get the name of the model
    fn name(&self) -> &str;
}

pub mod lstm;

pub use lstm::{LstmConfig, LstmForecaster, TrainedLstm};
