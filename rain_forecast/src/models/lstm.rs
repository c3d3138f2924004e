//! LSTM sequence-to-sequence regressor
//!
//! A single recurrent layer reads the past window one month at a time. Its
//! final hidden state goes through inverted dropout (training only) and a
//! linear dense head that emits the whole future window at once.
//!
//! Training is plain backpropagation through time on mean squared error,
//! with mini-batches, Nadam updates and global-norm gradient clipping.
//! Initialization, shuffling and dropout draw from one seeded RNG, so the
//! same seed and data give the same model.

use super::{Forecaster, TrainedForecaster, TrainingMetrics};
use crate::error::{ForecastError, Result};
use crate::window::WindowSet;
use ndarray::{s, Array, Array1, Array2, Dimension, Zip};
use rain_math::metrics::peaks_agree;
use rain_math::WindowShape;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Uniform};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

const BETA_1: f64 = 0.9;
const BETA_2: f64 = 0.999;
const EPSILON: f64 = 1e-7;

/// Hyperparameters of the LSTM forecaster
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LstmConfig {
    /// Size of the hidden and cell state
    pub hidden_units: usize,
    /// Nadam step size
    pub learning_rate: f64,
    /// Windows per gradient update
    pub batch_size: usize,
    /// Probability of dropping a hidden unit before the dense head
    pub dropout: f64,
    /// Maximum global gradient norm; `None` or `0.0` disables clipping
    pub gradient_clip: Option<f64>,
    /// Seed for initialization, shuffling and dropout
    pub seed: u64,
}

impl Default for LstmConfig {
    fn default() -> Self {
        Self {
            hidden_units: 64,
            learning_rate: 0.001,
            batch_size: 32,
            dropout: 0.2,
            gradient_clip: Some(1.0),
            seed: 42,
        }
    }
}

impl LstmConfig {
    pub fn with_hidden_units(mut self, hidden_units: usize) -> Self {
        self.hidden_units = hidden_units;
        self
    }

    pub fn with_learning_rate(mut self, learning_rate: f64) -> Self {
        self.learning_rate = learning_rate;
        self
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn with_dropout(mut self, dropout: f64) -> Self {
        self.dropout = dropout;
        self
    }

    pub fn with_gradient_clip(mut self, clip: Option<f64>) -> Self {
        self.gradient_clip = clip;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.hidden_units == 0 {
            return Err(ForecastError::Config(
                "lstm.hidden_units must be positive".to_string(),
            ));
        }
        if !(self.learning_rate > 0.0) || !self.learning_rate.is_finite() {
            return Err(ForecastError::Config(format!(
                "lstm.learning_rate must be a positive number (got {})",
                self.learning_rate
            )));
        }
        if self.batch_size == 0 {
            return Err(ForecastError::Config(
                "lstm.batch_size must be positive".to_string(),
            ));
        }
        if !(0.0..1.0).contains(&self.dropout) {
            return Err(ForecastError::Config(format!(
                "lstm.dropout must be in [0, 1) (got {})",
                self.dropout
            )));
        }
        if let Some(clip) = self.gradient_clip {
            if !(clip >= 0.0) || !clip.is_finite() {
                return Err(ForecastError::Config(format!(
                    "lstm.gradient_clip must be zero or positive (got {})",
                    clip
                )));
            }
        }
        Ok(())
    }

    /// Norm above which gradients are rescaled, if clipping is on
    pub fn clip_threshold(&self) -> Option<f64> {
        self.gradient_clip.filter(|&clip| clip > 0.0)
    }
}

/// Learnable tensors. Gates are stacked as input, forget, cell, output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct LstmParams {
    /// Input-to-gate weights [4H]; the input is a single scalar per step
    w_x: Array1<f64>,
    /// Hidden-to-gate weights [4H, H]
    w_h: Array2<f64>,
    /// Gate biases [4H]
    b: Array1<f64>,
    /// Dense head weights [F, H]
    w_out: Array2<f64>,
    /// Dense head biases [F]
    b_out: Array1<f64>,
}

/// Activations kept from the forward pass for backpropagation
struct StepCache {
    x: f64,
    h_prev: Array1<f64>,
    c_prev: Array1<f64>,
    i: Array1<f64>,
    f: Array1<f64>,
    g: Array1<f64>,
    o: Array1<f64>,
    c: Array1<f64>,
}

impl LstmParams {
    fn init(hidden: usize, horizon: usize, rng: &mut StdRng) -> Self {
        let input_limit = (6.0 / (1 + 4 * hidden) as f64).sqrt();
        let recurrent_limit = (1.0 / hidden as f64).sqrt();
        let head_limit = (6.0 / (hidden + horizon) as f64).sqrt();

        let input_dist = Uniform::new(-input_limit, input_limit);
        let recurrent_dist = Uniform::new(-recurrent_limit, recurrent_limit);
        let head_dist = Uniform::new(-head_limit, head_limit);

        let mut b = Array1::<f64>::zeros(4 * hidden);
        // Forget gate starts open
        b.slice_mut(s![hidden..2 * hidden]).fill(1.0);

        Self {
            w_x: Array1::from_shape_fn(4 * hidden, |_| input_dist.sample(rng)),
            w_h: Array2::from_shape_fn((4 * hidden, hidden), |_| recurrent_dist.sample(rng)),
            b,
            w_out: Array2::from_shape_fn((horizon, hidden), |_| head_dist.sample(rng)),
            b_out: Array1::zeros(horizon),
        }
    }

    fn zeros(hidden: usize, horizon: usize) -> Self {
        Self {
            w_x: Array1::zeros(4 * hidden),
            w_h: Array2::zeros((4 * hidden, hidden)),
            b: Array1::zeros(4 * hidden),
            w_out: Array2::zeros((horizon, hidden)),
            b_out: Array1::zeros(horizon),
        }
    }

    fn hidden(&self) -> usize {
        self.w_h.ncols()
    }

    fn horizon(&self) -> usize {
        self.b_out.len()
    }

    /// Run the recurrent layer over `inputs`, returning the final hidden state
    fn encode(&self, inputs: &[f64]) -> (Array1<f64>, Vec<StepCache>) {
        let hidden = self.hidden();
        let mut h = Array1::<f64>::zeros(hidden);
        let mut c = Array1::<f64>::zeros(hidden);
        let mut caches = Vec::with_capacity(inputs.len());

        for &x in inputs {
            let z = &self.w_x * x + self.w_h.dot(&h) + &self.b;

            let i = z.slice(s![0..hidden]).mapv(sigmoid);
            let f = z.slice(s![hidden..2 * hidden]).mapv(sigmoid);
            let g = z.slice(s![2 * hidden..3 * hidden]).mapv(f64::tanh);
            let o = z.slice(s![3 * hidden..4 * hidden]).mapv(sigmoid);

            let c_next = &f * &c + &i * &g;
            let h_next = &o * &c_next.mapv(f64::tanh);

            caches.push(StepCache {
                x,
                h_prev: h,
                c_prev: c,
                i,
                f,
                g,
                o,
                c: c_next.clone(),
            });

            h = h_next;
            c = c_next;
        }

        (h, caches)
    }

    /// Dense head applied to a (possibly dropped-out) hidden state
    fn head(&self, hidden: &Array1<f64>) -> Array1<f64> {
        self.w_out.dot(hidden) + &self.b_out
    }

    /// Add the gradients of one sample into `grads`.
    ///
    /// `dy` is the loss gradient at the head output, `dropped` the masked
    /// hidden state fed to the head and `mask` the dropout multipliers.
    fn accumulate(
        &self,
        caches: &[StepCache],
        mask: &Array1<f64>,
        dropped: &Array1<f64>,
        dy: &Array1<f64>,
        grads: &mut LstmParams,
    ) {
        let hidden = self.hidden();

        grads.w_out += &outer(dy, dropped);
        grads.b_out += dy;

        let mut dh = self.w_out.t().dot(dy) * mask;
        let mut dc = Array1::<f64>::zeros(hidden);
        let mut dz = Array1::<f64>::zeros(4 * hidden);

        for step in caches.iter().rev() {
            let tanh_c = step.c.mapv(f64::tanh);
            let d_o = &dh * &tanh_c;
            dc = dc + &dh * &step.o * &tanh_c.mapv(|t| 1.0 - t * t);

            let d_i = &dc * &step.g;
            let d_f = &dc * &step.c_prev;
            let d_g = &dc * &step.i;

            dz.slice_mut(s![0..hidden])
                .assign(&(d_i * &step.i.mapv(|v| v * (1.0 - v))));
            dz.slice_mut(s![hidden..2 * hidden])
                .assign(&(d_f * &step.f.mapv(|v| v * (1.0 - v))));
            dz.slice_mut(s![2 * hidden..3 * hidden])
                .assign(&(d_g * &step.g.mapv(|v| 1.0 - v * v)));
            dz.slice_mut(s![3 * hidden..4 * hidden])
                .assign(&(d_o * &step.o.mapv(|v| v * (1.0 - v))));

            grads.w_x.scaled_add(step.x, &dz);
            grads.w_h += &outer(&dz, &step.h_prev);
            grads.b += &dz;

            dh = self.w_h.t().dot(&dz);
            dc = dc * &step.f;
        }
    }

    fn global_norm(&self) -> f64 {
        let sum_sq = self.w_x.iter().map(|v| v * v).sum::<f64>()
            + self.w_h.iter().map(|v| v * v).sum::<f64>()
            + self.b.iter().map(|v| v * v).sum::<f64>()
            + self.w_out.iter().map(|v| v * v).sum::<f64>()
            + self.b_out.iter().map(|v| v * v).sum::<f64>();
        sum_sq.sqrt()
    }

    fn scale_by(&mut self, factor: f64) {
        self.w_x *= factor;
        self.w_h *= factor;
        self.b *= factor;
        self.w_out *= factor;
        self.b_out *= factor;
    }
}

/// First and second moment estimates for Nadam
struct Nadam {
    learning_rate: f64,
    step: i32,
    m: LstmParams,
    v: LstmParams,
}

impl Nadam {
    fn new(params: &LstmParams, learning_rate: f64) -> Self {
        Self {
            learning_rate,
            step: 0,
            m: LstmParams::zeros(params.hidden(), params.horizon()),
            v: LstmParams::zeros(params.hidden(), params.horizon()),
        }
    }

    fn apply(&mut self, params: &mut LstmParams, grads: &LstmParams) {
        self.step += 1;
        let rate = NadamRate {
            learning_rate: self.learning_rate,
            bias_1: 1.0 - BETA_1.powi(self.step),
            bias_1_next: 1.0 - BETA_1.powi(self.step + 1),
            bias_2: 1.0 - BETA_2.powi(self.step),
        };

        nadam_update(&mut params.w_x, &grads.w_x, &mut self.m.w_x, &mut self.v.w_x, &rate);
        nadam_update(&mut params.w_h, &grads.w_h, &mut self.m.w_h, &mut self.v.w_h, &rate);
        nadam_update(&mut params.b, &grads.b, &mut self.m.b, &mut self.v.b, &rate);
        nadam_update(&mut params.w_out, &grads.w_out, &mut self.m.w_out, &mut self.v.w_out, &rate);
        nadam_update(&mut params.b_out, &grads.b_out, &mut self.m.b_out, &mut self.v.b_out, &rate);
    }
}

struct NadamRate {
    learning_rate: f64,
    bias_1: f64,
    bias_1_next: f64,
    bias_2: f64,
}

fn nadam_update<D: Dimension>(
    param: &mut Array<f64, D>,
    grad: &Array<f64, D>,
    m: &mut Array<f64, D>,
    v: &mut Array<f64, D>,
    rate: &NadamRate,
) {
    Zip::from(param)
        .and(grad)
        .and(m)
        .and(v)
        .for_each(|p, &g, m, v| {
            *m = BETA_1 * *m + (1.0 - BETA_1) * g;
            *v = BETA_2 * *v + (1.0 - BETA_2) * g * g;
            let m_hat = BETA_1 * *m / rate.bias_1_next + (1.0 - BETA_1) * g / rate.bias_1;
            let v_hat = *v / rate.bias_2;
            *p -= rate.learning_rate * m_hat / (v_hat.sqrt() + EPSILON);
        });
}

fn sigmoid(v: f64) -> f64 {
    1.0 / (1.0 + (-v).exp())
}

fn outer(a: &Array1<f64>, b: &Array1<f64>) -> Array2<f64> {
    Array2::from_shape_fn((a.len(), b.len()), |(i, j)| a[i] * b[j])
}

fn dropout_mask(hidden: usize, rate: f64, rng: &mut StdRng) -> Array1<f64> {
    if rate <= 0.0 {
        return Array1::ones(hidden);
    }
    let keep = 1.0 / (1.0 - rate);
    Array1::from_shape_fn(hidden, |_| if rng.gen::<f64>() < rate { 0.0 } else { keep })
}

/// LSTM forecaster configured by [`LstmConfig`]
#[derive(Debug, Clone)]
pub struct LstmForecaster {
    name: String,
    config: LstmConfig,
}

/// Trained LSTM forecaster
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainedLstm {
    name: String,
    shape: WindowShape,
    params: LstmParams,
}

impl LstmForecaster {
    /// Create a forecaster, rejecting invalid hyperparameters
    pub fn new(config: LstmConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            name: format!("LSTM (hidden={})", config.hidden_units),
            config,
        })
    }

    pub fn config(&self) -> &LstmConfig {
        &self.config
    }
}

impl Forecaster for LstmForecaster {
    type Trained = TrainedLstm;

    fn train(&self, windows: &WindowSet, epochs: usize) -> Result<(TrainedLstm, TrainingMetrics)> {
        if windows.is_empty() {
            return Err(ForecastError::InsufficientWindow(
                "No windows to train on".to_string(),
            ));
        }
        if epochs == 0 {
            return Err(ForecastError::InvalidParameter(
                "epochs must be positive".to_string(),
            ));
        }

        let hidden = self.config.hidden_units;
        let horizon = windows.n_future();
        let mut rng = StdRng::seed_from_u64(self.config.seed);
        let mut params = LstmParams::init(hidden, horizon, &mut rng);
        let mut optimizer = Nadam::new(&params, self.config.learning_rate);
        let mut metrics = TrainingMetrics::new();
        let mut order: Vec<usize> = (0..windows.len()).collect();

        info!(
            model = %self.name,
            windows = windows.len(),
            epochs,
            "training"
        );

        for epoch in 0..epochs {
            order.shuffle(&mut rng);

            let mut loss_sum = 0.0;
            let mut batches = 0usize;
            let mut hits = 0usize;

            for batch in order.chunks(self.config.batch_size) {
                let mut grads = LstmParams::zeros(hidden, horizon);
                let weight = 1.0 / batch.len() as f64;
                let mut batch_loss = 0.0;

                for &index in batch {
                    let window = &windows.windows()[index];
                    let target = Array1::from(window.future.clone());

                    let (last_hidden, caches) = params.encode(&window.past);
                    let mask = dropout_mask(hidden, self.config.dropout, &mut rng);
                    let dropped = &last_hidden * &mask;
                    let output = params.head(&dropped);

                    let error = &output - &target;
                    batch_loss += error.mapv(|e| e * e).sum() / horizon as f64;
                    if peaks_agree(&output.to_vec(), &window.future)? {
                        hits += 1;
                    }

                    let dy = error * (2.0 * weight / horizon as f64);
                    params.accumulate(&caches, &mask, &dropped, &dy, &mut grads);
                }

                if let Some(clip) = self.config.clip_threshold() {
                    let norm = grads.global_norm();
                    if norm > clip {
                        grads.scale_by(clip / norm);
                    }
                }
                optimizer.apply(&mut params, &grads);

                loss_sum += batch_loss * weight;
                batches += 1;
            }

            let loss = loss_sum / batches as f64;
            let accuracy = hits as f64 / windows.len() as f64;
            metrics.push(loss, accuracy);
            debug!(epoch = epoch + 1, loss, accuracy, "epoch finished");
        }

        let model = TrainedLstm {
            name: self.name.clone(),
            shape: windows.shape(),
            params,
        };
        Ok((model, metrics))
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl TrainedLstm {
    /// Window shape the model was trained on
    pub fn trained_shape(&self) -> WindowShape {
        self.shape
    }

    pub fn hidden_units(&self) -> usize {
        self.params.hidden()
    }
}

impl TrainedForecaster for TrainedLstm {
    /// Any non-empty input length is accepted; the recurrent encoder is not
    /// tied to the training window's `n_past`.
    fn predict(&self, past: &[f64]) -> Result<Vec<f64>> {
        if past.is_empty() {
            return Err(ForecastError::InvalidParameter(
                "Cannot predict from an empty window".to_string(),
            ));
        }

        let (last_hidden, _) = self.params.encode(past);
        Ok(self.params.head(&last_hidden).to_vec())
    }

    fn horizon(&self) -> usize {
        self.params.horizon()
    }

    fn name(&self) -> &str {
        &self.name
    }
}
