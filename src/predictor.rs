//! Multi-step price forecasting.
//!
//! Provides the [`Forecaster`] seam over the sequence model, its ONNX Runtime
//! implementation, and the [`ForecastPipeline`] that scales a price window,
//! runs the model and maps the output back to price units.

use crate::scaler::Scaler;
use crate::{Result, FORECAST_HORIZON, WINDOW_SIZE};
use anyhow::Context;
use ndarray::{Array2, Array3};
use ort::session::{builder::GraphOptimizationLevel, Session};
use ort::value::Value;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Mutex;
use tracing::debug;

/// Configuration for the forecasting model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictorConfig {
    /// Input sequence length (time steps)
    pub window_size: usize,

    /// Number of future steps the model emits
    pub horizon: usize,

    /// ONNX Runtime intra-op thread count
    pub intra_threads: usize,

    /// Enable graph optimization
    pub optimize_graph: bool,
}

impl Default for PredictorConfig {
    fn default() -> Self {
        Self {
            window_size: WINDOW_SIZE,
            horizon: FORECAST_HORIZON,
            intra_threads: 1,
            optimize_graph: true,
        }
    }
}

/// Forward pass of a sequence-to-sequence regression model.
///
/// Input is `(batch, steps, features)`; output is `(batch, horizon)`.
pub trait Forecaster: Send + Sync {
    fn forecast(&self, window: Array3<f32>) -> Result<Array2<f32>>;
}

/// Forecaster backed by an ONNX Runtime session.
///
/// Running a session needs exclusive access, so concurrent requests
/// serialize on the session lock.
pub struct OnnxForecaster {
    session: Mutex<Session>,
}

impl OnnxForecaster {
    /// Load an ONNX model from disk.
    ///
    /// # Example
    /// ```no_run
    /// use price_forecast::{OnnxForecaster, PredictorConfig};
    /// use std::path::Path;
    ///
    /// let model = OnnxForecaster::load(
    ///     Path::new("lstm_model.onnx"),
    ///     &PredictorConfig::default(),
    /// ).unwrap();
    /// ```
    pub fn load(model_path: &Path, config: &PredictorConfig) -> Result<Self> {
        let session = Session::builder()?
            .with_optimization_level(if config.optimize_graph {
                GraphOptimizationLevel::Level3
            } else {
                GraphOptimizationLevel::Level1
            })?
            .with_intra_threads(config.intra_threads)?
            .commit_from_file(model_path)
            .with_context(|| format!("failed to load ONNX model {}", model_path.display()))?;

        Ok(Self {
            session: Mutex::new(session),
        })
    }
}

impl Forecaster for OnnxForecaster {
    fn forecast(&self, window: Array3<f32>) -> Result<Array2<f32>> {
        let batch = window.shape()[0];
        let input_tensor = Value::from_array(window)?;

        let mut session = self
            .session
            .lock()
            .map_err(|_| anyhow::anyhow!("ONNX session lock poisoned"))?;
        let outputs = session.run(ort::inputs![input_tensor])?;

        // Single-output graph: (batch, horizon)
        let (shape, data) = outputs[0].try_extract_tensor::<f32>()?;
        debug!("Model output shape: {:?}", shape);

        if batch == 0 || data.len() % batch != 0 {
            anyhow::bail!(
                "model output of {} values does not split into batch of {}",
                data.len(),
                batch
            );
        }
        let output = Array2::from_shape_vec((batch, data.len() / batch), data.to_vec())?;
        Ok(output)
    }
}

/// Forecast produced for one request, in original price units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Forecast {
    pub predicted_prices: Vec<f64>,
}

/// Scale → predict → inverse-scale over borrowed artifacts.
pub struct ForecastPipeline<'a> {
    forecaster: &'a dyn Forecaster,
    scaler: &'a Scaler,
    config: &'a PredictorConfig,
}

impl<'a> ForecastPipeline<'a> {
    pub fn new(
        forecaster: &'a dyn Forecaster,
        scaler: &'a Scaler,
        config: &'a PredictorConfig,
    ) -> Self {
        Self {
            forecaster,
            scaler,
            config,
        }
    }

    /// Forecast from a validated window of exactly `window_size` prices.
    pub fn run(&self, window: &[f64]) -> Result<Forecast> {
        let steps = self.config.window_size;
        if window.len() != steps {
            anyhow::bail!("expected window of {} prices, got {}", steps, window.len());
        }

        // 1. Single-feature column, scaled
        let column = Array2::from_shape_vec((steps, 1), window.to_vec())?;
        let scaled = self.scaler.transform(&column)?;

        // 2. (1, steps, 1) model input
        let input = Array3::from_shape_vec(
            (1, steps, 1),
            scaled.iter().map(|&v| v as f32).collect(),
        )?;
        let output = self
            .forecaster
            .forecast(input)
            .context("model forward pass failed")?;

        let horizon = self.config.horizon;
        if output.dim() != (1, horizon) {
            anyhow::bail!(
                "model returned shape {:?}, expected [1, {}]",
                output.shape(),
                horizon
            );
        }

        // 3. (horizon, 1) column back to price units
        let scaled_forecast =
            Array2::from_shape_vec((horizon, 1), output.iter().map(|&v| v as f64).collect())?;
        let prices = self.scaler.inverse_transform(&scaled_forecast)?;

        Ok(Forecast {
            predicted_prices: prices.iter().copied().collect(),
        })
    }
}
