//! Multi-step price forecasting over HTTP.
//!
//! Loads a sequence model (ONNX) and its fitted scaler once at startup and
//! serves `POST /predict`, turning a price history into a fixed-horizon
//! forecast. Every response carries timing and resource-usage headers.

pub mod artifacts;
pub mod config;
pub mod error;
pub mod monitor;
pub mod predictor;
pub mod scaler;
pub mod server;
pub mod window;

pub use artifacts::{ArtifactPaths, ArtifactStore, LoadPolicy};
pub use error::ForecastError;
pub use predictor::{Forecast, ForecastPipeline, Forecaster, OnnxForecaster, PredictorConfig};
pub use scaler::Scaler;
pub use server::{router, AppState, PredictRequest, SharedState};

/// Number of trailing observations the model consumes.
pub const WINDOW_SIZE: usize = 60;

/// Number of future steps returned per forecast.
pub const FORECAST_HORIZON: usize = 10;

/// Library-wide error type.
pub type Result<T> = anyhow::Result<T>;
