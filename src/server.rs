//! HTTP surface: shared state, routing and the forecast endpoint.

use crate::artifacts::ArtifactStore;
use crate::error::ForecastError;
use crate::monitor::{track_resources, ProcessProbe};
use crate::predictor::Forecast;
use crate::window::select_window;
use axum::{extract::State, middleware, routing::post, Json, Router};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// Request body for `POST /predict`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictRequest {
    /// Oldest to newest; at least one window's worth
    pub historical_prices: Vec<f64>,
}

/// State shared by all requests.
pub struct AppState {
    pub artifacts: ArtifactStore,
    pub probe: ProcessProbe,
}

impl AppState {
    pub fn new(artifacts: ArtifactStore) -> Self {
        Self {
            artifacts,
            probe: ProcessProbe::new(),
        }
    }
}

pub type SharedState = Arc<AppState>;

/// Build the application router.
pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/predict", post(predict))
        .layer(middleware::from_fn_with_state(state.clone(), track_resources))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// POST /predict - forecast the next horizon of prices
pub async fn predict(
    State(state): State<SharedState>,
    Json(request): Json<PredictRequest>,
) -> Result<Json<Forecast>, ForecastError> {
    let window_size = state.artifacts.config().window_size;
    let window = select_window(&request.historical_prices, window_size)?.to_vec();

    let forecast = tokio::task::spawn_blocking(move || -> Result<Forecast, ForecastError> {
        let pipeline = state.artifacts.pipeline()?;
        Ok(pipeline.run(&window)?)
    })
    .await
    .map_err(|e| ForecastError::Inference(anyhow::anyhow!("forecast task aborted: {}", e)))??;

    Ok(Json(forecast))
}
