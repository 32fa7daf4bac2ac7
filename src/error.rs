//! Domain error type for forecast requests.
//!
//! Artifact and ONNX plumbing report failures through `anyhow`; the request
//! path converts them into [`ForecastError`], which knows its HTTP status.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, error};

/// Errors surfaced by the forecast endpoint.
#[derive(Error, Debug)]
pub enum ForecastError {
    /// Caller supplied fewer observations than the model window needs.
    #[error("at least {required} historical prices are required for a forecast, got {got}")]
    InsufficientHistory { required: usize, got: usize },

    /// An artifact failed to load at startup and the server kept running.
    #[error("{0} artifact is not loaded")]
    ArtifactUnavailable(&'static str),

    /// Scaling, model execution or output shape failure.
    #[error("inference failed: {0:#}")]
    Inference(#[from] anyhow::Error),
}

impl ForecastError {
    /// HTTP status reported for this error.
    pub fn status(&self) -> StatusCode {
        match self {
            ForecastError::InsufficientHistory { .. } => StatusCode::BAD_REQUEST,
            ForecastError::ArtifactUnavailable(_) | ForecastError::Inference(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

#[derive(Serialize)]
struct ErrorDetail {
    detail: String,
}

impl IntoResponse for ForecastError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_client_error() {
            debug!("Rejected forecast request: {}", self);
            return (status, Json(ErrorDetail { detail: self.to_string() })).into_response();
        }

        // Server-side causes stay in the log.
        error!("Forecast request failed: {}", self);
        (status, "Internal Server Error").into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insufficient_history_message_names_minimum() {
        let err = ForecastError::InsufficientHistory { required: 60, got: 59 };
        let msg = err.to_string();
        assert!(msg.contains("60"));
        assert!(msg.contains("59"));
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_server_side_errors_map_to_500() {
        assert_eq!(
            ForecastError::ArtifactUnavailable("model").status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        let err: ForecastError = anyhow::anyhow!("bad shape").into();
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(err.to_string().contains("bad shape"));
    }
}
