//! Command-line configuration for the forecast server.

use crate::artifacts::{ArtifactPaths, LoadPolicy};
use crate::predictor::PredictorConfig;
use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use tracing::Level;

/// Price forecast server
#[derive(Parser, Debug, Clone)]
#[command(name = "price-forecast")]
#[command(version)]
#[command(about = "Serves multi-step price forecasts from a trained sequence model")]
pub struct Cli {
    /// Host to bind to
    #[arg(long, default_value = "0.0.0.0")]
    pub host: String,

    /// Port to listen on
    #[arg(short, long, default_value = "8000")]
    pub port: u16,

    /// Trained model (ONNX)
    #[arg(long, default_value = "lstm_model.onnx")]
    pub model: PathBuf,

    /// Fitted scaler parameters (JSON)
    #[arg(long, default_value = "scaler.json")]
    pub scaler: PathBuf,

    /// ONNX Runtime intra-op threads
    #[arg(long, default_value = "1")]
    pub intra_threads: usize,

    /// Keep serving when an artifact fails to load
    #[arg(long)]
    pub lenient: bool,

    /// Maximum log level
    #[arg(long, default_value = "info")]
    pub log_level: Level,
}

impl Cli {
    pub fn socket_addr(&self) -> anyhow::Result<SocketAddr> {
        Ok(format!("{}:{}", self.host, self.port).parse()?)
    }

    pub fn artifact_paths(&self) -> ArtifactPaths {
        ArtifactPaths {
            model: self.model.clone(),
            scaler: self.scaler.clone(),
        }
    }

    pub fn load_policy(&self) -> LoadPolicy {
        if self.lenient {
            LoadPolicy::Lenient
        } else {
            LoadPolicy::Strict
        }
    }

    pub fn predictor_config(&self) -> PredictorConfig {
        PredictorConfig {
            intra_threads: self.intra_threads,
            ..PredictorConfig::default()
        }
    }
}
