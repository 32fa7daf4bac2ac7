//! Startup-time artifact loading.
//!
//! The model and scaler are loaded once, then shared read-only by every
//! request for the life of the process. There is no reload.

use crate::error::ForecastError;
use crate::predictor::{ForecastPipeline, Forecaster, OnnxForecaster, PredictorConfig};
use crate::scaler::Scaler;
use crate::Result;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};

/// Locations of the serialized artifacts.
#[derive(Debug, Clone)]
pub struct ArtifactPaths {
    pub model: PathBuf,
    pub scaler: PathBuf,
}

impl Default for ArtifactPaths {
    fn default() -> Self {
        Self {
            model: PathBuf::from("lstm_model.onnx"),
            scaler: PathBuf::from("scaler.json"),
        }
    }
}

/// What to do when an artifact fails to load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoadPolicy {
    /// Abort startup.
    #[default]
    Strict,
    /// Log the failure and keep serving; requests needing the artifact fail.
    Lenient,
}

/// Process-wide model and scaler.
pub struct ArtifactStore {
    forecaster: Option<Arc<dyn Forecaster>>,
    scaler: Option<Arc<Scaler>>,
    config: PredictorConfig,
}

impl ArtifactStore {
    /// Load both artifacts from disk.
    pub fn load(paths: &ArtifactPaths, config: PredictorConfig, policy: LoadPolicy) -> Result<Self> {
        let forecaster = match OnnxForecaster::load(&paths.model, &config) {
            Ok(model) => {
                info!("Model loaded from {:?}", paths.model);
                Some(Arc::new(model) as Arc<dyn Forecaster>)
            }
            Err(e) => tolerate(policy, "model", e)?,
        };

        let scaler = match Scaler::load(&paths.scaler) {
            Ok(scaler) => {
                info!("Scaler loaded from {:?}: {:?}", paths.scaler, scaler);
                Some(Arc::new(scaler))
            }
            Err(e) => tolerate(policy, "scaler", e)?,
        };

        Ok(Self {
            forecaster,
            scaler,
            config,
        })
    }

    /// Build a store from already-constructed artifacts.
    pub fn from_parts(
        forecaster: Option<Arc<dyn Forecaster>>,
        scaler: Option<Scaler>,
        config: PredictorConfig,
    ) -> Self {
        Self {
            forecaster,
            scaler: scaler.map(Arc::new),
            config,
        }
    }

    pub fn config(&self) -> &PredictorConfig {
        &self.config
    }

    pub fn is_complete(&self) -> bool {
        self.forecaster.is_some() && self.scaler.is_some()
    }

    /// Pipeline over the loaded artifacts.
    pub fn pipeline(&self) -> std::result::Result<ForecastPipeline<'_>, ForecastError> {
        let forecaster = self
            .forecaster
            .as_deref()
            .ok_or(ForecastError::ArtifactUnavailable("model"))?;
        let scaler = self
            .scaler
            .as_deref()
            .ok_or(ForecastError::ArtifactUnavailable("scaler"))?;
        Ok(ForecastPipeline::new(forecaster, scaler, &self.config))
    }
}

fn tolerate<T>(policy: LoadPolicy, artifact: &str, err: anyhow::Error) -> Result<Option<T>> {
    match policy {
        LoadPolicy::Strict => Err(err.context(format!("failed to load {}", artifact))),
        LoadPolicy::Lenient => {
            error!("Failed to load {}: {:#}", artifact, err);
            Ok(None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{Array2, Array3};

    struct ZeroForecaster;

    impl Forecaster for ZeroForecaster {
        fn forecast(&self, _window: Array3<f32>) -> Result<Array2<f32>> {
            Ok(Array2::zeros((1, crate::FORECAST_HORIZON)))
        }
    }

    fn missing_paths(dir: &tempfile::TempDir) -> ArtifactPaths {
        ArtifactPaths {
            model: dir.path().join("missing.onnx"),
            scaler: dir.path().join("missing.json"),
        }
    }

    #[test]
    fn test_artifact_paths_default() {
        let paths = ArtifactPaths::default();
        assert_eq!(paths.model, PathBuf::from("lstm_model.onnx"));
        assert_eq!(paths.scaler, PathBuf::from("scaler.json"));
    }

    #[test]
    fn test_strict_load_fails_on_missing_artifacts() {
        let dir = tempfile::tempdir().unwrap();
        let result = ArtifactStore::load(
            &missing_paths(&dir),
            PredictorConfig::default(),
            LoadPolicy::Strict,
        );
        let err = result.err().expect("strict load must fail");
        assert!(format!("{:#}", err).contains("failed to load model"));
    }

    #[test]
    fn test_lenient_load_keeps_running_without_artifacts() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::load(
            &missing_paths(&dir),
            PredictorConfig::default(),
            LoadPolicy::Lenient,
        )
        .unwrap();

        assert!(!store.is_complete());
        assert!(matches!(
            store.pipeline(),
            Err(ForecastError::ArtifactUnavailable("model"))
        ));
    }

    #[test]
    fn test_lenient_load_reports_missing_scaler_only() {
        let store = ArtifactStore::from_parts(
            Some(Arc::new(ZeroForecaster)),
            None,
            PredictorConfig::default(),
        );
        assert!(matches!(
            store.pipeline(),
            Err(ForecastError::ArtifactUnavailable("scaler"))
        ));
    }

    #[test]
    fn test_from_parts_builds_pipeline() {
        let store = ArtifactStore::from_parts(
            Some(Arc::new(ZeroForecaster)),
            Some(Scaler::min_max(10.0, 20.0)),
            PredictorConfig::default(),
        );
        assert!(store.is_complete());

        let forecast = store.pipeline().unwrap().run(&[15.0; 60]).unwrap();
        assert_eq!(forecast.predicted_prices.len(), 10);
        assert!(forecast.predicted_prices.iter().all(|p| (p - 10.0).abs() < 1e-9));
    }
}
