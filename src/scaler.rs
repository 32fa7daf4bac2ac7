//! Fitted single-feature scaling transforms.
//!
//! The scaler is fitted offline alongside the model and shipped as JSON.
//! Parameters mirror scikit-learn's `MinMaxScaler` and `StandardScaler`
//! so an exported training artifact can be read without conversion:
//!
//! ```json
//! {"kind": "min_max", "data_min": 10.5, "data_max": 42.0, "feature_range": [0.0, 1.0]}
//! {"kind": "standard", "mean": 25.0, "scale": 4.2}
//! ```

use crate::Result;
use anyhow::Context;
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// A fitted, invertible transform over one numeric feature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Scaler {
    /// Linear map of `[data_min, data_max]` onto `feature_range`.
    MinMax {
        data_min: f64,
        data_max: f64,
        #[serde(default = "default_feature_range")]
        feature_range: (f64, f64),
    },

    /// Standardisation: `(x - mean) / scale`.
    Standard { mean: f64, scale: f64 },
}

fn default_feature_range() -> (f64, f64) {
    (0.0, 1.0)
}

/// Zero spans are replaced by 1, as scikit-learn does.
fn nonzero(span: f64) -> f64 {
    if span == 0.0 {
        1.0
    } else {
        span
    }
}

impl Scaler {
    /// Min-max scaler fitted to `[data_min, data_max]`, mapping onto `[0, 1]`.
    pub fn min_max(data_min: f64, data_max: f64) -> Self {
        Scaler::MinMax {
            data_min,
            data_max,
            feature_range: default_feature_range(),
        }
    }

    /// Standard scaler with the given mean and standard deviation.
    pub fn standard(mean: f64, scale: f64) -> Self {
        Scaler::Standard { mean, scale }
    }

    /// Load fitted parameters from a JSON file.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read scaler file {}", path.display()))?;
        let scaler: Scaler = serde_json::from_str(&raw)
            .with_context(|| format!("failed to parse scaler file {}", path.display()))?;
        scaler.validate()?;
        Ok(scaler)
    }

    /// Reject parameters that cannot produce a finite, invertible transform.
    pub fn validate(&self) -> Result<()> {
        match *self {
            Scaler::MinMax {
                data_min,
                data_max,
                feature_range: (lo, hi),
            } => {
                if ![data_min, data_max, lo, hi].iter().all(|v| v.is_finite()) {
                    anyhow::bail!("min-max scaler parameters must be finite");
                }
                if lo >= hi {
                    anyhow::bail!(
                        "min-max feature_range must be increasing, got ({}, {})",
                        lo,
                        hi
                    );
                }
            }
            Scaler::Standard { mean, scale } => {
                if !mean.is_finite() || !scale.is_finite() {
                    anyhow::bail!("standard scaler parameters must be finite");
                }
            }
        }
        Ok(())
    }

    /// `(multiplier, offset)` such that `scaled = x * multiplier + offset`.
    fn coefficients(&self) -> (f64, f64) {
        match *self {
            Scaler::MinMax {
                data_min,
                data_max,
                feature_range: (lo, hi),
            } => {
                let multiplier = (hi - lo) / nonzero(data_max - data_min);
                (multiplier, lo - data_min * multiplier)
            }
            Scaler::Standard { mean, scale } => {
                let scale = nonzero(scale);
                (1.0 / scale, -mean / scale)
            }
        }
    }

    /// Scale a single value.
    pub fn scale_value(&self, value: f64) -> f64 {
        let (multiplier, offset) = self.coefficients();
        value * multiplier + offset
    }

    /// Map a scaled value back to original units.
    pub fn unscale_value(&self, value: f64) -> f64 {
        let (multiplier, offset) = self.coefficients();
        (value - offset) / multiplier
    }

    /// Apply the transform to a `(n, 1)` feature column.
    pub fn transform(&self, column: &Array2<f64>) -> Result<Array2<f64>> {
        check_single_feature(column)?;
        Ok(column.mapv(|v| self.scale_value(v)))
    }

    /// Apply the inverse transform to a `(n, 1)` feature column.
    pub fn inverse_transform(&self, column: &Array2<f64>) -> Result<Array2<f64>> {
        check_single_feature(column)?;
        Ok(column.mapv(|v| self.unscale_value(v)))
    }

    /// Range of original values that map onto the scaled training domain.
    ///
    /// For min-max this is `[data_min, data_max]`; for standardisation it is
    /// the mean plus or minus three standard deviations.
    pub fn fitted_domain(&self) -> (f64, f64) {
        match *self {
            Scaler::MinMax {
                data_min, data_max, ..
            } => (data_min.min(data_max), data_min.max(data_max)),
            Scaler::Standard { mean, scale } => {
                let spread = 3.0 * nonzero(scale).abs();
                (mean - spread, mean + spread)
            }
        }
    }
}

fn check_single_feature(column: &Array2<f64>) -> Result<()> {
    if column.ncols() != 1 {
        anyhow::bail!(
            "scaler was fitted on 1 feature, got input with {} columns",
            column.ncols()
        );
    }
    Ok(())
}
