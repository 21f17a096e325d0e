//! Standardization of feature matrices and regression targets.
//!
//! Scalers are fit on the training partition only and applied unchanged to
//! the test partition. The fitted target scaler travels with a regression
//! outcome's artifacts so the simulator can invert predictions back to the
//! original scale.

use crate::error::{ModelError, Result};
use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};

/// Per-column zero-mean unit-variance scaler for feature matrices.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StandardScaler {
    means: Vec<f64>,
    stds: Vec<f64>,
}

impl StandardScaler {
    /// Fit column means and standard deviations on `x`.
    ///
    /// Zero-variance columns get a scale of 1.0 so constant features pass
    /// through centered instead of producing NaN.
    pub fn fit(x: &Array2<f64>) -> Self {
        let means = x.mean_axis(Axis(0)).map_or_else(Vec::new, |m| m.to_vec());
        let stds = x
            .axis_iter(Axis(1))
            .map(|column| {
                let std = column.std(1.0);
                if std == 0.0 || !std.is_finite() { 1.0 } else { std }
            })
            .collect();
        Self { means, stds }
    }

    /// Standardize `x` with the fitted parameters.
    pub fn transform(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        if x.ncols() != self.means.len() {
            return Err(ModelError::Shape {
                expected: format!("{} columns", self.means.len()),
                actual: format!("{} columns", x.ncols()),
            });
        }
        let mut scaled = x.clone();
        for (j, mut column) in scaled.axis_iter_mut(Axis(1)).enumerate() {
            let (mean, std) = (self.means[j], self.stds[j]);
            column.mapv_inplace(|v| (v - mean) / std);
        }
        Ok(scaled)
    }

    /// Number of columns the scaler was fit on.
    pub fn n_features(&self) -> usize {
        self.means.len()
    }
}

/// Scaler for a single regression target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetScaler {
    /// Fitted mean of the target.
    pub mean: f64,
    /// Fitted standard deviation of the target.
    pub std: f64,
}

impl TargetScaler {
    /// Fit on a target vector.
    pub fn fit(y: &Array1<f64>) -> Self {
        let mean = y.mean().unwrap_or(0.0);
        let std = y.std(1.0);
        let std = if std == 0.0 || !std.is_finite() { 1.0 } else { std };
        Self { mean, std }
    }

    /// Standardize `y`.
    pub fn transform(&self, y: &Array1<f64>) -> Array1<f64> {
        y.mapv(|v| (v - self.mean) / self.std)
    }

    /// Map standardized predictions back to the original scale.
    pub fn inverse_transform(&self, y: &Array1<f64>) -> Array1<f64> {
        y.mapv(|v| v * self.std + self.mean)
    }
}
