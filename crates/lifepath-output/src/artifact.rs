//! Serializable artifact forms of the trained models.
//!
//! Artifacts are what the downstream simulator consumes; each one carries
//! the ordered feature-name list so a loaded model can check the columns it
//! is applied to.

use crate::error::{ArtifactError, Result};
use lifepath_model::{BaselineModel, GradientBoosting, TargetScaler, TrainedOutcome};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

/// Which parametric family a baseline artifact holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BaselineKind {
    /// Weighted logistic regression.
    Logit,
    /// Weighted least squares.
    Ols,
}

impl BaselineKind {
    /// Suffix used in the artifact file name.
    pub const fn suffix(self) -> &'static str {
        match self {
            Self::Logit => "logit",
            Self::Ols => "ols",
        }
    }
}

/// A persisted parametric baseline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BaselineArtifact {
    /// Parametric family.
    pub kind: BaselineKind,
    /// Coefficients, in `feature_names` order.
    pub coefficients: Vec<f64>,
    /// Fitted intercept.
    pub intercept: f64,
    /// Ordered feature names the model was fit on.
    pub feature_names: Vec<String>,
    /// Whether the fit converged.
    pub converged: bool,
}

impl BaselineArtifact {
    /// Extract the baseline artifact from a training result.
    pub fn from_trained(trained: &TrainedOutcome) -> Result<Self> {
        let kind = match trained.baseline {
            BaselineModel::Logit(_) => BaselineKind::Logit,
            BaselineModel::LeastSquares(_) => BaselineKind::Ols,
        };
        let coefficients = trained
            .baseline
            .coefficients()
            .ok_or(ArtifactError::Unfitted("baseline"))?
            .to_vec();
        let intercept = trained
            .baseline
            .intercept()
            .ok_or(ArtifactError::Unfitted("baseline"))?;
        Ok(Self {
            kind,
            coefficients,
            intercept,
            feature_names: trained.feature_names.clone(),
            converged: trained.baseline.converged(),
        })
    }

    /// Apply the baseline to a feature matrix in artifact feature order.
    ///
    /// Logit artifacts return probabilities, OLS artifacts raw values.
    pub fn predict(&self, x: &Array2<f64>) -> Array1<f64> {
        let coefficients = Array1::from_vec(self.coefficients.clone());
        let linear = x.dot(&coefficients) + self.intercept;
        match self.kind {
            BaselineKind::Logit => linear.mapv(|v| 1.0 / (1.0 + (-v).exp())),
            BaselineKind::Ols => linear,
        }
    }
}

/// A persisted boosted ensemble with its feature order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnsembleArtifact {
    /// Ordered feature names the ensemble was fit on.
    pub feature_names: Vec<String>,
    /// The fitted ensemble, hyperparameters included.
    pub model: GradientBoosting,
}

impl EnsembleArtifact {
    /// Extract the ensemble artifact from a training result.
    pub fn from_trained(trained: &TrainedOutcome) -> Self {
        Self {
            feature_names: trained.feature_names.clone(),
            model: trained.ensemble.clone(),
        }
    }
}

/// A persisted target scaler for a continuous outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScalerArtifact {
    /// Fitted target mean.
    pub mean: f64,
    /// Fitted target standard deviation.
    pub std: f64,
}

impl From<&TargetScaler> for ScalerArtifact {
    fn from(scaler: &TargetScaler) -> Self {
        Self {
            mean: scaler.mean,
            std: scaler.std,
        }
    }
}

impl From<&ScalerArtifact> for TargetScaler {
    fn from(artifact: &ScalerArtifact) -> Self {
        Self {
            mean: artifact.mean,
            std: artifact.std,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    #[test]
    fn test_logit_artifact_predicts_probabilities() {
        let artifact = BaselineArtifact {
            kind: BaselineKind::Logit,
            coefficients: vec![1.0],
            intercept: 0.0,
            feature_names: vec!["age".to_string()],
            converged: true,
        };
        let p = artifact.predict(&array![[0.0], [10.0], [-10.0]]);
        assert_abs_diff_eq!(p[0], 0.5, epsilon = 1e-12);
        assert!(p[1] > 0.999);
        assert!(p[2] < 0.001);
    }

    #[test]
    fn test_ols_artifact_is_linear() {
        let artifact = BaselineArtifact {
            kind: BaselineKind::Ols,
            coefficients: vec![2.0, -1.0],
            intercept: 3.0,
            feature_names: vec!["a".to_string(), "b".to_string()],
            converged: true,
        };
        let values = artifact.predict(&array![[1.0, 1.0], [0.0, 4.0]]);
        assert_abs_diff_eq!(values[0], 4.0, epsilon = 1e-12);
        assert_abs_diff_eq!(values[1], -1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_scaler_artifact_round_trips() {
        let scaler = TargetScaler {
            mean: 1200.0,
            std: 300.0,
        };
        let artifact = ScalerArtifact::from(&scaler);
        let restored = TargetScaler::from(&artifact);
        assert_eq!(scaler, restored);
    }
}
