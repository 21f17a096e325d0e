//! Dual-model training of a single outcome.
//!
//! Every outcome gets two models fit on the identical dataset: a weighted
//! parametric baseline (logit for binary outcomes, least squares for
//! continuous ones) and a cross-validation-tuned boosted ensemble. The
//! tuning winner is refit on the full training partition with the held-out
//! test partition driving early stopping. Both models are kept; neither
//! replaces the other.

use crate::boost::{
    weighted_log_loss, weighted_mse, GradientBoosting, Objective, ValidationSet,
};
use crate::dataset::TrainingDataset;
use crate::error::Result;
use crate::linear::{WeightedLeastSquares, WeightedLogit};
use crate::tuning::{grid_search, GridSearchReport, ParamGrid};
use ndarray::Array1;
use serde::{Deserialize, Serialize};

/// The parametric half of the pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum BaselineModel {
    /// Weighted logistic regression, binary outcomes.
    Logit(WeightedLogit),
    /// Weighted least squares, continuous outcomes.
    LeastSquares(WeightedLeastSquares),
}

impl BaselineModel {
    /// Whether the fit converged. Least squares is a direct solve and
    /// always counts as converged.
    pub fn converged(&self) -> bool {
        match self {
            Self::Logit(model) => model.converged,
            Self::LeastSquares(_) => true,
        }
    }

    /// Fitted coefficients, in feature order.
    pub fn coefficients(&self) -> Option<&Array1<f64>> {
        match self {
            Self::Logit(model) => model.coefficients.as_ref(),
            Self::LeastSquares(model) => model.coefficients.as_ref(),
        }
    }

    /// Fitted intercept.
    pub fn intercept(&self) -> Option<f64> {
        match self {
            Self::Logit(model) => model.intercept,
            Self::LeastSquares(model) => model.intercept,
        }
    }
}

/// Knobs of one outcome's training run.
#[derive(Debug, Clone)]
pub struct TrainerConfig {
    /// Optimization objective shared by both models.
    pub objective: Objective,
    /// Hyperparameter grid for the ensemble.
    pub grid: ParamGrid,
    /// Cross-validation folds for the grid search.
    pub cv_folds: usize,
    /// Early-stopping patience for the final refit.
    pub patience: usize,
    /// Seed for folds, bagging and dropout.
    pub seed: u64,
}

impl TrainerConfig {
    /// Defaults: 3-fold search over the full grid, patience 5.
    pub fn new(objective: Objective) -> Self {
        Self {
            objective,
            grid: ParamGrid::default(),
            cv_folds: 3,
            patience: 5,
            seed: 42,
        }
    }
}

/// Held-out losses of the fitted pair (log loss or squared error).
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct FitMetrics {
    /// Baseline loss on the test partition.
    pub baseline_loss: f64,
    /// Ensemble loss on the test partition.
    pub ensemble_loss: f64,
}

/// Everything one outcome's training run produced.
#[derive(Debug, Clone)]
pub struct TrainedOutcome {
    /// The fitted parametric baseline.
    pub baseline: BaselineModel,
    /// The fitted, tuned ensemble.
    pub ensemble: GradientBoosting,
    /// The grid-search outcome behind the ensemble.
    pub search: GridSearchReport,
    /// Held-out losses of both models.
    pub metrics: FitMetrics,
    /// Feature order both models were fit on.
    pub feature_names: Vec<String>,
}

/// Fit both models of one outcome on a prepared dataset.
pub fn train_outcome(dataset: &TrainingDataset, config: &TrainerConfig) -> Result<TrainedOutcome> {
    let baseline = fit_baseline(dataset, config.objective)?;
    let baseline_loss = score_baseline(&baseline, dataset, config.objective)?;

    let search = grid_search(
        &dataset.x_train,
        &dataset.y_train,
        &dataset.w_train,
        config.objective,
        &config.grid,
        config.cv_folds,
        config.seed,
    )?;

    let mut ensemble = GradientBoosting::new(search.best_config);
    ensemble.fit(
        &dataset.x_train,
        &dataset.y_train,
        &dataset.w_train,
        Some(ValidationSet {
            x: &dataset.x_test,
            y: &dataset.y_test,
            w: &dataset.w_test,
        }),
        config.patience,
    )?;
    let ensemble_loss = ensemble.score(&dataset.x_test, &dataset.y_test, &dataset.w_test)?;

    Ok(TrainedOutcome {
        baseline,
        ensemble,
        search,
        metrics: FitMetrics {
            baseline_loss,
            ensemble_loss,
        },
        feature_names: dataset.feature_names.clone(),
    })
}

fn fit_baseline(dataset: &TrainingDataset, objective: Objective) -> Result<BaselineModel> {
    Ok(match objective {
        Objective::Binary => {
            let mut model = WeightedLogit::new(true);
            model.fit(&dataset.x_train, &dataset.y_train, &dataset.w_train)?;
            BaselineModel::Logit(model)
        }
        Objective::Regression => {
            let mut model = WeightedLeastSquares::new(true);
            model.fit(&dataset.x_train, &dataset.y_train, &dataset.w_train)?;
            BaselineModel::LeastSquares(model)
        }
    })
}

fn score_baseline(
    baseline: &BaselineModel,
    dataset: &TrainingDataset,
    objective: Objective,
) -> Result<f64> {
    Ok(match baseline {
        BaselineModel::Logit(model) => match objective {
            Objective::Binary => {
                let p = model.predict_proba(&dataset.x_test)?;
                weighted_log_loss(&dataset.y_test, &p, &dataset.w_test)
            }
            Objective::Regression => {
                let predictions = model.predict(&dataset.x_test)?;
                weighted_mse(&dataset.y_test, &predictions, &dataset.w_test)
            }
        },
        BaselineModel::LeastSquares(model) => {
            let predictions = model.predict(&dataset.x_test)?;
            weighted_mse(&dataset.y_test, &predictions, &dataset.w_test)
        }
    })
}
