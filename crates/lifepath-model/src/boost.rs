//! Gradient-boosted tree ensembles with gbdt, random-forest and dart
//! boosting variants.
//!
//! Binary outcomes are boosted on the logistic gradient and scored with
//! weighted log loss; regression outcomes on the residual with weighted
//! squared error. Validation-based early stopping truncates the ensemble
//! back to its best iteration.

use crate::error::{ModelError, Result};
use crate::tree::{RegressionTree, TreeConfig};
use ndarray::{Array1, Array2};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

/// What the ensemble optimizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Objective {
    /// 0/1 outcome, logistic link, weighted log loss.
    Binary,
    /// Continuous outcome, identity link, weighted squared error.
    Regression,
}

/// Boosting strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BoostingVariant {
    /// Plain gradient boosting.
    Gbdt,
    /// Bagged trees fit to the initial residual and averaged.
    Rf,
    /// Gradient boosting with tree dropout and re-normalization.
    Dart,
}

impl BoostingVariant {
    /// Short name used in summaries and artifact metadata.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Gbdt => "gbdt",
            Self::Rf => "rf",
            Self::Dart => "dart",
        }
    }
}

/// Hyperparameters of one ensemble fit.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct GradientBoostingConfig {
    /// Optimization objective.
    pub objective: Objective,
    /// Boosting strategy.
    pub variant: BoostingVariant,
    /// Shrinkage applied to each new tree.
    pub learning_rate: f64,
    /// Maximum number of trees.
    pub n_estimators: usize,
    /// Fraction of features each tree may split on.
    pub feature_fraction: f64,
    /// Fraction of rows in each bag.
    pub bagging_fraction: f64,
    /// Iterations between bag refreshes; 0 disables bagging.
    pub bagging_freq: usize,
    /// Per-tree dropout probability (dart only).
    pub drop_rate: f64,
    /// Structural limits of each tree.
    pub tree: TreeConfig,
    /// Seed for bagging, feature sampling and dropout.
    pub seed: u64,
}

impl Default for GradientBoostingConfig {
    fn default() -> Self {
        Self {
            objective: Objective::Regression,
            variant: BoostingVariant::Gbdt,
            learning_rate: 0.1,
            n_estimators: 100,
            feature_fraction: 1.0,
            bagging_fraction: 1.0,
            bagging_freq: 0,
            drop_rate: 0.1,
            tree: TreeConfig::default(),
            seed: 42,
        }
    }
}

/// A validation partition for early stopping.
#[derive(Debug, Clone, Copy)]
pub struct ValidationSet<'a> {
    /// Validation features.
    pub x: &'a Array2<f64>,
    /// Validation target.
    pub y: &'a Array1<f64>,
    /// Validation sampling weights.
    pub w: &'a Array1<f64>,
}

/// What a fit reported back.
#[derive(Debug, Clone, Copy)]
pub struct FitReport {
    /// Trees kept after any early-stopping truncation.
    pub n_trees: usize,
    /// Best validation score seen, if a validation set was provided.
    pub validation_score: Option<f64>,
}

/// A fitted gradient-boosted ensemble.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GradientBoosting {
    /// Hyperparameters the ensemble was fit with.
    pub config: GradientBoostingConfig,
    init_score: f64,
    trees: Vec<RegressionTree>,
    scales: Vec<f64>,
}

fn sigmoid(v: f64) -> f64 {
    1.0 / (1.0 + (-v).exp())
}

/// Weighted log loss with probability clamping.
pub fn weighted_log_loss(y: &Array1<f64>, p: &Array1<f64>, w: &Array1<f64>) -> f64 {
    let w_sum = w.sum();
    let total: f64 = y
        .iter()
        .zip(p.iter())
        .zip(w.iter())
        .map(|((yi, pi), wi)| {
            let pi = pi.clamp(1e-12, 1.0 - 1e-12);
            -wi * (yi * pi.ln() + (1.0 - yi) * (1.0 - pi).ln())
        })
        .sum();
    total / w_sum
}

/// Weighted mean squared error.
pub fn weighted_mse(y: &Array1<f64>, predictions: &Array1<f64>, w: &Array1<f64>) -> f64 {
    let w_sum = w.sum();
    let total: f64 = y
        .iter()
        .zip(predictions.iter())
        .zip(w.iter())
        .map(|((yi, pi), wi)| wi * (yi - pi) * (yi - pi))
        .sum();
    total / w_sum
}

impl GradientBoosting {
    /// Create an unfitted ensemble.
    pub fn new(config: GradientBoostingConfig) -> Self {
        Self {
            config,
            init_score: 0.0,
            trees: Vec::new(),
            scales: Vec::new(),
        }
    }

    /// Number of trees currently in the ensemble.
    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    /// Fit the ensemble.
    ///
    /// When `validation` is given, the validation score is tracked each
    /// iteration; after `patience` iterations without improvement the fit
    /// stops and the ensemble is truncated to its best iteration.
    pub fn fit(
        &mut self,
        x: &Array2<f64>,
        y: &Array1<f64>,
        w: &Array1<f64>,
        validation: Option<ValidationSet<'_>>,
        patience: usize,
    ) -> Result<FitReport> {
        let n = x.nrows();
        if n != y.len() || n != w.len() {
            return Err(ModelError::Shape {
                expected: format!("{n} rows"),
                actual: format!("y: {}, weights: {}", y.len(), w.len()),
            });
        }
        if n == 0 {
            return Err(ModelError::TooFewRows { rows: 0, min: 1 });
        }

        self.trees.clear();
        self.scales.clear();
        self.init_score = initial_score(self.config.objective, y, w);

        let mut rng = StdRng::seed_from_u64(self.config.seed);
        let n_features = x.ncols();
        let n_sampled_features =
            (((n_features as f64) * self.config.feature_fraction).ceil() as usize)
                .clamp(1, n_features);
        let bag_size = (((n as f64) * self.config.bagging_fraction).round() as usize).clamp(1, n);

        // Per-tree raw predictions, cached so dart re-normalization and
        // early-stopping truncation can re-score without re-traversal.
        let mut train_tree_preds: Vec<Array1<f64>> = Vec::new();
        let mut val_tree_preds: Vec<Array1<f64>> = Vec::new();

        let mut bag: Vec<usize> = (0..n).collect();
        let mut best: Option<(usize, Vec<f64>, f64)> = None;
        let mut since_best = 0usize;

        for iteration in 0..self.config.n_estimators {
            if self.config.bagging_freq > 0 && iteration % self.config.bagging_freq == 0 {
                let mut indices: Vec<usize> = (0..n).collect();
                indices.shuffle(&mut rng);
                indices.truncate(bag_size);
                bag = indices;
            }

            let mut features: Vec<usize> = (0..n_features).collect();
            features.shuffle(&mut rng);
            features.truncate(n_sampled_features);
            features.sort_unstable();

            // Dart drops a random subset of existing trees before computing
            // gradients, then folds the new tree in at reduced weight.
            let dropped: Vec<usize> = match self.config.variant {
                BoostingVariant::Dart => (0..self.trees.len())
                    .filter(|_| rng.r#gen::<f64>() < self.config.drop_rate)
                    .collect(),
                _ => Vec::new(),
            };

            let raw = self.raw_from_cache(&train_tree_preds, &dropped, n);
            let residuals = self.residuals(y, &raw);

            let tree = RegressionTree::fit(x, &residuals, w, &bag, &features, &self.config.tree);
            let tree_preds = tree.predict(x);

            match self.config.variant {
                BoostingVariant::Gbdt => {
                    self.scales.push(self.config.learning_rate);
                }
                BoostingVariant::Rf => {
                    // Averaged bagged trees: rescale the whole ensemble.
                    let count = (self.trees.len() + 1) as f64;
                    self.scales.push(0.0);
                    for scale in self.scales.iter_mut() {
                        *scale = 1.0 / count;
                    }
                }
                BoostingVariant::Dart => {
                    let k = dropped.len() as f64;
                    for &t in &dropped {
                        self.scales[t] *= k / (k + 1.0);
                    }
                    self.scales.push(self.config.learning_rate / (k + 1.0));
                }
            }
            self.trees.push(tree);
            train_tree_preds.push(tree_preds);

            if let Some(validation) = validation {
                let tree = self
                    .trees
                    .last()
                    .ok_or(ModelError::NotFitted)?;
                val_tree_preds.push(tree.predict(validation.x));
                let score = self.score_cached(&val_tree_preds, validation);

                let improved = best.as_ref().is_none_or(|(_, _, s)| score < *s);
                if improved {
                    best = Some((self.trees.len(), self.scales.clone(), score));
                    since_best = 0;
                } else {
                    since_best += 1;
                    if since_best >= patience {
                        break;
                    }
                }
            }
        }

        if let Some((n_trees, scales, score)) = best {
            self.trees.truncate(n_trees);
            self.scales = scales;
            self.scales.truncate(n_trees);
            Ok(FitReport {
                n_trees,
                validation_score: Some(score),
            })
        } else {
            Ok(FitReport {
                n_trees: self.trees.len(),
                validation_score: None,
            })
        }
    }

    fn residuals(&self, y: &Array1<f64>, raw: &Array1<f64>) -> Array1<f64> {
        let target = match self.config.variant {
            // rf trees all fit the initial residual.
            BoostingVariant::Rf => {
                let init = self.init_score;
                return match self.config.objective {
                    Objective::Binary => y.mapv(|yi| yi - sigmoid(init)),
                    Objective::Regression => y.mapv(|yi| yi - init),
                };
            }
            _ => raw,
        };
        match self.config.objective {
            Objective::Binary => y
                .iter()
                .zip(target.iter())
                .map(|(yi, ri)| yi - sigmoid(*ri))
                .collect(),
            Objective::Regression => y - target,
        }
    }

    /// Raw score from cached per-tree predictions, skipping dropped trees.
    fn raw_from_cache(
        &self,
        tree_preds: &[Array1<f64>],
        dropped: &[usize],
        n: usize,
    ) -> Array1<f64> {
        let mut raw = Array1::from_elem(n, self.init_score);
        for (t, preds) in tree_preds.iter().enumerate() {
            if dropped.contains(&t) {
                continue;
            }
            raw = raw + preds * self.scales[t];
        }
        raw
    }

    fn score_cached(&self, val_tree_preds: &[Array1<f64>], validation: ValidationSet<'_>) -> f64 {
        let raw = self.raw_from_cache(val_tree_preds, &[], validation.y.len());
        match self.config.objective {
            Objective::Binary => {
                let p = raw.mapv(sigmoid);
                weighted_log_loss(validation.y, &p, validation.w)
            }
            Objective::Regression => weighted_mse(validation.y, &raw, validation.w),
        }
    }

    /// Raw (pre-link) scores for `x`.
    pub fn predict_raw(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        if self.trees.is_empty() {
            return Err(ModelError::NotFitted);
        }
        let mut raw = Array1::from_elem(x.nrows(), self.init_score);
        for (tree, &scale) in self.trees.iter().zip(self.scales.iter()) {
            raw = raw + tree.predict(x) * scale;
        }
        Ok(raw)
    }

    /// Predictions on the outcome scale: probabilities for binary
    /// objectives, values for regression.
    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let raw = self.predict_raw(x)?;
        Ok(match self.config.objective {
            Objective::Binary => raw.mapv(sigmoid),
            Objective::Regression => raw,
        })
    }

    /// Score the ensemble on a held-out partition (lower is better).
    pub fn score(&self, x: &Array2<f64>, y: &Array1<f64>, w: &Array1<f64>) -> Result<f64> {
        let predictions = self.predict(x)?;
        Ok(match self.config.objective {
            Objective::Binary => weighted_log_loss(y, &predictions, w),
            Objective::Regression => weighted_mse(y, &predictions, w),
        })
    }
}

fn initial_score(objective: Objective, y: &Array1<f64>, w: &Array1<f64>) -> f64 {
    let w_sum = w.sum();
    let mean = y.iter().zip(w.iter()).map(|(yi, wi)| yi * wi).sum::<f64>() / w_sum;
    match objective {
        Objective::Binary => {
            let p = mean.clamp(1e-6, 1.0 - 1e-6);
            (p / (1.0 - p)).ln()
        }
        Objective::Regression => mean,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn regression_data(n: usize) -> (Array2<f64>, Array1<f64>, Array1<f64>) {
        let x = Array2::from_shape_fn((n, 2), |(i, j)| {
            if j == 0 {
                (i % 10) as f64
            } else {
                (i % 4) as f64
            }
        });
        let y: Array1<f64> = (0..n)
            .map(|i| 3.0 * ((i % 10) as f64) - 2.0 * ((i % 4) as f64))
            .collect();
        let w = Array1::from_elem(n, 1.0);
        (x, y, w)
    }

    fn binary_data(n: usize) -> (Array2<f64>, Array1<f64>, Array1<f64>) {
        let x = Array2::from_shape_fn((n, 1), |(i, _)| (i % 20) as f64);
        let y: Array1<f64> = (0..n).map(|i| if i % 20 >= 10 { 1.0 } else { 0.0 }).collect();
        let w = Array1::from_elem(n, 1.0);
        (x, y, w)
    }

    #[test]
    fn test_gbdt_drives_training_error_down() {
        let (x, y, w) = regression_data(80);
        let config = GradientBoostingConfig {
            n_estimators: 60,
            learning_rate: 0.3,
            ..Default::default()
        };
        let mut model = GradientBoosting::new(config);
        model.fit(&x, &y, &w, None, 5).unwrap();

        let baseline = weighted_mse(&y, &Array1::from_elem(80, y.mean().unwrap()), &w);
        let fitted = model.score(&x, &y, &w).unwrap();
        assert!(fitted < baseline * 0.1, "mse {fitted} vs baseline {baseline}");
    }

    #[test]
    fn test_binary_objective_returns_probabilities() {
        let (x, y, w) = binary_data(100);
        let config = GradientBoostingConfig {
            objective: Objective::Binary,
            n_estimators: 40,
            learning_rate: 0.3,
            ..Default::default()
        };
        let mut model = GradientBoosting::new(config);
        model.fit(&x, &y, &w, None, 5).unwrap();

        let p = model.predict(&x).unwrap();
        for (pi, yi) in p.iter().zip(y.iter()) {
            assert!(*pi >= 0.0 && *pi <= 1.0);
            assert_abs_diff_eq!(pi.round(), *yi, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_early_stopping_truncates_to_best_iteration() {
        let (x, y, w) = regression_data(80);
        // A noisy disjoint validation slice: after the signal is learned,
        // further iterations stop improving it.
        let x_val = Array2::from_shape_fn((20, 2), |(i, j)| {
            if j == 0 {
                (i % 10) as f64
            } else {
                ((i + 1) % 4) as f64
            }
        });
        let y_val: Array1<f64> = (0..20)
            .map(|i| 3.0 * ((i % 10) as f64) - 2.0 * (((i + 1) % 4) as f64) + if i % 2 == 0 { 4.0 } else { -4.0 })
            .collect();
        let w_val = Array1::from_elem(20, 1.0);

        let config = GradientBoostingConfig {
            n_estimators: 200,
            learning_rate: 0.3,
            ..Default::default()
        };
        let mut model = GradientBoosting::new(config);
        let report = model
            .fit(
                &x,
                &y,
                &w,
                Some(ValidationSet {
                    x: &x_val,
                    y: &y_val,
                    w: &w_val,
                }),
                5,
            )
            .unwrap();

        assert!(report.n_trees < 200);
        assert_eq!(model.n_trees(), report.n_trees);
        assert!(report.validation_score.is_some());
    }

    #[test]
    fn test_rf_variant_averages_trees() {
        let (x, y, w) = regression_data(60);
        let config = GradientBoostingConfig {
            variant: BoostingVariant::Rf,
            n_estimators: 20,
            bagging_fraction: 0.8,
            bagging_freq: 1,
            feature_fraction: 0.9,
            ..Default::default()
        };
        let mut model = GradientBoosting::new(config);
        model.fit(&x, &y, &w, None, 5).unwrap();

        // Averaged trees cannot overshoot the residual range.
        let predictions = model.predict(&x).unwrap();
        let (y_min, y_max) = (
            y.iter().cloned().fold(f64::INFINITY, f64::min),
            y.iter().cloned().fold(f64::NEG_INFINITY, f64::max),
        );
        for p in predictions.iter() {
            assert!(*p >= y_min - 1.0 && *p <= y_max + 1.0);
        }
    }

    #[test]
    fn test_dart_fit_is_reproducible() {
        let (x, y, w) = regression_data(60);
        let config = GradientBoostingConfig {
            variant: BoostingVariant::Dart,
            n_estimators: 30,
            learning_rate: 0.3,
            drop_rate: 0.2,
            ..Default::default()
        };
        let mut a = GradientBoosting::new(config);
        a.fit(&x, &y, &w, None, 5).unwrap();
        let mut b = GradientBoosting::new(config);
        b.fit(&x, &y, &w, None, 5).unwrap();

        let pa = a.predict(&x).unwrap();
        let pb = b.predict(&x).unwrap();
        for (u, v) in pa.iter().zip(pb.iter()) {
            assert_abs_diff_eq!(u, v, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_predict_before_fit_is_rejected() {
        let model = GradientBoosting::new(GradientBoostingConfig::default());
        let err = model.predict(&Array2::zeros((1, 2))).unwrap_err();
        assert!(matches!(err, ModelError::NotFitted));
    }
}
