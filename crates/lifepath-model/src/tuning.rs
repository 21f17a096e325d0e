//! Hyperparameter selection by k-fold cross-validated grid search.
//!
//! Every grid point is scored as its mean validation loss across the folds;
//! the candidates are evaluated in parallel and ties resolve to the earlier
//! grid position so a search is reproducible run to run.

use crate::boost::{BoostingVariant, GradientBoosting, GradientBoostingConfig, Objective};
use crate::error::{ModelError, Result};
use crate::tree::TreeConfig;
use ndarray::{Array1, Array2, Axis};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rayon::prelude::*;

/// Candidate hyperparameter values, expanded as a full cross product.
#[derive(Debug, Clone)]
pub struct ParamGrid {
    /// Learning rates to try.
    pub learning_rates: Vec<f64>,
    /// Ensemble sizes to try.
    pub n_estimators: Vec<usize>,
    /// Boosting variants to try.
    pub variants: Vec<BoostingVariant>,
    /// Feature fractions to try.
    pub feature_fractions: Vec<f64>,
    /// Bagging fractions to try.
    pub bagging_fractions: Vec<f64>,
    /// Bagging frequencies to try.
    pub bagging_freqs: Vec<usize>,
}

impl Default for ParamGrid {
    fn default() -> Self {
        Self {
            learning_rates: vec![0.01, 0.175, 0.34, 0.505, 0.67, 0.835, 1.0],
            n_estimators: vec![150, 200, 250],
            variants: vec![
                BoostingVariant::Gbdt,
                BoostingVariant::Rf,
                BoostingVariant::Dart,
            ],
            feature_fractions: vec![0.9],
            bagging_fractions: vec![0.8],
            bagging_freqs: vec![5],
        }
    }
}

impl ParamGrid {
    /// A small grid for smoke runs.
    pub fn quick() -> Self {
        Self {
            learning_rates: vec![0.1, 0.3],
            n_estimators: vec![50],
            variants: vec![BoostingVariant::Gbdt],
            feature_fractions: vec![0.9],
            bagging_fractions: vec![0.8],
            bagging_freqs: vec![5],
        }
    }

    /// Expand the cross product into concrete configurations, in grid order.
    pub fn expand(&self, objective: Objective, seed: u64) -> Vec<GradientBoostingConfig> {
        let mut configs = Vec::new();
        for &variant in &self.variants {
            for &n_estimators in &self.n_estimators {
                for &learning_rate in &self.learning_rates {
                    for &feature_fraction in &self.feature_fractions {
                        for &bagging_fraction in &self.bagging_fractions {
                            for &bagging_freq in &self.bagging_freqs {
                                configs.push(GradientBoostingConfig {
                                    objective,
                                    variant,
                                    learning_rate,
                                    n_estimators,
                                    feature_fraction,
                                    bagging_fraction,
                                    bagging_freq,
                                    drop_rate: 0.1,
                                    tree: TreeConfig::default(),
                                    seed,
                                });
                            }
                        }
                    }
                }
            }
        }
        configs
    }
}

/// What a completed grid search reports.
#[derive(Debug, Clone)]
pub struct GridSearchReport {
    /// The winning configuration.
    pub best_config: GradientBoostingConfig,
    /// Its mean validation loss across folds.
    pub best_score: f64,
    /// How many grid points were evaluated.
    pub n_candidates: usize,
}

/// Shuffle `n` row indices into `k` contiguous folds.
fn kfold_indices(n: usize, k: usize, seed: u64) -> Vec<(Vec<usize>, Vec<usize>)> {
    let mut indices: Vec<usize> = (0..n).collect();
    let mut rng = StdRng::seed_from_u64(seed);
    indices.shuffle(&mut rng);

    let fold_size = n / k;
    let remainder = n % k;
    let mut folds = Vec::with_capacity(k);
    let mut start = 0;
    for fold in 0..k {
        let len = fold_size + usize::from(fold < remainder);
        let validation: Vec<usize> = indices[start..start + len].to_vec();
        let train: Vec<usize> = indices[..start]
            .iter()
            .chain(indices[start + len..].iter())
            .copied()
            .collect();
        folds.push((train, validation));
        start += len;
    }
    folds
}

fn take_rows(v: &Array1<f64>, idx: &[usize]) -> Array1<f64> {
    idx.iter().map(|&i| v[i]).collect()
}

/// Search `grid` over `k` folds of the training partition.
///
/// A binary fold whose training slice holds a single class is reported as
/// [`ModelError::DegenerateFold`] and fails the whole search.
pub fn grid_search(
    x: &Array2<f64>,
    y: &Array1<f64>,
    w: &Array1<f64>,
    objective: Objective,
    grid: &ParamGrid,
    k: usize,
    seed: u64,
) -> Result<GridSearchReport> {
    let n = x.nrows();
    if n < k {
        return Err(ModelError::TooFewRows { rows: n, min: k });
    }

    let folds = kfold_indices(n, k, seed);
    if objective == Objective::Binary {
        for (fold, (train_idx, _)) in folds.iter().enumerate() {
            let positives = train_idx.iter().filter(|&&i| y[i] > 0.5).count();
            if positives == 0 || positives == train_idx.len() {
                return Err(ModelError::DegenerateFold {
                    fold,
                    reason: "training slice holds a single class".to_string(),
                });
            }
        }
    }

    let slices: Vec<_> = folds
        .iter()
        .map(|(train_idx, val_idx)| {
            (
                x.select(Axis(0), train_idx),
                take_rows(y, train_idx),
                take_rows(w, train_idx),
                x.select(Axis(0), val_idx),
                take_rows(y, val_idx),
                take_rows(w, val_idx),
            )
        })
        .collect();

    let candidates = grid.expand(objective, seed);
    let n_candidates = candidates.len();

    let scored: Vec<Result<f64>> = candidates
        .par_iter()
        .map(|config| {
            let mut total = 0.0;
            for (x_tr, y_tr, w_tr, x_val, y_val, w_val) in &slices {
                let mut model = GradientBoosting::new(*config);
                model.fit(x_tr, y_tr, w_tr, None, 0)?;
                total += model.score(x_val, y_val, w_val)?;
            }
            Ok(total / slices.len() as f64)
        })
        .collect();

    let mut best: Option<(usize, f64)> = None;
    for (index, score) in scored.into_iter().enumerate() {
        let score = score?;
        // Strict comparison keeps the earliest grid point on ties.
        if best.is_none_or(|(_, s)| score < s) {
            best = Some((index, score));
        }
    }
    let (index, best_score) = best.ok_or(ModelError::NotFitted)?;

    Ok(GridSearchReport {
        best_config: candidates[index],
        best_score,
        n_candidates,
    })
}
