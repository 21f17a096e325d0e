//! Train/test partitioning, weight extraction and standardization.

use crate::boost::Objective;
use crate::error::{ModelError, Result};
use crate::scaler::{StandardScaler, TargetScaler};
use ndarray::{Array1, Array2, Axis};
use polars::prelude::*;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

/// Fewest selected rows worth splitting and fitting on.
const MIN_ROWS: usize = 10;

/// Split configuration.
#[derive(Debug, Clone)]
pub struct SplitConfig {
    /// Fraction of rows held out for testing (default 0.05).
    pub test_fraction: f64,
    /// Seed for the shuffled partition.
    pub seed: u64,
    /// Column holding the dependent variable.
    pub target_column: String,
    /// Column holding the sampling weight.
    pub weight_column: String,
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            test_fraction: 0.05,
            seed: 42,
            target_column: "dep_var".to_string(),
            weight_column: "personweight".to_string(),
        }
    }
}

/// Everything both models of one outcome are fit and evaluated on.
///
/// Built fresh per outcome and never shared across outcomes. Features are
/// standardized with train-fit parameters; for regression objectives the
/// target is standardized too and the fitted scaler retained.
#[derive(Debug, Clone)]
pub struct TrainingDataset {
    /// Standardized training features.
    pub x_train: Array2<f64>,
    /// Standardized test features.
    pub x_test: Array2<f64>,
    /// Training target (standardized for regression objectives).
    pub y_train: Array1<f64>,
    /// Test target (standardized for regression objectives).
    pub y_test: Array1<f64>,
    /// Training sampling weights.
    pub w_train: Array1<f64>,
    /// Test sampling weights.
    pub w_test: Array1<f64>,
    /// Ordered feature names matching the matrix columns.
    pub feature_names: Vec<String>,
    /// Train-fit target scaler (regression objectives only).
    pub target_scaler: Option<TargetScaler>,
}

impl TrainingDataset {
    /// Number of training rows.
    pub fn n_train(&self) -> usize {
        self.x_train.nrows()
    }

    /// Number of feature columns.
    pub fn n_features(&self) -> usize {
        self.x_train.ncols()
    }
}

/// Partition a selected estimation frame and standardize it.
///
/// The weight column is extracted into separate train/test vectors and
/// removed from the feature matrix; weights must be strictly positive.
/// Remaining columns keep the frame's order, which is the feature-order
/// contract persisted with the artifacts.
pub fn split_and_scale(
    frame: &DataFrame,
    objective: Objective,
    config: &SplitConfig,
) -> Result<TrainingDataset> {
    let n = frame.height();
    if n < MIN_ROWS {
        return Err(ModelError::TooFewRows {
            rows: n,
            min: MIN_ROWS,
        });
    }

    for column in [&config.target_column, &config.weight_column] {
        if frame.column(column).is_err() {
            return Err(ModelError::MissingColumn(column.clone()));
        }
    }

    let feature_names: Vec<String> = frame
        .get_column_names()
        .iter()
        .map(|name| name.to_string())
        .filter(|name| name != &config.target_column && name != &config.weight_column)
        .collect();

    let y = column_values(frame, &config.target_column)?;
    let weights = column_values(frame, &config.weight_column)?;
    for (row, &weight) in weights.iter().enumerate() {
        if !(weight > 0.0) {
            return Err(ModelError::InvalidWeight { row });
        }
    }
    let x = feature_matrix(frame, &feature_names)?;

    let mut indices: Vec<usize> = (0..n).collect();
    let mut rng = StdRng::seed_from_u64(config.seed);
    indices.shuffle(&mut rng);

    let n_test = (((n as f64) * config.test_fraction).round() as usize)
        .max(1)
        .min(n - 1);
    let (test_idx, train_idx) = indices.split_at(n_test);

    let x_train = x.select(Axis(0), train_idx);
    let x_test = x.select(Axis(0), test_idx);
    let take = |idx: &[usize], v: &Array1<f64>| -> Array1<f64> {
        idx.iter().map(|&i| v[i]).collect()
    };
    let mut y_train = take(train_idx, &y);
    let mut y_test = take(test_idx, &y);
    let w_train = take(train_idx, &weights);
    let w_test = take(test_idx, &weights);

    let scaler = StandardScaler::fit(&x_train);
    let x_train = scaler.transform(&x_train)?;
    let x_test = scaler.transform(&x_test)?;

    let target_scaler = match objective {
        Objective::Regression => {
            let target_scaler = TargetScaler::fit(&y_train);
            y_train = target_scaler.transform(&y_train);
            y_test = target_scaler.transform(&y_test);
            Some(target_scaler)
        }
        Objective::Binary => None,
    };

    Ok(TrainingDataset {
        x_train,
        x_test,
        y_train,
        y_test,
        w_train,
        w_test,
        feature_names,
        target_scaler,
    })
}

/// Materialize one column as a dense f64 vector.
fn column_values(frame: &DataFrame, name: &str) -> Result<Array1<f64>> {
    let column = frame.column(name)?.cast(&DataType::Float64)?;
    let ca = column.f64()?;
    let mut values = Vec::with_capacity(frame.height());
    for (row, value) in ca.into_iter().enumerate() {
        match value {
            Some(v) => values.push(v),
            None => {
                return Err(ModelError::MissingValue {
                    column: name.to_string(),
                    row,
                });
            }
        }
    }
    Ok(Array1::from_vec(values))
}

/// Materialize the named columns as a row-major matrix.
fn feature_matrix(frame: &DataFrame, names: &[String]) -> Result<Array2<f64>> {
    let n = frame.height();
    let mut matrix = Array2::zeros((n, names.len()));
    for (j, name) in names.iter().enumerate() {
        let values = column_values(frame, name)?;
        matrix.column_mut(j).assign(&values);
    }
    Ok(matrix)
}
