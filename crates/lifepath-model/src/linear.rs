//! Weighted parametric baselines: linear and logistic regression.
//!
//! Both models are fit with the extracted sampling weights and no
//! regularization penalty. They are the transparent half of the dual-model
//! pair; their coefficients are persisted as-is for inspection by the
//! downstream simulator.

use crate::error::{ModelError, Result};
use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};

/// Solve the symmetric positive-definite system `A x = b` via Cholesky
/// decomposition, retrying once with a small ridge if A is near-singular.
fn cholesky_solve(a: &Array2<f64>, b: &Array1<f64>) -> Option<Array1<f64>> {
    let n = a.nrows();
    if n != a.ncols() || n != b.len() {
        return None;
    }

    let mut l = Array2::<f64>::zeros((n, n));
    for i in 0..n {
        for j in 0..=i {
            let mut sum = 0.0;
            for k in 0..j {
                sum += l[[i, k]] * l[[j, k]];
            }
            if i == j {
                let diag = a[[i, i]] - sum;
                if diag <= 0.0 {
                    // Not positive definite; retry with a ridge once.
                    let ridge = 1e-8 * a.diag().iter().map(|v| v.abs()).sum::<f64>() / n as f64;
                    let mut a_reg = a.clone();
                    for k in 0..n {
                        a_reg[[k, k]] += ridge;
                    }
                    return cholesky_solve_strict(&a_reg, b);
                }
                l[[i, j]] = diag.sqrt();
            } else {
                l[[i, j]] = (a[[i, j]] - sum) / l[[j, j]];
            }
        }
    }
    Some(back_substitute(&l, b))
}

/// Cholesky solve without the ridge retry.
fn cholesky_solve_strict(a: &Array2<f64>, b: &Array1<f64>) -> Option<Array1<f64>> {
    let n = a.nrows();
    let mut l = Array2::<f64>::zeros((n, n));
    for i in 0..n {
        for j in 0..=i {
            let mut sum = 0.0;
            for k in 0..j {
                sum += l[[i, k]] * l[[j, k]];
            }
            if i == j {
                let diag = a[[i, i]] - sum;
                if diag <= 0.0 {
                    return None;
                }
                l[[i, j]] = diag.sqrt();
            } else {
                l[[i, j]] = (a[[i, j]] - sum) / l[[j, j]];
            }
        }
    }
    Some(back_substitute(&l, b))
}

/// Forward then backward substitution through the Cholesky factor.
fn back_substitute(l: &Array2<f64>, b: &Array1<f64>) -> Array1<f64> {
    let n = b.len();
    let mut y = Array1::<f64>::zeros(n);
    for i in 0..n {
        let mut sum = 0.0;
        for j in 0..i {
            sum += l[[i, j]] * y[j];
        }
        y[i] = (b[i] - sum) / l[[i, i]];
    }
    let mut x = Array1::<f64>::zeros(n);
    for i in (0..n).rev() {
        let mut sum = 0.0;
        for j in (i + 1)..n {
            sum += l[[j, i]] * x[j];
        }
        x[i] = (y[i] - sum) / l[[i, i]];
    }
    x
}

fn check_shapes(x: &Array2<f64>, y: &Array1<f64>, w: &Array1<f64>) -> Result<()> {
    if x.nrows() != y.len() || x.nrows() != w.len() {
        return Err(ModelError::Shape {
            expected: format!("{} rows", x.nrows()),
            actual: format!("y: {}, weights: {}", y.len(), w.len()),
        });
    }
    Ok(())
}

/// Weighted ordinary least squares via the normal equations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeightedLeastSquares {
    /// Fitted coefficients, in feature order.
    pub coefficients: Option<Array1<f64>>,
    /// Fitted intercept.
    pub intercept: Option<f64>,
    /// Whether to fit an intercept.
    pub fit_intercept: bool,
}

impl WeightedLeastSquares {
    /// Create an unfitted model.
    pub const fn new(fit_intercept: bool) -> Self {
        Self {
            coefficients: None,
            intercept: None,
            fit_intercept,
        }
    }

    /// Fit on `x`, `y` with strictly positive sampling weights `w`.
    pub fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>, w: &Array1<f64>) -> Result<&mut Self> {
        check_shapes(x, y, w)?;
        let w_sum = w.sum();

        let (x_c, y_c, x_mean, y_mean) = if self.fit_intercept {
            let x_mean: Array1<f64> = x
                .axis_iter(Axis(1))
                .map(|column| column.iter().zip(w.iter()).map(|(v, wi)| v * wi).sum::<f64>() / w_sum)
                .collect();
            let y_mean = y.iter().zip(w.iter()).map(|(v, wi)| v * wi).sum::<f64>() / w_sum;
            (
                x - &x_mean.clone().insert_axis(Axis(0)),
                y - y_mean,
                Some(x_mean),
                Some(y_mean),
            )
        } else {
            (x.clone(), y.clone(), None, None)
        };

        // X^T W X and X^T W y, with W applied by scaling rows.
        let mut x_weighted = x_c.clone();
        for (mut row, &wi) in x_weighted.axis_iter_mut(Axis(0)).zip(w.iter()) {
            row.mapv_inplace(|v| v * wi);
        }
        let xtwx = x_c.t().dot(&x_weighted);
        let wy: Array1<f64> = y_c.iter().zip(w.iter()).map(|(v, wi)| v * wi).collect();
        let xtwy = x_c.t().dot(&wy);

        let coefficients = cholesky_solve(&xtwx, &xtwy)
            .ok_or_else(|| ModelError::Singular("weighted normal equations".to_string()))?;

        self.intercept = match (y_mean, x_mean) {
            (Some(ym), Some(xm)) => Some(ym - coefficients.dot(&xm)),
            _ => Some(0.0),
        };
        self.coefficients = Some(coefficients);
        Ok(self)
    }

    /// Predict target values.
    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let coefficients = self.coefficients.as_ref().ok_or(ModelError::NotFitted)?;
        let intercept = self.intercept.unwrap_or(0.0);
        Ok(x.dot(coefficients) + intercept)
    }
}

/// Weighted logistic regression fit by gradient descent, no penalty.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeightedLogit {
    /// Fitted coefficients, in feature order.
    pub coefficients: Option<Array1<f64>>,
    /// Fitted intercept.
    pub intercept: Option<f64>,
    /// Whether to fit an intercept.
    pub fit_intercept: bool,
    /// Maximum gradient-descent iterations.
    pub max_iter: usize,
    /// Convergence tolerance on the gradient norm.
    pub tol: f64,
    /// Gradient-descent step size.
    pub learning_rate: f64,
    /// Whether the last fit reached `tol` within `max_iter`.
    ///
    /// Non-convergence is not an error: the model is persisted anyway and
    /// the orchestrator logs a warning.
    pub converged: bool,
}

impl Default for WeightedLogit {
    fn default() -> Self {
        Self::new(true)
    }
}

impl WeightedLogit {
    /// Create an unfitted model.
    pub const fn new(fit_intercept: bool) -> Self {
        Self {
            coefficients: None,
            intercept: None,
            fit_intercept,
            max_iter: 1000,
            tol: 1e-6,
            learning_rate: 0.1,
            converged: false,
        }
    }

    fn sigmoid(z: &Array1<f64>) -> Array1<f64> {
        z.mapv(|v| 1.0 / (1.0 + (-v).exp()))
    }

    /// Fit on `x`, binary `y` with sampling weights `w`.
    pub fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>, w: &Array1<f64>) -> Result<&mut Self> {
        check_shapes(x, y, w)?;
        let n_features = x.ncols();
        let w_sum = w.sum();

        let mut weights = Array1::<f64>::zeros(n_features);
        let mut bias = 0.0;
        self.converged = false;

        for _ in 0..self.max_iter {
            let linear = x.dot(&weights) + bias;
            let probabilities = Self::sigmoid(&linear);

            let weighted_errors: Array1<f64> = probabilities
                .iter()
                .zip(y.iter())
                .zip(w.iter())
                .map(|((p, yi), wi)| wi * (p - yi))
                .collect();
            let gradient = x.t().dot(&weighted_errors) / w_sum;
            let bias_gradient = if self.fit_intercept {
                weighted_errors.sum() / w_sum
            } else {
                0.0
            };

            let gradient_norm =
                (gradient.mapv(|v| v * v).sum() + bias_gradient * bias_gradient).sqrt();
            if gradient_norm < self.tol {
                self.converged = true;
                break;
            }

            weights = weights - self.learning_rate * &gradient;
            bias -= self.learning_rate * bias_gradient;
        }

        self.coefficients = Some(weights);
        self.intercept = Some(bias);
        Ok(self)
    }

    /// Predict event probabilities.
    pub fn predict_proba(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let coefficients = self.coefficients.as_ref().ok_or(ModelError::NotFitted)?;
        let intercept = self.intercept.unwrap_or(0.0);
        let linear = x.dot(coefficients) + intercept;
        Ok(Self::sigmoid(&linear))
    }

    /// Predict hard 0/1 labels at the 0.5 threshold.
    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        Ok(self
            .predict_proba(x)?
            .mapv(|p| if p >= 0.5 { 1.0 } else { 0.0 }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    #[test]
    fn test_wls_recovers_exact_coefficients() {
        // y = 2*x1 - x2 + 3, no noise.
        let x = array![
            [1.0, 0.0],
            [2.0, 1.0],
            [3.0, 4.0],
            [0.0, 2.0],
            [5.0, 1.0],
            [4.0, 3.0],
        ];
        let y: Array1<f64> = x.rows().into_iter().map(|r| 2.0 * r[0] - r[1] + 3.0).collect();
        let w = Array1::from_elem(6, 1.0);

        let mut model = WeightedLeastSquares::new(true);
        model.fit(&x, &y, &w).unwrap();

        let coefficients = model.coefficients.as_ref().unwrap();
        assert_abs_diff_eq!(coefficients[0], 2.0, epsilon = 1e-8);
        assert_abs_diff_eq!(coefficients[1], -1.0, epsilon = 1e-8);
        assert_abs_diff_eq!(model.intercept.unwrap(), 3.0, epsilon = 1e-8);
    }

    #[test]
    fn test_wls_weighting_equals_row_duplication() {
        let x = array![[1.0], [2.0], [3.0], [10.0]];
        let y = array![1.0, 2.0, 3.0, 5.0];
        let w = array![1.0, 1.0, 1.0, 3.0];

        let x_dup = array![[1.0], [2.0], [3.0], [10.0], [10.0], [10.0]];
        let y_dup = array![1.0, 2.0, 3.0, 5.0, 5.0, 5.0];
        let w_dup = Array1::from_elem(6, 1.0);

        let mut weighted = WeightedLeastSquares::new(true);
        weighted.fit(&x, &y, &w).unwrap();
        let mut duplicated = WeightedLeastSquares::new(true);
        duplicated.fit(&x_dup, &y_dup, &w_dup).unwrap();

        assert_abs_diff_eq!(
            weighted.coefficients.as_ref().unwrap()[0],
            duplicated.coefficients.as_ref().unwrap()[0],
            epsilon = 1e-8
        );
        assert_abs_diff_eq!(
            weighted.intercept.unwrap(),
            duplicated.intercept.unwrap(),
            epsilon = 1e-8
        );
    }

    #[test]
    fn test_logit_separates_labels() {
        let n = 40;
        let x: Array2<f64> =
            Array2::from_shape_fn((n, 1), |(i, _)| if i < n / 2 { -2.0 } else { 2.0 });
        let y: Array1<f64> = (0..n).map(|i| if i < n / 2 { 0.0 } else { 1.0 }).collect();
        let w = Array1::from_elem(n, 1.0);

        let mut model = WeightedLogit::new(true);
        model.fit(&x, &y, &w).unwrap();

        let predictions = model.predict(&x).unwrap();
        let correct = predictions
            .iter()
            .zip(y.iter())
            .filter(|(p, a)| (*p - *a).abs() < 0.5)
            .count();
        assert_eq!(correct, n);
    }

    #[test]
    fn test_predict_before_fit_is_rejected() {
        let model = WeightedLogit::new(true);
        let err = model.predict_proba(&array![[0.0]]).unwrap_err();
        assert!(matches!(err, ModelError::NotFitted));
    }

    #[test]
    fn test_shape_mismatch() {
        let mut model = WeightedLeastSquares::new(true);
        let err = model
            .fit(&array![[1.0], [2.0]], &array![1.0], &array![1.0, 1.0])
            .unwrap_err();
        assert!(matches!(err, ModelError::Shape { .. }));
    }
}
