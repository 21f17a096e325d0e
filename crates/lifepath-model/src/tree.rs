//! Weighted regression trees, the base learner of the boosted ensemble.
//!
//! Trees always fit a continuous target: for binary outcomes the ensemble
//! hands them gradients, not labels. Splits minimize weighted squared error
//! and leaves predict weighted means.

use ndarray::{Array1, Array2, ArrayView1};
use serde::{Deserialize, Serialize};

/// Structural limits for a single tree.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TreeConfig {
    /// Maximum split depth.
    pub max_depth: usize,
    /// Minimum rows on each side of a split.
    pub min_samples_leaf: usize,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            max_depth: 6,
            min_samples_leaf: 5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
enum Node {
    Leaf {
        value: f64,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: Box<Node>,
        right: Box<Node>,
    },
}

/// A fitted weighted regression tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegressionTree {
    root: Node,
}

struct SplitCandidate {
    feature: usize,
    threshold: f64,
    gain: f64,
}

impl RegressionTree {
    /// Fit on the rows in `rows`, considering only the features in
    /// `features`. Both index sets come from the ensemble's bagging and
    /// feature-fraction sampling; passing the full ranges fits an
    /// unsubsampled tree.
    pub fn fit(
        x: &Array2<f64>,
        y: &Array1<f64>,
        w: &Array1<f64>,
        rows: &[usize],
        features: &[usize],
        config: &TreeConfig,
    ) -> Self {
        let root = build_node(x, y, w, rows, features, config, 0);
        Self { root }
    }

    /// Predict a single row.
    pub fn predict_row(&self, row: ArrayView1<'_, f64>) -> f64 {
        let mut node = &self.root;
        loop {
            match node {
                Node::Leaf { value } => return *value,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    node = if row[*feature] <= *threshold {
                        left
                    } else {
                        right
                    };
                }
            }
        }
    }

    /// Predict every row of `x`.
    pub fn predict(&self, x: &Array2<f64>) -> Array1<f64> {
        x.rows()
            .into_iter()
            .map(|row| self.predict_row(row))
            .collect()
    }
}

fn weighted_mean(y: &Array1<f64>, w: &Array1<f64>, rows: &[usize]) -> f64 {
    let mut sw = 0.0;
    let mut swy = 0.0;
    for &i in rows {
        sw += w[i];
        swy += w[i] * y[i];
    }
    if sw > 0.0 { swy / sw } else { 0.0 }
}

fn build_node(
    x: &Array2<f64>,
    y: &Array1<f64>,
    w: &Array1<f64>,
    rows: &[usize],
    features: &[usize],
    config: &TreeConfig,
    depth: usize,
) -> Node {
    if depth >= config.max_depth || rows.len() < 2 * config.min_samples_leaf {
        return Node::Leaf {
            value: weighted_mean(y, w, rows),
        };
    }

    let best = features
        .iter()
        .filter_map(|&feature| best_split_on(x, y, w, rows, feature, config.min_samples_leaf))
        .max_by(|a, b| a.gain.total_cmp(&b.gain));

    let Some(split) = best else {
        return Node::Leaf {
            value: weighted_mean(y, w, rows),
        };
    };

    let (left_rows, right_rows): (Vec<usize>, Vec<usize>) = rows
        .iter()
        .copied()
        .partition(|&i| x[[i, split.feature]] <= split.threshold);

    Node::Split {
        feature: split.feature,
        threshold: split.threshold,
        left: Box::new(build_node(x, y, w, &left_rows, features, config, depth + 1)),
        right: Box::new(build_node(
            x, y, w, &right_rows, features, config, depth + 1,
        )),
    }
}

/// Scan one feature for the split with the largest weighted-SSE reduction.
///
/// Rows are sorted by the feature once; prefix sums of `w`, `w*y` and
/// `w*y^2` then give both sides' errors in a single pass.
fn best_split_on(
    x: &Array2<f64>,
    y: &Array1<f64>,
    w: &Array1<f64>,
    rows: &[usize],
    feature: usize,
    min_samples_leaf: usize,
) -> Option<SplitCandidate> {
    let mut order: Vec<usize> = rows.to_vec();
    order.sort_by(|&a, &b| x[[a, feature]].total_cmp(&x[[b, feature]]));

    let mut total_w = 0.0;
    let mut total_wy = 0.0;
    let mut total_wyy = 0.0;
    for &i in &order {
        total_w += w[i];
        total_wy += w[i] * y[i];
        total_wyy += w[i] * y[i] * y[i];
    }
    if total_w <= 0.0 {
        return None;
    }
    let total_sse = total_wyy - total_wy * total_wy / total_w;

    let mut left_w = 0.0;
    let mut left_wy = 0.0;
    let mut left_wyy = 0.0;
    let mut best: Option<SplitCandidate> = None;

    for (pos, &i) in order.iter().enumerate() {
        left_w += w[i];
        left_wy += w[i] * y[i];
        left_wyy += w[i] * y[i] * y[i];

        let n_left = pos + 1;
        let n_right = order.len() - n_left;
        if n_right == 0 {
            break;
        }
        if n_left < min_samples_leaf || n_right < min_samples_leaf {
            continue;
        }

        let value = x[[i, feature]];
        let next = x[[order[pos + 1], feature]];
        // No valid threshold between tied values.
        if value == next {
            continue;
        }

        let right_w = total_w - left_w;
        if left_w <= 0.0 || right_w <= 0.0 {
            continue;
        }
        let left_sse = left_wyy - left_wy * left_wy / left_w;
        let right_wy = total_wy - left_wy;
        let right_sse = (total_wyy - left_wyy) - right_wy * right_wy / right_w;
        let gain = total_sse - left_sse - right_sse;

        if gain > 1e-12 && best.as_ref().is_none_or(|b| gain > b.gain) {
            best = Some(SplitCandidate {
                feature,
                threshold: (value + next) / 2.0,
                gain,
            });
        }
    }
    best
}
