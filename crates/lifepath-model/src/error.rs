//! Error types for training operations.

use thiserror::Error;

/// Result type for training operations.
pub type Result<T> = std::result::Result<T, ModelError>;

/// Errors that can occur while preparing samples or fitting models.
#[derive(Debug, Error)]
pub enum ModelError {
    /// Matrix/vector dimensions disagree.
    #[error("Shape mismatch: expected {expected}, got {actual}")]
    Shape {
        /// What the operation required.
        expected: String,
        /// What it received.
        actual: String,
    },

    /// The selected frame lacks a column the dataset builder needs.
    #[error("Missing column '{0}' in selected frame")]
    MissingColumn(String),

    /// Too few rows survived selection to split and fit.
    #[error("Dataset has {rows} rows; need at least {min}")]
    TooFewRows {
        /// Rows available.
        rows: usize,
        /// Minimum required.
        min: usize,
    },

    /// A value was unexpectedly missing after selection.
    #[error("Missing value in column '{column}' at row {row}")]
    MissingValue {
        /// Column holding the null.
        column: String,
        /// Row index.
        row: usize,
    },

    /// A sampling weight was zero, negative or missing.
    #[error("Sampling weights must be strictly positive (row {row})")]
    InvalidWeight {
        /// Offending row index in the selected frame.
        row: usize,
    },

    /// Prediction requested from an unfitted model.
    #[error("Model is not fitted")]
    NotFitted,

    /// Normal-equation system could not be solved.
    #[error("Singular design matrix: {0}")]
    Singular(String),

    /// A cross-validation fold was unusable (e.g. a single-class training
    /// slice for a binary outcome). Fatal for the outcome, never retried.
    #[error("Degenerate cross-validation fold {fold}: {reason}")]
    DegenerateFold {
        /// Fold index.
        fold: usize,
        /// Why the fold was rejected.
        reason: String,
    },

    /// Polars error.
    #[error("Polars error: {0}")]
    Polars(#[from] polars::prelude::PolarsError),
}
