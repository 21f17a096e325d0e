//! Error types for feature selection.

use thiserror::Error;

/// Result type for feature selection operations.
pub type Result<T> = std::result::Result<T, FeatureError>;

/// Errors that can occur while selecting outcome features.
#[derive(Debug, Error)]
pub enum FeatureError {
    /// Selection mode was neither estimation nor simulation.
    #[error("Invalid mode '{value}': expected 'estimation' (1) or 'simulation' (0)")]
    InvalidMode {
        /// The rejected mode value.
        value: String,
    },

    /// No outcome is registered under this name.
    #[error("Unknown outcome '{0}'")]
    UnknownOutcome(String),

    /// The lagged panel lacks a column the outcome's feature list declares.
    #[error("Missing column '{column}' required by outcome '{outcome}'")]
    MissingColumn {
        /// Name of the absent column.
        column: String,
        /// Outcome whose declaration requires it.
        outcome: String,
    },

    /// The registry declares an outcome whose feature list contains its own
    /// dependent variable.
    #[error("Outcome '{outcome}' leaks its label: '{column}' is both target and feature")]
    LabelLeak {
        /// Offending outcome.
        outcome: String,
        /// The leaked column.
        column: String,
    },

    /// Polars error.
    #[error("Polars error: {0}")]
    Polars(#[from] polars::prelude::PolarsError),
}
