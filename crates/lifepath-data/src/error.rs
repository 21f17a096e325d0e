//! Error types for panel data operations.

use thiserror::Error;

/// Result type for panel data operations.
pub type Result<T> = std::result::Result<T, DataError>;

/// Errors that can occur while loading or transforming the panel.
#[derive(Debug, Error)]
pub enum DataError {
    /// The input panel lacks a column required downstream.
    #[error("Missing column '{column}' ({context})")]
    MissingColumn {
        /// Name of the absent column.
        column: String,
        /// Which consumer needed it.
        context: String,
    },

    /// The panel holds too few observed years to build any lagged row.
    #[error("Panel spans {n_years} distinct years; lag construction needs at least 3")]
    InsufficientYears {
        /// Number of distinct years found.
        n_years: usize,
    },

    /// Polars error.
    #[error("Polars error: {0}")]
    Polars(#[from] polars::prelude::PolarsError),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
