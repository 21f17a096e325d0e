//! Error types for artifact persistence.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for artifact persistence operations.
pub type Result<T> = std::result::Result<T, ArtifactError>;

/// Errors that can occur while saving or loading model artifacts.
#[derive(Debug, Error)]
pub enum ArtifactError {
    /// JSON serialization error.
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV serialization error.
    #[error("CSV serialization error: {0}")]
    Csv(#[from] csv::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A requested artifact file does not exist.
    #[error("Artifact not found: {}", path.display())]
    NotFound {
        /// The path that was looked up.
        path: PathBuf,
    },

    /// An unfitted model cannot be persisted.
    #[error("Cannot persist an unfitted {0} model")]
    Unfitted(&'static str),
}
