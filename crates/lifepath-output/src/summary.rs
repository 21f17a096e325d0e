//! Per-run training summary export.

use crate::error::Result;
use chrono::{SecondsFormat, Utc};
use lifepath_model::TrainedOutcome;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// One row of `training_summary.csv`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutcomeSummary {
    /// Outcome name.
    pub outcome: String,
    /// Rows in the estimation sample.
    pub rows: usize,
    /// Baseline loss on the held-out partition.
    pub baseline_loss: f64,
    /// Ensemble loss on the held-out partition.
    pub ensemble_loss: f64,
    /// Winning boosting variant.
    pub variant: String,
    /// Winning learning rate.
    pub learning_rate: f64,
    /// Trees kept after early stopping.
    pub n_trees: usize,
    /// When the outcome finished training (UTC, RFC 3339).
    pub trained_at: String,
}

impl OutcomeSummary {
    /// Summarize one finished outcome, timestamped now.
    pub fn new(outcome: &str, rows: usize, trained: &TrainedOutcome) -> Self {
        Self {
            outcome: outcome.to_string(),
            rows,
            baseline_loss: trained.metrics.baseline_loss,
            ensemble_loss: trained.metrics.ensemble_loss,
            variant: trained.search.best_config.variant.name().to_string(),
            learning_rate: trained.search.best_config.learning_rate,
            n_trees: trained.ensemble.n_trees(),
            trained_at: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
        }
    }
}

/// Write the run summary as CSV, one row per trained outcome.
pub fn write_summary(path: &Path, summaries: &[OutcomeSummary]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    for summary in summaries {
        writer.serialize(summary)?;
    }
    writer.flush()?;
    Ok(())
}
