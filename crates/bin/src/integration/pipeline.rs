//! The outcome pipeline: lagged panel in, persisted artifact sets out.
//!
//! Outcomes are independent failure domains. A failed outcome is reported
//! and skipped; completed outcomes' artifact files are never touched by a
//! later failure.

use indicatif::ProgressBar;
use lifepath_data::lag::build_lagged_panel;
use lifepath_data::loader::load_panel;
use lifepath_features::select::{Mode, select};
use lifepath_features::{ModelFamily, Outcome, validate_registry};
use lifepath_model::{
    Objective, ParamGrid, SplitConfig, TrainerConfig, split_and_scale, train_outcome,
};
use lifepath_output::{ArtifactStore, OutcomeSummary, write_summary};
use polars::prelude::DataFrame;
use std::path::Path;

/// Error type for pipeline operations.
#[derive(Debug, thiserror::Error)]
pub(crate) enum PipelineError {
    /// Panel loading or lag construction error.
    #[error("Data error: {0}")]
    Data(#[from] lifepath_data::error::DataError),
    /// Outcome registry or selection error.
    #[error("Feature error: {0}")]
    Feature(#[from] lifepath_features::error::FeatureError),
    /// Sample preparation or model fitting error.
    #[error("Model error: {0}")]
    Model(#[from] lifepath_model::ModelError),
    /// Artifact persistence error.
    #[error("Artifact error: {0}")]
    Artifact(#[from] lifepath_output::ArtifactError),
}

/// Knobs shared by every outcome in a run.
#[derive(Debug, Clone, Copy)]
pub(crate) struct PipelineConfig {
    /// Seed for splits, folds and subsampling.
    pub seed: u64,
    /// Held-out test fraction.
    pub test_fraction: f64,
    /// Use the small smoke-run grid.
    pub quick: bool,
}

/// What one pipeline run reports back.
#[derive(Debug)]
pub(crate) struct RunReport {
    /// Per-outcome summaries, in training order.
    pub summaries: Vec<OutcomeSummary>,
    /// Outcomes that failed, with their errors rendered.
    pub failures: Vec<(Outcome, String)>,
}

const fn objective_for(outcome: Outcome) -> Objective {
    match outcome.family() {
        ModelFamily::Binary => Objective::Binary,
        ModelFamily::Continuous => Objective::Regression,
    }
}

/// Run the full pipeline: load, lag once, then train and persist each
/// requested outcome.
pub(crate) fn run_pipeline(
    input: &Path,
    models: &Path,
    outcomes: &[Outcome],
    config: &PipelineConfig,
) -> Result<RunReport, PipelineError> {
    validate_registry()?;

    let panel = load_panel(input)?;
    println!(
        "Loaded panel: {} person-years, {} columns",
        panel.height(),
        panel.width()
    );

    let lagged = build_lagged_panel(&panel)?;
    println!("Lagged panel: {} estimation rows", lagged.height());

    let store = ArtifactStore::new(models)?;

    let progress = ProgressBar::new(outcomes.len() as u64);
    let mut summaries = Vec::new();
    let mut failures = Vec::new();

    for &outcome in outcomes {
        progress.set_message(outcome.name());
        match train_one(&lagged, &store, outcome, config) {
            Ok(summary) => {
                println!(
                    "  {}: {} rows, {} loss {:.4} (baseline {:.4}), {} trees",
                    outcome,
                    summary.rows,
                    summary.variant,
                    summary.ensemble_loss,
                    summary.baseline_loss,
                    summary.n_trees
                );
                summaries.push(summary);
            }
            Err(error) => {
                eprintln!("  {outcome}: failed: {error}");
                failures.push((outcome, error.to_string()));
            }
        }
        progress.inc(1);
    }
    progress.finish_and_clear();

    if !summaries.is_empty() {
        write_summary(&models.join("training_summary.csv"), &summaries)?;
    }
    Ok(RunReport {
        summaries,
        failures,
    })
}

/// Train and persist a single outcome's model pair.
fn train_one(
    lagged: &DataFrame,
    store: &ArtifactStore,
    outcome: Outcome,
    config: &PipelineConfig,
) -> Result<OutcomeSummary, PipelineError> {
    let selected = select(lagged, outcome, Mode::Estimation)?;
    let rows = selected.height();

    let objective = objective_for(outcome);
    let split = SplitConfig {
        test_fraction: config.test_fraction,
        seed: config.seed,
        ..SplitConfig::default()
    };
    let dataset = split_and_scale(&selected, objective, &split)?;

    let trainer = TrainerConfig {
        grid: if config.quick {
            ParamGrid::quick()
        } else {
            ParamGrid::default()
        },
        seed: config.seed,
        ..TrainerConfig::new(objective)
    };
    let trained = train_outcome(&dataset, &trainer)?;

    if !trained.baseline.converged() {
        eprintln!("  {outcome}: warning: baseline did not converge; persisting anyway");
    }

    store.save_outcome(
        outcome.artifact_stem(),
        &trained,
        dataset.target_scaler.as_ref(),
    )?;
    Ok(OutcomeSummary::new(outcome.name(), rows, &trained))
}
