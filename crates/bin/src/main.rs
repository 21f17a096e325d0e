//! Lifepath CLI binary.
//!
//! Trains the life-cycle transition models from a person-year panel and
//! persists the per-outcome artifact sets.

mod integration;

use clap::{Parser, Subcommand};
use integration::pipeline::{PipelineConfig, run_pipeline};
use lifepath_features::select::{Mode, declared_columns, model_feature_names};
use lifepath_features::{Outcome, outcome_spec};
use std::path::PathBuf;
use std::process;

#[derive(Parser)]
#[command(name = "lifepath")]
#[command(about = "Lifepath: dual-model estimation of labor-market transitions", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Train the transition models from a panel CSV
    Estimate {
        /// Input panel CSV (person-year rows)
        #[arg(long)]
        input: PathBuf,

        /// Directory the model artifacts are written to
        #[arg(long)]
        models: PathBuf,

        /// Train only the named outcomes (repeatable; default: all)
        #[arg(long)]
        outcome: Vec<String>,

        /// Seed for splits, folds and subsampling
        #[arg(long, default_value = "42")]
        seed: u64,

        /// Held-out test fraction
        #[arg(long, default_value = "0.05")]
        test_fraction: f64,

        /// Use a small hyperparameter grid for smoke runs
        #[arg(long)]
        quick: bool,
    },

    /// List the outcome registry
    Outcomes,
}

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Estimate {
            input,
            models,
            outcome,
            seed,
            test_fraction,
            quick,
        } => {
            let outcomes = resolve_outcomes(&outcome)?;
            let config = PipelineConfig {
                seed,
                test_fraction,
                quick,
            };

            println!(
                "Training {} outcome(s) from {} into {}",
                outcomes.len(),
                input.display(),
                models.display()
            );
            let report = run_pipeline(&input, &models, &outcomes, &config)?;

            println!(
                "Done: {} trained, {} failed",
                report.summaries.len(),
                report.failures.len()
            );
            if !report.failures.is_empty() {
                process::exit(1);
            }
        }
        Commands::Outcomes => list_outcomes(),
    }

    Ok(())
}

/// Parse `--outcome` values, defaulting to the full training order.
fn resolve_outcomes(names: &[String]) -> Result<Vec<Outcome>, Box<dyn std::error::Error>> {
    if names.is_empty() {
        return Ok(Outcome::training_order().to_vec());
    }
    let mut outcomes = Vec::with_capacity(names.len());
    for name in names {
        outcomes.push(name.parse::<Outcome>()?);
    }
    Ok(outcomes)
}

fn list_outcomes() {
    println!(
        "{:<16}{:<12}{:<20}{:<10}{}",
        "outcome", "family", "sample", "features", "model columns"
    );
    for outcome in Outcome::training_order() {
        let spec = outcome_spec(outcome);
        println!(
            "{:<16}{:<12}{:<20}{:<10}{}",
            outcome.name(),
            format!("{:?}", outcome.family()).to_lowercase(),
            spec.filter.describe(),
            declared_columns(outcome, Mode::Simulation).len(),
            model_feature_names(outcome).len()
        );
    }
}
