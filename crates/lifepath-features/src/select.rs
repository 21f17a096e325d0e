//! Applying an outcome declaration to the lagged panel.

use crate::error::{FeatureError, Result};
use crate::outcome::Outcome;
use crate::spec::{EligibilityFilter, outcome_spec};
use crate::DEP_VAR;
use lifepath_data::schema::WEIGHT;
use polars::prelude::*;
use std::str::FromStr;

/// Feature-selection mode.
///
/// Estimation mode keeps the dependent variable (renamed to
/// [`DEP_VAR`]) and the sampling weight; simulation mode excludes both so
/// a consumer can rebuild exactly the matrix the models were fit on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Include dependent variable and weight.
    Estimation,
    /// Features only.
    Simulation,
}

impl FromStr for Mode {
    type Err = FeatureError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "estimation" | "1" => Ok(Self::Estimation),
            "simulation" | "0" => Ok(Self::Simulation),
            other => Err(FeatureError::InvalidMode {
                value: other.to_string(),
            }),
        }
    }
}

impl TryFrom<i64> for Mode {
    type Error = FeatureError;

    /// The upstream encoding: 1 is estimation, 0 is simulation.
    fn try_from(value: i64) -> Result<Self> {
        match value {
            1 => Ok(Self::Estimation),
            0 => Ok(Self::Simulation),
            other => Err(FeatureError::InvalidMode {
                value: other.to_string(),
            }),
        }
    }
}

/// Columns each eligibility filter reads.
const fn filter_columns(filter: EligibilityFilter) -> &'static [&'static str] {
    match filter {
        EligibilityFilter::All => &[],
        EligibilityFilter::ChildlessFemale => &["female", "child"],
        EligibilityFilter::NotRetired => &["retired"],
        EligibilityFilter::Working => &["working"],
    }
}

/// Ordered base projection for `outcome` in `mode`, before interaction and
/// squared-age terms are appended.
pub fn declared_columns(outcome: Outcome, mode: Mode) -> Vec<String> {
    let spec = outcome_spec(outcome);
    let mut columns = Vec::with_capacity(spec.features.len() + 2);
    if mode == Mode::Estimation {
        columns.push(DEP_VAR.to_string());
    }
    columns.extend(spec.features.iter().map(|f| (*f).to_string()));
    if mode == Mode::Estimation {
        columns.push(WEIGHT.to_string());
    }
    columns
}

/// Ordered names of the columns the models are actually fit on: declared
/// features plus interaction and squared-age terms, weight excluded.
///
/// This list is the feature-order contract persisted with every artifact.
pub fn model_feature_names(outcome: Outcome) -> Vec<String> {
    let spec = outcome_spec(outcome);
    let mut names: Vec<String> = spec.features.iter().map(|f| (*f).to_string()).collect();
    if spec.interact_with_female {
        names.extend(
            spec.features
                .iter()
                .filter(|&&f| f != "female")
                .map(|f| format!("{f}_interacted")),
        );
    }
    if spec.append_age_squared {
        names.push("age_squared".to_string());
    }
    names
}

/// Apply `outcome`'s declared record to a lagged panel.
///
/// Filters to the eligible subpopulation, renames the dependent column to
/// [`DEP_VAR`], projects onto the declared feature list, appends the
/// configured interaction and squared-age terms, and drops rows with any
/// remaining missing value.
pub fn select(frame: &DataFrame, outcome: Outcome, mode: Mode) -> Result<DataFrame> {
    let spec = outcome_spec(outcome);

    let mut required: Vec<&str> = spec.features.to_vec();
    required.extend_from_slice(filter_columns(spec.filter));
    if mode == Mode::Estimation {
        required.push(spec.dependent);
        required.push(WEIGHT);
    }
    for &column in &required {
        if frame.column(column).is_err() {
            return Err(FeatureError::MissingColumn {
                column: column.to_string(),
                outcome: outcome.name().to_string(),
            });
        }
    }

    let mut lf = frame.clone().lazy();
    if let Some(predicate) = spec.filter.predicate() {
        lf = lf.filter(predicate);
    }

    let mut projection: Vec<Expr> = Vec::with_capacity(spec.features.len() + 2);
    if mode == Mode::Estimation {
        projection.push(col(spec.dependent).alias(DEP_VAR));
    }
    projection.extend(spec.features.iter().map(|&f| col(f)));
    if mode == Mode::Estimation {
        projection.push(col(WEIGHT));
    }
    lf = lf.select(projection);

    if spec.interact_with_female {
        let interactions: Vec<Expr> = spec
            .features
            .iter()
            .filter(|&&f| f != "female")
            .map(|&f| (col(f) * col("female")).alias(format!("{f}_interacted")))
            .collect();
        lf = lf.with_columns(interactions);
    }
    if spec.append_age_squared {
        lf = lf.with_column((col("age") * col("age")).alias("age_squared"));
    }

    Ok(lf.drop_nulls(None).collect()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    /// One row per combination of sex, child status and employment state.
    fn lagged_frame() -> DataFrame {
        let n = 8;
        let female = [1.0, 1.0, 0.0, 0.0, 1.0, 0.0, 1.0, 0.0];
        let child = [0.0, 1.0, 0.0, 1.0, 0.0, 0.0, 1.0, 1.0];
        let retired = [0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 0.0, 0.0];
        let working = [1.0, 1.0, 0.0, 1.0, 0.0, 0.0, 1.0, 1.0];
        let age = [25.0, 30.0, 67.0, 40.0, 55.0, 70.0, 35.0, 45.0];

        let constant = |v: f64| vec![v; n];
        DataFrame::new(vec![
            Series::new("female".into(), female.to_vec()).into(),
            Series::new("child".into(), child.to_vec()).into(),
            Series::new("retired".into(), retired.to_vec()).into(),
            Series::new("working".into(), working.to_vec()).into(),
            Series::new("age".into(), age.to_vec()).into(),
            Series::new("education".into(), constant(12.0)).into(),
            Series::new("married".into(), constant(1.0)).into(),
            Series::new("n_children".into(), constant(0.0)).into(),
            Series::new("hh_youngest_age".into(), constant(0.0)).into(),
            Series::new("hh_income".into(), constant(40_000.0)).into(),
            Series::new("hh_frac_working".into(), constant(0.5)).into(),
            Series::new("retired_t1".into(), constant(0.0)).into(),
            Series::new("working_t1".into(), constant(1.0)).into(),
            Series::new("fulltime_t1".into(), constant(1.0)).into(),
            Series::new("fulltime".into(), constant(1.0)).into(),
            Series::new("hours".into(), constant(38.0)).into(),
            Series::new("hours_t1".into(), constant(40.0)).into(),
            Series::new("hours_t2".into(), constant(35.0)).into(),
            Series::new("gross_earnings".into(), constant(30_000.0)).into(),
            Series::new("gross_earnings_t1".into(), constant(29_000.0)).into(),
            Series::new("gross_earnings_t2".into(), constant(28_000.0)).into(),
            Series::new("birth".into(), constant(0.0)).into(),
            Series::new(WEIGHT.into(), constant(1.5)).into(),
        ])
        .unwrap()
    }

    #[test]
    fn test_mode_parsing() {
        assert_eq!(Mode::try_from(1).unwrap(), Mode::Estimation);
        assert_eq!(Mode::try_from(0).unwrap(), Mode::Simulation);
        assert!(matches!(
            Mode::try_from(2),
            Err(FeatureError::InvalidMode { .. })
        ));
        assert!(matches!(
            "online".parse::<Mode>(),
            Err(FeatureError::InvalidMode { .. })
        ));
    }

    #[test]
    fn test_retired_estimation_declares_ten_columns() {
        let columns = declared_columns(Outcome::Retired, Mode::Estimation);
        assert_eq!(columns.len(), 10);
        assert_eq!(columns[0], DEP_VAR);
        assert_eq!(columns.last().unwrap(), WEIGHT);
    }

    #[rstest]
    #[case::retired(Outcome::Retired)]
    #[case::working(Outcome::Working)]
    #[case::hours(Outcome::Hours)]
    #[case::birth(Outcome::Birth)]
    fn test_feature_lists_are_deterministic(#[case] outcome: Outcome) {
        assert_eq!(model_feature_names(outcome), model_feature_names(outcome));
        assert_eq!(
            declared_columns(outcome, Mode::Simulation),
            declared_columns(outcome, Mode::Simulation)
        );
    }

    #[test]
    fn test_simulation_mode_excludes_target_and_weight() {
        let frame = lagged_frame();
        let selected = select(&frame, Outcome::Working, Mode::Simulation).unwrap();
        let names: Vec<String> = selected
            .get_column_names()
            .iter()
            .map(|n| n.to_string())
            .collect();
        assert!(!names.contains(&DEP_VAR.to_string()));
        assert!(!names.contains(&WEIGHT.to_string()));
    }

    #[test]
    fn test_birth_sample_is_childless_female() {
        let frame = lagged_frame();
        // Filter columns are not part of birth's projection, so check the
        // row count: rows 0 and 4 are the only childless women.
        let selected = select(&frame, Outcome::Birth, Mode::Estimation).unwrap();
        assert_eq!(selected.height(), 2);
    }

    #[test]
    fn test_fulltime_sample_excludes_nonworkers() {
        let frame = lagged_frame();
        let selected = select(&frame, Outcome::Fulltime, Mode::Estimation).unwrap();
        // Rows with working == 1: indices 0, 1, 3, 6, 7.
        assert_eq!(selected.height(), 5);
    }

    #[test]
    fn test_interactions_and_age_squared_are_appended() {
        let frame = lagged_frame();
        let selected = select(&frame, Outcome::Retired, Mode::Estimation).unwrap();

        let age = selected.column("age").unwrap().f64().unwrap();
        let age_sq = selected.column("age_squared").unwrap().f64().unwrap();
        let female = selected.column("female").unwrap().f64().unwrap();
        let interacted = selected.column("age_interacted").unwrap().f64().unwrap();

        for i in 0..selected.height() {
            let a = age.get(i).unwrap();
            assert_eq!(age_sq.get(i).unwrap(), a * a);
            assert_eq!(interacted.get(i).unwrap(), a * female.get(i).unwrap());
        }
        // Female itself never gets an interaction term.
        assert!(selected.column("female_interacted").is_err());
    }

    #[test]
    fn test_model_feature_names_match_selected_frame() {
        let frame = lagged_frame();
        for outcome in Outcome::training_order() {
            let selected = select(&frame, outcome, Mode::Estimation).unwrap();
            let names = model_feature_names(outcome);
            for name in &names {
                assert!(
                    selected.column(name).is_ok(),
                    "{outcome}: missing model column {name}"
                );
            }
            // Selected frame = dep_var + model features + weight.
            assert_eq!(selected.width(), names.len() + 2);
        }
    }

    #[test]
    fn test_missing_column_is_reported() {
        let frame = lagged_frame().drop("hh_income").unwrap();
        let err = select(&frame, Outcome::Retired, Mode::Estimation).unwrap_err();
        assert!(matches!(err, FeatureError::MissingColumn { .. }));
    }
}
