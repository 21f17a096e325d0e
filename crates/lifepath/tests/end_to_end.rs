//! End-to-end pipeline test: raw panel → lags → selection → split/scale →
//! dual fit → persisted artifacts.

use lifepath::data::lag::build_lagged_panel;
use lifepath::data::schema;
use lifepath::features::select::{declared_columns, model_feature_names, select};
use lifepath::features::{FeatureError, Mode, Outcome};
use lifepath::model::{
    Objective, ParamGrid, SplitConfig, TrainerConfig, split_and_scale, train_outcome,
};
use lifepath::output::ArtifactStore;
use polars::prelude::*;

/// Deterministic person-year panel with every required column.
fn synthetic_panel(n_persons: i64, years: std::ops::Range<i64>) -> DataFrame {
    let mut pid = Vec::new();
    let mut year = Vec::new();
    let mut female = Vec::new();
    let mut age = Vec::new();
    let mut education = Vec::new();
    let mut married = Vec::new();
    let mut child = Vec::new();
    let mut n_children = Vec::new();
    let mut hh_youngest_age = Vec::new();
    let mut hh_income = Vec::new();
    let mut hh_frac_working = Vec::new();
    let mut retired = Vec::new();
    let mut working = Vec::new();
    let mut fulltime = Vec::new();
    let mut hours = Vec::new();
    let mut gross_earnings = Vec::new();
    let mut employment_status = Vec::new();
    let mut birth = Vec::new();
    let mut personweight = Vec::new();

    for p in 1..=n_persons {
        for y in years.clone() {
            let t = (y - 2000) as f64;
            let ft = f64::from((p + y) % 2 == 0);
            let has_child = f64::from(p % 3 == 0);
            let h = hours_for(p, y);

            pid.push(p);
            year.push(y);
            female.push((p % 2) as f64);
            age.push(30.0 + (p % 20) as f64 + t);
            education.push(10.0 + (p % 4) as f64);
            married.push(f64::from(p % 3 == 0));
            child.push(has_child);
            n_children.push(has_child);
            hh_youngest_age.push(5.0 * has_child);
            hh_income.push(30_000.0 + 1_000.0 * p as f64 + 500.0 * t);
            hh_frac_working.push(0.5);
            retired.push(0.0);
            working.push(1.0);
            fulltime.push(ft);
            hours.push(h);
            gross_earnings.push(900.0 * h);
            employment_status.push(1.0 + ft);
            birth.push(0.0);
            personweight.push(1.0 + 0.5 * (p % 2) as f64);
        }
    }

    DataFrame::new(vec![
        Series::new("pid".into(), pid).into(),
        Series::new("year".into(), year).into(),
        Series::new("female".into(), female).into(),
        Series::new("age".into(), age).into(),
        Series::new("education".into(), education).into(),
        Series::new("married".into(), married).into(),
        Series::new("child".into(), child).into(),
        Series::new("n_children".into(), n_children).into(),
        Series::new("hh_youngest_age".into(), hh_youngest_age).into(),
        Series::new("hh_income".into(), hh_income).into(),
        Series::new("hh_frac_working".into(), hh_frac_working).into(),
        Series::new("retired".into(), retired).into(),
        Series::new("working".into(), working).into(),
        Series::new("fulltime".into(), fulltime).into(),
        Series::new("hours".into(), hours).into(),
        Series::new("gross_earnings".into(), gross_earnings).into(),
        Series::new("employment_status".into(), employment_status).into(),
        Series::new("birth".into(), birth).into(),
        Series::new("personweight".into(), personweight).into(),
    ])
    .unwrap()
}

fn hours_for(p: i64, y: i64) -> f64 {
    30.0 + 5.0 * (p % 3) as f64 + 2.0 * f64::from((p + y) % 2 == 0)
}

#[test]
fn test_lagged_panel_has_one_row_per_person_per_laggable_year() {
    let panel = synthetic_panel(4, 2000..2005);
    let lagged = build_lagged_panel(&panel).unwrap();

    // 5 observed years leave 3 laggable ones for each of the 4 persons.
    assert_eq!(lagged.height(), 12);

    // Hand-check one person's lags for 2002.
    let row = lagged
        .clone()
        .lazy()
        .filter(col("pid").eq(lit(2i64)).and(col("year").eq(lit(2002i64))))
        .collect()
        .unwrap();
    assert_eq!(row.height(), 1);

    let value = |name: &str| row.column(name).unwrap().f64().unwrap().get(0).unwrap();
    assert_eq!(value("hours"), hours_for(2, 2002));
    assert_eq!(value(&schema::lag1("hours")), hours_for(2, 2001));
    assert_eq!(value(&schema::lag2("hours")), hours_for(2, 2000));
    assert_eq!(
        value(&schema::lag1("gross_earnings")),
        900.0 * hours_for(2, 2001)
    );
}

#[test]
fn test_retired_estimation_set_shape() {
    let panel = synthetic_panel(4, 2000..2005);
    let lagged = build_lagged_panel(&panel).unwrap();

    let declared = declared_columns(Outcome::Retired, Mode::Estimation);
    assert_eq!(declared.len(), 10);

    let selected = select(&lagged, Outcome::Retired, Mode::Estimation).unwrap();
    let names = model_feature_names(Outcome::Retired);
    assert_eq!(selected.width(), names.len() + 2);
    assert_eq!(selected.height(), 12);
}

#[test]
fn test_invalid_mode_fails_before_any_fitting() {
    let err = Mode::try_from(2).unwrap_err();
    assert!(matches!(err, FeatureError::InvalidMode { .. }));
}

#[test]
fn test_hours_pipeline_trains_and_persists() {
    let panel = synthetic_panel(30, 2000..2004);
    let lagged = build_lagged_panel(&panel).unwrap();
    assert_eq!(lagged.height(), 60);

    let selected = select(&lagged, Outcome::Hours, Mode::Estimation).unwrap();
    assert_eq!(selected.height(), 60);

    let dataset = split_and_scale(&selected, Objective::Regression, &SplitConfig::default())
        .unwrap();
    // Selected frame order minus target and weight is the artifact order.
    assert_eq!(dataset.feature_names, model_feature_names(Outcome::Hours));
    assert!(dataset.target_scaler.is_some());

    let config = TrainerConfig {
        grid: ParamGrid::quick(),
        ..TrainerConfig::new(Objective::Regression)
    };
    let trained = train_outcome(&dataset, &config).unwrap();
    assert!(trained.metrics.baseline_loss.is_finite());
    assert!(trained.ensemble.n_trees() > 0);

    let root = std::env::temp_dir().join("lifepath_e2e_models");
    std::fs::remove_dir_all(&root).ok();
    let store = ArtifactStore::new(&root).unwrap();
    let stem = Outcome::Hours.artifact_stem();
    store
        .save_outcome(stem, &trained, dataset.target_scaler.as_ref())
        .unwrap();

    assert!(root.join("hours_ols").exists());
    assert!(root.join("hours_ml.txt").exists());
    assert!(root.join("hours_scaler").exists());

    let ensemble = store.load_ensemble(stem).unwrap();
    assert_eq!(ensemble.feature_names, model_feature_names(Outcome::Hours));

    std::fs::remove_dir_all(&root).ok();
}
