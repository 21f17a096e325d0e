//! Static per-outcome declarations.
//!
//! One record per outcome: eligibility filter, dependent column, ordered
//! feature list and the transformation flags. The table is data, not
//! imperative assembly — identical lookups always yield identical lists.

use crate::error::{FeatureError, Result};
use crate::outcome::Outcome;
use polars::prelude::*;

/// Subpopulation restriction applied before feature selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EligibilityFilter {
    /// Whole lagged panel.
    All,
    /// Childless women only (`female == 1 && child == 0`).
    ChildlessFemale,
    /// Persons not retired in the current period (`retired == 0`).
    NotRetired,
    /// Persons working in the current period (`working == 1`).
    Working,
}

impl EligibilityFilter {
    /// Polars predicate for this filter, if any.
    pub fn predicate(self) -> Option<Expr> {
        match self {
            Self::All => None,
            Self::ChildlessFemale => Some(col("female").eq(lit(1)).and(col("child").eq(lit(0)))),
            Self::NotRetired => Some(col("retired").eq(lit(0))),
            Self::Working => Some(col("working").eq(lit(1))),
        }
    }

    /// Human-readable description for registry listings.
    pub const fn describe(self) -> &'static str {
        match self {
            Self::All => "all persons",
            Self::ChildlessFemale => "childless women",
            Self::NotRetired => "not retired",
            Self::Working => "working",
        }
    }
}

/// Declared configuration of one outcome's feature set.
#[derive(Debug, Clone, Copy)]
pub struct OutcomeSpec {
    /// Outcome this record belongs to.
    pub outcome: Outcome,
    /// Subpopulation restriction.
    pub filter: EligibilityFilter,
    /// Raw column holding the dependent variable.
    pub dependent: &'static str,
    /// Ordered feature list (simulation-mode projection).
    pub features: &'static [&'static str],
    /// Append `feature × female` interaction terms.
    pub interact_with_female: bool,
    /// Append a squared-age term.
    pub append_age_squared: bool,
    /// Fit an intercept in the parametric baseline.
    pub with_intercept: bool,
}

const EMPLOYMENT_FEATURES: &[&str] = &[
    "fulltime_t1",
    "working_t1",
    "n_children",
    "hh_youngest_age",
    "hh_income",
    "hh_frac_working",
    "female",
    "age",
];

static RETIRED: OutcomeSpec = OutcomeSpec {
    outcome: Outcome::Retired,
    filter: EligibilityFilter::All,
    dependent: "retired",
    features: &[
        "retired_t1",
        "working_t1",
        "n_children",
        "hh_youngest_age",
        "hh_income",
        "hh_frac_working",
        "female",
        "age",
    ],
    interact_with_female: true,
    append_age_squared: true,
    with_intercept: true,
};

static WORKING: OutcomeSpec = OutcomeSpec {
    outcome: Outcome::Working,
    filter: EligibilityFilter::NotRetired,
    dependent: "working",
    features: EMPLOYMENT_FEATURES,
    interact_with_female: true,
    append_age_squared: true,
    with_intercept: true,
};

static FULLTIME: OutcomeSpec = OutcomeSpec {
    outcome: Outcome::Fulltime,
    filter: EligibilityFilter::Working,
    dependent: "fulltime",
    features: EMPLOYMENT_FEATURES,
    interact_with_female: true,
    append_age_squared: true,
    with_intercept: true,
};

static HOURS: OutcomeSpec = OutcomeSpec {
    outcome: Outcome::Hours,
    filter: EligibilityFilter::Working,
    dependent: "hours",
    features: &[
        "hours_t1",
        "hours_t2",
        "fulltime",
        "fulltime_t1",
        "gross_earnings_t1",
        "n_children",
        "hh_youngest_age",
        "hh_income",
        "hh_frac_working",
        "female",
        "age",
    ],
    interact_with_female: false,
    append_age_squared: true,
    with_intercept: true,
};

static EARNINGS: OutcomeSpec = OutcomeSpec {
    outcome: Outcome::Earnings,
    filter: EligibilityFilter::Working,
    dependent: "gross_earnings",
    features: &[
        "gross_earnings_t1",
        "gross_earnings_t2",
        "fulltime",
        "hours",
        "education",
        "n_children",
        "hh_youngest_age",
        "hh_income",
        "hh_frac_working",
        "female",
        "age",
    ],
    interact_with_female: false,
    append_age_squared: true,
    with_intercept: true,
};

static BIRTH: OutcomeSpec = OutcomeSpec {
    outcome: Outcome::Birth,
    filter: EligibilityFilter::ChildlessFemale,
    dependent: "birth",
    features: &["education", "age", "married", "n_children", "hh_youngest_age"],
    interact_with_female: false,
    append_age_squared: false,
    with_intercept: true,
};

/// Look up the declared record for `outcome`.
pub const fn outcome_spec(outcome: Outcome) -> &'static OutcomeSpec {
    match outcome {
        Outcome::Retired => &RETIRED,
        Outcome::Working => &WORKING,
        Outcome::Fulltime => &FULLTIME,
        Outcome::Hours => &HOURS,
        Outcome::Earnings => &EARNINGS,
        Outcome::Birth => &BIRTH,
    }
}

/// Check the whole registry for label leaks: no outcome's feature list may
/// contain its own dependent column.
pub fn validate_registry() -> Result<()> {
    for outcome in Outcome::training_order() {
        let spec = outcome_spec(outcome);
        if spec.features.contains(&spec.dependent) {
            return Err(FeatureError::LabelLeak {
                outcome: outcome.name().to_string(),
                column: spec.dependent.to_string(),
            });
        }
    }
    Ok(())
}
