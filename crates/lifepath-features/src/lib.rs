#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/lifepath-model/lifepath/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod error;
pub mod outcome;
pub mod select;
pub mod spec;

pub use error::{FeatureError, Result};
pub use outcome::{ModelFamily, Outcome};
pub use select::{Mode, declared_columns, model_feature_names, select};
pub use spec::{EligibilityFilter, OutcomeSpec, outcome_spec, validate_registry};

/// Canonical name the dependent variable is renamed to by the selector.
pub const DEP_VAR: &str = "dep_var";
