#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/lifepath-model/lifepath/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod boost;
pub mod dataset;
pub mod error;
pub mod linear;
pub mod scaler;
pub mod trainer;
pub mod tree;
pub mod tuning;

pub use boost::{
    BoostingVariant, FitReport, GradientBoosting, GradientBoostingConfig, Objective,
    ValidationSet,
};
pub use dataset::{SplitConfig, TrainingDataset, split_and_scale};
pub use error::{ModelError, Result};
pub use linear::{WeightedLeastSquares, WeightedLogit};
pub use scaler::{StandardScaler, TargetScaler};
pub use trainer::{BaselineModel, FitMetrics, TrainedOutcome, TrainerConfig, train_outcome};
pub use tree::{RegressionTree, TreeConfig};
pub use tuning::{GridSearchReport, ParamGrid, grid_search};
