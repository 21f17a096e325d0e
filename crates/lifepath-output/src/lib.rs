#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/lifepath-model/lifepath/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod artifact;
pub mod error;
pub mod store;
pub mod summary;

pub use artifact::{BaselineArtifact, BaselineKind, EnsembleArtifact, ScalerArtifact};
pub use error::{ArtifactError, Result};
pub use store::ArtifactStore;
pub use summary::{OutcomeSummary, write_summary};
