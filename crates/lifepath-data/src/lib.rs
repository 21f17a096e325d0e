#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/lifepath-model/lifepath/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod error;
pub mod lag;
pub mod loader;
pub mod schema;

pub use error::{DataError, Result};
pub use lag::build_lagged_panel;
pub use loader::load_panel;
