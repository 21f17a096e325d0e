#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/lifepath-model/lifepath/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

// Re-export main types from sub-crates
pub use lifepath_data as data;
pub use lifepath_features as features;
pub use lifepath_model as model;
pub use lifepath_output as output;

// Re-export the types most callers start from
pub use lifepath_features::{Mode, Outcome};

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
