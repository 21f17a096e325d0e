//! Integration module wiring the library crates into the training pipeline.

pub(crate) mod pipeline;
