//! Loading interface for the serialized person-year panel.
//!
//! Ingestion from whatever storage the panel originates in is an external
//! concern; this module is the declared boundary. It reads a CSV panel,
//! drops incomplete rows and validates the schema.

use crate::error::Result;
use crate::schema;
use polars::prelude::*;
use std::path::Path;

/// Load a person-year panel from `path`.
///
/// Rows with any missing value are dropped, matching the estimation
/// pipeline's expectation of a complete panel. Fails with
/// [`DataError::MissingColumn`](crate::DataError::MissingColumn) if a
/// required column is absent.
pub fn load_panel(path: &Path) -> Result<DataFrame> {
    let frame = LazyCsvReader::new(path)
        .with_has_header(true)
        .finish()?
        .drop_nulls(None)
        .collect()?;

    schema::ensure_columns(&frame, schema::REQUIRED_COLUMNS, "panel loader")?;
    Ok(frame)
}
