//! Raw panel schema: the person-year columns every input must carry.

use crate::error::{DataError, Result};
use polars::prelude::*;

/// Person identifier column.
pub const PID: &str = "pid";
/// Calendar year column.
pub const YEAR: &str = "year";
/// Person-level sampling weight column.
pub const WEIGHT: &str = "personweight";

/// Columns every raw panel must contain.
pub const REQUIRED_COLUMNS: &[&str] = &[
    PID,
    YEAR,
    "female",
    "age",
    "education",
    "married",
    "child",
    "n_children",
    "hh_youngest_age",
    "hh_income",
    "hh_frac_working",
    "retired",
    "working",
    "fulltime",
    "hours",
    "gross_earnings",
    "employment_status",
    "birth",
    WEIGHT,
];

/// Covariates that receive a one-period lag (`*_t1`).
pub const LAG1_COLUMNS: &[&str] = &[
    "retired",
    "working",
    "fulltime",
    "hours",
    "gross_earnings",
    "employment_status",
];

/// Covariates that additionally receive a two-period lag (`*_t2`).
pub const LAG2_COLUMNS: &[&str] = &["hours", "gross_earnings", "employment_status"];

/// Name of the lag-1 column derived from `column`.
pub fn lag1(column: &str) -> String {
    format!("{column}_t1")
}

/// Name of the lag-2 column derived from `column`.
pub fn lag2(column: &str) -> String {
    format!("{column}_t2")
}

/// Verify that `frame` carries every column in `columns`.
///
/// `context` names the consumer for the error message.
pub fn ensure_columns(frame: &DataFrame, columns: &[&str], context: &str) -> Result<()> {
    for &column in columns {
        if frame.column(column).is_err() {
            return Err(DataError::MissingColumn {
                column: column.to_string(),
                context: context.to_string(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lag_names() {
        assert_eq!(lag1("hours"), "hours_t1");
        assert_eq!(lag2("gross_earnings"), "gross_earnings_t2");
    }

    #[test]
    fn test_ensure_columns_reports_first_missing() {
        let df = DataFrame::new(vec![
            Series::new(PID.into(), &[1i64, 2]).into(),
            Series::new(YEAR.into(), &[2000i64, 2000]).into(),
        ])
        .unwrap();

        assert!(ensure_columns(&df, &[PID, YEAR], "test").is_ok());

        let err = ensure_columns(&df, &[PID, "hours"], "test").unwrap_err();
        match err {
            DataError::MissingColumn { column, .. } => assert_eq!(column, "hours"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_lag2_columns_are_subset_of_lag1() {
        for column in LAG2_COLUMNS {
            assert!(
                LAG1_COLUMNS.contains(column),
                "{column} has a lag-2 but no lag-1"
            );
        }
    }
}
