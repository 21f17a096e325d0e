//! Lagged-panel construction.
//!
//! Builds one output row per person-year by joining each year's slice with
//! the slices one and two years earlier, attaching the declared lag
//! covariates. Only persons observed in more than two distinct years enter
//! the output; persons with shorter histories are silently excluded, which
//! is documented filtering behavior rather than an error.
//!
//! Joins match on strict calendar-year equality. A person with a gap in
//! their observed years has no matching record for the missing period, so
//! the inner join drops that person-year instead of attaching a
//! non-adjacent observation as a lag.

use crate::error::{DataError, Result};
use crate::schema::{self, LAG1_COLUMNS, LAG2_COLUMNS, PID, YEAR};
use polars::prelude::*;

/// Build the lagged panel from a raw person-year panel.
///
/// Output columns are the raw columns followed by the `*_t1` and `*_t2`
/// lag columns. Any row with a remaining missing value is dropped.
///
/// # Errors
///
/// Returns [`DataError::MissingColumn`] if a required column is absent and
/// [`DataError::InsufficientYears`] if the panel spans fewer than three
/// distinct years.
pub fn build_lagged_panel(panel: &DataFrame) -> Result<DataFrame> {
    let mut required = vec![PID, YEAR];
    required.extend_from_slice(LAG1_COLUMNS);
    schema::ensure_columns(panel, &required, "lag builder")?;

    let years = observed_years(panel)?;
    if years.len() < 3 {
        return Err(DataError::InsufficientYears {
            n_years: years.len(),
        });
    }

    // Persons need more than two observed years to ever satisfy both joins.
    let base = panel
        .clone()
        .lazy()
        .filter(col(YEAR).len().over([col(PID)]).gt(lit(2)));

    let parts: Vec<LazyFrame> = years[2..]
        .iter()
        .map(|&year| attach_lags(&base, year))
        .collect();

    let lagged = concat(parts, UnionArgs::default())?
        .drop_nulls(None)
        .collect()?;

    Ok(lagged)
}

/// Join year `year` with the two preceding calendar years on person id.
fn attach_lags(base: &LazyFrame, year: i64) -> LazyFrame {
    let current = base.clone().filter(col(YEAR).eq(lit(year)));

    let lag1_cols: Vec<Expr> = std::iter::once(col(PID))
        .chain(
            LAG1_COLUMNS
                .iter()
                .map(|&column| col(column).alias(schema::lag1(column))),
        )
        .collect();
    let previous = base
        .clone()
        .filter(col(YEAR).eq(lit(year - 1)))
        .select(lag1_cols);

    let lag2_cols: Vec<Expr> = std::iter::once(col(PID))
        .chain(
            LAG2_COLUMNS
                .iter()
                .map(|&column| col(column).alias(schema::lag2(column))),
        )
        .collect();
    let previous2 = base
        .clone()
        .filter(col(YEAR).eq(lit(year - 2)))
        .select(lag2_cols);

    current
        .join(
            previous,
            [col(PID)],
            [col(PID)],
            JoinArgs::new(JoinType::Inner),
        )
        .join(
            previous2,
            [col(PID)],
            [col(PID)],
            JoinArgs::new(JoinType::Inner),
        )
}

/// Sorted distinct calendar years present in the panel.
fn observed_years(panel: &DataFrame) -> Result<Vec<i64>> {
    let years = panel.column(YEAR)?.cast(&DataType::Int64)?;
    let mut years: Vec<i64> = years.i64()?.into_iter().flatten().collect();
    years.sort_unstable();
    years.dedup();
    Ok(years)
}
