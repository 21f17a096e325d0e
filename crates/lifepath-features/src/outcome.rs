//! Behavioral outcomes and their training order.

use crate::error::FeatureError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Kind of dependent variable an outcome models.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModelFamily {
    /// Binary transition (logistic baseline, log-loss ensemble).
    Binary,
    /// Continuous level (linear baseline, squared-error ensemble, scaled target).
    Continuous,
}

/// A life-cycle transition modeled by the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// Transition into retirement.
    Retired,
    /// Labor-force participation.
    Working,
    /// Full-time employment among the working.
    Fulltime,
    /// Weekly hours worked among the working.
    Hours,
    /// Gross earnings among the working.
    Earnings,
    /// Childbirth among childless women.
    Birth,
}

impl Outcome {
    /// All outcomes in population-gating order: retirement gates working,
    /// working gates fulltime and hours, hours feeds earnings. Birth is
    /// independent of the employment chain and runs last.
    pub const fn training_order() -> [Self; 6] {
        [
            Self::Retired,
            Self::Working,
            Self::Fulltime,
            Self::Hours,
            Self::Earnings,
            Self::Birth,
        ]
    }

    /// Registry name of this outcome.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Retired => "retired",
            Self::Working => "working",
            Self::Fulltime => "fulltime",
            Self::Hours => "hours",
            Self::Earnings => "earnings",
            Self::Birth => "birth",
        }
    }

    /// File-name stem of this outcome's artifacts. Earnings keeps the
    /// dependent column's name, which the downstream simulator expects.
    pub const fn artifact_stem(self) -> &'static str {
        match self {
            Self::Earnings => "gross_earnings",
            other => other.name(),
        }
    }

    /// Dependent-variable kind.
    pub const fn family(self) -> ModelFamily {
        match self {
            Self::Hours | Self::Earnings => ModelFamily::Continuous,
            _ => ModelFamily::Binary,
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Outcome {
    type Err = FeatureError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "retired" => Ok(Self::Retired),
            "working" => Ok(Self::Working),
            "fulltime" => Ok(Self::Fulltime),
            "hours" => Ok(Self::Hours),
            "earnings" | "gross_earnings" => Ok(Self::Earnings),
            "birth" => Ok(Self::Birth),
            other => Err(FeatureError::UnknownOutcome(other.to_string())),
        }
    }
}
