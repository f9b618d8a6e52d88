use serde::{Deserialize, Serialize};
use std::fmt;

use crate::coverage::CoverageResult;

/// Relative growth, or the sentinel used when the before coverage is zero.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelativeGrowth {
    Percent(f64),
    Undefined,
}

impl RelativeGrowth {
    pub fn percent(&self) -> Option<f64> {
        match self {
            RelativeGrowth::Percent(value) => Some(*value),
            RelativeGrowth::Undefined => None,
        }
    }

    pub fn is_undefined(&self) -> bool {
        matches!(self, RelativeGrowth::Undefined)
    }
}

impl fmt::Display for RelativeGrowth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RelativeGrowth::Percent(value) => write!(f, "{value:+.1}%"),
            RelativeGrowth::Undefined => f.write_str("undefined"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GrowthStatus {
    Positive,
    Negative,
    Stable,
}

/// Qualitative tier for positive growth.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GrowthAssessment {
    /// More than doubled (or grew from zero coverage)
    Exceptional,
    Significant,
    Good,
    Moderate,
}

impl GrowthAssessment {
    pub fn description(&self) -> &'static str {
        match self {
            GrowthAssessment::Exceptional => {
                "Exceptional growth detected. The plant has more than doubled in size."
            }
            GrowthAssessment::Significant => "Significant growth with strong development.",
            GrowthAssessment::Good => "Good growth showing healthy development.",
            GrowthAssessment::Moderate => "Moderate but steady growth progress.",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GrowthReport {
    pub before_percentage: f64,
    pub after_percentage: f64,
    pub absolute_growth: f64,
    pub relative_growth: RelativeGrowth,
}

impl GrowthReport {
    pub fn from_percentages(before_percentage: f64, after_percentage: f64) -> Self {
        let absolute_growth = after_percentage - before_percentage;
        let relative_growth = if before_percentage == 0.0 {
            RelativeGrowth::Undefined
        } else {
            RelativeGrowth::Percent(absolute_growth / before_percentage * 100.0)
        };

        Self {
            before_percentage,
            after_percentage,
            absolute_growth,
            relative_growth,
        }
    }

    pub fn status(&self) -> GrowthStatus {
        if self.absolute_growth > 0.0 {
            GrowthStatus::Positive
        } else if self.absolute_growth < 0.0 {
            GrowthStatus::Negative
        } else {
            GrowthStatus::Stable
        }
    }

    /// Tier for positive growth; `None` for stable or shrinking coverage.
    pub fn assessment(&self) -> Option<GrowthAssessment> {
        if self.status() != GrowthStatus::Positive {
            return None;
        }
        let tier = match self.relative_growth {
            RelativeGrowth::Undefined => GrowthAssessment::Exceptional,
            RelativeGrowth::Percent(r) if r > 100.0 => GrowthAssessment::Exceptional,
            RelativeGrowth::Percent(r) if r > 50.0 => GrowthAssessment::Significant,
            RelativeGrowth::Percent(r) if r > 20.0 => GrowthAssessment::Good,
            RelativeGrowth::Percent(_) => GrowthAssessment::Moderate,
        };
        Some(tier)
    }
}

/// Derive growth between two chronologically ordered coverage results.
pub fn compare_growth(before: &CoverageResult, after: &CoverageResult) -> GrowthReport {
    GrowthReport::from_percentages(before.percentage, after.percentage)
}
