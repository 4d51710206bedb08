//! Rest evaluation models.
//!
//! A [`RestEvaluation`] carries every intermediate quantity of a rest check
//! so a reviewer can trace how the required rest was built up.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The rest policy applied to a rest period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RestPolicy {
    /// Regulatory baseline.
    #[serde(rename = "EASA")]
    Easa,
    /// Operator rules, rest taken at home base.
    #[serde(rename = "OMA_HOME")]
    OmaHome,
    /// Operator rules, rest taken away from base.
    #[serde(rename = "OMA_AWAY")]
    OmaAway,
}

impl RestPolicy {
    /// Minimum rest regardless of the preceding duty length.
    pub fn floor_minutes(self) -> i64 {
        match self {
            RestPolicy::Easa => 600,
            RestPolicy::OmaAway => 600,
            RestPolicy::OmaHome => 720,
        }
    }

    /// Extra rest when the preceding duty touched the WOCL.
    pub fn wocl_bonus_minutes(self) -> i64 {
        match self {
            RestPolicy::Easa => 120,
            RestPolicy::OmaHome => 60,
            RestPolicy::OmaAway => 30,
        }
    }
}

impl fmt::Display for RestPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RestPolicy::Easa => write!(f, "EASA"),
            RestPolicy::OmaHome => write!(f, "OMA_HOME"),
            RestPolicy::OmaAway => write!(f, "OMA_AWAY"),
        }
    }
}

/// Compliance of a rest period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RestStatus {
    /// Required rest met.
    #[serde(rename = "OK")]
    Ok,
    /// Short by 30 minutes or less.
    #[serde(rename = "At-Risk")]
    AtRisk,
    /// Short by more than 30 minutes.
    #[serde(rename = "Non-Compliant")]
    NonCompliant,
}

impl fmt::Display for RestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RestStatus::Ok => write!(f, "OK"),
            RestStatus::AtRisk => write!(f, "At-Risk"),
            RestStatus::NonCompliant => write!(f, "Non-Compliant"),
        }
    }
}

/// Traffic-light colour paired with a [`RestStatus`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorCode {
    /// OK.
    Green,
    /// At-Risk.
    Amber,
    /// Non-Compliant.
    Red,
}

/// The kind of adjustment added on top of the base requirement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AdjustmentKind {
    /// Preceding duty overlapped the window of circadian low.
    Wocl,
    /// Travel time when resting away from base.
    Travel,
}

/// One adjustment to the required rest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestAdjustment {
    /// What caused the adjustment.
    #[serde(rename = "type")]
    pub kind: AdjustmentKind,
    /// Minutes added.
    pub minutes: i64,
    /// Human-readable note.
    pub note: String,
}

/// The full result of a rest check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestEvaluation {
    /// Minutes from the previous duty end to the next report.
    pub actual_rest_minutes: i64,
    /// Policy requirement before adjustments.
    pub base_required_rest_minutes: i64,
    /// Requirement after adjustments.
    pub required_rest_minutes: i64,
    /// `max(0, required - actual)`.
    pub shortfall_minutes: i64,
    /// Earliest compliant report instant.
    pub next_earliest_report_utc: DateTime<Utc>,
    /// Compliance status.
    pub rest_status: RestStatus,
    /// Colour for the status.
    pub color_code: ColorCode,
    /// Policy applied.
    pub policy: RestPolicy,
    /// Whether the preceding duty overlapped the WOCL.
    pub wocl_overlap: bool,
    /// Travel minutes added.
    pub travel_adjustment_minutes: i64,
    /// Adjustments in the order they were applied.
    pub adjustments: Vec<RestAdjustment>,
    /// Audit notes in the order they were produced.
    pub notes: Vec<String>,
}
