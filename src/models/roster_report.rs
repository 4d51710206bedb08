//! Roster-level report models.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::{DutyType, EvaluationResult, RestEvaluation};

/// Overall compliance of a set of results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ComplianceStatus {
    /// No result carries a violation.
    #[serde(rename = "OK")]
    Ok,
    /// At least one result carries a violation.
    #[serde(rename = "Non-Compliant")]
    NonCompliant,
}

impl fmt::Display for ComplianceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ComplianceStatus::Ok => write!(f, "OK"),
            ComplianceStatus::NonCompliant => write!(f, "Non-Compliant"),
        }
    }
}

/// Reduction of many results to one status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterSummary {
    /// Overall status.
    pub overall_status: ComplianceStatus,
    /// Number of results reduced.
    pub evaluated_results: usize,
    /// Total violations across all results.
    pub violation_count: usize,
}

/// All results for one duty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DutyEvaluation {
    /// Duty identifier, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duty_id: Option<String>,
    /// Duty kind, which decides the checks applied.
    pub duty_type: DutyType,
    /// One result per check applied.
    pub results: Vec<EvaluationResult>,
}

/// The rest check between two consecutive duties.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RestPeriodEvaluation {
    /// Duty the rest follows.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_duty_id: Option<String>,
    /// Duty the rest precedes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_duty_id: Option<String>,
    /// Detailed rest figures.
    pub evaluation: RestEvaluation,
    /// The rest check expressed as an evaluation result.
    pub result: EvaluationResult,
}

/// Everything produced by evaluating a roster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RosterReport {
    /// Per-duty results, in input order.
    pub duties: Vec<DutyEvaluation>,
    /// Rest periods between consecutive duties, in chronological order.
    pub rest_periods: Vec<RestPeriodEvaluation>,
    /// Roster-level summary over every result above.
    pub summary: RosterSummary,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compliance_status_serialization() {
        assert_eq!(serde_json::to_value(ComplianceStatus::Ok).unwrap(), "OK");
        assert_eq!(
            serde_json::to_value(ComplianceStatus::NonCompliant).unwrap(),
            "Non-Compliant"
        );
        assert_eq!(ComplianceStatus::NonCompliant.to_string(), "Non-Compliant");
    }
}
