//! Reduction of evaluation results to one compliance status.

use crate::models::{ComplianceStatus, EvaluationResult, RosterSummary};

/// Summarises a set of results.
///
/// The status is Non-Compliant when any result carries at least one
/// violation, and OK otherwise (including for an empty set). The
/// reduction does not depend on the order of `results`.
///
/// # Example
///
/// ```
/// use ftl_engine::evaluation::summarise;
/// use ftl_engine::models::{
///     ComplianceStatus, EvaluationMode, EvaluationResult, RuleSource, Violation,
/// };
///
/// let ok = EvaluationResult::new(RuleSource::Easa, EvaluationMode::Fdp);
/// let mut bad = EvaluationResult::new(RuleSource::Oma, EvaluationMode::Augmented);
/// bad.violations.push(Violation::excess(
///     RuleSource::Oma,
///     "augmented_cap_exceeded",
///     "Augmented FDP cap exceeded",
///     5,
/// ));
///
/// assert_eq!(summarise([&ok]).overall_status, ComplianceStatus::Ok);
/// assert_eq!(summarise([&ok, &bad]).overall_status, ComplianceStatus::NonCompliant);
/// ```
pub fn summarise<'a, I>(results: I) -> RosterSummary
where
    I: IntoIterator<Item = &'a EvaluationResult>,
{
    let (evaluated_results, violation_count) = results
        .into_iter()
        .fold((0, 0), |(count, violations), result| {
            (count + 1, violations + result.violations.len())
        });

    RosterSummary {
        overall_status: if violation_count > 0 {
            ComplianceStatus::NonCompliant
        } else {
            ComplianceStatus::Ok
        },
        evaluated_results,
        violation_count,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{EvaluationMode, RuleSource, Violation};

    fn failing() -> EvaluationResult {
        let mut result = EvaluationResult::new(RuleSource::Easa, EvaluationMode::Fdp);
        result
            .violations
            .push(Violation::excess(RuleSource::Easa, "fdp_exceeded", "FDP exceeded", 10));
        result
    }

    #[test]
    fn test_empty_set_is_ok() {
        let summary = summarise(std::iter::empty());
        assert_eq!(summary.overall_status, ComplianceStatus::Ok);
        assert_eq!(summary.evaluated_results, 0);
    }

    #[test]
    fn test_order_does_not_matter() {
        let ok = EvaluationResult::new(RuleSource::Oma, EvaluationMode::Reserve);
        let bad = failing();

        assert_eq!(summarise([&ok, &bad]), summarise([&bad, &ok]));
        assert_eq!(summarise([&ok, &bad]).violation_count, 1);
    }
}
