//! Duty and roster evaluation drivers.
//!
//! [`evaluate_duty`] dispatches one duty to the checks for its type.
//! [`evaluate_roster`] evaluates every duty in parallel, then checks the
//! rest between each pair of consecutive duties and summarises everything.

use rayon::prelude::*;
use tracing::debug;

use crate::config::{EngineSettings, RuleBundle};
use crate::error::EngineResult;
use crate::models::{DutyEvaluation, DutyRecord, DutyType, RestPeriodEvaluation, RosterReport};

use super::fdp_limit::evaluate_easa_duty;
use super::night::evaluate_night_duty;
use super::operator::evaluate_oma_duty;
use super::rest::{RestInput, RestOptions, evaluate_rest, rest_evaluation_result};
use super::standby::{evaluate_airport_standby, evaluate_home_standby, evaluate_reserve_day};
use super::summary::summarise;

/// Evaluates one duty against the rule bundle.
///
/// | Duty type         | Checks                  |
/// |-------------------|-------------------------|
/// | `flying`          | EASA FDP, then OMA      |
/// | `ground`          | OMA                     |
/// | `standby_home`    | home standby            |
/// | `standby_airport` | airport standby         |
/// | `reserve`         | reserve day             |
///
/// Every duty type then gets the night duty check. All checks read the
/// duty over [`DutyRecord::interval`], and local clock rules are read in the
/// duty's own `base_timezone`.
///
/// # Errors
///
/// Returns `InvalidDuty` when the duty has no usable interval.
pub fn evaluate_duty(duty: &DutyRecord, bundle: &RuleBundle) -> EngineResult<DutyEvaluation> {
    let (start, end) = duty.interval()?;

    let mut results = match duty.duty_type {
        DutyType::Flying => vec![
            evaluate_easa_duty(duty, &bundle.easa)?,
            evaluate_oma_duty(duty, &bundle.oma),
        ],
        DutyType::Ground => vec![evaluate_oma_duty(duty, &bundle.oma)],
        DutyType::StandbyHome => vec![evaluate_home_standby(
            start,
            end,
            duty.call_out_utc,
            duty.assigned_report_utc,
            duty.base_timezone,
        )],
        DutyType::StandbyAirport => vec![evaluate_airport_standby(
            start,
            end,
            duty.assigned_report_utc,
        )],
        DutyType::Reserve => vec![evaluate_reserve_day(start, end)],
    };
    results.push(evaluate_night_duty(duty)?);

    Ok(DutyEvaluation {
        duty_id: duty.duty_id.clone(),
        duty_type: duty.duty_type,
        results,
    })
}

/// Evaluates a whole roster.
///
/// # Arguments
///
/// * `duties` - Duty records in any order
/// * `bundle` - The rule tables
/// * `settings` - Base airports and rest toggles
///
/// # Returns
///
/// A [`RosterReport`] with per-duty results in input order, rest periods in
/// chronological order of the evaluated intervals (airports taken from the
/// previous duty's `destination` and the next duty's `origin`, timezone from
/// the previous duty), and a summary over all of them.
///
/// # Errors
///
/// Returns the first `InvalidDuty` found; no partial report is produced.
pub fn evaluate_roster(
    duties: &[DutyRecord],
    bundle: &RuleBundle,
    settings: &EngineSettings,
) -> EngineResult<RosterReport> {
    let duty_evaluations = duties
        .par_iter()
        .map(|duty| evaluate_duty(duty, bundle))
        .collect::<EngineResult<Vec<_>>>()?;

    let mut chronological = duties
        .iter()
        .map(|duty| duty.interval().map(|(start, end)| (duty, start, end)))
        .collect::<EngineResult<Vec<_>>>()?;
    chronological.sort_by_key(|&(_, start, _)| start);

    let options = RestOptions::from_settings(settings);
    let rest_periods = chronological
        .windows(2)
        .map(|pair| -> EngineResult<RestPeriodEvaluation> {
            let ((previous, previous_start, previous_end), (next, next_start, _)) =
                (pair[0], pair[1]);
            let input = RestInput {
                previous_start_utc: previous_start,
                previous_end_utc: previous_end,
                next_report_utc: next_start,
                previous_end_airport: previous.destination.clone(),
                next_start_airport: next.origin.clone(),
            };
            let evaluation =
                evaluate_rest(&input, &options.clone().with_timezone(previous.base_timezone))?;
            let result = rest_evaluation_result(&evaluation);

            Ok(RestPeriodEvaluation {
                previous_duty_id: previous.duty_id.clone(),
                next_duty_id: next.duty_id.clone(),
                evaluation,
                result,
            })
        })
        .collect::<EngineResult<Vec<_>>>()?;

    let summary = summarise(
        duty_evaluations
            .iter()
            .flat_map(|duty| duty.results.iter())
            .chain(rest_periods.iter().map(|rest| &rest.result)),
    );

    debug!(
        duties = duty_evaluations.len(),
        rest_periods = rest_periods.len(),
        violations = summary.violation_count,
        status = %summary.overall_status,
        "Evaluated roster"
    );

    Ok(RosterReport {
        duties: duty_evaluations,
        rest_periods,
        summary,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigLoader;
    use crate::error::EngineError;
    use crate::models::{
        ComplianceStatus, CrewRole, DutyStatus, EvaluationMode, NextPlannedDuty, RuleSource,
    };
    use chrono::{DateTime, TimeZone, Utc};

    fn load_bundle() -> RuleBundle {
        ConfigLoader::load("./config/ftl").unwrap().bundle().clone()
    }

    fn make_utc(d: u32, h: u32, mi: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, d, h, mi, 0).unwrap()
    }

    fn make_flight(
        id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        from: &str,
        to: &str,
    ) -> DutyRecord {
        let mut duty = DutyRecord::new(DutyType::Flying, start, end);
        duty.duty_id = Some(id.to_string());
        duty.origin = Some(from.to_string());
        duty.destination = Some(to.to_string());
        duty
    }

    #[test]
    fn test_flying_duty_gets_easa_then_oma() {
        let duty = make_flight("1-1", make_utc(15, 8, 0), make_utc(15, 16, 0), "LHR", "LHR");
        let evaluation = evaluate_duty(&duty, &load_bundle()).unwrap();

        let sources: Vec<RuleSource> = evaluation.results.iter().map(|r| r.rule_source).collect();
        assert_eq!(sources, vec![RuleSource::Easa, RuleSource::Oma, RuleSource::Blr]);
        assert_eq!(evaluation.results[0].limit_i64("base_limit_minutes"), Some(780));
        assert!(evaluation.results.iter().all(|r| r.is_compliant()));
    }

    #[test]
    fn test_ground_duty_gets_oma_then_night() {
        let duty = DutyRecord::new(DutyType::Ground, make_utc(15, 9, 0), make_utc(15, 17, 0));
        let evaluation = evaluate_duty(&duty, &load_bundle()).unwrap();

        let modes: Vec<EvaluationMode> = evaluation.results.iter().map(|r| r.mode).collect();
        assert_eq!(modes, vec![EvaluationMode::Unconstrained, EvaluationMode::Night]);
    }

    #[test]
    fn test_standby_types_dispatch() {
        let bundle = load_bundle();
        let duty_types = [DutyType::StandbyHome, DutyType::StandbyAirport, DutyType::Reserve];
        let modes: Vec<EvaluationMode> = duty_types
            .into_iter()
            .map(|duty_type| {
                let duty = DutyRecord::new(duty_type, make_utc(15, 6, 0), make_utc(15, 12, 0));
                evaluate_duty(&duty, &bundle).unwrap().results[0].mode
            })
            .collect();

        assert_eq!(
            modes,
            vec![
                EvaluationMode::HomeStandby,
                EvaluationMode::AirportStandby,
                EvaluationMode::Reserve,
            ]
        );
    }

    #[test]
    fn test_invalid_duty_is_rejected() {
        let duty = DutyRecord::new(DutyType::Flying, make_utc(15, 9, 0), make_utc(15, 8, 0));
        assert!(matches!(
            evaluate_duty(&duty, &load_bundle()),
            Err(EngineError::InvalidDuty { .. })
        ));
    }

    #[test]
    fn test_evaluating_twice_is_identical() {
        let mut duty = make_flight("9-1", make_utc(15, 22, 0), make_utc(16, 11, 0), "LHR", "JFK");
        duty.crew_role = CrewRole::Cabin;
        duty.rest_facility_class = Some(1);
        duty.inflight_rest_minutes = 60;
        let bundle = load_bundle();

        assert_eq!(evaluate_duty(&duty, &bundle).unwrap(), evaluate_duty(&duty, &bundle).unwrap());
    }

    #[test]
    fn test_roster_orders_rest_periods_chronologically() {
        let duties = vec![
            make_flight("B", make_utc(16, 8, 0), make_utc(16, 16, 0), "LHR", "LHR"),
            make_flight("A", make_utc(15, 8, 0), make_utc(15, 16, 0), "LHR", "LHR"),
        ];
        let report = evaluate_roster(&duties, &load_bundle(), &EngineSettings::default()).unwrap();

        assert_eq!(report.duties[0].duty_id.as_deref(), Some("B"));
        assert_eq!(report.rest_periods.len(), 1);
        assert_eq!(report.rest_periods[0].previous_duty_id.as_deref(), Some("A"));
        assert_eq!(report.rest_periods[0].evaluation.actual_rest_minutes, 960);
        assert_eq!(report.summary.overall_status, ComplianceStatus::Ok);
        assert_eq!(report.summary.evaluated_results, 7);
    }

    #[test]
    fn test_planned_night_duty_with_early_next_duty_is_non_compliant() {
        let mut duty = make_flight("N", make_utc(15, 20, 0), make_utc(16, 4, 0), "LHR", "LHR");
        duty.next_planned_duties = vec![NextPlannedDuty {
            duty_id: Some("M".to_string()),
            start_utc: make_utc(16, 18, 0),
        }];
        let report = evaluate_roster(&[duty], &load_bundle(), &EngineSettings::default()).unwrap();

        let night = &report.duties[0].results[2];
        assert_eq!(night.violations[0].rule, "rest_after_night_forecast");
        assert_eq!(night.violations[0].shortfall_minutes, Some(16 * 60));
        assert_eq!(report.summary.overall_status, ComplianceStatus::NonCompliant);
    }

    #[test]
    fn test_block_time_duty_is_evaluated() {
        let mut duty = make_flight("BLK", make_utc(15, 8, 0), make_utc(15, 9, 0), "LHR", "LHR");
        duty.planned_end_utc = None;
        duty.planned_block_minutes = Some(14 * 60);
        let evaluation = evaluate_duty(&duty, &load_bundle()).unwrap();

        let easa = &evaluation.results[0];
        assert_eq!(easa.violations[0].rule, "fdp_exceeded");
        assert_eq!(easa.violations[0].excess_minutes, Some(60));
    }

    #[test]
    fn test_rest_uses_operated_times() {
        let mut first = make_flight("A", make_utc(15, 8, 0), make_utc(15, 16, 0), "LHR", "LHR");
        first.status = DutyStatus::Operated;
        first.actual_end_utc = Some(make_utc(15, 18, 0));
        let second = make_flight("B", make_utc(16, 8, 0), make_utc(16, 16, 0), "LHR", "LHR");

        let report =
            evaluate_roster(&[first, second], &load_bundle(), &EngineSettings::default()).unwrap();
        assert_eq!(report.rest_periods[0].evaluation.actual_rest_minutes, 840);
    }

    #[test]
    fn test_short_rest_makes_roster_non_compliant() {
        let duties = vec![
            make_flight("A", make_utc(15, 8, 0), make_utc(15, 16, 0), "LHR", "JFK"),
            make_flight("B", make_utc(16, 0, 0), make_utc(16, 8, 0), "JFK", "LHR"),
        ];
        let report = evaluate_roster(&duties, &load_bundle(), &EngineSettings::default()).unwrap();

        let rest = &report.rest_periods[0];
        assert_eq!(rest.evaluation.required_rest_minutes, 660);
        assert_eq!(rest.result.violations[0].rule, "rest_insufficient");
        assert_eq!(rest.result.violations[0].shortfall_minutes, Some(180));
        assert_eq!(report.summary.overall_status, ComplianceStatus::NonCompliant);
    }

    #[test]
    fn test_empty_roster_is_ok() {
        let report = evaluate_roster(&[], &load_bundle(), &EngineSettings::default()).unwrap();
        assert!(report.duties.is_empty());
        assert!(report.rest_periods.is_empty());
        assert_eq!(report.summary.overall_status, ComplianceStatus::Ok);
    }
}
