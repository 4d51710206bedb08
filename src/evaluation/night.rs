//! Night duty classification and the rest owed after a night duty.
//!
//! A duty is a night duty when any part of it falls inside the local window
//! 00:59–04:59 on any day it spans. A planned night duty is checked against
//! the next planned duty. An operated duty that only became a night duty
//! through disruption earns a 30 hour recovery, and every planned duty
//! starting inside it is listed for dropping.

use chrono::{DateTime, Duration, NaiveTime, Timelike, Utc};
use chrono_tz::Tz;
use serde_json::{Value, json};

use crate::error::EngineResult;
use crate::models::{
    DisruptionReason, DutyRecord, DutyStatus, EvaluationMode, EvaluationResult, InfoNote,
    RuleSource, Violation,
};

use super::time_window::{elapsed_minutes, local_to_utc, to_local};

/// Start of the night window, in minutes after local midnight (00:59).
pub const NIGHT_WINDOW_START_MINUTE: u32 = 59;

/// End of the night window, in minutes after local midnight (04:59).
pub const NIGHT_WINDOW_END_MINUTE: u32 = 4 * 60 + 59;

/// Rest owed after a night duty.
pub const NIGHT_RECOVERY_MINUTES: i64 = 30 * 60;

/// Local hour from which a report on the day a night duty ends is allowed.
pub const NEXT_DAY_EARLIEST_REPORT_HOUR: u32 = 8;

const NIGHT_CITATION: &str = "BLR 10.6.2";
const REST_AFTER_NIGHT_CITATION: &str = "BLR 10.6.6.1";
const DISRUPTION_CITATION: &str = "BLR 10.6.6.3";

fn clock(minute: u32) -> NaiveTime {
    NaiveTime::MIN + Duration::minutes(i64::from(minute))
}

/// Tests whether `[start, end)` overlaps the local night window on any day
/// it touches.
///
/// # Example
///
/// ```
/// use ftl_engine::evaluation::impinges_night_window;
/// use chrono::{TimeZone, Utc};
/// use chrono_tz::Europe::London;
///
/// let start = Utc.with_ymd_and_hms(2026, 1, 15, 20, 0, 0).unwrap();
/// let end = Utc.with_ymd_and_hms(2026, 1, 16, 1, 30, 0).unwrap();
/// assert!(impinges_night_window(start, end, London));
/// assert!(!impinges_night_window(start, start + chrono::Duration::hours(4), London));
/// ```
pub fn impinges_night_window(start: DateTime<Utc>, end: DateTime<Utc>, tz: Tz) -> bool {
    if end <= start {
        return false;
    }

    let last_day = to_local(end, tz).date_naive();
    let mut day = to_local(start, tz).date_naive();
    loop {
        let window_start = local_to_utc(day.and_time(clock(NIGHT_WINDOW_START_MINUTE)), tz);
        let window_end = local_to_utc(day.and_time(clock(NIGHT_WINDOW_END_MINUTE)), tz);
        if start.max(window_start) < end.min(window_end) {
            return true;
        }
        match day.succ_opt() {
            Some(next) if next <= last_day => day = next,
            _ => return false,
        }
    }
}

/// Classifies a duty as night or day and applies the rest rules that follow
/// a night duty.
///
/// The duty is read over [`DutyRecord::interval`]. A planned night duty
/// raises `rest_after_night_forecast` when the earliest of its
/// `next_planned_duties` starts less than 30 hours after it ends, or before
/// 08:00 local on the day it ends. An operated night duty with an
/// operational `disruption_reason` whose plan did not touch the night window
/// raises `following_disruption_drop_day_entitlement`, listing the planned
/// duties that start within 30 hours of its end.
///
/// # Errors
///
/// Returns `InvalidDuty` when the duty has no usable interval.
pub fn evaluate_night_duty(duty: &DutyRecord) -> EngineResult<EvaluationResult> {
    let (start, end) = duty.interval()?;
    let tz = duty.base_timezone;
    let night = impinges_night_window(start, end, tz);

    let mut result = EvaluationResult::new(RuleSource::Blr, EvaluationMode::Night);
    result.set_limit("status", duty.status.to_string());
    result.set_limit("start_local", to_local(start, tz).to_rfc3339());
    result.set_limit("end_local", to_local(end, tz).to_rfc3339());
    result.set_limit("duration_minutes", elapsed_minutes(start, end));
    result.set_limit("impinges_night_window", night);

    if !night {
        result.push_info(InfoNote::new(RuleSource::Blr, "Does not impinge night window"));
        return Ok(result);
    }
    result.push_info(
        InfoNote::new(RuleSource::Blr, "Classified as night duty")
            .with_fact("citation", NIGHT_CITATION),
    );

    match duty.status {
        DutyStatus::Planned => check_rest_after_night(duty, end, &mut result),
        DutyStatus::Operated => check_disruption_recovery(duty, end, &mut result),
    }
    Ok(result)
}

fn check_rest_after_night(duty: &DutyRecord, end: DateTime<Utc>, result: &mut EvaluationResult) {
    let Some(next) = duty.next_planned_duties.iter().min_by_key(|next| next.start_utc) else {
        return;
    };

    let tz = duty.base_timezone;
    let next_local = to_local(next.start_utc, tz);
    let rest = elapsed_minutes(end, next.start_utc);
    let early_same_day = next_local.date_naive() == to_local(end, tz).date_naive()
        && next_local.hour() < NEXT_DAY_EARLIEST_REPORT_HOUR;
    result.set_limit("next_duty_start_local", next_local.to_rfc3339());
    result.set_limit("rest_before_next_minutes", rest);

    if rest < NIGHT_RECOVERY_MINUTES || early_same_day {
        result.violations.push(
            Violation::shortfall(
                RuleSource::Blr,
                "rest_after_night_forecast",
                "Planned rest after night may be insufficient",
                (NIGHT_RECOVERY_MINUTES - rest).max(0),
            )
            .with_fact("citation", REST_AFTER_NIGHT_CITATION),
        );
    } else {
        result.push_info(InfoNote::new(
            RuleSource::Blr,
            "Planned rest after night duty is sufficient",
        ));
    }
}

fn check_disruption_recovery(
    duty: &DutyRecord,
    end: DateTime<Utc>,
    result: &mut EvaluationResult,
) {
    if !duty
        .disruption_reason
        .is_some_and(DisruptionReason::earns_recovery)
    {
        return;
    }

    let tz = duty.base_timezone;
    let planned_end = duty.planned_end().unwrap_or(duty.planned_start_utc);
    if impinges_night_window(duty.planned_start_utc, planned_end, tz) {
        result.push_info(InfoNote::new(
            RuleSource::Blr,
            "Planned as a night duty; no disruption entitlement",
        ));
        return;
    }

    let recovery = Duration::minutes(NIGHT_RECOVERY_MINUTES);
    let drop_list: Vec<Value> = duty
        .next_planned_duties
        .iter()
        .filter(|next| {
            let gap = next.start_utc - end;
            gap >= Duration::zero() && gap <= recovery
        })
        .map(|next| {
            json!({
                "duty_id": next.duty_id,
                "start_local": to_local(next.start_utc, tz).to_rfc3339(),
            })
        })
        .collect();
    result.set_limit("dropped_duties", drop_list.len());

    result.violations.push(
        Violation::new(
            RuleSource::Blr,
            "following_disruption_drop_day_entitlement",
            "Disruption made this a night duty; 30h rest entitlement applies",
        )
        .with_fact("min_rest_minutes", NIGHT_RECOVERY_MINUTES)
        .with_fact("drop_any_within_30h", true)
        .with_fact("drop_list", drop_list)
        .with_fact("day_following_return_becomes_dfd", true)
        .with_fact("protection_credit", "PR")
        .with_fact("citation", DISRUPTION_CITATION),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DutyType, NextPlannedDuty};
    use chrono::TimeZone;
    use chrono_tz::{Asia::Dubai, Europe::London};

    fn make_utc(d: u32, h: u32, mi: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, d, h, mi, 0).unwrap()
    }

    fn make_duty(start: DateTime<Utc>, end: DateTime<Utc>) -> DutyRecord {
        let mut duty = DutyRecord::new(DutyType::Flying, start, end);
        duty.duty_id = Some("N1".to_string());
        duty
    }

    fn make_next(id: &str, start: DateTime<Utc>) -> NextPlannedDuty {
        NextPlannedDuty {
            duty_id: Some(id.to_string()),
            start_utc: start,
        }
    }

    fn make_disrupted(planned_end: DateTime<Utc>, actual_end: DateTime<Utc>) -> DutyRecord {
        let mut duty = make_duty(make_utc(15, 18, 0), planned_end);
        duty.status = DutyStatus::Operated;
        duty.actual_end_utc = Some(actual_end);
        duty.disruption_reason = Some(DisruptionReason::Delay);
        duty
    }

    #[test]
    fn test_night_window_boundaries() {
        // Ending exactly at 00:59 touches nothing; one minute more does.
        assert!(!impinges_night_window(make_utc(15, 20, 0), make_utc(16, 0, 59), London));
        assert!(impinges_night_window(make_utc(15, 20, 0), make_utc(16, 1, 0), London));
        // Starting at 04:59 is already outside.
        assert!(!impinges_night_window(make_utc(16, 4, 59), make_utc(16, 12, 0), London));
        assert!(impinges_night_window(make_utc(16, 4, 58), make_utc(16, 12, 0), London));
    }

    #[test]
    fn test_night_window_read_in_base_timezone() {
        // 22:00-23:30 UTC is 02:00-03:30 in Dubai.
        assert!(!impinges_night_window(make_utc(15, 22, 0), make_utc(15, 23, 30), London));
        assert!(impinges_night_window(make_utc(15, 22, 0), make_utc(15, 23, 30), Dubai));
    }

    #[test]
    fn test_multi_day_duty_checks_every_day() {
        assert!(impinges_night_window(make_utc(15, 6, 0), make_utc(17, 2, 0), London));
        assert!(!impinges_night_window(make_utc(15, 6, 0), make_utc(15, 23, 0), London));
    }

    #[test]
    fn test_day_duty_gets_info_only() {
        let duty = make_duty(make_utc(15, 8, 0), make_utc(15, 16, 0));
        let result = evaluate_night_duty(&duty).unwrap();

        assert_eq!(result.rule_source, RuleSource::Blr);
        assert_eq!(result.mode, EvaluationMode::Night);
        assert_eq!(result.limits["impinges_night_window"], false);
        assert_eq!(result.limits["start_local"], "2026-01-15T08:00:00+00:00");
        assert_eq!(result.limit_i64("duration_minutes"), Some(480));
        assert_eq!(result.info[0].note, "Does not impinge night window");
        assert!(result.is_compliant());
    }

    #[test]
    fn test_night_duty_is_classified() {
        let duty = make_duty(make_utc(15, 20, 0), make_utc(16, 5, 0));
        let result = evaluate_night_duty(&duty).unwrap();

        assert_eq!(result.limits["impinges_night_window"], true);
        assert_eq!(result.info[0].facts["citation"], "BLR 10.6.2");
        assert!(result.is_compliant());
    }

    #[test]
    fn test_rest_after_night_forecast_flags_short_rest() {
        let mut duty = make_duty(make_utc(15, 20, 0), make_utc(16, 5, 0));
        duty.next_planned_duties = vec![
            make_next("LATER", make_utc(20, 8, 0)),
            make_next("NEXT", make_utc(17, 6, 0)),
        ];
        let result = evaluate_night_duty(&duty).unwrap();

        assert_eq!(result.limit_i64("rest_before_next_minutes"), Some(25 * 60));
        assert_eq!(result.limits["next_duty_start_local"], "2026-01-17T06:00:00+00:00");
        let violation = &result.violations[0];
        assert_eq!(violation.rule, "rest_after_night_forecast");
        assert_eq!(violation.shortfall_minutes, Some(300));
        assert_eq!(violation.facts["citation"], "BLR 10.6.6.1");
    }

    #[test]
    fn test_rest_after_night_forecast_passes_after_30h() {
        let mut duty = make_duty(make_utc(15, 20, 0), make_utc(16, 5, 0));
        duty.next_planned_duties = vec![make_next("NEXT", make_utc(17, 11, 0))];
        let result = evaluate_night_duty(&duty).unwrap();

        assert!(result.is_compliant());
        assert_eq!(result.info[1].note, "Planned rest after night duty is sufficient");
    }

    #[test]
    fn test_no_next_duties_means_no_forecast() {
        let duty = make_duty(make_utc(15, 20, 0), make_utc(16, 5, 0));
        let result = evaluate_night_duty(&duty).unwrap();

        assert!(result.is_compliant());
        assert!(!result.limits.contains_key("next_duty_start_local"));
    }

    #[test]
    fn test_disruption_into_night_lists_duties_to_drop() {
        // Planned 18:00-23:00, delayed to 02:30.
        let mut duty = make_disrupted(make_utc(15, 23, 0), make_utc(16, 2, 30));
        duty.next_planned_duties = vec![
            make_next("D2", make_utc(16, 14, 0)),
            make_next("D3", make_utc(17, 8, 30)),
            make_next("D4", make_utc(17, 9, 0)),
        ];
        let result = evaluate_night_duty(&duty).unwrap();

        assert_eq!(result.limit_i64("duration_minutes"), Some(510));
        assert_eq!(result.limit_i64("dropped_duties"), Some(2));
        let violation = &result.violations[0];
        assert_eq!(violation.rule, "following_disruption_drop_day_entitlement");
        assert_eq!(violation.facts["min_rest_minutes"], 1800);
        assert_eq!(violation.facts["protection_credit"], "PR");
        let dropped: Vec<&str> = violation.facts["drop_list"]
            .as_array()
            .unwrap()
            .iter()
            .map(|d| d["duty_id"].as_str().unwrap())
            .collect();
        assert_eq!(dropped, vec!["D2", "D3"]);
    }

    #[test]
    fn test_planned_night_duty_earns_no_disruption_entitlement() {
        let duty = make_disrupted(make_utc(16, 2, 0), make_utc(16, 3, 30));
        let result = evaluate_night_duty(&duty).unwrap();

        assert!(result.is_compliant());
        assert_eq!(result.info[1].note, "Planned as a night duty; no disruption entitlement");
    }

    #[test]
    fn test_non_operational_change_earns_no_entitlement() {
        let mut duty = make_disrupted(make_utc(15, 23, 0), make_utc(16, 2, 30));
        duty.disruption_reason = Some(DisruptionReason::Other);
        assert!(evaluate_night_duty(&duty).unwrap().is_compliant());

        duty.disruption_reason = None;
        assert!(evaluate_night_duty(&duty).unwrap().is_compliant());
    }

    #[test]
    fn test_operated_duty_classified_on_actual_times() {
        // Planned entirely by day, operated from 00:30.
        let mut duty = make_duty(make_utc(15, 8, 0), make_utc(15, 16, 0));
        duty.status = DutyStatus::Operated;
        duty.actual_start_utc = Some(make_utc(15, 0, 30));
        duty.actual_end_utc = Some(make_utc(15, 9, 0));
        let result = evaluate_night_duty(&duty).unwrap();

        assert_eq!(result.limits["impinges_night_window"], true);
        assert_eq!(result.limits["status"], "operated");
    }

    #[test]
    fn test_block_time_sets_planned_end() {
        let mut duty = make_duty(make_utc(15, 20, 0), make_utc(15, 21, 0));
        duty.planned_end_utc = None;
        duty.planned_block_minutes = Some(360);
        let result = evaluate_night_duty(&duty).unwrap();

        assert_eq!(result.limits["end_local"], "2026-01-16T02:00:00+00:00");
        assert_eq!(result.limits["impinges_night_window"], true);
    }
}
