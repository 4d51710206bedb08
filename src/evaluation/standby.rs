//! Standby and reserve evaluation.
//!
//! These checks do not use the FDP table. Home and airport standby share a
//! 16 hour ceiling; reserve days are recorded without a constraint.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;

use crate::models::{EvaluationMode, EvaluationResult, InfoNote, RuleSource, Violation};

use super::time_window::{elapsed_minutes, minutes_outside_local_band};

/// Ceiling for home standby, and for airport standby plus the resulting FDP.
pub const STANDBY_CEILING_MINUTES: i64 = 16 * 60;

/// Local clock minute the night band starts (23:00).
pub const STANDBY_NIGHT_START_MINUTE: u32 = 23 * 60;

/// Local clock minute the night band ends, exclusive (07:00).
pub const STANDBY_NIGHT_END_MINUTE: u32 = 7 * 60;

/// Daytime standby before a call that does not reduce the following FDP.
pub const DAYTIME_STANDBY_ALLOWANCE_MINUTES: i64 = 6 * 60;

/// Minutes of home standby before the call-out that fall outside the local
/// night band 23:00-06:59.
///
/// Only the part of the standby before `call_out_utc` counts, and never
/// beyond the standby end.
pub fn counted_daytime_minutes(
    start_utc: DateTime<Utc>,
    end_utc: DateTime<Utc>,
    call_out_utc: DateTime<Utc>,
    tz: Tz,
) -> i64 {
    minutes_outside_local_band(
        start_utc,
        call_out_utc.min(end_utc),
        tz,
        STANDBY_NIGHT_START_MINUTE,
        STANDBY_NIGHT_END_MINUTE,
    )
}

/// Evaluates a home standby.
///
/// # Arguments
///
/// * `start_utc` / `end_utc` - The standby span
/// * `call_out_utc` - When the crew member was contacted, if at all
/// * `report_utc` - Report instant of the resulting duty, if any
/// * `tz` - Crew base timezone for the night band
///
/// # Returns
///
/// An [`EvaluationResult`] with `standby_minutes`, plus
/// `fdp_reduction_minutes` when both the call-out and report are known.
/// A standby longer than 16 hours is a `home_standby_exceeds_16h` violation.
///
/// # Example
///
/// ```
/// use ftl_engine::evaluation::evaluate_home_standby;
/// use chrono::{TimeZone, Utc};
///
/// let start = Utc.with_ymd_and_hms(2026, 1, 15, 6, 0, 0).unwrap();
/// let end = Utc.with_ymd_and_hms(2026, 1, 15, 23, 0, 0).unwrap();
/// let result = evaluate_home_standby(start, end, None, None, chrono_tz::Europe::London);
///
/// assert_eq!(result.violations[0].excess_minutes, Some(60));
/// assert!(result.limit_i64("fdp_reduction_minutes").is_none());
/// ```
pub fn evaluate_home_standby(
    start_utc: DateTime<Utc>,
    end_utc: DateTime<Utc>,
    call_out_utc: Option<DateTime<Utc>>,
    report_utc: Option<DateTime<Utc>>,
    tz: Tz,
) -> EvaluationResult {
    let mut result = EvaluationResult::new(RuleSource::Oma, EvaluationMode::HomeStandby);
    let total = elapsed_minutes(start_utc, end_utc);

    if total > STANDBY_CEILING_MINUTES {
        result.violations.push(Violation::excess(
            RuleSource::Oma,
            "home_standby_exceeds_16h",
            "Home Standby exceeds 16 hours",
            total - STANDBY_CEILING_MINUTES,
        ));
    }

    match (call_out_utc, report_utc) {
        (Some(call_out), Some(_)) => {
            let counted = counted_daytime_minutes(start_utc, end_utc, call_out, tz);
            let reduction = (counted - DAYTIME_STANDBY_ALLOWANCE_MINUTES).max(0);
            result.set_limit("fdp_reduction_minutes", reduction);
            result.push_info(
                InfoNote::new(RuleSource::Oma, "FDP reduction due to late call from Home Standby")
                    .with_fact("reduction_minutes", reduction),
            );
        }
        _ => result.push_info(InfoNote::new(
            RuleSource::Oma,
            "No call to duty during Home Standby",
        )),
    }

    result.set_limit("standby_minutes", total);
    result
}

/// Evaluates an airport standby.
///
/// With an assigned report the standby and the duty span from the assigned
/// report to the later of the standby end and the assigned report are
/// combined and held to the 16 hour ceiling.
pub fn evaluate_airport_standby(
    start_utc: DateTime<Utc>,
    end_utc: DateTime<Utc>,
    assigned_report_utc: Option<DateTime<Utc>>,
) -> EvaluationResult {
    let mut result = EvaluationResult::new(RuleSource::Oma, EvaluationMode::AirportStandby);
    let standby = elapsed_minutes(start_utc, end_utc);
    result.set_limit("standby_minutes", standby);

    let Some(assigned) = assigned_report_utc else {
        result.push_info(InfoNote::new(RuleSource::Oma, "No assignment from Airport Standby"));
        return result;
    };

    let combined = standby + elapsed_minutes(assigned, end_utc.max(assigned));
    result.set_limit("combined_ceiling_minutes", STANDBY_CEILING_MINUTES);
    result.set_limit("combined_minutes", combined);

    if combined > STANDBY_CEILING_MINUTES {
        result.violations.push(Violation::excess(
            RuleSource::Oma,
            "airport_standby_plus_fdp_gt_16h",
            "Airport Standby + FDP exceeds 16h",
            combined - STANDBY_CEILING_MINUTES,
        ));
    } else {
        result.push_info(
            InfoNote::new(RuleSource::Oma, "Airport Standby + FDP within 16h ceiling")
                .with_fact("combined_minutes", combined),
        );
    }
    result
}

/// Records a reserve day. Always compliant.
pub fn evaluate_reserve_day(start_utc: DateTime<Utc>, end_utc: DateTime<Utc>) -> EvaluationResult {
    let mut result = EvaluationResult::new(RuleSource::Oma, EvaluationMode::Reserve);
    result.set_limit("reserve_span_minutes", elapsed_minutes(start_utc, end_utc));
    result.push_info(InfoNote::new(RuleSource::Oma, "Reserve day recorded"));
    result
}
