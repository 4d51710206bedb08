//! Operator (OMA) duty evaluation.
//!
//! The operator rules branch on the crew role: cabin crew are checked
//! against the in-flight rest table, augmented flight crews against the
//! augmentation caps, and everyone else is reported without a constraint.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::{AugmentationCaps, CabinRestRow, OmaRules};
use crate::models::{
    CrewRole, DutyRecord, EvaluationMode, EvaluationResult, InfoNote, RuleSource, Violation,
};

use super::time_window::elapsed_minutes;

/// The duty facts the operator rules need.
///
/// Report and end are optional so a caller holding partial data gets an
/// `inputs_missing` violation rather than an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OmaInput {
    /// Flight or cabin crew.
    pub crew_role: CrewRole,
    /// Report instant.
    pub report_utc: Option<DateTime<Utc>>,
    /// End of duty.
    pub end_utc: Option<DateTime<Utc>>,
    /// Sectors flown.
    pub sectors: u32,
    /// In-flight rest facility class.
    pub rest_facility_class: Option<u8>,
    /// Additional pilots carried.
    pub augmented_pilots: Option<u8>,
    /// Whether a sector exceeds nine hours.
    pub long_sector_over_9h: bool,
    /// In-flight rest provided.
    pub inflight_rest_minutes: i64,
}

impl From<&DutyRecord> for OmaInput {
    fn from(duty: &DutyRecord) -> Self {
        let interval = duty.interval().ok();
        Self {
            crew_role: duty.crew_role,
            report_utc: interval.map(|(start, _)| start),
            end_utc: interval.map(|(_, end)| end),
            sectors: duty.sectors,
            rest_facility_class: duty.rest_facility_class,
            augmented_pilots: duty.augmented_pilots,
            long_sector_over_9h: duty.long_sector_over_9h,
            inflight_rest_minutes: duty.inflight_rest_minutes,
        }
    }
}

/// Sector profile used to pick an augmentation cap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AugmentationProfile {
    /// Up to three sectors.
    #[serde(rename = "upto3")]
    UpTo3,
    /// Two sectors or fewer, one of them longer than nine hours.
    #[serde(rename = "two_or_less_one_over_9h")]
    TwoOrLessOneOver9h,
}

impl AugmentationProfile {
    /// Key of this profile in the caps table.
    pub fn key(self) -> &'static str {
        match self {
            AugmentationProfile::UpTo3 => "upto3",
            AugmentationProfile::TwoOrLessOneOver9h => "two_or_less_one_over_9h",
        }
    }
}

/// Picks the augmentation profile.
///
/// The long-sector profile applies to two sectors or fewer with the
/// long-sector flag set, provided `configured` has an entry for it;
/// otherwise `upto3` is used.
pub fn select_augmentation_profile(
    sectors: u32,
    long_sector_over_9h: bool,
    configured: &BTreeMap<String, Decimal>,
) -> AugmentationProfile {
    let long_profile = AugmentationProfile::TwoOrLessOneOver9h;
    if sectors <= 2 && long_sector_over_9h && configured.contains_key(long_profile.key()) {
        long_profile
    } else {
        AugmentationProfile::UpTo3
    }
}

/// Looks up an augmented FDP cap in minutes.
///
/// Returns 0 when the rest class, pilot count or profile has no entry.
/// Hours are converted to minutes and truncated.
pub fn augmented_cap_minutes(
    caps: &AugmentationCaps,
    rest_class: u8,
    augmented_pilots: u8,
    sectors: u32,
    long_sector_over_9h: bool,
) -> i64 {
    caps.get(&rest_class)
        .and_then(|by_pilots| by_pilots.get(&augmented_pilots))
        .and_then(|profiles| {
            let profile = select_augmentation_profile(sectors, long_sector_over_9h, profiles);
            profiles.get(profile.key())
        })
        .and_then(|hours| (*hours * Decimal::from(60)).trunc().to_i64())
        .unwrap_or(0)
}

fn find_cabin_row(
    rows: &[CabinRestRow],
    rest_class: u8,
    fdp_hours: Decimal,
) -> Option<&CabinRestRow> {
    rows.iter().find(|row| {
        row.classes.contains(&rest_class)
            && row.min_fdp_h <= fdp_hours
            && fdp_hours <= row.max_fdp_h
    })
}

fn is_augmented(input: &OmaInput) -> bool {
    input.augmented_pilots.unwrap_or(0) > 0 && matches!(input.rest_facility_class, Some(1 | 2))
}

fn evaluate_cabin(
    input: &OmaInput,
    actual_minutes: i64,
    rules: &OmaRules,
    result: &mut EvaluationResult,
) {
    let rest_class = input.rest_facility_class.unwrap_or(0);
    let fdp_hours = Decimal::from(actual_minutes) / Decimal::from(60);
    let row = find_cabin_row(&rules.cabin_crew.min_rest_by_extended_fdp, rest_class, fdp_hours);
    let required = row.and_then(|r| r.min_rest_minutes);

    result.set_limit(
        "extended_fdp_hours",
        fdp_hours.round_dp(2).to_f64().map_or(Value::Null, Value::from),
    );
    result.set_limit("required_inflight_rest_minutes", required);
    result.set_limit("provided_inflight_rest_minutes", input.inflight_rest_minutes);

    match (row, required) {
        (Some(_), None) => result.violations.push(Violation::new(
            RuleSource::Oma,
            "rest_class_not_allowed",
            "Rest class not permitted for this FDP length",
        )),
        (_, Some(required)) if input.inflight_rest_minutes < required => {
            result.violations.push(Violation::shortfall(
                RuleSource::Oma,
                "insufficient_inflight_rest",
                "Minimum in-flight rest not met",
                required - input.inflight_rest_minutes,
            ))
        }
        _ => result.push_info(InfoNote::new(
            RuleSource::Oma,
            "Cabin in-flight rest requirement satisfied",
        )),
    }
}

fn evaluate_augmented(
    input: &OmaInput,
    actual_minutes: i64,
    rules: &OmaRules,
    result: &mut EvaluationResult,
) {
    let cap = augmented_cap_minutes(
        &rules.augmentation_caps,
        input.rest_facility_class.unwrap_or(0),
        input.augmented_pilots.unwrap_or(0),
        input.sectors,
        input.long_sector_over_9h,
    );
    let flex = cap - actual_minutes;

    result.set_limit("augmented_cap_minutes", cap);
    result.set_limit("actual_minutes", actual_minutes);
    result.set_limit("flex_minutes", flex);

    if flex < 0 {
        result.violations.push(Violation::excess(
            RuleSource::Oma,
            "augmented_cap_exceeded",
            "Augmented FDP cap exceeded",
            -flex,
        ));
    } else {
        result.push_info(
            InfoNote::new(RuleSource::Oma, "Within augmented FDP cap")
                .with_fact("flex_minutes", flex),
        );
    }
}

/// Checks a duty against the operator rules.
///
/// # Arguments
///
/// * `input` - Duty timing, sectors and crew data
/// * `rules` - The OMA bundle
///
/// # Returns
///
/// An [`EvaluationResult`] whose mode records the branch taken:
/// - `cabin`: FDP hours looked up in the in-flight rest table
/// - `augmented`: FDP compared with the augmentation cap
/// - `unconstrained`: actual minutes only
///
/// A missing report or end instant yields a single `inputs_missing`
/// violation and nothing else.
///
/// # Example
///
/// ```
/// use ftl_engine::config::OmaRules;
/// use ftl_engine::evaluation::{evaluate_oma, OmaInput};
/// use ftl_engine::models::{CrewRole, EvaluationMode};
///
/// let input = OmaInput {
///     crew_role: CrewRole::Flight,
///     report_utc: None,
///     end_utc: None,
///     sectors: 1,
///     rest_facility_class: None,
///     augmented_pilots: None,
///     long_sector_over_9h: false,
///     inflight_rest_minutes: 0,
/// };
/// let result = evaluate_oma(&input, &OmaRules::default());
/// assert_eq!(result.violations[0].rule, "inputs_missing");
/// ```
pub fn evaluate_oma(input: &OmaInput, rules: &OmaRules) -> EvaluationResult {
    let mode = if input.crew_role == CrewRole::Cabin {
        EvaluationMode::Cabin
    } else if is_augmented(input) {
        EvaluationMode::Augmented
    } else {
        EvaluationMode::Unconstrained
    };
    let mut result = EvaluationResult::new(RuleSource::Oma, mode);

    let (Some(report), Some(end)) = (input.report_utc, input.end_utc) else {
        result.violations.push(Violation::new(
            RuleSource::Oma,
            "inputs_missing",
            "Report and end times required",
        ));
        return result;
    };
    let actual_minutes = elapsed_minutes(report, end);

    match mode {
        EvaluationMode::Cabin => evaluate_cabin(input, actual_minutes, rules, &mut result),
        EvaluationMode::Augmented => evaluate_augmented(input, actual_minutes, rules, &mut result),
        _ => {
            result.set_limit("actual_minutes", actual_minutes);
            result.push_info(InfoNote::new(
                RuleSource::Oma,
                "No augmented/cabin constraints applied",
            ));
        }
    }

    result
}

/// Checks a duty record against the operator rules.
pub fn evaluate_oma_duty(duty: &DutyRecord, rules: &OmaRules) -> EvaluationResult {
    evaluate_oma(&OmaInput::from(duty), rules)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CabinCrewRules;
    use crate::models::{DutyStatus, DutyType};
    use chrono::{Duration, TimeZone};
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn make_rules() -> OmaRules {
        let row = |classes: &[u8], min: &str, max: &str, rest: Option<i64>| CabinRestRow {
            classes: classes.to_vec(),
            min_fdp_h: dec(min),
            max_fdp_h: dec(max),
            min_rest_minutes: rest,
        };

        let caps: AugmentationCaps = BTreeMap::from([
            (
                1,
                BTreeMap::from([
                    (
                        2,
                        BTreeMap::from([
                            ("upto3".to_string(), dec("17")),
                            ("two_or_less_one_over_9h".to_string(), dec("18")),
                        ]),
                    ),
                    (1, BTreeMap::from([("upto3".to_string(), dec("15.5"))])),
                ]),
            ),
            (2, BTreeMap::from([(1, BTreeMap::from([("upto3".to_string(), dec("15"))]))])),
        ]);

        OmaRules {
            cabin_crew: CabinCrewRules {
                min_rest_by_extended_fdp: vec![
                    row(&[1, 2, 3], "0", "14.5", Some(90)),
                    row(&[1, 2], "14.5", "16", Some(120)),
                    row(&[3], "14.5", "16", None),
                ],
            },
            augmentation_caps: caps,
        }
    }

    fn make_input(role: CrewRole, fdp_minutes: i64) -> OmaInput {
        let report = Utc.with_ymd_and_hms(2026, 1, 15, 20, 0, 0).unwrap();
        OmaInput {
            crew_role: role,
            report_utc: Some(report),
            end_utc: Some(report + Duration::minutes(fdp_minutes)),
            sectors: 1,
            rest_facility_class: None,
            augmented_pilots: None,
            long_sector_over_9h: false,
            inflight_rest_minutes: 0,
        }
    }

    #[test]
    fn test_long_sector_profile_preferred_when_configured() {
        let caps = make_rules().augmentation_caps;
        assert_eq!(augmented_cap_minutes(&caps, 1, 2, 2, true), 18 * 60);
        assert_eq!(augmented_cap_minutes(&caps, 1, 2, 3, true), 17 * 60);
        assert_eq!(augmented_cap_minutes(&caps, 1, 2, 2, false), 17 * 60);
    }

    #[test]
    fn test_long_sector_profile_falls_back_to_upto3() {
        let caps = make_rules().augmentation_caps;
        assert_eq!(augmented_cap_minutes(&caps, 1, 1, 1, true), 930);
    }

    #[test]
    fn test_missing_cap_entry_is_zero() {
        let caps = make_rules().augmentation_caps;
        assert_eq!(augmented_cap_minutes(&caps, 3, 1, 1, false), 0);
        assert_eq!(augmented_cap_minutes(&caps, 2, 2, 1, false), 0);
    }

    #[test]
    fn test_select_profile_requires_both_conditions() {
        let configured = BTreeMap::from([
            ("upto3".to_string(), dec("16")),
            ("two_or_less_one_over_9h".to_string(), dec("17")),
        ]);
        assert_eq!(
            select_augmentation_profile(2, true, &configured),
            AugmentationProfile::TwoOrLessOneOver9h
        );
        assert_eq!(select_augmentation_profile(3, true, &configured), AugmentationProfile::UpTo3);
        assert_eq!(select_augmentation_profile(1, false, &configured), AugmentationProfile::UpTo3);
    }

    #[test]
    fn test_missing_times_short_circuit() {
        let mut input = make_input(CrewRole::Cabin, 600);
        input.end_utc = None;
        let result = evaluate_oma(&input, &make_rules());

        assert_eq!(result.violations.len(), 1);
        assert_eq!(result.violations[0].rule, "inputs_missing");
        assert!(result.limits.is_empty());
        assert!(result.info.is_empty());
    }

    #[test]
    fn test_cabin_rest_satisfied() {
        let mut input = make_input(CrewRole::Cabin, 600);
        input.rest_facility_class = Some(2);
        input.inflight_rest_minutes = 90;
        let result = evaluate_oma(&input, &make_rules());

        assert_eq!(result.mode, EvaluationMode::Cabin);
        assert!(result.is_compliant());
        assert_eq!(result.limits["extended_fdp_hours"], 10.0);
        assert_eq!(result.limit_i64("required_inflight_rest_minutes"), Some(90));
    }

    #[test]
    fn test_cabin_rest_shortfall() {
        let mut input = make_input(CrewRole::Cabin, 15 * 60);
        input.rest_facility_class = Some(1);
        input.inflight_rest_minutes = 100;
        let result = evaluate_oma(&input, &make_rules());

        assert_eq!(result.violations[0].rule, "insufficient_inflight_rest");
        assert_eq!(result.violations[0].shortfall_minutes, Some(20));
    }

    #[test]
    fn test_cabin_rest_class_not_allowed() {
        let mut input = make_input(CrewRole::Cabin, 15 * 60);
        input.rest_facility_class = Some(3);
        input.inflight_rest_minutes = 300;
        let result = evaluate_oma(&input, &make_rules());

        assert_eq!(result.violations[0].rule, "rest_class_not_allowed");
        assert_eq!(result.limits["required_inflight_rest_minutes"], Value::Null);
    }

    #[test]
    fn test_cabin_without_rest_class_uses_class_zero() {
        let input = make_input(CrewRole::Cabin, 600);
        let result = evaluate_oma(&input, &make_rules());

        assert!(result.is_compliant());
        assert_eq!(result.limits["required_inflight_rest_minutes"], Value::Null);
    }

    #[test]
    fn test_cabin_hours_rounded_to_two_places() {
        let mut input = make_input(CrewRole::Cabin, 601);
        input.rest_facility_class = Some(1);
        input.inflight_rest_minutes = 90;
        let result = evaluate_oma(&input, &make_rules());
        let hours = result.limits["extended_fdp_hours"].as_f64().unwrap();
        assert!((hours - 10.02).abs() < 1e-9);
    }

    #[test]
    fn test_augmented_cap_exceeded() {
        let mut input = make_input(CrewRole::Flight, 18 * 60 + 30);
        input.rest_facility_class = Some(1);
        input.augmented_pilots = Some(2);
        input.sectors = 2;
        input.long_sector_over_9h = true;
        let result = evaluate_oma(&input, &make_rules());

        assert_eq!(result.mode, EvaluationMode::Augmented);
        assert_eq!(result.limit_i64("augmented_cap_minutes"), Some(1080));
        assert_eq!(result.violations[0].rule, "augmented_cap_exceeded");
        assert_eq!(result.violations[0].excess_minutes, Some(30));
    }

    #[test]
    fn test_class_three_is_not_augmented() {
        let mut input = make_input(CrewRole::Flight, 600);
        input.rest_facility_class = Some(3);
        input.augmented_pilots = Some(1);
        let result = evaluate_oma(&input, &make_rules());

        assert_eq!(result.mode, EvaluationMode::Unconstrained);
        assert_eq!(result.limit_i64("actual_minutes"), Some(600));
        assert_eq!(result.info[0].note, "No augmented/cabin constraints applied");
    }

    #[test]
    fn test_evaluate_twice_is_identical() {
        let mut input = make_input(CrewRole::Flight, 16 * 60);
        input.rest_facility_class = Some(1);
        input.augmented_pilots = Some(2);
        let rules = make_rules();
        assert_eq!(evaluate_oma(&input, &rules), evaluate_oma(&input, &rules));
    }

    #[test]
    fn test_duty_input_uses_operated_times() {
        let start = Utc.with_ymd_and_hms(2026, 1, 15, 7, 0, 0).unwrap();
        let mut duty = DutyRecord::new(DutyType::Flying, start, start + Duration::hours(8));
        duty.status = DutyStatus::Operated;
        duty.actual_end_utc = Some(start + Duration::hours(9));

        let input = OmaInput::from(&duty);
        assert_eq!(input.report_utc, Some(start));
        assert_eq!(input.end_utc, Some(start + Duration::hours(9)));
    }

    #[test]
    fn test_duty_without_end_or_block_reports_missing_inputs() {
        let start = Utc.with_ymd_and_hms(2026, 1, 15, 7, 0, 0).unwrap();
        let mut duty = DutyRecord::new(DutyType::Ground, start, start + Duration::hours(8));
        duty.planned_end_utc = None;

        let result = evaluate_oma_duty(&duty, &make_rules());
        assert_eq!(result.violations[0].rule, "inputs_missing");
    }
}
