//! EASA flight duty period limit evaluation.
//!
//! The limit is read from an ordered band table keyed by the local report
//! time and the number of sectors, then corrected for the sector count and
//! penalised when the report falls inside a WOCL window.

use chrono::{DateTime, NaiveTime};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::config::EasaRules;
use crate::error::EngineResult;
use crate::models::{DutyRecord, EvaluationMode, EvaluationResult, InfoNote, RuleSource, Violation};

use super::time_window::{elapsed_minutes, to_local};

/// Looks up the base FDP limit for a local report time and sector count.
///
/// The first band containing `report_local` wins. Within it the exact
/// sector entry is used, or the entry for the highest configured sector
/// count when there is none. With no matching band, or a band with no
/// entries at all, the bundle's `default_limit_minutes` applies.
///
/// # Example
///
/// ```
/// use ftl_engine::config::{EasaRules, FdpRow};
/// use ftl_engine::evaluation::easa_base_limit_minutes;
/// use chrono::NaiveTime;
/// use std::collections::BTreeMap;
///
/// let rules = EasaRules {
///     fdp_rows: vec![FdpRow {
///         start_local: NaiveTime::from_hms_opt(6, 0, 0).unwrap(),
///         end_local: NaiveTime::from_hms_opt(14, 0, 0).unwrap(),
///         limits: BTreeMap::from([(1, 780), (2, 750), (4, 690)]),
///     }],
///     ..EasaRules::default()
/// };
///
/// let nine_am = NaiveTime::from_hms_opt(9, 0, 0).unwrap();
/// assert_eq!(easa_base_limit_minutes(nine_am, 2, &rules), 750);
/// assert_eq!(easa_base_limit_minutes(nine_am, 10, &rules), 690);
///
/// let night = NaiveTime::from_hms_opt(23, 0, 0).unwrap();
/// assert_eq!(easa_base_limit_minutes(night, 1, &rules), 660);
/// ```
pub fn easa_base_limit_minutes(report_local: NaiveTime, sectors: u32, rules: &EasaRules) -> i64 {
    rules
        .fdp_rows
        .iter()
        .find(|row| row.contains(report_local))
        .and_then(|row| {
            row.limits
                .get(&sectors)
                .or_else(|| row.limits.last_key_value().map(|(_, limit)| limit))
        })
        .copied()
        .unwrap_or(rules.default_limit_minutes)
}

/// Signed correction for the sector count; 0 when not configured.
pub fn easa_sector_correction(sectors: u32, rules: &EasaRules) -> i64 {
    rules.sector_corrections.get(&sectors).copied().unwrap_or(0)
}

/// Penalty from the first WOCL window containing the report time; 0 when none does.
pub fn easa_wocl_penalty(report_local: NaiveTime, rules: &EasaRules) -> i64 {
    rules
        .wocl
        .iter()
        .find(|window| window.contains(report_local))
        .map_or(0, |window| window.penalty_min)
}

/// The pieces an EASA legal limit is built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FdpLimitBreakdown {
    /// Band/sector table value.
    pub base_limit_minutes: i64,
    /// Sector correction added.
    pub sector_correction_minutes: i64,
    /// WOCL penalty subtracted.
    pub wocl_penalty_minutes: i64,
    /// `max(0, base + correction - penalty)`.
    pub legal_limit_minutes: i64,
}

impl FdpLimitBreakdown {
    /// Computes the breakdown for a local report time and sector count.
    pub fn compute(report_local: NaiveTime, sectors: u32, rules: &EasaRules) -> Self {
        let base_limit_minutes = easa_base_limit_minutes(report_local, sectors, rules);
        let sector_correction_minutes = easa_sector_correction(sectors, rules);
        let wocl_penalty_minutes = easa_wocl_penalty(report_local, rules);

        Self {
            base_limit_minutes,
            sector_correction_minutes,
            wocl_penalty_minutes,
            legal_limit_minutes: (base_limit_minutes + sector_correction_minutes
                - wocl_penalty_minutes)
                .max(0),
        }
    }
}

/// Checks an FDP against the EASA limit.
///
/// # Arguments
///
/// * `report_local` - Report instant in the crew base timezone
/// * `actual_minutes` - Length of the FDP
/// * `sectors` - Number of sectors flown
/// * `rules` - The EASA bundle
///
/// # Returns
///
/// An [`EvaluationResult`] with limits `base_limit_minutes`,
/// `sector_correction_minutes`, `wocl_penalty_minutes`,
/// `legal_limit_minutes`, `actual_minutes` and `flex_minutes`. A negative
/// flex is reported as an `fdp_exceeded` violation.
pub fn evaluate_easa(
    report_local: DateTime<Tz>,
    actual_minutes: i64,
    sectors: u32,
    rules: &EasaRules,
) -> EvaluationResult {
    let breakdown = FdpLimitBreakdown::compute(report_local.time(), sectors, rules);
    let flex = breakdown.legal_limit_minutes - actual_minutes;

    let mut result = EvaluationResult::new(RuleSource::Easa, EvaluationMode::Fdp);
    result.set_limit("base_limit_minutes", breakdown.base_limit_minutes);
    result.set_limit("sector_correction_minutes", breakdown.sector_correction_minutes);
    result.set_limit("wocl_penalty_minutes", breakdown.wocl_penalty_minutes);
    result.set_limit("legal_limit_minutes", breakdown.legal_limit_minutes);
    result.set_limit("actual_minutes", actual_minutes);
    result.set_limit("flex_minutes", flex);

    if flex < 0 {
        result.violations.push(Violation::excess(
            RuleSource::Easa,
            "fdp_exceeded",
            "FDP exceeded",
            -flex,
        ));
    } else {
        result.push_info(
            InfoNote::new(RuleSource::Easa, "Within FDP").with_fact("flex_minutes", flex),
        );
    }

    result
}

/// Checks a duty record against the EASA limit, reading the report time in
/// the duty's base timezone.
///
/// # Errors
///
/// Returns `InvalidDuty` when the duty has no usable interval.
pub fn evaluate_easa_duty(duty: &DutyRecord, rules: &EasaRules) -> EngineResult<EvaluationResult> {
    let (start, end) = duty.interval()?;
    Ok(evaluate_easa(
        to_local(start, duty.base_timezone),
        elapsed_minutes(start, end),
        duty.sectors,
        rules,
    ))
}
