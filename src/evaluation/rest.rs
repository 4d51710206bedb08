//! Rest period evaluation.
//!
//! Computes the rest required after a completed duty, adjusts it for the
//! window of circadian low and for travel when resting away from base,
//! and compares it with the rest actually scheduled before the next report.

use std::collections::BTreeSet;

use chrono::{DateTime, Duration, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::config::EngineSettings;
use crate::error::{EngineError, EngineResult};
use crate::models::{
    AdjustmentKind, ColorCode, EvaluationMode, EvaluationResult, InfoNote, RestAdjustment,
    RestEvaluation, RestPolicy, RestStatus, RuleSource, Violation,
};

use super::time_window::{elapsed_minutes, format_hm, overlaps_wocl, to_local};

/// Shortfalls up to this many minutes are At-Risk rather than Non-Compliant.
pub const AT_RISK_TOLERANCE_MINUTES: i64 = 30;

/// Travel time added when the rest is taken away from base.
pub const TRAVEL_ADJUSTMENT_MINUTES: i64 = 60;

/// The two duties a rest period sits between.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestInput {
    /// Start of the previous duty.
    pub previous_start_utc: DateTime<Utc>,
    /// End of the previous duty; the rest starts here.
    pub previous_end_utc: DateTime<Utc>,
    /// Report instant of the next duty; the rest ends here.
    pub next_report_utc: DateTime<Utc>,
    /// Airport where the previous duty ended.
    #[serde(default)]
    pub previous_end_airport: Option<String>,
    /// Airport where the next duty starts.
    #[serde(default)]
    pub next_start_airport: Option<String>,
}

/// Settings that shape a rest evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestOptions {
    /// Airports counted as home base.
    pub base_airports: BTreeSet<String>,
    /// Timezone used to place the previous duty against the WOCL.
    pub base_timezone: Tz,
    /// Add the WOCL bonus.
    pub apply_wocl: bool,
    /// Add travel time when away.
    pub apply_travel: bool,
    /// Use operator policies instead of the EASA baseline.
    pub prefer_operator_policy: bool,
}

impl RestOptions {
    /// Builds options from the loaded engine settings.
    pub fn from_settings(settings: &EngineSettings) -> Self {
        Self {
            base_airports: settings.base_airports.clone(),
            base_timezone: settings.base_timezone,
            apply_wocl: settings.rest.apply_wocl,
            apply_travel: settings.rest.apply_travel,
            prefer_operator_policy: settings.rest.prefer_operator_policy,
        }
    }

    /// Returns a copy that evaluates in a different timezone.
    pub fn with_timezone(mut self, tz: Tz) -> Self {
        self.base_timezone = tz;
        self
    }
}

impl Default for RestOptions {
    fn default() -> Self {
        Self::from_settings(&EngineSettings::default())
    }
}

fn airport_code(raw: Option<&str>) -> Option<String> {
    raw.map(str::trim)
        .filter(|code| !code.is_empty())
        .map(str::to_uppercase)
}

/// Chooses the rest policy for a rest period.
///
/// Both airports at base, or neither known, means the rest is taken at home
/// (`OMA_HOME`); anything else is `OMA_AWAY`. When operator policies are
/// switched off the EASA baseline applies regardless of airports.
///
/// # Example
///
/// ```
/// use ftl_engine::evaluation::select_policy;
/// use ftl_engine::models::RestPolicy;
/// use std::collections::BTreeSet;
///
/// let base: BTreeSet<String> = ["LHR".to_string()].into_iter().collect();
/// assert_eq!(select_policy(Some("lhr"), Some("LHR"), &base, true), RestPolicy::OmaHome);
/// assert_eq!(select_policy(Some("LHR"), Some("JFK"), &base, true), RestPolicy::OmaAway);
/// assert_eq!(select_policy(None, None, &base, true), RestPolicy::OmaHome);
/// assert_eq!(select_policy(Some("JFK"), None, &base, false), RestPolicy::Easa);
/// ```
pub fn select_policy(
    previous_end_airport: Option<&str>,
    next_start_airport: Option<&str>,
    base_airports: &BTreeSet<String>,
    prefer_operator_policy: bool,
) -> RestPolicy {
    if !prefer_operator_policy {
        return RestPolicy::Easa;
    }

    let at_base = |code: &str| base_airports.iter().any(|b| b.eq_ignore_ascii_case(code));
    match (
        airport_code(previous_end_airport),
        airport_code(next_start_airport),
    ) {
        (None, None) => RestPolicy::OmaHome,
        (Some(a), Some(b)) if at_base(&a) && at_base(&b) => RestPolicy::OmaHome,
        _ => RestPolicy::OmaAway,
    }
}

/// Maps a shortfall to a status and colour.
pub fn classify_shortfall(shortfall_minutes: i64) -> (RestStatus, ColorCode) {
    if shortfall_minutes > AT_RISK_TOLERANCE_MINUTES {
        (RestStatus::NonCompliant, ColorCode::Red)
    } else if shortfall_minutes > 0 {
        (RestStatus::AtRisk, ColorCode::Amber)
    } else {
        (RestStatus::Ok, ColorCode::Green)
    }
}

fn wocl_note(policy: RestPolicy) -> &'static str {
    match policy {
        RestPolicy::Easa => "WOCL overlap: +2h (EASA)",
        RestPolicy::OmaHome => "WOCL overlap: +1h (OMA Home)",
        RestPolicy::OmaAway => "WOCL overlap: +30m (OMA Away)",
    }
}

/// Evaluates one rest period.
///
/// # Arguments
///
/// * `input` - The previous duty's span and the next report instant
/// * `options` - Base airports, base timezone and feature toggles
///
/// # Returns
///
/// A [`RestEvaluation`] carrying every intermediate figure, or an
/// `InvalidInput` error when the previous duty ends before it starts.
///
/// # Algorithm
///
/// 1. Select the policy from the airports
/// 2. Base requirement is the policy floor or the previous duty length,
///    whichever is longer
/// 3. Add the policy's WOCL bonus when the previous duty touched 02:00-05:59 local
/// 4. Add travel time when resting away from base
/// 5. Compare with the actual rest and grade the shortfall
///
/// # Example
///
/// ```
/// use ftl_engine::evaluation::{evaluate_rest, RestInput, RestOptions};
/// use ftl_engine::models::{RestPolicy, RestStatus};
/// use chrono::{TimeZone, Utc};
///
/// let input = RestInput {
///     previous_start_utc: Utc.with_ymd_and_hms(2026, 1, 15, 8, 0, 0).unwrap(),
///     previous_end_utc: Utc.with_ymd_and_hms(2026, 1, 15, 16, 0, 0).unwrap(),
///     next_report_utc: Utc.with_ymd_and_hms(2026, 1, 16, 8, 0, 0).unwrap(),
///     previous_end_airport: Some("LHR".to_string()),
///     next_start_airport: Some("LHR".to_string()),
/// };
///
/// let rest = evaluate_rest(&input, &RestOptions::default()).unwrap();
/// assert_eq!(rest.policy, RestPolicy::OmaHome);
/// assert_eq!(rest.required_rest_minutes, 720);
/// assert_eq!(rest.rest_status, RestStatus::Ok);
/// ```
pub fn evaluate_rest(input: &RestInput, options: &RestOptions) -> EngineResult<RestEvaluation> {
    if input.previous_end_utc < input.previous_start_utc {
        return Err(EngineError::invalid_input(
            "previous_end_utc",
            "previous duty must not end before it starts",
        ));
    }

    let policy = select_policy(
        input.previous_end_airport.as_deref(),
        input.next_start_airport.as_deref(),
        &options.base_airports,
        options.prefer_operator_policy,
    );

    let previous_duty_minutes = elapsed_minutes(input.previous_start_utc, input.previous_end_utc);
    let base_required = policy.floor_minutes().max(previous_duty_minutes);

    let mut adjustments = Vec::new();

    let wocl_overlap = options.apply_wocl
        && overlaps_wocl(
            to_local(input.previous_start_utc, options.base_timezone),
            to_local(input.previous_end_utc, options.base_timezone),
        );
    if wocl_overlap {
        adjustments.push(RestAdjustment {
            kind: AdjustmentKind::Wocl,
            minutes: policy.wocl_bonus_minutes(),
            note: wocl_note(policy).to_string(),
        });
    }

    let mut travel_adjustment_minutes = 0;
    if options.apply_travel && policy == RestPolicy::OmaAway {
        travel_adjustment_minutes = TRAVEL_ADJUSTMENT_MINUTES;
        adjustments.push(RestAdjustment {
            kind: AdjustmentKind::Travel,
            minutes: TRAVEL_ADJUSTMENT_MINUTES,
            note: "Travel-time (away): +1h".to_string(),
        });
    }

    let required = base_required + adjustments.iter().map(|a| a.minutes).sum::<i64>();
    let actual = elapsed_minutes(input.previous_end_utc, input.next_report_utc);
    let shortfall = (required - actual).max(0);
    let (rest_status, color_code) = classify_shortfall(shortfall);

    let mut notes = vec![format!("Base requirement {} ({})", format_hm(base_required), policy)];
    notes.extend(adjustments.iter().map(|a| a.note.clone()));
    if shortfall > 0 {
        notes.push(format!("Rest short by {}", format_hm(shortfall)));
    }

    Ok(RestEvaluation {
        actual_rest_minutes: actual,
        base_required_rest_minutes: base_required,
        required_rest_minutes: required,
        shortfall_minutes: shortfall,
        next_earliest_report_utc: input.previous_end_utc + Duration::minutes(required),
        rest_status,
        color_code,
        policy,
        wocl_overlap,
        travel_adjustment_minutes,
        adjustments,
        notes,
    })
}

/// Expresses a rest evaluation as an [`EvaluationResult`] so it can be
/// summarised alongside duty results.
///
/// Only a Non-Compliant rest is a violation; At-Risk is reported as a note.
pub fn rest_evaluation_result(rest: &RestEvaluation) -> EvaluationResult {
    let mut result = EvaluationResult::new(RuleSource::Rest, EvaluationMode::Rest);
    result.set_limit("actual_rest_minutes", rest.actual_rest_minutes);
    result.set_limit("required_rest_minutes", rest.required_rest_minutes);
    result.set_limit("shortfall_minutes", rest.shortfall_minutes);

    match rest.rest_status {
        RestStatus::NonCompliant => result.violations.push(Violation::shortfall(
            RuleSource::Rest,
            "rest_insufficient",
            "Minimum rest not met",
            rest.shortfall_minutes,
        )),
        RestStatus::AtRisk => result.push_info(
            InfoNote::new(RuleSource::Rest, "Rest at risk")
                .with_fact("shortfall_minutes", rest.shortfall_minutes),
        ),
        RestStatus::Ok => result.push_info(InfoNote::new(RuleSource::Rest, "Rest requirement met")),
    }
    result
}
