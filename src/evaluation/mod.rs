//! Rule evaluation for the FTL compliance engine.
//!
//! This module contains the time window utilities, the rest evaluator, the
//! duty limit evaluators (EASA FDP, operator rules, standby and reserve),
//! the night duty rules, the summary reduction and the roster driver. Every evaluator is a pure
//! function of its inputs and the rule tables passed to it.

mod fdp_limit;
mod night;
mod operator;
mod rest;
mod roster;
mod standby;
mod summary;
mod time_window;

pub use fdp_limit::{
    FdpLimitBreakdown, easa_base_limit_minutes, easa_sector_correction, easa_wocl_penalty,
    evaluate_easa, evaluate_easa_duty,
};
pub use night::{
    NEXT_DAY_EARLIEST_REPORT_HOUR, NIGHT_RECOVERY_MINUTES, NIGHT_WINDOW_END_MINUTE,
    NIGHT_WINDOW_START_MINUTE, evaluate_night_duty, impinges_night_window,
};
pub use operator::{
    AugmentationProfile, OmaInput, augmented_cap_minutes, evaluate_oma, evaluate_oma_duty,
    select_augmentation_profile,
};
pub use rest::{
    AT_RISK_TOLERANCE_MINUTES, RestInput, RestOptions, TRAVEL_ADJUSTMENT_MINUTES,
    classify_shortfall, evaluate_rest, rest_evaluation_result, select_policy,
};
pub use roster::{evaluate_duty, evaluate_roster};
pub use standby::{
    DAYTIME_STANDBY_ALLOWANCE_MINUTES, STANDBY_CEILING_MINUTES, counted_daytime_minutes,
    evaluate_airport_standby, evaluate_home_standby, evaluate_reserve_day,
};
pub use summary::summarise;
pub use time_window::{
    WOCL_END_MINUTE, WOCL_SAMPLE_MINUTES, WOCL_START_MINUTE, elapsed_minutes, format_hm,
    local_date_time, local_to_utc, minute_of_day, minutes_outside_local_band, overlaps_wocl,
    parse_hhmm, to_local, within_band,
};
