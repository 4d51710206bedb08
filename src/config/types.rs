//! Configuration types for FTL rule evaluation.
//!
//! This module contains the strongly-typed rule tables deserialized from the
//! JSON rule bundles and the engine settings deserialized from YAML.

use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveTime;
use chrono_tz::Tz;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::evaluation::within_band;

/// FDP limit applied when no band matches the local report time.
pub const DEFAULT_LIMIT_MINUTES: i64 = 660;

/// Local clock times in the rule tables are written as `HH:MM`.
mod hhmm {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&time.format("%H:%M").to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        crate::evaluation::parse_hhmm(&raw).map_err(serde::de::Error::custom)
    }
}

/// One row of the EASA FDP table.
///
/// The band `[start_local, end_local)` wraps past midnight when
/// `start_local > end_local`. `limits` maps a sector count to a limit in
/// minutes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FdpRow {
    /// Inclusive start of the local report-time band.
    #[serde(with = "hhmm")]
    pub start_local: NaiveTime,
    /// Exclusive end of the local report-time band.
    #[serde(with = "hhmm")]
    pub end_local: NaiveTime,
    /// Sector count to maximum FDP minutes.
    #[serde(default)]
    pub limits: BTreeMap<u32, i64>,
}

impl FdpRow {
    /// Returns true when the local report time falls inside this row's band.
    pub fn contains(&self, report_local: NaiveTime) -> bool {
        within_band(report_local, self.start_local, self.end_local)
    }
}

/// A local-time window that shortens the FDP when the duty reports inside it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WoclWindow {
    /// Inclusive start of the window.
    #[serde(with = "hhmm")]
    pub start_local: NaiveTime,
    /// Exclusive end of the window.
    #[serde(with = "hhmm")]
    pub end_local: NaiveTime,
    /// Minutes removed from the FDP limit.
    #[serde(default)]
    pub penalty_min: i64,
}

impl WoclWindow {
    /// Returns true when the local report time falls inside this window.
    pub fn contains(&self, report_local: NaiveTime) -> bool {
        within_band(report_local, self.start_local, self.end_local)
    }
}

fn default_limit_minutes() -> i64 {
    DEFAULT_LIMIT_MINUTES
}

/// The regulatory baseline rule bundle (`easa.json`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EasaRules {
    /// Ordered FDP bands; the first matching band wins.
    #[serde(default)]
    pub fdp_rows: Vec<FdpRow>,
    /// Signed minute corrections keyed by sector count.
    #[serde(default)]
    pub sector_corrections: BTreeMap<u32, i64>,
    /// Ordered WOCL penalty windows; the first matching window wins.
    #[serde(default)]
    pub wocl: Vec<WoclWindow>,
    /// Limit used when no band matches.
    #[serde(default = "default_limit_minutes")]
    pub default_limit_minutes: i64,
}

impl Default for EasaRules {
    fn default() -> Self {
        Self {
            fdp_rows: Vec::new(),
            sector_corrections: BTreeMap::new(),
            wocl: Vec::new(),
            default_limit_minutes: DEFAULT_LIMIT_MINUTES,
        }
    }
}

/// One row of the cabin crew in-flight rest table.
///
/// `min_rest_minutes` of `None` marks the listed rest classes as not
/// permitted for FDPs in this band.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CabinRestRow {
    /// Rest facility classes this row applies to.
    pub classes: Vec<u8>,
    /// Inclusive lower bound of the FDP band in hours.
    pub min_fdp_h: Decimal,
    /// Inclusive upper bound of the FDP band in hours.
    pub max_fdp_h: Decimal,
    /// Required in-flight rest, or `None` when the class is disallowed.
    #[serde(default)]
    pub min_rest_minutes: Option<i64>,
}

/// Cabin crew section of the operator bundle.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CabinCrewRules {
    /// Ordered rest table; the first matching row wins.
    #[serde(default)]
    pub min_rest_by_extended_fdp: Vec<CabinRestRow>,
}

/// Augmented FDP caps in hours: rest class → pilot count → profile → hours.
pub type AugmentationCaps = BTreeMap<u8, BTreeMap<u8, BTreeMap<String, Decimal>>>;

/// The operator rule bundle (`oma.json`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OmaRules {
    /// Cabin crew in-flight rest rules.
    #[serde(default)]
    pub cabin_crew: CabinCrewRules,
    /// Augmented flight crew caps.
    #[serde(default)]
    pub augmentation_caps: AugmentationCaps,
}

/// Both rule bundles, loaded once and passed by reference into every
/// evaluator call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleBundle {
    /// Regulatory baseline tables.
    pub easa: EasaRules,
    /// Operator tables.
    pub oma: OmaRules,
}

fn default_true() -> bool {
    true
}

/// Feature toggles for the rest evaluator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestSettings {
    /// Add the WOCL bonus when the previous duty touched the night band.
    #[serde(default = "default_true")]
    pub apply_wocl: bool,
    /// Add travel time when resting away from base.
    #[serde(default = "default_true")]
    pub apply_travel: bool,
    /// Use operator policies; when false the EASA baseline is always used.
    #[serde(default = "default_true")]
    pub prefer_operator_policy: bool,
}

impl Default for RestSettings {
    fn default() -> Self {
        Self {
            apply_wocl: true,
            apply_travel: true,
            prefer_operator_policy: true,
        }
    }
}

fn default_bind_address() -> String {
    "0.0.0.0:8000".to_string()
}

/// HTTP adapter settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerSettings {
    /// Socket address the server listens on.
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
        }
    }
}

fn default_base_timezone() -> Tz {
    chrono_tz::Europe::London
}

fn default_base_airports() -> BTreeSet<String> {
    ["LHR", "LGW", "LCY"].iter().map(|s| s.to_string()).collect()
}

/// Engine settings from `settings.yaml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineSettings {
    /// Timezone of the crew base.
    #[serde(default = "default_base_timezone")]
    pub base_timezone: Tz,
    /// Airports counted as home base for rest policy selection.
    #[serde(default = "default_base_airports")]
    pub base_airports: BTreeSet<String>,
    /// Rest evaluator toggles.
    #[serde(default)]
    pub rest: RestSettings,
    /// HTTP adapter settings.
    #[serde(default)]
    pub server: ServerSettings,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            base_timezone: default_base_timezone(),
            base_airports: default_base_airports(),
            rest: RestSettings::default(),
            server: ServerSettings::default(),
        }
    }
}
