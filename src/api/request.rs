//! Request types for the FTL compliance engine API.
//!
//! This module defines the JSON request structures for the check endpoints
//! and the query parameters of `/upload-roster`.

use std::collections::BTreeSet;
use std::str::FromStr;

use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::config::EngineSettings;
use crate::error::{EngineError, EngineResult};
use crate::evaluation::{RestInput, RestOptions};
use crate::models::DutyRecord;

/// Request body for the `/check-duty` endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DutyCheckRequest {
    /// The duty to evaluate.
    pub duty: DutyRecord,
}

/// Request body for the `/check-roster` endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RosterCheckRequest {
    /// The duties making up the roster, in any order.
    pub duties: Vec<DutyRecord>,
}

/// Request body for the `/check-rest` endpoint.
///
/// The rest period fields sit at the top level; every option left out falls
/// back to the engine settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RestCheckRequest {
    /// The rest period to evaluate.
    #[serde(flatten)]
    pub rest: RestInput,
    /// IANA timezone of the crew base (e.g. "Europe/London").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_timezone: Option<String>,
    /// Airports counted as home base.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_airports: Option<BTreeSet<String>>,
    /// Add the WOCL bonus.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub apply_wocl: Option<bool>,
    /// Add travel time when away from base.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub apply_travel: Option<bool>,
    /// Use operator policies instead of the EASA baseline.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefer_operator_policy: Option<bool>,
}

impl RestCheckRequest {
    /// Resolves the rest options, starting from `settings`.
    ///
    /// # Errors
    ///
    /// Returns `UnknownTimezone` when `base_timezone` is not an IANA zone.
    pub fn options(&self, settings: &EngineSettings) -> EngineResult<RestOptions> {
        let mut options = RestOptions::from_settings(settings);
        if let Some(name) = &self.base_timezone {
            options.base_timezone = parse_timezone(name)?;
        }
        if let Some(airports) = &self.base_airports {
            options.base_airports = airports.clone();
        }
        options.apply_wocl = self.apply_wocl.unwrap_or(options.apply_wocl);
        options.apply_travel = self.apply_travel.unwrap_or(options.apply_travel);
        options.prefer_operator_policy = self
            .prefer_operator_policy
            .unwrap_or(options.prefer_operator_policy);
        Ok(options)
    }
}

/// Query parameters for the `/upload-roster` endpoint.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UploadParams {
    /// Timezone in which local roster times are read; defaults to the
    /// configured base timezone.
    #[serde(default)]
    pub timezone: Option<String>,
}

/// Parses an IANA timezone name.
pub(crate) fn parse_timezone(name: &str) -> EngineResult<Tz> {
    Tz::from_str(name.trim()).map_err(|_| EngineError::UnknownTimezone {
        name: name.to_string(),
    })
}
