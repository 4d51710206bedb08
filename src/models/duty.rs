//! Duty record model and related types.
//!
//! A [`DutyRecord`] is the normalized shape produced by the roster ingesters
//! and consumed read-only by every evaluator.

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};

/// The kind of duty being evaluated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DutyType {
    /// A flying duty with one or more sectors.
    #[default]
    Flying,
    /// A ground duty (training, office, positioning by ground).
    Ground,
    /// Standby at home or suitable accommodation.
    StandbyHome,
    /// Standby at the airport.
    StandbyAirport,
    /// A reserve day.
    Reserve,
}

/// Whether the times describe the plan or what was actually operated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DutyStatus {
    /// Planned times from the roster.
    #[default]
    Planned,
    /// Actual operated times.
    Operated,
}

impl fmt::Display for DutyStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DutyStatus::Planned => write!(f, "planned"),
            DutyStatus::Operated => write!(f, "operated"),
        }
    }
}

/// Why an operated duty departed from its plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisruptionReason {
    /// Late departure or arrival.
    Delay,
    /// Landed somewhere other than planned.
    Diversion,
    /// Any other operational disruption.
    Disruption,
    /// A change not caused by the operation.
    Other,
}

impl DisruptionReason {
    /// Returns true for the operational reasons that earn night recovery.
    pub fn earns_recovery(self) -> bool {
        !matches!(self, DisruptionReason::Other)
    }
}

/// A later duty already on the plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NextPlannedDuty {
    /// Identifier of the planned duty.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duty_id: Option<String>,
    /// Planned report instant.
    pub start_utc: DateTime<Utc>,
}

/// The crew member's role on the duty.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CrewRole {
    /// Flight deck crew.
    #[default]
    Flight,
    /// Cabin crew.
    Cabin,
}

fn default_base_timezone() -> Tz {
    chrono_tz::Europe::London
}

/// A normalized duty.
///
/// The interval a duty is evaluated over comes from [`DutyRecord::interval`]:
/// planned times for a planned duty (the end falling back to start plus
/// `planned_block_minutes`), actual times where known for an operated one.
/// That interval is always non-empty once a record has passed
/// [`DutyRecord::validate`]; the ingesters never emit a record that would
/// fail it.
///
/// # Example
///
/// ```
/// use ftl_engine::models::{DutyRecord, DutyType};
/// use chrono::{TimeZone, Utc};
///
/// let duty = DutyRecord::new(
///     DutyType::Flying,
///     Utc.with_ymd_and_hms(2026, 1, 15, 7, 0, 0).unwrap(),
///     Utc.with_ymd_and_hms(2026, 1, 15, 17, 30, 0).unwrap(),
/// );
/// assert_eq!(duty.duration_minutes()?, 630);
/// assert!(duty.validate().is_ok());
/// # Ok::<(), ftl_engine::error::EngineError>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DutyRecord {
    /// Identifier such as `{tripNumber}-{dutyNumber}`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duty_id: Option<String>,
    /// Crew member identifier, when the export carries one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crew_id: Option<String>,
    /// The kind of duty.
    #[serde(rename = "type", default)]
    pub duty_type: DutyType,
    /// Planned or operated.
    #[serde(default)]
    pub status: DutyStatus,
    /// Timezone of the crew base.
    #[serde(default = "default_base_timezone")]
    pub base_timezone: Tz,
    /// Report (start) instant.
    pub planned_start_utc: DateTime<Utc>,
    /// Planned end instant.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub planned_end_utc: Option<DateTime<Utc>>,
    /// Planned length, used when no planned end is given.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub planned_block_minutes: Option<i64>,
    /// Actual report instant of an operated duty.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actual_start_utc: Option<DateTime<Utc>>,
    /// Actual end instant of an operated duty.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actual_end_utc: Option<DateTime<Utc>>,
    /// Why an operated duty departed from its plan.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disruption_reason: Option<DisruptionReason>,
    /// Later duties already on the plan.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub next_planned_duties: Vec<NextPlannedDuty>,
    /// Number of sectors flown.
    #[serde(default)]
    pub sectors: u32,
    /// Flight or cabin crew.
    #[serde(default)]
    pub crew_role: CrewRole,
    /// In-flight rest facility class (1 best, 3 worst).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rest_facility_class: Option<u8>,
    /// Number of additional pilots carried.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub augmented_pilots: Option<u8>,
    /// Whether one sector is longer than nine hours.
    #[serde(default)]
    pub long_sector_over_9h: bool,
    /// In-flight rest actually provided, in minutes.
    #[serde(default)]
    pub inflight_rest_minutes: i64,
    /// Departure airport of the first sector.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin: Option<String>,
    /// Arrival airport of the last sector.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination: Option<String>,
    /// Instant a home standby was called out.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub call_out_utc: Option<DateTime<Utc>>,
    /// Report instant assigned from a standby.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned_report_utc: Option<DateTime<Utc>>,
    /// Where the record came from (`roster:ground`, `trip:duty`, `permissive`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

impl DutyRecord {
    /// Creates a planned flight-crew duty with every optional field unset.
    pub fn new(duty_type: DutyType, start_utc: DateTime<Utc>, end_utc: DateTime<Utc>) -> Self {
        Self {
            duty_id: None,
            crew_id: None,
            duty_type,
            status: DutyStatus::Planned,
            base_timezone: default_base_timezone(),
            planned_start_utc: start_utc,
            planned_end_utc: Some(end_utc),
            planned_block_minutes: None,
            actual_start_utc: None,
            actual_end_utc: None,
            disruption_reason: None,
            next_planned_duties: Vec::new(),
            sectors: if duty_type == DutyType::Flying { 1 } else { 0 },
            crew_role: CrewRole::Flight,
            rest_facility_class: None,
            augmented_pilots: None,
            long_sector_over_9h: false,
            inflight_rest_minutes: 0,
            origin: None,
            destination: None,
            call_out_utc: None,
            assigned_report_utc: None,
            source: None,
        }
    }

    /// Returns the duty id, or `<unnamed>` for logging and error messages.
    pub fn label(&self) -> &str {
        self.duty_id.as_deref().unwrap_or("<unnamed>")
    }

    /// Returns the planned end, falling back to start plus the block time.
    pub fn planned_end(&self) -> Option<DateTime<Utc>> {
        self.planned_end_utc.or_else(|| {
            self.planned_block_minutes
                .and_then(Duration::try_minutes)
                .and_then(|block| self.planned_start_utc.checked_add_signed(block))
        })
    }

    /// Returns the interval the duty is evaluated over.
    ///
    /// A planned duty uses its planned start and [`DutyRecord::planned_end`].
    /// An operated duty uses its actual start and end where known, falling
    /// back to the planned start and [`DutyRecord::planned_end`].
    ///
    /// # Errors
    ///
    /// Returns `InvalidDuty` when a planned duty has neither an end nor a
    /// usable block time, or when the interval ends at or before its start.
    pub fn interval(&self) -> EngineResult<(DateTime<Utc>, DateTime<Utc>)> {
        let (start, end) = match self.status {
            DutyStatus::Planned => {
                let end = self.planned_end().ok_or_else(|| EngineError::InvalidDuty {
                    duty_id: self.label().to_string(),
                    message: "planned duties need planned_end_utc or planned_block_minutes"
                        .to_string(),
                })?;
                (self.planned_start_utc, end)
            }
            DutyStatus::Operated => {
                let start = self.actual_start_utc.unwrap_or(self.planned_start_utc);
                let end = self
                    .actual_end_utc
                    .or_else(|| self.planned_end())
                    .unwrap_or(self.planned_start_utc);
                (start, end)
            }
        };

        if end <= start {
            return Err(EngineError::InvalidDuty {
                duty_id: self.label().to_string(),
                message: format!("end {end} must be after start {start}"),
            });
        }
        Ok((start, end))
    }

    /// Returns the evaluated span in whole minutes.
    ///
    /// # Errors
    ///
    /// Same as [`DutyRecord::interval`].
    pub fn duration_minutes(&self) -> EngineResult<i64> {
        let (start, end) = self.interval()?;
        Ok(crate::evaluation::elapsed_minutes(start, end))
    }

    /// Checks the record invariants.
    ///
    /// # Errors
    ///
    /// Same as [`DutyRecord::interval`].
    pub fn validate(&self) -> EngineResult<()> {
        self.interval().map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn make_utc(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, 0).unwrap()
    }

    #[test]
    fn test_new_flying_duty_defaults() {
        let duty = DutyRecord::new(
            DutyType::Flying,
            make_utc(2026, 1, 15, 7, 0),
            make_utc(2026, 1, 15, 15, 0),
        );
        assert_eq!(duty.sectors, 1);
        assert_eq!(duty.crew_role, CrewRole::Flight);
        assert_eq!(duty.status, DutyStatus::Planned);
        assert_eq!(duty.label(), "<unnamed>");
        assert_eq!(duty.duration_minutes().unwrap(), 480);
    }

    #[test]
    fn test_new_ground_duty_has_no_sectors() {
        let duty = DutyRecord::new(
            DutyType::Ground,
            make_utc(2026, 1, 15, 9, 0),
            make_utc(2026, 1, 15, 17, 0),
        );
        assert_eq!(duty.sectors, 0);
    }

    #[test]
    fn test_validate_rejects_end_not_after_start() {
        let mut duty = DutyRecord::new(
            DutyType::Flying,
            make_utc(2026, 1, 15, 9, 0),
            make_utc(2026, 1, 15, 9, 0),
        );
        duty.duty_id = Some("1234-1".to_string());

        match duty.validate() {
            Err(EngineError::InvalidDuty { duty_id, .. }) => assert_eq!(duty_id, "1234-1"),
            other => panic!("Expected InvalidDuty, got {:?}", other),
        }
    }

    #[test]
    fn test_serializes_canonical_shape() {
        let mut duty = DutyRecord::new(
            DutyType::StandbyHome,
            make_utc(2026, 1, 15, 6, 0),
            make_utc(2026, 1, 15, 18, 0),
        );
        duty.duty_id = Some("SBY-1".to_string());

        let json = serde_json::to_value(&duty).unwrap();
        assert_eq!(json["type"], "standby_home");
        assert_eq!(json["status"], "planned");
        assert_eq!(json["base_timezone"], "Europe/London");
        assert_eq!(json["planned_start_utc"], "2026-01-15T06:00:00Z");
        assert_eq!(json["crew_role"], "flight");
        assert!(json.get("rest_facility_class").is_none());
    }

    #[test]
    fn test_deserializes_minimal_payload() {
        let json = r#"{
            "planned_start_utc": "2026-01-15T22:30:00Z",
            "planned_end_utc": "2026-01-16T09:00:00Z",
            "sectors": 1,
            "crew_role": "cabin",
            "rest_facility_class": 2,
            "inflight_rest_minutes": 120
        }"#;

        let duty: DutyRecord = serde_json::from_str(json).unwrap();
        assert_eq!(duty.duty_type, DutyType::Flying);
        assert_eq!(duty.crew_role, CrewRole::Cabin);
        assert_eq!(duty.rest_facility_class, Some(2));
        assert_eq!(duty.duration_minutes().unwrap(), 630);
    }

    #[test]
    fn test_planned_end_falls_back_to_block_time() {
        let json = r#"{
            "duty_id": "BLK-1",
            "planned_start_utc": "2026-01-15T07:00:00Z",
            "planned_block_minutes": 450
        }"#;
        let duty: DutyRecord = serde_json::from_str(json).unwrap();

        assert_eq!(duty.planned_end_utc, None);
        assert_eq!(duty.planned_end(), Some(make_utc(2026, 1, 15, 14, 30)));
        assert_eq!(duty.interval().unwrap().1, make_utc(2026, 1, 15, 14, 30));
    }

    #[test]
    fn test_planned_duty_without_end_or_block_is_invalid() {
        let mut duty = DutyRecord::new(
            DutyType::Flying,
            make_utc(2026, 1, 15, 7, 0),
            make_utc(2026, 1, 15, 15, 0),
        );
        duty.planned_end_utc = None;

        match duty.validate() {
            Err(EngineError::InvalidDuty { message, .. }) => {
                assert!(message.contains("planned_block_minutes"))
            }
            other => panic!("Expected InvalidDuty, got {:?}", other),
        }
    }

    #[test]
    fn test_operated_duty_uses_actual_times() {
        let mut duty = DutyRecord::new(
            DutyType::Flying,
            make_utc(2026, 1, 15, 7, 0),
            make_utc(2026, 1, 15, 15, 0),
        );
        duty.status = DutyStatus::Operated;
        duty.actual_start_utc = Some(make_utc(2026, 1, 15, 7, 40));
        duty.actual_end_utc = Some(make_utc(2026, 1, 15, 17, 10));

        assert_eq!(
            duty.interval().unwrap(),
            (make_utc(2026, 1, 15, 7, 40), make_utc(2026, 1, 15, 17, 10))
        );
        assert_eq!(duty.duration_minutes().unwrap(), 570);
    }

    #[test]
    fn test_operated_duty_falls_back_to_plan() {
        let mut duty = DutyRecord::new(
            DutyType::Flying,
            make_utc(2026, 1, 15, 7, 0),
            make_utc(2026, 1, 15, 15, 0),
        );
        duty.status = DutyStatus::Operated;
        duty.actual_start_utc = Some(make_utc(2026, 1, 15, 7, 30));
        assert_eq!(duty.interval().unwrap().1, make_utc(2026, 1, 15, 15, 0));

        duty.planned_end_utc = None;
        duty.planned_block_minutes = Some(600);
        assert_eq!(duty.interval().unwrap().1, make_utc(2026, 1, 15, 17, 0));
    }
}
