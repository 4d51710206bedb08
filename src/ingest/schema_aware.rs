//! Ingestion of roster and trip file exports.
//!
//! Both schemas carry local clock times at the crew base. Roster files
//! contribute ground duties; trip files contribute flying duties built from
//! a report time, a day offset and a duty length.

use std::sync::LazyLock;

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, Utc};
use chrono_tz::Tz;
use regex::Regex;
use roxmltree::{Document, Node};
use tracing::debug;

use crate::error::{EngineError, EngineResult};
use crate::evaluation::{local_date_time, local_to_utc};
use crate::models::{DutyRecord, DutyType};

use super::nodes::{child, child_text, descendants_named, local_name};
use super::{DocumentSchema, IngestReport, IngesterKind, PartMeta, RosterIngester};

/// `PT` followed by optional hours and optional minutes, e.g. `PT10H35M`.
static DUTY_HOURS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^PT(?:(\d+)H)?(?:(\d+)M)?$").unwrap());

/// Parses a duty length such as `PT10H35M` into minutes.
///
/// Missing hours or minutes count as zero, so `PT` alone is 0.
///
/// # Errors
///
/// Returns `InvalidInput` when the value does not match the pattern.
///
/// # Example
///
/// ```
/// use ftl_engine::ingest::parse_duty_duration_minutes;
///
/// assert_eq!(parse_duty_duration_minutes("PT10H35M").unwrap(), 635);
/// assert_eq!(parse_duty_duration_minutes("PT45M").unwrap(), 45);
/// assert!(parse_duty_duration_minutes("10:35").is_err());
/// ```
pub fn parse_duty_duration_minutes(raw: &str) -> EngineResult<i64> {
    let invalid =
        || EngineError::invalid_input("DutyHours", format!("unparseable duration '{raw}'"));
    let caps = DUTY_HOURS_RE.captures(raw.trim()).ok_or_else(invalid)?;

    let part = |index: usize| -> EngineResult<i64> {
        caps.get(index)
            .map_or(Ok(0), |m| m.as_str().parse::<i64>().map_err(|_| invalid()))
    };
    let (hours, minutes) = (part(1)?, part(2)?);
    hours
        .checked_mul(60)
        .and_then(|hours| hours.checked_add(minutes))
        .ok_or_else(invalid)
}

/// Parses a local date written as `YYYY-MM-DD`, or as an ISO date-time whose
/// date part is used.
pub fn parse_local_date(raw: &str) -> EngineResult<NaiveDate> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S").map(|dt| dt.date()))
        .map_err(|_| {
            EngineError::invalid_input("date", format!("expected YYYY-MM-DD, got '{raw}'"))
        })
}

/// Ingester for exports whose root is a `RosterFileSpecification` or a
/// `TripFileSpecification`. Documents with any other root are ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchemaAwareIngester {
    base_timezone: Tz,
}

impl SchemaAwareIngester {
    /// Creates an ingester reading local times in `base_timezone`.
    pub fn new(base_timezone: Tz) -> Self {
        Self { base_timezone }
    }

    fn local_instant(&self, date: NaiveDate, hhmm: &str) -> EngineResult<DateTime<Utc>> {
        Ok(local_to_utc(local_date_time(date, hhmm)?, self.base_timezone))
    }

    fn ingest_roster(&self, root: Node<'_, '_>, report: &mut IngestReport) -> EngineResult<()> {
        for roster_duty in descendants_named(root, &["RosterDuty"]) {
            if let Some(ground) = child(roster_duty, "GroundDuty") {
                let fields = ["StartDate", "StartTime", "EndDate", "EndTime"]
                    .map(|name| child_text(ground, name));
                let [Some(start_date), Some(start_time), Some(end_date), Some(end_time)] = fields
                else {
                    report.skip("ground duty missing one of StartDate/StartTime/EndDate/EndTime");
                    continue;
                };

                let start = self.local_instant(parse_local_date(start_date)?, start_time)?;
                let end = self.local_instant(parse_local_date(end_date)?, end_time)?;
                if end <= start {
                    report.skip(format!("ground duty on {start_date} ends at or before its start"));
                    continue;
                }

                let mut duty = DutyRecord::new(DutyType::Ground, start, end);
                duty.base_timezone = self.base_timezone;
                duty.source = Some("roster:ground".to_string());
                report.duties.push(duty);
            } else if child(roster_duty, "TripDuty").is_some() {
                // Trip references are not joined against trip file duties.
                report.discarded_markers += 1;
            }
        }

        let file_name = descendants_named(root, &["RosterFileHeader"])
            .next()
            .and_then(|header| child_text(header, "FileName"))
            .map(str::to_string);
        report.parts.push(PartMeta::Roster { file_name });
        Ok(())
    }

    fn ingest_trip(&self, root: Node<'_, '_>, report: &mut IngestReport) -> EngineResult<()> {
        for trip in descendants_named(root, &["Trip"]) {
            let trip_number = child(trip, "TripDetails")
                .and_then(|details| child_text(details, "TripNumber"))
                .unwrap_or_default();
            let span_start =
                child(trip, "TripSpanDetails").and_then(|span| child_text(span, "StartDate"));

            let duty_nodes = trip
                .children()
                .filter(|n| n.is_element() && local_name(*n) == "Duty");
            for duty_node in duty_nodes {
                let details = child(duty_node, "DutyDetails");
                let (Some(details), Some(span_start)) = (details, span_start) else {
                    report.skip(format!(
                        "trip {trip_number}: duty without DutyDetails or span start date"
                    ));
                    continue;
                };

                let duty_number = child_text(details, "DutyNumber").unwrap_or_default();
                let report_time = child_text(details, "ActualReportTime").unwrap_or("00:00");
                let duty_hours = child_text(details, "DutyHours").unwrap_or("PT00H00M");
                let sectors = child_text(details, "NumberOfSectors")
                    .filter(|s| s.bytes().all(|b| b.is_ascii_digit()))
                    .and_then(|s| s.parse::<u32>().ok())
                    .unwrap_or(1);

                let day_offset = first_sector_day_offset(duty_node);
                let span_date = parse_local_date(span_start)?;
                let base_date = Duration::try_days(day_offset)
                    .and_then(|offset| span_date.checked_add_signed(offset))
                    .ok_or_else(|| {
                        EngineError::invalid_input(
                            "RelativeDepartureDay",
                            format!("offset {day_offset} out of range"),
                        )
                    })?;

                let start = self.local_instant(base_date, report_time)?;
                let duty_id = format!("{trip_number}-{duty_number}");
                let length = parse_duty_duration_minutes(duty_hours)?;
                let end = Duration::try_minutes(length)
                    .and_then(|length| start.checked_add_signed(length))
                    .ok_or_else(|| {
                        EngineError::invalid_input(
                            "DutyHours",
                            format!("duty {duty_id} length out of range"),
                        )
                    })?;
                if end <= start {
                    report.skip(format!("duty {duty_id} has no length"));
                    continue;
                }

                let mut duty = DutyRecord::new(DutyType::Flying, start, end);
                duty.duty_id = Some(duty_id);
                duty.base_timezone = self.base_timezone;
                duty.sectors = sectors;
                duty.source = Some("trip:duty".to_string());
                report.duties.push(duty);
            }
        }

        report.parts.push(PartMeta::Trip);
        Ok(())
    }
}

/// Signed day offset from the duty's first sector, 0 when absent or not numeric.
fn first_sector_day_offset(duty_node: Node<'_, '_>) -> i64 {
    duty_node
        .children()
        .find(|n| n.is_element() && local_name(*n) == "Sector")
        .and_then(|sector| child(sector, "SectorDetails"))
        .and_then(|details| child_text(details, "RelativeDepartureDay"))
        .and_then(|day| day.parse::<i64>().ok())
        .unwrap_or(0)
}

impl RosterIngester for SchemaAwareIngester {
    fn kind(&self) -> IngesterKind {
        IngesterKind::SchemaAware
    }

    fn ingest_document(
        &self,
        document: &Document<'_>,
        report: &mut IngestReport,
    ) -> EngineResult<()> {
        let root = document.root_element();
        match DocumentSchema::of(document) {
            DocumentSchema::Roster => self.ingest_roster(root, report),
            DocumentSchema::Trip => self.ingest_trip(root, report),
            DocumentSchema::Unknown => {
                debug!(root = local_name(root), "Ignored document with unknown root");
                Ok(())
            }
        }
    }
}
