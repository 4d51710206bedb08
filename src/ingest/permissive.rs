//! Ingestion of roster exports without a recognized schema.
//!
//! Field names vary between exporters, so each value is looked up under a
//! fixed list of alternate attribute and child names. Times are expected in
//! UTC already and are never converted from local time.

use chrono::{DateTime, NaiveDateTime, Utc};
use chrono_tz::Tz;
use roxmltree::{Document, Node};

use crate::error::EngineResult;
use crate::models::{DutyRecord, DutyType};

use super::nodes::{attribute, descendants_named, first_child_text, is_named};
use super::{IngestReport, IngesterKind, PartMeta, RosterIngester};

const HEADER_NAMES: &[&str] = &["Header", "ROSTERHEADER", "RosterHeader"];
const DUTY_NAMES: &[&str] = &["RosterDuty", "DUTY", "Duty"];
const LEG_NAMES: &[&str] = &["Flight", "SECTOR", "Leg"];

/// Naive formats tried after RFC 3339; all are read as UTC.
const UTC_FORMATS: [&str; 5] = [
    "%Y-%m-%dT%H:%M:%SZ",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%MZ",
    "%Y-%m-%dT%H:%M",
];

/// Parses a UTC instant in any of the accepted layouts.
///
/// # Example
///
/// ```
/// use ftl_engine::ingest::parse_utc_instant;
///
/// assert!(parse_utc_instant("2026-01-15T07:00:00Z").is_some());
/// assert!(parse_utc_instant("2026-01-15 07:00:00").is_some());
/// assert!(parse_utc_instant("2026-01-15T07:00").is_some());
/// assert!(parse_utc_instant("15/01/2026 07:00").is_none());
/// ```
pub fn parse_utc_instant(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(instant) = DateTime::parse_from_rfc3339(raw) {
        return Some(instant.with_timezone(&Utc));
    }
    UTC_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
        .map(|naive| naive.and_utc())
}

/// Attribute `attr` if present, otherwise the first of `children` present.
fn lookup<'a>(node: Node<'a, '_>, attr: Option<&str>, children: &[&str]) -> Option<&'a str> {
    attr.and_then(|name| attribute(node, name))
        .or_else(|| first_child_text(node, children))
}

/// Times and airports collected from a duty's legs.
#[derive(Debug, Default)]
struct LegSummary {
    count: u32,
    earliest_departure: Option<DateTime<Utc>>,
    latest_arrival: Option<DateTime<Utc>>,
    first_origin: Option<String>,
    last_destination: Option<String>,
}

impl LegSummary {
    fn collect(duty_node: Node<'_, '_>) -> Self {
        let mut summary = Self::default();
        for leg in descendants_named(duty_node, LEG_NAMES) {
            summary.count += 1;

            if summary.first_origin.is_none() {
                summary.first_origin =
                    first_child_text(leg, &["From", "Departure"]).map(str::to_string);
            }
            if let Some(destination) = first_child_text(leg, &["To", "Arrival"]) {
                summary.last_destination = Some(destination.to_string());
            }

            let departure =
                lookup(leg, Some("STDUTC"), &["STDUTC", "STD"]).and_then(parse_utc_instant);
            if let Some(departure) = departure {
                summary.earliest_departure =
                    Some(summary.earliest_departure.map_or(departure, |d| d.min(departure)));
            }
            let arrival =
                lookup(leg, Some("STAUTC"), &["STAUTC", "STA"]).and_then(parse_utc_instant);
            if let Some(arrival) = arrival {
                summary.latest_arrival =
                    Some(summary.latest_arrival.map_or(arrival, |a| a.max(arrival)));
            }
        }
        summary
    }
}

/// Ingester for exports that carry UTC times under varying field names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GenericPermissiveIngester {
    base_timezone: Tz,
}

impl GenericPermissiveIngester {
    /// Creates an ingester that stamps records with `base_timezone`.
    pub fn new(base_timezone: Tz) -> Self {
        Self { base_timezone }
    }

    fn duty_from_node(
        &self,
        node: Node<'_, '_>,
        crew_id: Option<&str>,
        report: &mut IngestReport,
    ) -> Option<DutyRecord> {
        let legs = LegSummary::collect(node);

        let start = lookup(node, Some("StartUTC"), &["StartUTC", "SignOnUTC", "StartTimeUTC"])
            .and_then(parse_utc_instant)
            .or(legs.earliest_departure);
        let end = lookup(node, Some("EndUTC"), &["EndUTC", "SignOffUTC", "EndTimeUTC"])
            .and_then(parse_utc_instant)
            .or(legs.latest_arrival);
        let duty_id = lookup(node, Some("Id"), &["DutyId", "ID"]).map(str::to_string);

        let (Some(start), Some(end)) = (start, end) else {
            report.skip(format!(
                "duty {} has no resolvable UTC start and end",
                duty_id.as_deref().unwrap_or("<unnamed>")
            ));
            return None;
        };
        if end <= start {
            report.skip(format!(
                "duty {} ends at or before its start",
                duty_id.as_deref().unwrap_or("<unnamed>")
            ));
            return None;
        }

        let mut duty = DutyRecord::new(DutyType::Flying, start, end);
        duty.duty_id = duty_id;
        duty.crew_id = crew_id.map(str::to_string);
        duty.base_timezone = self.base_timezone;
        duty.sectors = legs.count.max(1);
        duty.origin = legs
            .first_origin
            .or_else(|| first_child_text(node, &["Departure", "From"]).map(str::to_string));
        duty.destination = legs
            .last_destination
            .or_else(|| first_child_text(node, &["Arrival", "To"]).map(str::to_string));
        duty.source = Some("permissive".to_string());
        Some(duty)
    }
}

impl RosterIngester for GenericPermissiveIngester {
    fn kind(&self) -> IngesterKind {
        IngesterKind::Permissive
    }

    fn ingest_document(
        &self,
        document: &Document<'_>,
        report: &mut IngestReport,
    ) -> EngineResult<()> {
        let root = document.root_element();
        let header = root.descendants().find(|node| is_named(*node, HEADER_NAMES));

        let crew_id =
            header.and_then(|h| first_child_text(h, &["CrewId", "CREWID", "EmployeeId"]));
        let period_start = header.and_then(|h| first_child_text(h, &["PeriodStart", "STARTDATE"]));
        let period_end = header.and_then(|h| first_child_text(h, &["PeriodEnd", "ENDDATE"]));

        for node in descendants_named(root, DUTY_NAMES) {
            if let Some(duty) = self.duty_from_node(node, crew_id, report) {
                report.duties.push(duty);
            }
        }

        report.parts.push(PartMeta::Permissive {
            crew_id: crew_id.map(str::to_string),
            period_start: period_start.map(str::to_string),
            period_end: period_end.map(str::to_string),
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn make_utc(d: u32, h: u32, mi: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, d, h, mi, 0).unwrap()
    }

    fn ingest(xml: &str) -> IngestReport {
        let document = Document::parse(xml).unwrap();
        let mut report = IngestReport::new(IngesterKind::Permissive);
        GenericPermissiveIngester::new(chrono_tz::Europe::London)
            .ingest_document(&document, &mut report)
            .unwrap();
        report
    }

    #[test]
    fn test_attribute_and_child_times() {
        let report = ingest(
            r#"<Roster>
                <Header><CrewId>123456</CrewId><PeriodStart>2026-01-01</PeriodStart></Header>
                <RosterDuty Id="D1" StartUTC="2026-01-15T07:00:00Z" EndUTC="2026-01-15T15:00:00Z"/>
                <DUTY><ID>D2</ID><SignOnUTC>2026-01-16 07:00:00</SignOnUTC><SignOffUTC>2026-01-16T13:30</SignOffUTC></DUTY>
            </Roster>"#,
        );

        assert_eq!(report.duties.len(), 2);
        assert_eq!(report.duties[0].duty_id.as_deref(), Some("D1"));
        assert_eq!(report.duties[0].crew_id.as_deref(), Some("123456"));
        assert_eq!(report.duties[0].sectors, 1);
        assert_eq!(report.duties[1].planned_end_utc, Some(make_utc(16, 13, 30)));
        assert_eq!(report.duties[1].source.as_deref(), Some("permissive"));
        assert_eq!(
            report.parts,
            vec![PartMeta::Permissive {
                crew_id: Some("123456".to_string()),
                period_start: Some("2026-01-01".to_string()),
                period_end: None,
            }]
        );
    }

    #[test]
    fn test_legs_count_sectors_and_backfill_times() {
        let report = ingest(
            r#"<Roster>
                <Duty>
                    <DutyId>T9</DutyId>
                    <Leg STDUTC="2026-01-15T10:00:00Z"><From>LHR</From><To>MAD</To><STAUTC>2026-01-15T12:30:00Z</STAUTC></Leg>
                    <Leg><From>MAD</From><To>LHR</To><STD>2026-01-15T13:30:00Z</STD><STA>2026-01-15T16:00:00Z</STA></Leg>
                    <Flight><STD>2026-01-15T08:00:00Z</STD></Flight>
                </Duty>
            </Roster>"#,
        );

        let duty = &report.duties[0];
        assert_eq!(duty.sectors, 3);
        assert_eq!(duty.planned_start_utc, make_utc(15, 8, 0));
        assert_eq!(duty.planned_end_utc, Some(make_utc(15, 16, 0)));
        assert_eq!(duty.origin.as_deref(), Some("LHR"));
        assert_eq!(duty.destination.as_deref(), Some("LHR"));
    }

    #[test]
    fn test_explicit_times_win_over_legs() {
        let report = ingest(
            r#"<Roster><Duty StartUTC="2026-01-15T07:00:00Z">
                <EndUTC>2026-01-15T18:00:00Z</EndUTC>
                <SECTOR><STD>2026-01-15T08:00:00Z</STD><STA>2026-01-15T10:00:00Z</STA></SECTOR>
            </Duty></Roster>"#,
        );
        assert_eq!(report.duties[0].planned_start_utc, make_utc(15, 7, 0));
        assert_eq!(report.duties[0].planned_end_utc, Some(make_utc(15, 18, 0)));
    }

    #[test]
    fn test_unresolvable_duties_skipped() {
        let report = ingest(
            r#"<Roster>
                <Duty Id="NO-END" StartUTC="2026-01-15T07:00:00Z"/>
                <Duty Id="LOCAL"><StartTime>07:00</StartTime><EndTime>15:00</EndTime></Duty>
                <Duty Id="BACKWARDS" StartUTC="2026-01-15T07:00:00Z" EndUTC="2026-01-15T06:00:00Z"/>
            </Roster>"#,
        );
        assert!(report.duties.is_empty());
        assert_eq!(report.skipped, 3);
        assert_eq!(report.skip_reasons.len(), 3);
    }
}
