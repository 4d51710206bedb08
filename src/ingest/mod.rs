//! Roster ingestion for the FTL compliance engine.
//!
//! Turns raw upload bytes into normalized [`DutyRecord`]s in four steps:
//!
//! 1. [`decode_xml_bytes`] finds an encoding that yields markup.
//! 2. [`split_composite`] separates concatenated XML documents.
//! 3. Each fragment is parsed and its schema detected ([`DocumentSchema`]).
//! 4. A [`RosterIngester`] walks each document and appends duties to an
//!    [`IngestReport`].
//!
//! When at least one fragment has a known root, the [`SchemaAwareIngester`]
//! handles the upload; otherwise the [`GenericPermissiveIngester`] does.

mod composite;
mod decode;
mod nodes;
mod permissive;
mod schema_aware;

use chrono_tz::Tz;
use roxmltree::{Document, ParsingOptions};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::EngineSettings;
use crate::error::{EngineError, EngineResult};
use crate::models::DutyRecord;

pub use composite::split_composite;
pub use decode::{DecodedText, TextEncoding, decode_xml_bytes};
pub use permissive::{GenericPermissiveIngester, parse_utc_instant};
pub use schema_aware::{SchemaAwareIngester, parse_duty_duration_minutes, parse_local_date};

/// Which ingester produced a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IngesterKind {
    /// Roster and trip file specifications.
    SchemaAware,
    /// Field-name scanning over exports without a known schema.
    Permissive,
}

/// Schema of a parsed document, detected from its root element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentSchema {
    /// `RosterFileSpecification` root.
    Roster,
    /// `TripFileSpecification` root.
    Trip,
    /// Any other root.
    Unknown,
}

impl DocumentSchema {
    /// Reads the root element's local name; namespace prefixes are ignored.
    pub fn of(document: &Document<'_>) -> Self {
        let root = document.root_element().tag_name().name();
        if root.contains("RosterFileSpecification") {
            DocumentSchema::Roster
        } else if root.contains("TripFileSpecification") {
            DocumentSchema::Trip
        } else {
            DocumentSchema::Unknown
        }
    }
}

/// Metadata for one ingested document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "file", rename_all = "snake_case")]
pub enum PartMeta {
    /// A roster file.
    Roster {
        /// File name from the roster header.
        file_name: Option<String>,
    },
    /// A trip file.
    Trip,
    /// An export read by the permissive ingester.
    Permissive {
        /// Crew member from the header.
        crew_id: Option<String>,
        /// Roster period start, as written.
        period_start: Option<String>,
        /// Roster period end, as written.
        period_end: Option<String>,
    },
}

/// Outcome of ingesting one upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestReport {
    /// The ingester that handled the upload.
    pub schema: IngesterKind,
    /// Normalized duties in document order.
    pub duties: Vec<DutyRecord>,
    /// One entry per ingested document.
    pub parts: Vec<PartMeta>,
    /// Number of duty nodes skipped. Documents with an unknown root are
    /// ignored without being counted.
    pub skipped: usize,
    /// Why each skip happened.
    pub skip_reasons: Vec<String>,
    /// Trip references in roster files, which are not turned into duties.
    pub discarded_markers: usize,
}

impl IngestReport {
    /// Creates an empty report for `schema`.
    pub fn new(schema: IngesterKind) -> Self {
        Self {
            schema,
            duties: Vec::new(),
            parts: Vec::new(),
            skipped: 0,
            skip_reasons: Vec::new(),
            discarded_markers: 0,
        }
    }

    /// Records a skipped node or document.
    pub fn skip(&mut self, reason: impl Into<String>) {
        let reason = reason.into();
        debug!(reason = %reason, "Skipped roster entry");
        self.skipped += 1;
        self.skip_reasons.push(reason);
    }
}

/// A strategy for turning a parsed document into duty records.
pub trait RosterIngester {
    /// Which variant this is.
    fn kind(&self) -> IngesterKind;

    /// Appends the duties found in `document` to `report`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` when a present field is malformed. Missing
    /// fields are recorded as skips instead.
    fn ingest_document(&self, document: &Document<'_>, report: &mut IngestReport)
    -> EngineResult<()>;
}

/// Options for [`ingest_roster`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IngestOptions {
    /// Timezone in which local roster and trip times are read.
    pub base_timezone: Tz,
}

impl Default for IngestOptions {
    fn default() -> Self {
        Self {
            base_timezone: chrono_tz::Europe::London,
        }
    }
}

impl IngestOptions {
    /// Takes the base timezone from the engine settings.
    pub fn from_settings(settings: &EngineSettings) -> Self {
        Self {
            base_timezone: settings.base_timezone,
        }
    }
}

/// Ingests a raw roster upload.
///
/// # Arguments
///
/// * `bytes` - The upload, in any supported encoding
/// * `options` - Ingestion options
///
/// # Returns
///
/// An [`IngestReport`] with the normalized duties and per-document metadata.
///
/// # Errors
///
/// * `ParseError` when no XML document is found or a fragment is not
///   well-formed XML
/// * `InvalidInput` when a present time, date or duration is malformed
///
/// # Example
///
/// ```
/// use ftl_engine::ingest::{IngestOptions, IngesterKind, ingest_roster};
///
/// let xml = br#"<?xml version="1.0"?>
/// <Roster><Duty Id="D1" StartUTC="2026-01-15T07:00:00Z" EndUTC="2026-01-15T15:00:00Z"/></Roster>"#;
/// let report = ingest_roster(xml, &IngestOptions::default())?;
/// assert_eq!(report.schema, IngesterKind::Permissive);
/// assert_eq!(report.duties.len(), 1);
/// # Ok::<(), ftl_engine::error::EngineError>(())
/// ```
pub fn ingest_roster(bytes: &[u8], options: &IngestOptions) -> EngineResult<IngestReport> {
    let decoded = decode_xml_bytes(bytes);
    let fragments = split_composite(&decoded.text);
    if fragments.is_empty() {
        return Err(EngineError::ParseError {
            message: "No XML documents detected (expecting Roster/Trip XML)".to_string(),
        });
    }

    let parsing = ParsingOptions {
        allow_dtd: true,
        ..ParsingOptions::default()
    };
    let documents = fragments
        .iter()
        .enumerate()
        .map(|(index, fragment)| {
            Document::parse_with_options(fragment, parsing).map_err(|e| EngineError::ParseError {
                message: format!("document {} is not well-formed XML: {e}", index + 1),
            })
        })
        .collect::<EngineResult<Vec<_>>>()?;

    let schema_aware = documents
        .iter()
        .any(|document| DocumentSchema::of(document) != DocumentSchema::Unknown);
    let ingester: Box<dyn RosterIngester> = if schema_aware {
        Box::new(SchemaAwareIngester::new(options.base_timezone))
    } else {
        Box::new(GenericPermissiveIngester::new(options.base_timezone))
    };

    let mut report = IngestReport::new(ingester.kind());
    for document in &documents {
        ingester.ingest_document(document, &mut report)?;
    }

    info!(
        encoding = decoded.encoding.map_or("lossy", TextEncoding::label),
        fragments = documents.len(),
        schema = ?report.schema,
        duties = report.duties.len(),
        skipped = report.skipped,
        "Roster ingested"
    );

    Ok(report)
}
