//! Splitting of uploads that concatenate several XML documents.

use std::sync::LazyLock;

use regex::Regex;

/// `[ROSTER]` / `[TRIP]` separator lines some exports place between documents.
static MARKER_LINE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^[ \t]*\[(?:ROSTER|TRIP)\][ \t]*\r?$").unwrap());

/// Start of an XML declaration.
static DECLARATION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<\?xml\s+version=").unwrap());

/// Start of a trip file root element, with or without a namespace prefix.
static TRIP_ROOT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<(?:\w+:)?TripFileSpecification\b").unwrap());

/// Prefixes a fragment must start with to be kept.
const RECOGNIZED_PREFIXES: [&str; 5] = [
    "<?xml",
    "<rfs:",
    "<tfs:",
    "<RosterFileSpecification",
    "<TripFileSpecification",
];

/// Cuts `text` immediately before every match of `re`.
fn split_before<'a>(text: &'a str, re: &Regex) -> Vec<&'a str> {
    let mut bounds: Vec<usize> = std::iter::once(0)
        .chain(re.find_iter(text).map(|m| m.start()))
        .collect();
    bounds.push(text.len());
    bounds.windows(2).map(|w| &text[w[0]..w[1]]).collect()
}

/// Splits decoded upload text into individual XML documents.
///
/// Marker lines are removed first. The text is then cut before every XML
/// declaration or, when there is none, before every trip file root element.
/// Non-blank fragments beginning with a recognized root prefix are returned,
/// trimmed. When no fragment is recognized, the whole text from its first
/// `<` is returned as a single document, so plain exports without a
/// declaration still reach an ingester. Text with no `<` yields nothing.
///
/// # Example
///
/// ```
/// use ftl_engine::ingest::split_composite;
///
/// let text = "[ROSTER]\n<?xml version=\"1.0\"?><rfs:RosterFileSpecification/>\n\
///             [TRIP]\n<?xml version=\"1.0\"?><tfs:TripFileSpecification/>";
/// let parts = split_composite(text);
/// assert_eq!(parts.len(), 2);
/// assert!(parts[1].ends_with("<tfs:TripFileSpecification/>"));
/// ```
pub fn split_composite(text: &str) -> Vec<String> {
    let cleaned = MARKER_LINE_RE.replace_all(text, "");
    let cleaned = cleaned.trim_start();

    let mut parts = split_before(cleaned, &DECLARATION_RE);
    if parts.len() == 1 {
        parts = split_before(cleaned, &TRIP_ROOT_RE);
    }

    let recognized: Vec<String> = parts
        .into_iter()
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .filter(|part| RECOGNIZED_PREFIXES.iter().any(|prefix| part.starts_with(prefix)))
        .map(str::to_string)
        .collect();
    if !recognized.is_empty() {
        return recognized;
    }

    cleaned
        .find('<')
        .map(|start| cleaned[start..].trim_end())
        .filter(|whole| !whole.is_empty())
        .map(|whole| vec![whole.to_string()])
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_document_kept_whole() {
        let text = "<?xml version=\"1.0\"?>\n<Roster><Duty/></Roster>\n";
        assert_eq!(
            split_composite(text),
            vec!["<?xml version=\"1.0\"?>\n<Roster><Duty/></Roster>"]
        );
    }

    #[test]
    fn test_markers_removed_and_split_on_declarations() {
        let text = "[ROSTER]\r\n<?xml version=\"1.0\"?><rfs:RosterFileSpecification/>\r\n  [TRIP]  \r\n<?xml version='1.0'?><tfs:TripFileSpecification/>";
        let parts = split_composite(text);

        assert_eq!(parts.len(), 2);
        assert!(parts[0].starts_with("<?xml"));
        assert!(!parts[0].contains("[TRIP]"));
        assert!(parts[1].ends_with("<tfs:TripFileSpecification/>"));
    }

    #[test]
    fn test_split_on_trip_roots_without_declarations() {
        let text = "<tfs:TripFileSpecification>1</tfs:TripFileSpecification>\n<tfs:TripFileSpecification>2</tfs:TripFileSpecification>";
        let parts = split_composite(text);

        assert_eq!(parts.len(), 2);
        assert_eq!(parts[1], "<tfs:TripFileSpecification>2</tfs:TripFileSpecification>");
    }

    #[test]
    fn test_text_without_markup_yields_nothing() {
        assert!(split_composite("not xml at all").is_empty());
        assert!(split_composite("   \n").is_empty());
    }

    #[test]
    fn test_plain_export_without_declaration_kept_whole() {
        let text = "export 2026-01\n<CrewRoster><Duties><Duty Id=\"P2\"/></Duties></CrewRoster>\n";
        assert_eq!(
            split_composite(text),
            vec!["<CrewRoster><Duties><Duty Id=\"P2\"/></Duties></CrewRoster>"]
        );
    }

    #[test]
    fn test_unrecognized_fragment_dropped_beside_recognized_one() {
        let text = "<Other/>\n<?xml version=\"1.0\"?><tfs:TripFileSpecification/>";
        assert_eq!(
            split_composite(text),
            vec!["<?xml version=\"1.0\"?><tfs:TripFileSpecification/>"]
        );
    }

    #[test]
    fn test_leading_text_before_declaration_dropped() {
        let parts = split_composite("garbage\n<?xml version=\"1.0\"?><a/>");
        assert_eq!(parts, vec!["<?xml version=\"1.0\"?><a/>"]);
    }
}
