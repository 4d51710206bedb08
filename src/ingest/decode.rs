//! Byte-to-text decoding for roster uploads of unknown encoding.
//!
//! Decoding never fails: when no candidate encoding fits, the bytes are
//! read as Latin-1 with NUL bytes dropped.

use encoding_rs::{Encoding, UTF_8, UTF_16BE, UTF_16LE, WINDOWS_1252};

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

/// Bytes skipped before looking for the first `<`: BOM bytes, whitespace and NUL.
const LEADING_NOISE: &[u8] = &[0xEF, 0xBB, 0xBF, 0xFF, 0xFE, b'\r', b'\n', b'\t', b' ', 0x00];

/// Bytes windows-1252 leaves undefined.
const UNDEFINED_WINDOWS_1252: &[u8] = &[0x81, 0x8D, 0x8F, 0x90, 0x9D];

/// Candidate encodings in the order they are tried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextEncoding {
    /// UTF-8 with an optional byte order mark.
    Utf8Sig,
    /// UTF-8.
    Utf8,
    /// UTF-16 with byte order from a BOM, little-endian without one.
    Utf16,
    /// UTF-16 little-endian.
    Utf16Le,
    /// UTF-16 big-endian.
    Utf16Be,
    /// Windows code page 1252.
    Windows1252,
    /// ISO-8859-1.
    Latin1,
}

impl TextEncoding {
    /// The preference order.
    pub const CANDIDATES: [TextEncoding; 7] = [
        TextEncoding::Utf8Sig,
        TextEncoding::Utf8,
        TextEncoding::Utf16,
        TextEncoding::Utf16Le,
        TextEncoding::Utf16Be,
        TextEncoding::Windows1252,
        TextEncoding::Latin1,
    ];

    /// Label used in logs.
    pub fn label(self) -> &'static str {
        match self {
            TextEncoding::Utf8Sig => "utf-8-sig",
            TextEncoding::Utf8 => "utf-8",
            TextEncoding::Utf16 => "utf-16",
            TextEncoding::Utf16Le => "utf-16le",
            TextEncoding::Utf16Be => "utf-16be",
            TextEncoding::Windows1252 => "windows-1252",
            TextEncoding::Latin1 => "latin-1",
        }
    }

    /// Strictly decodes `bytes`; `None` when they are not valid in this encoding.
    fn decode(self, bytes: &[u8]) -> Option<String> {
        match self {
            TextEncoding::Utf8Sig => strict(UTF_8, bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes)),
            TextEncoding::Utf8 => strict(UTF_8, bytes),
            TextEncoding::Utf16 => match Encoding::for_bom(bytes) {
                Some((encoding, bom_len)) if encoding != UTF_8 => {
                    strict(encoding, &bytes[bom_len..])
                }
                _ => strict(UTF_16LE, bytes),
            },
            TextEncoding::Utf16Le => strict(UTF_16LE, bytes),
            TextEncoding::Utf16Be => strict(UTF_16BE, bytes),
            TextEncoding::Windows1252 => {
                if bytes.iter().any(|b| UNDEFINED_WINDOWS_1252.contains(b)) {
                    None
                } else {
                    strict(WINDOWS_1252, bytes)
                }
            }
            TextEncoding::Latin1 => Some(bytes.iter().map(|&b| char::from(b)).collect()),
        }
    }
}

fn strict(encoding: &'static Encoding, bytes: &[u8]) -> Option<String> {
    encoding
        .decode_without_bom_handling_and_without_replacement(bytes)
        .map(|text| text.into_owned())
}

/// Text decoded from an upload, with the encoding that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedText {
    /// The decoded markup.
    pub text: String,
    /// The encoding that fit, or `None` for the lossy fallback.
    pub encoding: Option<TextEncoding>,
}

/// Accepts a decoding only when it yields markup: no NUL characters, and
/// the first character is `<` whenever the input started with one.
fn plausible(text: &str, starts_with_markup: bool) -> bool {
    !text.contains('\0') && (!starts_with_markup || text.starts_with('<'))
}

fn skip_leading_noise(bytes: &[u8]) -> &[u8] {
    let start = bytes
        .iter()
        .position(|b| !LEADING_NOISE.contains(b))
        .unwrap_or(bytes.len());
    let bytes = &bytes[start..];
    match bytes.iter().position(|&b| b == b'<') {
        Some(lt) => &bytes[lt..],
        None => bytes,
    }
}

/// Decodes an upload into text.
///
/// A UTF-16 byte order mark is honoured first. Otherwise leading BOM bytes,
/// whitespace and NULs are skipped, the input is cut to start at the first
/// `<`, and each of [`TextEncoding::CANDIDATES`] is tried in turn.
///
/// # Example
///
/// ```
/// use ftl_engine::ingest::decode_xml_bytes;
///
/// let decoded = decode_xml_bytes(b"\xEF\xBB\xBF  <Roster/>");
/// assert_eq!(decoded.text, "<Roster/>");
/// ```
pub fn decode_xml_bytes(bytes: &[u8]) -> DecodedText {
    if let Some((encoding, bom_len)) = Encoding::for_bom(bytes) {
        if encoding != UTF_8 {
            if let Some(text) = strict(encoding, &bytes[bom_len..]) {
                let text = text.trim_start_matches(|c: char| c.is_whitespace() || c == '\u{feff}');
                if plausible(text, true) {
                    return DecodedText {
                        text: text.to_string(),
                        encoding: Some(TextEncoding::Utf16),
                    };
                }
            }
        }
    }

    let bytes = skip_leading_noise(bytes);
    let starts_with_markup = bytes.first() == Some(&b'<');
    for candidate in TextEncoding::CANDIDATES {
        if let Some(text) = candidate.decode(bytes) {
            if plausible(&text, starts_with_markup) {
                return DecodedText {
                    text,
                    encoding: Some(candidate),
                };
            }
        }
    }

    DecodedText {
        text: bytes.iter().filter(|&&b| b != 0).map(|&b| char::from(b)).collect(),
        encoding: None,
    }
}
