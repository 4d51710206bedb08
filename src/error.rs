//! Error types for the FTL compliance engine.
//!
//! This module provides strongly-typed errors using the `thiserror` crate
//! for every failure that aborts an operation. Rule violations are not
//! errors: they are reported as data inside evaluation results.

use thiserror::Error;

/// The main error type for the FTL compliance engine.
///
/// # Example
///
/// ```
/// use ftl_engine::error::EngineError;
///
/// let error = EngineError::ConfigNotFound {
///     path: "/missing/easa.json".to_string(),
/// };
/// assert_eq!(error.to_string(), "Configuration file not found: /missing/easa.json");
/// ```
#[derive(Debug, Error)]
pub enum EngineError {
    /// Configuration file was not found at the specified path.
    #[error("Configuration file not found: {path}")]
    ConfigNotFound {
        /// The path that was not found.
        path: String,
    },

    /// Configuration file could not be parsed.
    #[error("Failed to parse configuration file '{path}': {message}")]
    ConfigParseError {
        /// The path to the file that failed to parse.
        path: String,
        /// A description of the parse error.
        message: String,
    },

    /// A timezone name is not a known IANA zone.
    #[error("Unknown timezone: {name}")]
    UnknownTimezone {
        /// The rejected timezone name.
        name: String,
    },

    /// A required timestamp or numeric field is missing or malformed.
    #[error("Invalid input field '{field}': {message}")]
    InvalidInput {
        /// The field that was missing or malformed.
        field: String,
        /// A description of the problem.
        message: String,
    },

    /// A duty record breaks one of its invariants.
    #[error("Invalid duty '{duty_id}': {message}")]
    InvalidDuty {
        /// The duty identifier, or `<unnamed>` when the record has none.
        duty_id: String,
        /// A description of what made the duty invalid.
        message: String,
    },

    /// An uploaded roster export could not be turned into XML documents.
    #[error("Roster parse error: {message}")]
    ParseError {
        /// A description of the parse failure.
        message: String,
    },
}

impl EngineError {
    /// Shorthand for an [`EngineError::InvalidInput`].
    pub fn invalid_input(field: impl Into<String>, message: impl Into<String>) -> Self {
        EngineError::InvalidInput {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// A type alias for Results that return EngineError.
pub type EngineResult<T> = Result<T, EngineError>;
