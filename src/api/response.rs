//! Response types for the FTL compliance engine API.
//!
//! This module defines the success bodies that are specific to the API and
//! the error response structures with their mapping from [`EngineError`].

use axum::{
    Json,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

use crate::error::EngineError;
use crate::ingest::IngestReport;
use crate::models::{EvaluationResult, RestEvaluation, RosterReport};

/// Body of `GET /health`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Always `"ok"` while the server is serving.
    pub status: String,
    /// Crate version.
    pub version: String,
}

/// Body of a successful `POST /check-rest`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RestCheckResponse {
    /// The full rest evaluation.
    pub evaluation: RestEvaluation,
    /// The same outcome expressed as an evaluation result.
    pub result: EvaluationResult,
}

/// Body of a successful `POST /upload-roster`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadResponse {
    /// What the ingester found in the upload.
    pub ingestion: IngestReport,
    /// Evaluation of the ingested duties.
    pub report: RosterReport,
}

/// API error response structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    /// Error code for programmatic handling.
    pub code: String,
    /// Human-readable error message.
    pub message: String,
    /// Optional details about the error.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ApiError {
    /// Creates a new API error.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
        }
    }

    /// Creates a new API error with details.
    pub fn with_details(
        code: impl Into<String>,
        message: impl Into<String>,
        details: impl Into<String>,
    ) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: Some(details.into()),
        }
    }

    /// Creates a malformed JSON error response.
    pub fn malformed_json(message: impl Into<String>) -> Self {
        Self::new("MALFORMED_JSON", message)
    }
}

/// API error with HTTP status code.
pub struct ApiErrorResponse {
    /// The HTTP status code.
    pub status: StatusCode,
    /// The error body.
    pub error: ApiError,
}

impl ApiErrorResponse {
    /// A 400 response with `error` as the body.
    pub fn bad_request(error: ApiError) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            error,
        }
    }
}

impl IntoResponse for ApiErrorResponse {
    fn into_response(self) -> Response {
        (
            self.status,
            [(header::CONTENT_TYPE, "application/json")],
            Json(self.error),
        )
            .into_response()
    }
}

impl From<EngineError> for ApiErrorResponse {
    fn from(error: EngineError) -> Self {
        match error {
            EngineError::ConfigNotFound { path } => ApiErrorResponse {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                error: ApiError::with_details(
                    "CONFIG_ERROR",
                    "Configuration error",
                    format!("Configuration file not found: {}", path),
                ),
            },
            EngineError::ConfigParseError { path, message } => ApiErrorResponse {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                error: ApiError::with_details(
                    "CONFIG_ERROR",
                    "Configuration parse error",
                    format!("Failed to parse {}: {}", path, message),
                ),
            },
            EngineError::UnknownTimezone { name } => ApiErrorResponse::bad_request(
                ApiError::with_details(
                    "UNKNOWN_TIMEZONE",
                    format!("Unknown timezone: {}", name),
                    "Timezones must be IANA names such as 'Europe/London'",
                ),
            ),
            EngineError::InvalidInput { field, message } => ApiErrorResponse::bad_request(
                ApiError::with_details(
                    "INVALID_INPUT",
                    format!("Invalid input field '{}': {}", field, message),
                    "A required time, date or duration is missing or malformed",
                ),
            ),
            EngineError::InvalidDuty { duty_id, message } => ApiErrorResponse::bad_request(
                ApiError::with_details(
                    "INVALID_DUTY",
                    format!("Invalid duty '{}': {}", duty_id, message),
                    "The duty data contains invalid information",
                ),
            ),
            EngineError::ParseError { message } => ApiErrorResponse::bad_request(
                ApiError::with_details("PARSE_ERROR", "Roster could not be parsed", message),
            ),
        }
    }
}
