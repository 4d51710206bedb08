//! HTTP request handlers for the FTL compliance engine API.
//!
//! This module contains the handler functions for all API endpoints. The
//! handlers only marshal payloads; every rule decision is made by the
//! evaluation module.

use std::time::Instant;

use axum::{
    Json, Router,
    body::Bytes,
    extract::{Query, State, rejection::JsonRejection},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::Serialize;
use tokio::task::{self, JoinError};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::evaluation::{evaluate_duty, evaluate_rest, evaluate_roster, rest_evaluation_result};
use crate::ingest::{IngestOptions, ingest_roster};

use super::request::{
    DutyCheckRequest, RestCheckRequest, RosterCheckRequest, UploadParams, parse_timezone,
};
use super::response::{
    ApiError, ApiErrorResponse, HealthResponse, RestCheckResponse, UploadResponse,
};
use super::state::AppState;

/// Creates the API router with all endpoints.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/rules", get(rules_handler))
        .route("/check-duty", post(check_duty_handler))
        .route("/check-roster", post(check_roster_handler))
        .route("/check-rest", post(check_rest_handler))
        .route("/upload-roster", post(upload_roster_handler))
        .with_state(state)
}

/// Serializes `body` with a 200 status.
fn ok_json<T: Serialize>(body: T) -> Response {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "application/json")],
        Json(body),
    )
        .into_response()
}

/// Maps a JSON extraction failure to a 400 response.
fn rejection_response(correlation_id: Uuid, rejection: JsonRejection) -> Response {
    let error = match rejection {
        JsonRejection::JsonDataError(err) => {
            // The body text carries serde's description, e.g. "missing field".
            let body_text = err.body_text();
            warn!(
                correlation_id = %correlation_id,
                error = %body_text,
                "JSON data error"
            );
            if body_text.contains("missing field") {
                ApiError::new("VALIDATION_ERROR", body_text)
            } else {
                ApiError::malformed_json(body_text)
            }
        }
        JsonRejection::JsonSyntaxError(err) => {
            warn!(
                correlation_id = %correlation_id,
                error = %err,
                "JSON syntax error"
            );
            ApiError::malformed_json(format!("Invalid JSON syntax: {}", err))
        }
        JsonRejection::MissingJsonContentType(_) => {
            ApiError::new("MISSING_CONTENT_TYPE", "Content-Type must be application/json")
        }
        _ => ApiError::malformed_json("Failed to parse request body"),
    };
    ApiErrorResponse::bad_request(error).into_response()
}

/// Logs a failed engine call and converts it to an error response.
fn engine_error_response(correlation_id: Uuid, err: crate::error::EngineError) -> Response {
    warn!(
        correlation_id = %correlation_id,
        error = %err,
        "Request failed"
    );
    ApiErrorResponse::from(err).into_response()
}

/// Logs a panicked evaluation task and converts it to a 500 response.
fn join_error_response(correlation_id: Uuid, err: JoinError) -> Response {
    error!(
        correlation_id = %correlation_id,
        error = %err,
        "Evaluation task failed"
    );
    ApiErrorResponse {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        error: ApiError::new("INTERNAL_ERROR", "Evaluation task failed"),
    }
    .into_response()
}

/// Handler for GET /health.
async fn health_handler() -> impl IntoResponse {
    ok_json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Handler for GET /rules.
///
/// Returns the loaded EASA and OMA rule tables.
async fn rules_handler(State(state): State<AppState>) -> impl IntoResponse {
    ok_json(state.config().bundle())
}

/// Handler for POST /check-duty endpoint.
///
/// Evaluates a single duty against the checks for its type on the blocking
/// pool.
async fn check_duty_handler(
    State(state): State<AppState>,
    payload: Result<Json<DutyCheckRequest>, JsonRejection>,
) -> impl IntoResponse {
    let correlation_id = Uuid::new_v4();
    info!(correlation_id = %correlation_id, "Processing duty check");

    let request = match payload {
        Ok(Json(req)) => req,
        Err(rejection) => return rejection_response(correlation_id, rejection),
    };

    let start_time = Instant::now();
    let outcome =
        task::spawn_blocking(move || evaluate_duty(&request.duty, state.config().bundle())).await;
    match outcome {
        Ok(Ok(evaluation)) => {
            info!(
                correlation_id = %correlation_id,
                duty_type = ?evaluation.duty_type,
                results = evaluation.results.len(),
                duration_us = start_time.elapsed().as_micros(),
                "Duty check completed"
            );
            ok_json(evaluation)
        }
        Ok(Err(err)) => engine_error_response(correlation_id, err),
        Err(err) => join_error_response(correlation_id, err),
    }
}

/// Handler for POST /check-roster endpoint.
///
/// Evaluates every duty and the rest between consecutive duties on the
/// blocking pool.
async fn check_roster_handler(
    State(state): State<AppState>,
    payload: Result<Json<RosterCheckRequest>, JsonRejection>,
) -> impl IntoResponse {
    let correlation_id = Uuid::new_v4();
    info!(correlation_id = %correlation_id, "Processing roster check");

    let request = match payload {
        Ok(Json(req)) => req,
        Err(rejection) => return rejection_response(correlation_id, rejection),
    };

    let duties_count = request.duties.len();
    let start_time = Instant::now();
    let outcome = task::spawn_blocking(move || {
        let config = state.config();
        evaluate_roster(&request.duties, config.bundle(), config.settings())
    })
    .await;
    match outcome {
        Ok(Ok(report)) => {
            info!(
                correlation_id = %correlation_id,
                duties_count,
                status = %report.summary.overall_status,
                violations = report.summary.violation_count,
                duration_us = start_time.elapsed().as_micros(),
                "Roster check completed"
            );
            ok_json(report)
        }
        Ok(Err(err)) => engine_error_response(correlation_id, err),
        Err(err) => join_error_response(correlation_id, err),
    }
}

/// Handler for POST /check-rest endpoint.
///
/// Evaluates one rest period; options missing from the body come from the
/// engine settings.
async fn check_rest_handler(
    State(state): State<AppState>,
    payload: Result<Json<RestCheckRequest>, JsonRejection>,
) -> impl IntoResponse {
    let correlation_id = Uuid::new_v4();
    info!(correlation_id = %correlation_id, "Processing rest check");

    let request = match payload {
        Ok(Json(req)) => req,
        Err(rejection) => return rejection_response(correlation_id, rejection),
    };

    let start_time = Instant::now();
    let evaluation = request
        .options(state.config().settings())
        .and_then(|options| evaluate_rest(&request.rest, &options));
    match evaluation {
        Ok(evaluation) => {
            info!(
                correlation_id = %correlation_id,
                policy = ?evaluation.policy,
                status = ?evaluation.rest_status,
                shortfall_minutes = evaluation.shortfall_minutes,
                duration_us = start_time.elapsed().as_micros(),
                "Rest check completed"
            );
            let result = rest_evaluation_result(&evaluation);
            ok_json(RestCheckResponse { evaluation, result })
        }
        Err(err) => engine_error_response(correlation_id, err),
    }
}

/// Handler for POST /upload-roster endpoint.
///
/// The body is the raw export in any supported encoding. An optional
/// `timezone` query parameter overrides the configured base timezone.
/// Ingestion and evaluation run on the blocking pool.
async fn upload_roster_handler(
    State(state): State<AppState>,
    Query(params): Query<UploadParams>,
    body: Bytes,
) -> impl IntoResponse {
    let correlation_id = Uuid::new_v4();
    info!(
        correlation_id = %correlation_id,
        bytes = body.len(),
        "Processing roster upload"
    );

    let start_time = Instant::now();
    let outcome = task::spawn_blocking(move || {
        let config = state.config();
        params
            .timezone
            .as_deref()
            .map(parse_timezone)
            .transpose()
            .and_then(|timezone| {
                let mut options = IngestOptions::from_settings(config.settings());
                if let Some(timezone) = timezone {
                    options.base_timezone = timezone;
                }
                ingest_roster(&body, &options)
            })
            .and_then(|ingestion| {
                let report =
                    evaluate_roster(&ingestion.duties, config.bundle(), config.settings())?;
                Ok(UploadResponse { ingestion, report })
            })
    })
    .await;

    match outcome {
        Ok(Ok(response)) => {
            info!(
                correlation_id = %correlation_id,
                duties_count = response.ingestion.duties.len(),
                skipped = response.ingestion.skipped,
                status = %response.report.summary.overall_status,
                duration_us = start_time.elapsed().as_micros(),
                "Roster upload evaluated"
            );
            ok_json(response)
        }
        Ok(Err(err)) => engine_error_response(correlation_id, err),
        Err(err) => join_error_response(correlation_id, err),
    }
}
