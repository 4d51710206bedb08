//! HTTP API module for the FTL compliance engine.
//!
//! This module provides the REST endpoints that carry duties, rest periods
//! and raw roster uploads into the engine and return its results as JSON.

mod handlers;
mod request;
mod response;
mod state;

pub use handlers::create_router;
pub use request::{DutyCheckRequest, RestCheckRequest, RosterCheckRequest, UploadParams};
pub use response::{
    ApiError, ApiErrorResponse, HealthResponse, RestCheckResponse, UploadResponse,
};
pub use state::AppState;
