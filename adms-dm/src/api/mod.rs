//! HTTP API for adms-dm

mod activity;
mod applications;
mod changes;
mod health;
mod sse;
mod stats;
mod status;

pub use activity::{get_activity, ActivityResponse};
pub use applications::{list_applications, ApplicationsQuery, ListResponse};
pub use changes::{ingest_change, IngestResponse};
pub use health::{health_check, HealthResponse};
pub use sse::event_stream;
pub use stats::get_stats;
pub use status::get_status;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

/// API errors surfaced as JSON bodies
#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
        };

        let body = Json(json!({
            "error": message,
        }));

        (status, body).into_response()
    }
}
