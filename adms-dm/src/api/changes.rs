//! Change-ingest webhook
//!
//! Boundary to the external change transport: upstream delivery posts one
//! row change per request, and the handler publishes it onto the in-process
//! change feed for the subscription worker to reconcile.

use axum::extract::State;
use axum::Json;
use serde::Serialize;
use tracing::debug;

use adms_common::events::RowChange;

use crate::AppState;

/// Ingest acknowledgment
#[derive(Debug, Serialize)]
pub struct IngestResponse {
    pub accepted: bool,
    /// Number of feed subscribers the change was delivered to
    pub subscribers: usize,
}

/// POST /api/changes
pub async fn ingest_change(
    State(state): State<AppState>,
    Json(change): Json<RowChange>,
) -> Json<IngestResponse> {
    debug!(
        "Ingesting {} for application {}",
        change.change_type(),
        change.target_id()
    );

    let subscribers = state.feed.emit(change).unwrap_or(0);
    Json(IngestResponse {
        accepted: true,
        subscribers,
    })
}
