//! Recent-activity endpoint

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::cache::ActivityEntry;
use crate::AppState;

/// Recent-activity response
#[derive(Debug, Serialize)]
pub struct ActivityResponse {
    pub activities: Vec<ActivityEntry>,
}

/// GET /api/activity
///
/// The recent-activity feed, most recent first, at most 5 entries.
pub async fn get_activity(State(state): State<AppState>) -> Json<ActivityResponse> {
    Json(ActivityResponse {
        activities: state.cache.recent_activity().await,
    })
}
