//! Aggregate stats endpoint

use axum::extract::State;
use axum::Json;

use crate::cache::DashboardStats;
use crate::AppState;

/// GET /api/stats
///
/// Current aggregate counters from the stats cache.
pub async fn get_stats(State(state): State<AppState>) -> Json<DashboardStats> {
    Json(state.cache.stats().await)
}
