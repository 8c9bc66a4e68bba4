//! Subscription status endpoint

use axum::extract::State;
use axum::Json;

use crate::subscription::SubscriptionStatus;
use crate::AppState;

/// GET /api/status
///
/// Advisory connection state of the change-feed subscription. Nothing in
/// the reconciliation pipeline depends on it; it exists for UI display.
pub async fn get_status(State(state): State<AppState>) -> Json<SubscriptionStatus> {
    Json(state.subscription.read().await.status().await)
}
