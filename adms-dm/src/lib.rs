//! adms-dm library - Dashboard Metrics module
//!
//! Keeps the admin dashboard's cached read models (aggregate stats, recent
//! activity, paginated application lists, flat application collection)
//! consistent with the applications table as row-change events arrive on
//! the change feed, without re-fetching from the source of truth per event.

use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;
use tokio::sync::RwLock;
use tower_http::trace::TraceLayer;

use adms_common::events::ChangeFeed;

pub mod api;
pub mod cache;
pub mod db;
pub mod delta;
pub mod filter;
pub mod pagination;
pub mod projector;
pub mod subscription;

use cache::DashboardCache;
use subscription::SubscriptionManager;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// The dashboard's cached read models
    pub cache: DashboardCache,
    /// Change feed the ingest webhook publishes into
    pub feed: ChangeFeed,
    /// Subscription lifecycle owner (status + notice fan-out)
    pub subscription: Arc<RwLock<SubscriptionManager>>,
}

impl AppState {
    /// Create new application state
    pub fn new(
        cache: DashboardCache,
        feed: ChangeFeed,
        subscription: Arc<RwLock<SubscriptionManager>>,
    ) -> Self {
        Self {
            cache,
            feed,
            subscription,
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(api::health_check))
        .route("/api/stats", get(api::get_stats))
        .route("/api/activity", get(api::get_activity))
        .route("/api/applications", get(api::list_applications))
        .route("/api/status", get(api::get_status))
        .route("/api/events", get(api::event_stream))
        .route("/api/changes", post(api::ingest_change))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
