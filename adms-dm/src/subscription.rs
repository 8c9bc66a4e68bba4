//! Change-feed subscription lifecycle
//!
//! Owns the single worker task that drains the change feed into the cache
//! reconciler and fans processed notices out to observers. Connection state
//! is advisory: it is surfaced for UI consumption, and nothing in the
//! reconciliation pipeline consults it.

use adms_common::events::{ChangeFeed, RowChange};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::{broadcast, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::cache::{ChangeNotice, DashboardCache};

/// Connection state of the feed subscription
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    Connected,
    Error,
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConnectionState::Disconnected => write!(f, "disconnected"),
            ConnectionState::Connecting => write!(f, "connecting"),
            ConnectionState::Connected => write!(f, "connected"),
            ConnectionState::Error => write!(f, "error"),
        }
    }
}

/// Snapshot of the subscription surfaced to UI consumers
#[derive(Debug, Clone, Serialize)]
pub struct SubscriptionStatus {
    pub state: ConnectionState,
    pub is_connected: bool,
    pub error: Option<String>,
    pub last_event_at: Option<DateTime<Utc>>,
    pub channel: Option<String>,
}

#[derive(Debug, Default)]
struct StatusInner {
    state: ConnectionState,
    error: Option<String>,
    last_event_at: Option<DateTime<Utc>>,
    channel: Option<String>,
}

/// Manages the lifecycle of the change-feed subscription
pub struct SubscriptionManager {
    cache: DashboardCache,
    status: Arc<RwLock<StatusInner>>,
    notices: broadcast::Sender<ChangeNotice>,
    worker: Option<JoinHandle<()>>,
}

impl SubscriptionManager {
    /// Create a manager in the disconnected state
    ///
    /// `notice_capacity` bounds the observer broadcast buffer.
    pub fn new(cache: DashboardCache, notice_capacity: usize) -> Self {
        let (notices, _) = broadcast::channel(notice_capacity);
        Self {
            cache,
            status: Arc::new(RwLock::new(StatusInner::default())),
            notices,
            worker: None,
        }
    }

    /// Open a subscription against a change feed.
    ///
    /// Any existing worker is torn down first, so duplicate listeners can
    /// never process the same feed.
    pub async fn start(&mut self, feed: &ChangeFeed) {
        self.teardown().await;

        {
            let mut status = self.status.write().await;
            status.state = ConnectionState::Connecting;
            status.error = None;
            status.channel = Some(feed.channel().to_string());
        }

        let rx = feed.subscribe();

        {
            let mut status = self.status.write().await;
            status.state = ConnectionState::Connected;
        }
        info!("Subscribed to change feed '{}'", feed.channel());

        let cache = self.cache.clone();
        let status = self.status.clone();
        let notices = self.notices.clone();
        self.worker = Some(tokio::spawn(run_loop(rx, cache, status, notices)));
    }

    /// Re-open the subscription (channel or identity change)
    pub async fn resubscribe(&mut self, feed: &ChangeFeed) {
        info!("Re-subscribing to change feed '{}'", feed.channel());
        self.start(feed).await;
    }

    /// Release the worker and return to the disconnected state
    pub async fn teardown(&mut self) {
        if let Some(worker) = self.worker.take() {
            worker.abort();
        }
        let mut status = self.status.write().await;
        status.state = ConnectionState::Disconnected;
    }

    /// Current subscription status snapshot
    pub async fn status(&self) -> SubscriptionStatus {
        let status = self.status.read().await;
        SubscriptionStatus {
            state: status.state,
            is_connected: status.state == ConnectionState::Connected,
            error: status.error.clone(),
            last_event_at: status.last_event_at,
            channel: status.channel.clone(),
        }
    }

    /// Subscribe to the per-event notices produced after reconciliation
    pub fn subscribe_notices(&self) -> broadcast::Receiver<ChangeNotice> {
        self.notices.subscribe()
    }
}

impl Drop for SubscriptionManager {
    fn drop(&mut self) {
        if let Some(worker) = self.worker.take() {
            worker.abort();
        }
    }
}

/// Worker loop: one event at a time, processed to completion
/// (delta → reconcile → notify) before the next is received.
async fn run_loop(
    mut rx: broadcast::Receiver<RowChange>,
    cache: DashboardCache,
    status: Arc<RwLock<StatusInner>>,
    notices: broadcast::Sender<ChangeNotice>,
) {
    loop {
        match rx.recv().await {
            Ok(change) => {
                debug!(
                    "Processing {} for application {}",
                    change.change_type(),
                    change.target_id()
                );
                let notice = cache.apply_change(&change).await;
                {
                    let mut status = status.write().await;
                    status.last_event_at = Some(Utc::now());
                }
                let _ = notices.send(notice);
            }
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                // Non-fatal: the caches missed events and will drift until
                // the next rehydration, but processing continues.
                warn!("Change feed lagged, {} events skipped", skipped);
                let mut status = status.write().await;
                status.error = Some(format!("Feed lagged; {} events were skipped", skipped));
            }
            Err(broadcast::error::RecvError::Closed) => {
                warn!("Change feed closed, ending subscription");
                let mut status = status.write().await;
                status.state = ConnectionState::Error;
                status.error = Some("Change feed closed".to_string());
                break;
            }
        }
    }
}
