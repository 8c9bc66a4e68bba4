//! Cached read models for the admin dashboard
//!
//! Four independently-keyed caches live behind one shared handle: the
//! aggregate stats record, the recent-activity feed, one page per resident
//! list query, and the flat all-applications collection. The reconciler
//! keeps them consistent with the change feed between full rehydrations;
//! they are best-effort mirrors, never the source of truth.

mod reconciler;

use adms_common::events::RowChange;
use adms_common::models::{ApplicationRow, ApplicationSummary};
use adms_common::time::parse_timestamp;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::delta::{insertion_delta, MetricsDelta};
use crate::filter::{matches, ApplicationFilter};
use crate::pagination::calculate_pagination;
use crate::projector::project;

/// Maximum number of entries retained in the recent-activity feed
pub const RECENT_ACTIVITY_LIMIT: usize = 5;

/// Aggregate dashboard counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardStats {
    pub total: u64,
    pub pending: u64,
    pub approved: u64,
    pub rejected: u64,
    pub today: u64,
    pub this_week: u64,
    pub this_month: u64,
}

impl DashboardStats {
    /// Apply a metrics delta, saturating every counter at zero.
    ///
    /// Duplicate or out-of-order feed delivery can drive a counter below
    /// its true value; the clamp keeps the displayed numbers non-negative
    /// until the next rehydration corrects them.
    pub fn apply(&mut self, delta: &MetricsDelta) {
        self.total = add_clamped(self.total, delta.total);
        self.pending = add_clamped(self.pending, delta.pending);
        self.approved = add_clamped(self.approved, delta.approved);
        self.rejected = add_clamped(self.rejected, delta.rejected);
        self.today = add_clamped(self.today, delta.today);
        self.this_week = add_clamped(self.this_week, delta.this_week);
        self.this_month = add_clamped(self.this_month, delta.this_month);
    }

    /// Fold the full row set into aggregate counters (hydration path)
    pub fn from_rows(rows: &[ApplicationRow], now: DateTime<Utc>) -> Self {
        let mut stats = DashboardStats::default();
        for row in rows {
            stats.apply(&insertion_delta(row, now));
        }
        stats
    }
}

fn add_clamped(current: u64, delta: i64) -> u64 {
    if delta >= 0 {
        current.saturating_add(delta as u64)
    } else {
        current.saturating_sub(delta.unsigned_abs())
    }
}

/// Kind of a recent-activity entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityKind {
    Application,
    Approval,
    Rejection,
}

/// One entry in the recent-activity feed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityEntry {
    pub id: String,
    pub kind: ActivityKind,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    pub user: String,
}

/// Identity of one cached list query: a filter set plus its page window
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ListKey {
    pub filter: ApplicationFilter,
    /// 1-indexed page number
    pub page: u64,
    pub page_size: u64,
}

impl ListKey {
    pub fn new(filter: ApplicationFilter, page: u64, page_size: u64) -> Self {
        Self {
            filter,
            page,
            page_size,
        }
    }

    /// Only the first page may receive newly-arrived rows; later pages
    /// cannot take an insertion without a full refetch.
    pub fn is_first_page(&self) -> bool {
        self.page <= 1
    }
}

/// One cached page of a list query
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CachedPage {
    pub applications: Vec<ApplicationSummary>,
    pub total_count: u64,
}

/// Observer payload forwarded once per processed change event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangeNotice {
    pub change_type: String,
    pub target_id: String,
    pub new_row: Option<ApplicationRow>,
    pub old_row: Option<ApplicationRow>,
    pub delta: MetricsDelta,
    pub activity: Option<ActivityEntry>,
}

struct CacheInner {
    stats: DashboardStats,
    activity: Vec<ActivityEntry>,
    lists: HashMap<ListKey, CachedPage>,
    all: Vec<ApplicationRow>,
}

/// Shared handle over the dashboard's cached read models
///
/// An explicit value injected into the subscription manager and the HTTP
/// state; cloning shares the underlying store. All mutation happens under
/// one write lock, so each change event is applied to every cache before
/// any reader can observe a partial update.
#[derive(Clone)]
pub struct DashboardCache {
    inner: Arc<RwLock<CacheInner>>,
    current_user: Option<String>,
}

impl DashboardCache {
    /// Create an empty cache store
    ///
    /// `current_user` is the ambient admin user id consulted by the
    /// ownership (`mine`) filter dimension.
    pub fn new(current_user: Option<String>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(CacheInner {
                stats: DashboardStats::default(),
                activity: Vec::new(),
                lists: HashMap::new(),
                all: Vec::new(),
            })),
            current_user,
        }
    }

    /// Ambient user id used by the ownership filter
    pub fn current_user(&self) -> Option<&str> {
        self.current_user.as_deref()
    }

    /// Seed every cache from a full row set, discarding prior contents.
    ///
    /// Stats are folded from the rows, the activity feed is rebuilt from
    /// the most recent rows, the flat list takes the rows as-is, and all
    /// resident list pages are dropped (they repopulate on demand).
    pub async fn hydrate(&self, rows: Vec<ApplicationRow>, now: DateTime<Utc>) {
        let mut inner = self.inner.write().await;
        inner.stats = DashboardStats::from_rows(&rows, now);
        inner.activity = reconciler::seed_activity(&rows);
        inner.lists.clear();
        inner.all = rows;
    }

    /// Current aggregate counters
    pub async fn stats(&self) -> DashboardStats {
        self.inner.read().await.stats
    }

    /// Current activity feed, most recent first
    pub async fn recent_activity(&self) -> Vec<ActivityEntry> {
        self.inner.read().await.activity.clone()
    }

    /// Resident page for a list query, if any
    pub async fn list_page(&self, key: &ListKey) -> Option<CachedPage> {
        self.inner.read().await.lists.get(key).cloned()
    }

    /// Store a page under its query key
    pub async fn put_list_page(&self, key: ListKey, page: CachedPage) {
        self.inner.write().await.lists.insert(key, page);
    }

    /// Enumerate the query keys currently resident in the list cache
    pub async fn list_keys(&self) -> Vec<ListKey> {
        self.inner.read().await.lists.keys().cloned().collect()
    }

    /// Full rows currently held by the flat cache
    pub async fn all_applications(&self) -> Vec<ApplicationRow> {
        self.inner.read().await.all.clone()
    }

    /// Read-through lookup: return the resident page for `key`, or build
    /// it from the flat cache (filter, newest first, paginate), store it,
    /// and return it.
    pub async fn fetch_or_build_page(&self, key: &ListKey) -> CachedPage {
        let mut guard = self.inner.write().await;
        let inner = &mut *guard;
        if let Some(page) = inner.lists.get(key) {
            return page.clone();
        }

        let mut matched: Vec<&ApplicationRow> = inner
            .all
            .iter()
            .filter(|row| matches(row, &key.filter, self.current_user.as_deref()))
            .collect();
        matched.sort_by_key(|row| {
            Reverse(row.effective_created_at().and_then(parse_timestamp))
        });

        let total_count = matched.len() as u64;
        let offset = calculate_pagination(total_count, key.page).offset as usize;
        let applications = matched
            .into_iter()
            .skip(offset)
            .take(key.page_size as usize)
            .map(project)
            .collect();

        let page = CachedPage {
            applications,
            total_count,
        };
        inner.lists.insert(key.clone(), page.clone());
        page
    }

    /// Apply one change event to every resident cache, stamping it with
    /// the current wall-clock time.
    pub async fn apply_change(&self, change: &RowChange) -> ChangeNotice {
        self.apply_change_at(change, Utc::now()).await
    }

    /// Apply one change event at an explicit event-processing time.
    ///
    /// Runs the whole pipeline (delta, activity, list pages, flat list)
    /// under a single write acquisition and returns the notice for
    /// observer forwarding.
    pub async fn apply_change_at(&self, change: &RowChange, now: DateTime<Utc>) -> ChangeNotice {
        let mut inner = self.inner.write().await;
        reconciler::apply(&mut inner, change, self.current_user.as_deref(), now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use adms_common::models::ApplicationStatus;

    fn row(id: &str, status: ApplicationStatus, created_at: &str) -> ApplicationRow {
        ApplicationRow {
            id: id.to_string(),
            application_number: Some(format!("APP-{}", id)),
            full_name: Some(format!("Applicant {}", id)),
            email: None,
            phone: None,
            nrc_number: None,
            passport_number: None,
            program: None,
            intake: None,
            institution: None,
            status: Some(status),
            payment_status: None,
            application_fee: None,
            paid_amount: None,
            result_slip_url: None,
            pop_url: None,
            created_at: Some(created_at.to_string()),
            submitted_at: None,
            updated_at: Some(created_at.to_string()),
            user_id: None,
        }
    }

    fn fixed_now() -> DateTime<Utc> {
        parse_timestamp("2026-03-15T12:00:00Z").expect("fixed now")
    }

    #[test]
    fn test_stats_apply_clamps_at_zero() {
        let mut stats = DashboardStats {
            total: 1,
            ..Default::default()
        };
        stats.apply(&MetricsDelta {
            total: -5,
            pending: -1,
            ..Default::default()
        });
        assert_eq!(stats.total, 0);
        assert_eq!(stats.pending, 0);
    }

    #[test]
    fn test_stats_from_rows() {
        let rows = vec![
            row("a1", ApplicationStatus::Submitted, "2026-03-15T09:00:00Z"),
            row("a2", ApplicationStatus::Approved, "2026-03-10T09:00:00Z"),
            row("a3", ApplicationStatus::Draft, "2025-01-01T09:00:00Z"),
        ];
        let stats = DashboardStats::from_rows(&rows, fixed_now());

        assert_eq!(stats.total, 3);
        assert_eq!(stats.pending, 1);
        assert_eq!(stats.approved, 1);
        assert_eq!(stats.rejected, 0);
        assert_eq!(stats.today, 1);
        assert_eq!(stats.this_week, 2);
        assert_eq!(stats.this_month, 2);
    }

    #[tokio::test]
    async fn test_hydrate_seeds_all_caches() {
        let cache = DashboardCache::new(None);
        let rows = vec![
            row("a1", ApplicationStatus::Submitted, "2026-03-15T09:00:00Z"),
            row("a2", ApplicationStatus::Approved, "2026-03-14T09:00:00Z"),
        ];
        cache.hydrate(rows, fixed_now()).await;

        assert_eq!(cache.stats().await.total, 2);
        assert_eq!(cache.all_applications().await.len(), 2);
        assert!(cache.list_keys().await.is_empty());

        let activity = cache.recent_activity().await;
        assert_eq!(activity.len(), 2);
        // Most recent first
        assert_eq!(activity[0].id, "a1");
    }

    #[tokio::test]
    async fn test_fetch_or_build_page_populates_and_hits() {
        let cache = DashboardCache::new(None);
        let rows: Vec<ApplicationRow> = (0..25)
            .map(|i| {
                row(
                    &format!("a{:02}", i),
                    ApplicationStatus::Submitted,
                    &format!("2026-03-01T{:02}:00:00Z", i % 24),
                )
            })
            .collect();
        cache.hydrate(rows, fixed_now()).await;

        let key = ListKey::new(ApplicationFilter::default(), 1, 20);
        let page = cache.fetch_or_build_page(&key).await;
        assert_eq!(page.total_count, 25);
        assert_eq!(page.applications.len(), 20);

        // Second page holds the remainder
        let key2 = ListKey::new(ApplicationFilter::default(), 2, 20);
        let page2 = cache.fetch_or_build_page(&key2).await;
        assert_eq!(page2.applications.len(), 5);

        // Both keys are now resident
        assert_eq!(cache.list_keys().await.len(), 2);
        assert_eq!(cache.list_page(&key).await.expect("resident"), page);
    }

    #[tokio::test]
    async fn test_fetch_or_build_page_newest_first() {
        let cache = DashboardCache::new(None);
        let rows = vec![
            row("old", ApplicationStatus::Submitted, "2026-01-01T00:00:00Z"),
            row("new", ApplicationStatus::Submitted, "2026-03-01T00:00:00Z"),
            row("mid", ApplicationStatus::Submitted, "2026-02-01T00:00:00Z"),
        ];
        cache.hydrate(rows, fixed_now()).await;

        let key = ListKey::new(ApplicationFilter::default(), 1, 20);
        let page = cache.fetch_or_build_page(&key).await;
        let ids: Vec<&str> = page.applications.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["new", "mid", "old"]);
    }
}
