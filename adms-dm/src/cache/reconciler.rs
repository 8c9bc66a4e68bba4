//! Change-event reconciliation against the resident caches
//!
//! Applies one row change to the stats record, the activity feed, every
//! resident list page, and the flat list, in that order, without ever
//! triggering a fetch. Each step is a plain function over the cache
//! contents; the orchestrator in `apply` composes them and produces the
//! observer notice.

use adms_common::events::RowChange;
use adms_common::models::{ApplicationRow, ApplicationStatus};
use adms_common::time::parse_timestamp;
use chrono::{DateTime, Utc};

use super::{
    ActivityEntry, ActivityKind, CacheInner, CachedPage, ChangeNotice, ListKey,
    RECENT_ACTIVITY_LIMIT,
};
use crate::delta::compute_delta;
use crate::filter::matches;
use crate::projector::project;

/// Apply one change event to every resident cache and build its notice
pub(super) fn apply(
    inner: &mut CacheInner,
    change: &RowChange,
    current_user: Option<&str>,
    now: DateTime<Utc>,
) -> ChangeNotice {
    let delta = compute_delta(change, now);
    inner.stats.apply(&delta);

    let activity = match change.new_row() {
        // Deletes carry no new row and leave the activity feed untouched
        Some(row) => {
            let entry = build_activity(row);
            if let Some(entry) = entry.clone() {
                push_activity(&mut inner.activity, entry);
            }
            entry
        }
        None => None,
    };

    for (key, page) in inner.lists.iter_mut() {
        apply_to_list(key, page, change, current_user);
    }

    apply_to_flat(&mut inner.all, change);

    ChangeNotice {
        change_type: change.change_type().to_string(),
        target_id: change.target_id().to_string(),
        new_row: change.new_row().cloned(),
        old_row: change.old_row().cloned(),
        delta,
        activity,
    }
}

/// Build an activity entry from a row, when it has a usable timestamp
pub(super) fn build_activity(row: &ApplicationRow) -> Option<ActivityEntry> {
    let timestamp = row
        .updated_at
        .as_deref()
        .or(row.created_at.as_deref())
        .and_then(parse_timestamp)?;

    let name = row
        .full_name
        .clone()
        .unwrap_or_else(|| "Unknown applicant".to_string());
    let (kind, message) = match row.effective_status() {
        ApplicationStatus::Approved => (
            ActivityKind::Approval,
            format!("{}'s application was approved", name),
        ),
        ApplicationStatus::Rejected => (
            ActivityKind::Rejection,
            format!("{}'s application was rejected", name),
        ),
        _ => (
            ActivityKind::Application,
            format!("New application from {}", name),
        ),
    };

    Some(ActivityEntry {
        id: row.id.clone(),
        kind,
        message,
        timestamp,
        user: name,
    })
}

/// Rebuild the activity feed from a full row set (hydration path)
pub(super) fn seed_activity(rows: &[ApplicationRow]) -> Vec<ActivityEntry> {
    let mut feed = Vec::new();
    for row in rows {
        if let Some(entry) = build_activity(row) {
            push_activity(&mut feed, entry);
        }
    }
    feed
}

/// Insert an entry into the feed: drop any prior entry for the same row,
/// keep most-recent-first order, cap the length.
fn push_activity(feed: &mut Vec<ActivityEntry>, entry: ActivityEntry) {
    feed.retain(|existing| existing.id != entry.id);
    feed.push(entry);
    feed.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    feed.truncate(RECENT_ACTIVITY_LIMIT);
}

/// Apply one change to a single resident list page
fn apply_to_list(
    key: &ListKey,
    page: &mut CachedPage,
    change: &RowChange,
    current_user: Option<&str>,
) {
    match change {
        RowChange::Insert { new } => {
            if matches(new, &key.filter, current_user) {
                page.total_count += 1;
                if key.is_first_page() {
                    page.applications.insert(0, project(new));
                    page.applications.truncate(key.page_size as usize);
                }
            }
        }

        RowChange::Update { new, old } => {
            let new_matches = matches(new, &key.filter, current_user);
            // A feed that omits the prior row leaves the membership
            // transition unknown; treat it as unchanged so the count
            // cannot drift from guesses.
            let old_matches = old
                .as_ref()
                .map(|row| matches(row, &key.filter, current_user))
                .unwrap_or(new_matches);
            let position = page.applications.iter().position(|s| s.id == new.id);

            if new_matches {
                if !old_matches {
                    page.total_count += 1;
                }
                if let Some(index) = position {
                    page.applications[index] = project(new);
                } else if key.is_first_page() {
                    page.applications.insert(0, project(new));
                    page.applications.truncate(key.page_size as usize);
                }
                // Later pages never take an insertion; the row surfaces
                // there only on the next refetch.
            } else if old_matches {
                if let Some(index) = position {
                    page.applications.remove(index);
                }
                page.total_count = page.total_count.saturating_sub(1);
            }
        }

        RowChange::Delete { old } => {
            if matches(old, &key.filter, current_user) {
                if let Some(index) = page.applications.iter().position(|s| s.id == old.id) {
                    page.applications.remove(index);
                }
                page.total_count = page.total_count.saturating_sub(1);
            }
        }
    }
}

/// Upsert-by-id against the flat all-applications collection
fn apply_to_flat(all: &mut Vec<ApplicationRow>, change: &RowChange) {
    match change {
        RowChange::Insert { new } | RowChange::Update { new, .. } => {
            if let Some(index) = all.iter().position(|row| row.id == new.id) {
                all[index] = new.clone();
            } else {
                all.insert(0, new.clone());
            }
        }
        RowChange::Delete { old } => {
            all.retain(|row| row.id != old.id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn row(id: &str, status: ApplicationStatus, stamp: &str) -> ApplicationRow {
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
            created_at: Some(stamp.to_string()),
            submitted_at: None,
            updated_at: Some(stamp.to_string()),
            user_id: None,
        }
    }

    #[test]
    fn test_build_activity_kinds() {
        let approved = row("a1", ApplicationStatus::Approved, "2026-03-01T10:00:00Z");
        let entry = build_activity(&approved).expect("usable timestamp");
        assert_eq!(entry.kind, ActivityKind::Approval);
        assert!(entry.message.contains("approved"));

        let rejected = row("a2", ApplicationStatus::Rejected, "2026-03-01T10:00:00Z");
        let entry = build_activity(&rejected).expect("usable timestamp");
        assert_eq!(entry.kind, ActivityKind::Rejection);

        let submitted = row("a3", ApplicationStatus::Submitted, "2026-03-01T10:00:00Z");
        let entry = build_activity(&submitted).expect("usable timestamp");
        assert_eq!(entry.kind, ActivityKind::Application);
        assert_eq!(entry.user, "Applicant a3");
    }

    #[test]
    fn test_build_activity_requires_usable_timestamp() {
        let mut subject = row("a1", ApplicationStatus::Submitted, "2026-03-01T10:00:00Z");
        subject.updated_at = Some("garbage".to_string());
        subject.created_at = None;
        assert!(build_activity(&subject).is_none());

        // Falls back from a bad updated_at to a good created_at
        subject.created_at = Some("2026-03-01T10:00:00Z".to_string());
        assert!(build_activity(&subject).is_some());
    }

    #[test]
    fn test_push_activity_caps_and_orders() {
        let base = parse_timestamp("2026-03-01T00:00:00Z").expect("base");
        let mut feed = Vec::new();
        for i in 0..8 {
            let mut entry = build_activity(&row(
                &format!("a{}", i),
                ApplicationStatus::Submitted,
                "2026-03-01T00:00:00Z",
            ))
            .expect("entry");
            entry.timestamp = base + Duration::minutes(i);
            push_activity(&mut feed, entry);
        }

        assert_eq!(feed.len(), RECENT_ACTIVITY_LIMIT);
        for pair in feed.windows(2) {
            assert!(pair[0].timestamp >= pair[1].timestamp);
        }
        // The newest entries survived
        assert_eq!(feed[0].id, "a7");
    }

    #[test]
    fn test_push_activity_dedupes_by_id() {
        let mut feed = Vec::new();
        let entry = build_activity(&row("a1", ApplicationStatus::Submitted, "2026-03-01T00:00:00Z"))
            .expect("entry");
        push_activity(&mut feed, entry);

        let updated = build_activity(&row("a1", ApplicationStatus::Approved, "2026-03-02T00:00:00Z"))
            .expect("entry");
        push_activity(&mut feed, updated);

        assert_eq!(feed.len(), 1);
        assert_eq!(feed[0].kind, ActivityKind::Approval);
    }

    #[test]
    fn test_out_of_order_arrival_stays_sorted() {
        let mut feed = Vec::new();
        let newer = build_activity(&row("a1", ApplicationStatus::Submitted, "2026-03-02T00:00:00Z"))
            .expect("entry");
        let older = build_activity(&row("a2", ApplicationStatus::Submitted, "2026-03-01T00:00:00Z"))
            .expect("entry");
        push_activity(&mut feed, newer);
        push_activity(&mut feed, older);

        assert_eq!(feed[0].id, "a1");
        assert_eq!(feed[1].id, "a2");
    }

    #[test]
    fn test_flat_upsert_and_delete() {
        let mut all = vec![row("a1", ApplicationStatus::Submitted, "2026-03-01T00:00:00Z")];

        // Insert of a new id prepends
        apply_to_flat(
            &mut all,
            &RowChange::Insert {
                new: row("a2", ApplicationStatus::Draft, "2026-03-02T00:00:00Z"),
            },
        );
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].id, "a2");

        // Update of an existing id replaces in place
        apply_to_flat(
            &mut all,
            &RowChange::Update {
                new: row("a1", ApplicationStatus::Approved, "2026-03-03T00:00:00Z"),
                old: None,
            },
        );
        assert_eq!(all.len(), 2);
        assert_eq!(all[1].status, Some(ApplicationStatus::Approved));

        // Delete removes by id
        apply_to_flat(
            &mut all,
            &RowChange::Delete {
                old: row("a1", ApplicationStatus::Approved, "2026-03-03T00:00:00Z"),
            },
        );
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].id, "a2");
    }
}
