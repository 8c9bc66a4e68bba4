//! Metrics delta calculation
//!
//! Turns one row-change event into the signed adjustments the stats cache
//! applies to its counters. `now` is supplied by the caller (event-processing
//! time) so the calculation stays a pure function.

use adms_common::events::RowChange;
use adms_common::models::{ApplicationRow, ApplicationStatus};
use adms_common::time::parse_timestamp;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Signed adjustment to the aggregate dashboard counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricsDelta {
    pub total: i64,
    pub pending: i64,
    pub approved: i64,
    pub rejected: i64,
    pub today: i64,
    pub this_week: i64,
    pub this_month: i64,
}

impl MetricsDelta {
    /// True when every field is zero
    pub fn is_zero(&self) -> bool {
        *self == MetricsDelta::default()
    }

    /// The same delta with all signs negated
    pub fn negated(self) -> Self {
        MetricsDelta {
            total: -self.total,
            pending: -self.pending,
            approved: -self.approved,
            rejected: -self.rejected,
            today: -self.today,
            this_week: -self.this_week,
            this_month: -self.this_month,
        }
    }
}

/// Compute the counter adjustments for one change event
///
/// Insert counts the new row in, delete mirrors it out, and update moves a
/// row between status buckets when its effective status actually changed.
/// Time buckets are computed on insert/delete only: creation timestamps are
/// immutable, so an update cannot move a row between buckets.
pub fn compute_delta(change: &RowChange, now: DateTime<Utc>) -> MetricsDelta {
    match change {
        RowChange::Insert { new } => presence_delta(new, now, 1),
        RowChange::Delete { old } => presence_delta(old, now, -1),
        RowChange::Update { new, old } => {
            let mut delta = MetricsDelta::default();
            let new_status = new.effective_status();
            // Without the prior row the transition is unknown; treat the
            // status as unchanged and leave every counter alone.
            let old_status = old
                .as_ref()
                .map(|row| row.effective_status())
                .unwrap_or(new_status);
            if new_status != old_status {
                bump_status(&mut delta, old_status, -1);
                bump_status(&mut delta, new_status, 1);
            }
            delta
        }
    }
}

/// Full contribution of one row to the counters, as if newly inserted.
///
/// Also the hydration fold: summing this over every row yields the same
/// stats the event stream would have produced.
pub fn insertion_delta(row: &ApplicationRow, now: DateTime<Utc>) -> MetricsDelta {
    presence_delta(row, now, 1)
}

/// Full contribution of one row to the counters, signed for insert/delete
fn presence_delta(row: &ApplicationRow, now: DateTime<Utc>, sign: i64) -> MetricsDelta {
    let mut delta = MetricsDelta {
        total: sign,
        ..Default::default()
    };
    bump_status(&mut delta, row.effective_status(), sign);

    if let Some(ts) = row.effective_created_at().and_then(parse_timestamp) {
        if ts >= now - Duration::days(1) {
            delta.today += sign;
        }
        if ts >= now - Duration::days(7) {
            delta.this_week += sign;
        }
        if ts >= now - Duration::days(30) {
            delta.this_month += sign;
        }
    }

    delta
}

/// A row contributes to at most one status bucket; draft and under_review
/// contribute to none.
fn bump_status(delta: &mut MetricsDelta, status: ApplicationStatus, sign: i64) {
    match status {
        ApplicationStatus::Submitted => delta.pending += sign,
        ApplicationStatus::Approved => delta.approved += sign,
        ApplicationStatus::Rejected => delta.rejected += sign,
        ApplicationStatus::Draft | ApplicationStatus::UnderReview => {}
    }
}
