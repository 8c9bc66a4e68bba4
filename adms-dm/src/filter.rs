//! Client-side filter predicate for application rows
//!
//! List-query caches are keyed by a filter set; the reconciler re-evaluates
//! the same predicate against changed rows to decide cache membership, so
//! the predicate must be a pure total function.

use adms_common::models::{ApplicationRow, ApplicationStatus, PaymentStatus};
use adms_common::time::parse_timestamp;
use chrono::{Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// One filter set as selected in the admin dashboard
///
/// An absent dimension always passes (the HTTP layer maps the `all`
/// sentinel to `None` before a filter is built).
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ApplicationFilter {
    pub status: Option<ApplicationStatus>,
    pub program: Option<String>,
    pub institution: Option<String>,
    pub payment_status: Option<PaymentStatus>,
    /// Restrict to rows owned by the ambient current user
    pub mine: bool,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
    pub search: Option<String>,
}

impl ApplicationFilter {
    /// True when no dimension is active (every row passes)
    pub fn is_empty(&self) -> bool {
        *self == ApplicationFilter::default()
    }
}

/// Evaluate a filter set against one row. Dimensions combine with AND.
pub fn matches(
    row: &ApplicationRow,
    filter: &ApplicationFilter,
    current_user: Option<&str>,
) -> bool {
    if let Some(status) = filter.status {
        if row.effective_status() != status {
            return false;
        }
    }

    if let Some(program) = filter.program.as_deref() {
        if row.program.as_deref() != Some(program) {
            return false;
        }
    }

    if let Some(institution) = filter.institution.as_deref() {
        if row.institution.as_deref() != Some(institution) {
            return false;
        }
    }

    if let Some(payment_status) = filter.payment_status {
        if row.effective_payment_status() != payment_status {
            return false;
        }
    }

    if filter.mine {
        match current_user {
            Some(user) => {
                if row.user_id.as_deref() != Some(user) {
                    return false;
                }
            }
            // Ownership filter without an ambient user matches nothing
            None => return false,
        }
    }

    if filter.date_from.is_some() || filter.date_to.is_some() {
        // A row whose creation timestamp is missing or malformed is
        // excluded whenever a range is active.
        let created = match row.created_at.as_deref().and_then(parse_timestamp) {
            Some(ts) => ts,
            None => return false,
        };
        if let Some(from) = filter.date_from {
            let start = Utc.from_utc_datetime(&from.and_time(NaiveTime::MIN));
            if created < start {
                return false;
            }
        }
        if let Some(to) = filter.date_to {
            // Inclusive through the end of the `to` day
            let end = Utc.from_utc_datetime(&to.and_time(NaiveTime::MIN)) + Duration::days(1);
            if created >= end {
                return false;
            }
        }
    }

    if let Some(term) = filter.search.as_deref() {
        let needle = normalize_search_term(term);
        if !needle.is_empty() && !search_hit(row, &needle) {
            return false;
        }
    }

    true
}

/// Lowercase, trim, and strip SQL wildcard characters from a search term
pub fn normalize_search_term(term: &str) -> String {
    term.trim()
        .to_lowercase()
        .replace(['%', '_'], "")
}

fn search_hit(row: &ApplicationRow, needle: &str) -> bool {
    [
        row.application_number.as_deref(),
        row.full_name.as_deref(),
        row.email.as_deref(),
        row.phone.as_deref(),
        row.nrc_number.as_deref(),
        row.passport_number.as_deref(),
    ]
    .iter()
    .any(|field| {
        field
            .map(|value| value.to_lowercase().contains(needle))
            .unwrap_or(false)
    })
}
