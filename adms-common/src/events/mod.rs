//! Row-change event types and the change feed bus
//!
//! Provides the shared change-event definition and the ChangeFeed used to
//! move row changes from the ingest boundary to cache subscribers.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::models::ApplicationRow;

/// A row-level change to the applications table
///
/// Produced once per mutation of the source of truth (by the ingest webhook
/// or an in-process publisher), consumed by the cache reconciler, then
/// discarded. Serialized form uses a lowercase `type` tag, matching the
/// hosted platform's change-record shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum RowChange {
    /// A new application row was inserted
    Insert {
        /// The inserted row
        new: ApplicationRow,
    },

    /// An existing application row was updated
    Update {
        /// The row after the update
        new: ApplicationRow,
        /// The row before the update, when the feed supplies it
        old: Option<ApplicationRow>,
    },

    /// An application row was deleted
    Delete {
        /// The row before deletion
        old: ApplicationRow,
    },
}

impl RowChange {
    /// Get change type as string for filtering and logging
    pub fn change_type(&self) -> &'static str {
        match self {
            RowChange::Insert { .. } => "insert",
            RowChange::Update { .. } => "update",
            RowChange::Delete { .. } => "delete",
        }
    }

    /// Identifier of the row this change targets
    pub fn target_id(&self) -> &str {
        match self {
            RowChange::Insert { new } => &new.id,
            RowChange::Update { new, .. } => &new.id,
            RowChange::Delete { old } => &old.id,
        }
    }

    /// Row state after the change (insert/update only)
    pub fn new_row(&self) -> Option<&ApplicationRow> {
        match self {
            RowChange::Insert { new } => Some(new),
            RowChange::Update { new, .. } => Some(new),
            RowChange::Delete { .. } => None,
        }
    }

    /// Row state before the change (update/delete only)
    pub fn old_row(&self) -> Option<&ApplicationRow> {
        match self {
            RowChange::Insert { .. } => None,
            RowChange::Update { old, .. } => old.as_ref(),
            RowChange::Delete { old } => Some(old),
        }
    }
}

/// Broadcast bus carrying row changes for one named channel
///
/// Wraps tokio::broadcast, providing:
/// - Non-blocking publish (slow subscribers don't block producers)
/// - Multiple concurrent subscribers
/// - Automatic cleanup when subscribers drop
/// - Lagged message detection for slow subscribers
#[derive(Clone)]
pub struct ChangeFeed {
    tx: broadcast::Sender<RowChange>,
    channel: String,
    capacity: usize,
}

impl ChangeFeed {
    /// Creates a new ChangeFeed scoped to a channel name
    ///
    /// # Arguments
    ///
    /// * `channel` - Channel name the feed is scoped to (e.g., "applications")
    /// * `capacity` - Number of events to buffer before dropping old events
    pub fn new(channel: impl Into<String>, capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self {
            tx,
            channel: channel.into(),
            capacity,
        }
    }

    /// Subscribe to all future row changes
    ///
    /// Changes emitted before subscription are not received.
    pub fn subscribe(&self) -> broadcast::Receiver<RowChange> {
        self.tx.subscribe()
    }

    /// Emit a row change to all subscribers
    ///
    /// Returns `Ok(subscriber_count)` if at least one subscriber exists,
    /// `Err` if no subscribers are listening.
    #[allow(clippy::result_large_err)]
    pub fn emit(
        &self,
        change: RowChange,
    ) -> Result<usize, broadcast::error::SendError<RowChange>> {
        self.tx.send(change)
    }

    /// Emit a row change, ignoring if no subscribers are listening
    pub fn emit_lossy(&self, change: RowChange) {
        let _ = self.tx.send(change);
    }

    /// Get the current number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Get the configured channel capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Channel name this feed is scoped to
    pub fn channel(&self) -> &str {
        &self.channel
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blank_row(id: &str) -> ApplicationRow {
        ApplicationRow {
            id: id.to_string(),
            application_number: None,
            full_name: None,
            email: None,
            phone: None,
            nrc_number: None,
            passport_number: None,
            program: None,
            intake: None,
            institution: None,
            status: None,
            payment_status: None,
            application_fee: None,
            paid_amount: None,
            result_slip_url: None,
            pop_url: None,
            created_at: None,
            submitted_at: None,
            updated_at: None,
            user_id: None,
        }
    }

    #[test]
    fn test_change_type_and_target() {
        let insert = RowChange::Insert { new: blank_row("a") };
        let update = RowChange::Update {
            new: blank_row("b"),
            old: Some(blank_row("b")),
        };
        let delete = RowChange::Delete { old: blank_row("c") };

        assert_eq!(insert.change_type(), "insert");
        assert_eq!(update.change_type(), "update");
        assert_eq!(delete.change_type(), "delete");

        assert_eq!(insert.target_id(), "a");
        assert_eq!(update.target_id(), "b");
        assert_eq!(delete.target_id(), "c");

        assert!(insert.new_row().is_some());
        assert!(insert.old_row().is_none());
        assert!(delete.new_row().is_none());
        assert!(delete.old_row().is_some());
    }

    #[test]
    fn test_change_serde_tag() {
        let change = RowChange::Delete { old: blank_row("x") };
        let json = serde_json::to_string(&change).expect("serialize");
        assert!(json.contains("\"type\":\"delete\""));

        let back: RowChange = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back.change_type(), "delete");
        assert_eq!(back.target_id(), "x");
    }

    #[test]
    fn test_feed_new() {
        let feed = ChangeFeed::new("applications", 100);
        assert_eq!(feed.capacity(), 100);
        assert_eq!(feed.channel(), "applications");
        assert_eq!(feed.subscriber_count(), 0);
    }

    #[test]
    fn test_feed_emit_and_subscribe() {
        let feed = ChangeFeed::new("applications", 10);
        let mut rx = feed.subscribe();
        assert_eq!(feed.subscriber_count(), 1);

        feed.emit(RowChange::Insert { new: blank_row("a1") })
            .expect("emit should succeed");

        let received = rx.try_recv().expect("should receive change");
        assert_eq!(received.change_type(), "insert");
        assert_eq!(received.target_id(), "a1");
    }

    #[test]
    fn test_feed_emit_lossy_without_subscribers() {
        let feed = ChangeFeed::new("applications", 2);
        // No subscribers: emit_lossy must not panic or error
        for i in 0..5 {
            feed.emit_lossy(RowChange::Insert {
                new: blank_row(&format!("a{}", i)),
            });
        }
        assert_eq!(feed.subscriber_count(), 0);
    }

    #[test]
    fn test_feed_multiple_subscribers() {
        let feed = ChangeFeed::new("applications", 10);
        let mut rx1 = feed.subscribe();
        let mut rx2 = feed.subscribe();

        feed.emit(RowChange::Delete { old: blank_row("gone") })
            .expect("emit should succeed");

        assert_eq!(rx1.try_recv().unwrap().target_id(), "gone");
        assert_eq!(rx2.try_recv().unwrap().target_id(), "gone");
    }
}
