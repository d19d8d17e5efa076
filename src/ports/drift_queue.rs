//! DriftQueue port - durable local buffer for drift records that could not
//! be persisted yet.
//!
//! Entries are keyed by observation id: enqueueing a known observation
//! replaces the entry rather than duplicating it. An entry leaves the
//! queue only through `remove`, after the record reached the store.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::PersistenceError;
use crate::domain::drift::DriftRecord;
use crate::domain::foundation::{ObservationId, Timestamp};

/// A drift record waiting for delivery.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueuedDrift {
    pub record: DriftRecord,
    pub enqueued_at: Timestamp,
    /// Failed delivery attempts so far.
    pub attempts: u32,
    pub last_error: Option<String>,
}

impl QueuedDrift {
    pub fn new(record: DriftRecord) -> Self {
        Self {
            record,
            enqueued_at: Timestamp::now(),
            attempts: 0,
            last_error: None,
        }
    }

    /// Queue entry for a record whose first delivery attempt failed.
    pub fn failed(record: DriftRecord, error: impl Into<String>) -> Self {
        let mut entry = Self::new(record);
        entry.mark_failed(error);
        entry
    }

    pub fn observation_id(&self) -> &ObservationId {
        &self.record.observation_id
    }

    pub fn mark_failed(&mut self, error: impl Into<String>) {
        self.attempts += 1;
        self.last_error = Some(error.into());
    }

    /// Moves the entry behind everything queued so far.
    pub fn defer(&mut self) {
        self.enqueued_at = Timestamp::now();
    }
}

#[async_trait]
pub trait DriftQueue: Send + Sync {
    /// Stores or replaces the entry for its observation id.
    async fn enqueue(&self, entry: QueuedDrift) -> Result<(), PersistenceError>;

    /// Up to `limit` entries, oldest first.
    async fn pending(&self, limit: usize) -> Result<Vec<QueuedDrift>, PersistenceError>;

    /// Deletes the entry for an observation. Unknown ids are ignored.
    async fn remove(&self, observation_id: &ObservationId) -> Result<(), PersistenceError>;

    async fn len(&self) -> Result<usize, PersistenceError>;

    async fn is_empty(&self) -> Result<bool, PersistenceError> {
        Ok(self.len().await? == 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_entry_has_no_attempts() {
        let entry = QueuedDrift::new(DriftRecord::test_fixture("SHP-1"));
        assert_eq!(entry.attempts, 0);
        assert!(entry.last_error.is_none());
        assert_eq!(entry.observation_id().as_str(), "SHP-1");
    }

    #[test]
    fn failed_entry_counts_the_attempt() {
        let mut entry = QueuedDrift::failed(DriftRecord::test_fixture("SHP-1"), "timeout");
        assert_eq!(entry.attempts, 1);
        assert_eq!(entry.last_error.as_deref(), Some("timeout"));

        entry.mark_failed("connection refused");
        assert_eq!(entry.attempts, 2);
        assert_eq!(entry.last_error.as_deref(), Some("connection refused"));
    }

    #[test]
    fn deferred_entry_moves_behind_newer_entries() {
        let mut entry = QueuedDrift::new(DriftRecord::test_fixture("SHP-1"));
        std::thread::sleep(std::time::Duration::from_millis(5));
        let newer = QueuedDrift::new(DriftRecord::test_fixture("SHP-2"));
        std::thread::sleep(std::time::Duration::from_millis(5));

        entry.defer();

        assert!(entry.enqueued_at > newer.enqueued_at);
    }

    #[test]
    fn entry_roundtrips_through_json() {
        let entry = QueuedDrift::new(DriftRecord::test_fixture("SHP/2"));
        let json = serde_json::to_string(&entry).unwrap();
        let back: QueuedDrift = serde_json::from_str(&json).unwrap();
        assert_eq!(back.observation_id(), entry.observation_id());
        assert_eq!(back.record.drift_kind, entry.record.drift_kind);
        assert_eq!(back.enqueued_at, entry.enqueued_at);
    }
}
