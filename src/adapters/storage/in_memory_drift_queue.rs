//! In-Memory Drift Queue Adapter
//!
//! Keeps pending drift records in memory. Nothing survives a restart, so
//! this is for tests and development only.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::foundation::ObservationId;
use crate::ports::{DriftQueue, PersistenceError, QueuedDrift};

/// In-memory queue of drift records awaiting delivery
#[derive(Debug, Clone)]
pub struct InMemoryDriftQueue {
    entries: Arc<RwLock<HashMap<ObservationId, QueuedDrift>>>,
}

impl InMemoryDriftQueue {
    pub fn new() -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Clear all queued entries (useful for tests)
    pub async fn clear(&self) {
        self.entries.write().await.clear();
    }

    pub async fn get(&self, observation_id: &ObservationId) -> Option<QueuedDrift> {
        self.entries.read().await.get(observation_id).cloned()
    }
}

impl Default for InMemoryDriftQueue {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DriftQueue for InMemoryDriftQueue {
    async fn enqueue(&self, entry: QueuedDrift) -> Result<(), PersistenceError> {
        let mut entries = self.entries.write().await;
        entries.insert(entry.observation_id().clone(), entry);
        Ok(())
    }

    async fn pending(&self, limit: usize) -> Result<Vec<QueuedDrift>, PersistenceError> {
        let entries = self.entries.read().await;
        let mut pending: Vec<QueuedDrift> = entries.values().cloned().collect();
        pending.sort_by(|a, b| {
            a.enqueued_at
                .cmp(&b.enqueued_at)
                .then_with(|| a.observation_id().cmp(b.observation_id()))
        });
        pending.truncate(limit);
        Ok(pending)
    }

    async fn remove(&self, observation_id: &ObservationId) -> Result<(), PersistenceError> {
        self.entries.write().await.remove(observation_id);
        Ok(())
    }

    async fn len(&self) -> Result<usize, PersistenceError> {
        Ok(self.entries.read().await.len())
    }
}
