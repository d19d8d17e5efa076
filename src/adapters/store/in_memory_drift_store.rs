//! In-memory drift record store for tests and development.
//!
//! Availability can be toggled to simulate an unreachable backend.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::drift::DriftRecord;
use crate::domain::foundation::ObservationId;
use crate::ports::{DriftRecordStore, PersistenceError};

/// Drift log held in memory, keyed by observation id.
#[derive(Debug, Clone)]
pub struct InMemoryDriftRecordStore {
    records: Arc<RwLock<HashMap<ObservationId, DriftRecord>>>,
    available: Arc<AtomicBool>,
    insert_calls: Arc<AtomicUsize>,
}

impl InMemoryDriftRecordStore {
    pub fn new() -> Self {
        Self {
            records: Arc::new(RwLock::new(HashMap::new())),
            available: Arc::new(AtomicBool::new(true)),
            insert_calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// A store that rejects every insert until `set_available(true)`.
    pub fn unavailable() -> Self {
        let store = Self::new();
        store.set_available(false);
        store
    }

    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    pub async fn count(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn get(&self, observation_id: &ObservationId) -> Option<DriftRecord> {
        self.records.read().await.get(observation_id).cloned()
    }

    /// Inserts attempted, successful or not.
    pub fn insert_calls(&self) -> usize {
        self.insert_calls.load(Ordering::SeqCst)
    }
}

impl Default for InMemoryDriftRecordStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DriftRecordStore for InMemoryDriftRecordStore {
    async fn insert(&self, record: &DriftRecord) -> Result<(), PersistenceError> {
        self.insert_calls.fetch_add(1, Ordering::SeqCst);

        if !self.available.load(Ordering::SeqCst) {
            return Err(PersistenceError::unavailable("in-memory store is offline"));
        }

        let mut records = self.records.write().await;
        records
            .entry(record.observation_id.clone())
            .or_insert_with(|| record.clone());
        Ok(())
    }

    async fn is_available(&self) -> bool {
        self.available.load(Ordering::SeqCst)
    }
}
