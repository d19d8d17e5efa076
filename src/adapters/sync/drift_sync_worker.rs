//! DriftSyncWorker - Background service for at-least-once delivery of drift
//! records.
//!
//! Recording an outcome never waits on the network:
//! 1. The record-outcome handler publishes the record through a `DriftSyncHandle`
//! 2. **The worker tries the store, parks failures in the durable queue, and
//!    drains the queue on every tick** ← This module
//!
//! ## Configuration
//!
//! | Setting | Default | Description |
//! |---------|---------|-------------|
//! | `poll_interval` | 5s | How often to retry queued records |
//! | `batch_size` | 50 | Max records delivered per drain |
//! | `channel_capacity` | 1024 | Records buffered between handler and worker |
//!
//! ## Graceful Shutdown
//!
//! On shutdown the worker stops accepting records, moves everything still
//! buffered in the channel into the durable queue, tries one final drain,
//! and exits. Records that could not be delivered stay in the queue for the
//! next start.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{mpsc, watch};
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use crate::domain::drift::DriftRecord;
use crate::ports::{DriftPublisher, DriftQueue, DriftRecordStore, PersistenceError, QueuedDrift};

/// Configuration for the DriftSyncWorker service.
#[derive(Debug, Clone)]
pub struct DriftSyncConfig {
    /// How often to drain the durable queue.
    pub poll_interval: Duration,

    /// Maximum records delivered per drain.
    pub batch_size: usize,

    /// Capacity of the handler-to-worker channel.
    pub channel_capacity: usize,
}

impl Default for DriftSyncConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(5000),
            batch_size: 50,
            channel_capacity: 1024,
        }
    }
}

impl DriftSyncConfig {
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_batch_size(mut self, size: usize) -> Self {
        self.batch_size = size;
        self
    }

    pub fn with_channel_capacity(mut self, capacity: usize) -> Self {
        self.channel_capacity = capacity;
        self
    }
}

/// Sender side handed to the record-outcome handler.
///
/// Publishing never waits on the store. When the worker is gone or its
/// buffer is full the record goes straight into the durable queue.
#[derive(Clone)]
pub struct DriftSyncHandle {
    sender: mpsc::Sender<DriftRecord>,
    queue: Arc<dyn DriftQueue>,
}

impl DriftSyncHandle {
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }
}

#[async_trait]
impl DriftPublisher for DriftSyncHandle {
    async fn publish(&self, record: DriftRecord) -> Result<(), PersistenceError> {
        let record = match self.sender.try_send(record) {
            Ok(()) => return Ok(()),
            Err(mpsc::error::TrySendError::Full(record)) => record,
            Err(mpsc::error::TrySendError::Closed(record)) => record,
        };

        debug!(observation_id = %record.observation_id, "Drift worker not accepting, queueing directly");
        self.queue.enqueue(QueuedDrift::new(record)).await
    }
}

/// Outcome of one drain of the durable queue.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DrainReport {
    pub delivered: usize,
    pub remaining: usize,
}

/// Background service that delivers drift records to the store.
pub struct DriftSyncWorker {
    store: Arc<dyn DriftRecordStore>,
    queue: Arc<dyn DriftQueue>,
    config: DriftSyncConfig,
}

impl DriftSyncWorker {
    pub fn new(store: Arc<dyn DriftRecordStore>, queue: Arc<dyn DriftQueue>) -> Self {
        Self::with_config(store, queue, DriftSyncConfig::default())
    }

    pub fn with_config(
        store: Arc<dyn DriftRecordStore>,
        queue: Arc<dyn DriftQueue>,
        config: DriftSyncConfig,
    ) -> Self {
        Self {
            store,
            queue,
            config,
        }
    }

    /// Channel pair for `run`; the handle goes to the record-outcome handler.
    pub fn channel(&self) -> (DriftSyncHandle, mpsc::Receiver<DriftRecord>) {
        let (sender, receiver) = mpsc::channel(self.config.channel_capacity.max(1));
        let handle = DriftSyncHandle {
            sender,
            queue: Arc::clone(&self.queue),
        };
        (handle, receiver)
    }

    /// Run the worker loop until the shutdown signal is received.
    ///
    /// Drains records left over from a previous run first. Per-record and
    /// per-tick failures are logged and the loop keeps running; only the
    /// final shutdown drain reports an error.
    pub async fn run(
        &self,
        mut records: mpsc::Receiver<DriftRecord>,
        mut shutdown: watch::Receiver<bool>,
    ) -> Result<(), PersistenceError> {
        match self.drain_once().await {
            Ok(report) if report.delivered > 0 || report.remaining > 0 => {
                info!(
                    delivered = report.delivered,
                    remaining = report.remaining,
                    "Drained drift records from previous run"
                );
            }
            Ok(_) => {}
            Err(e) => warn!(error = %e, "Startup drain of drift queue failed"),
        }

        let mut interval = time::interval(self.config.poll_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately and the startup drain already ran.
        interval.tick().await;

        let mut accepting = true;

        loop {
            tokio::select! {
                changed = shutdown.changed() => {
                    // A dropped sender counts as shutdown.
                    if changed.is_err() || *shutdown.borrow() {
                        return self.shutdown(records).await;
                    }
                }

                received = records.recv(), if accepting => {
                    match received {
                        Some(record) => {
                            if let Err(e) = self.deliver(record.clone()).await {
                                error!(
                                    observation_id = %record.observation_id,
                                    record = ?record,
                                    error = %e,
                                    "Drift record could be neither stored nor queued"
                                );
                            }
                        }
                        // Every handle dropped; keep draining the queue until shutdown.
                        None => accepting = false,
                    }
                }

                _ = interval.tick() => {
                    if let Err(e) = self.drain_once().await {
                        warn!(error = %e, "Drift queue drain failed, retrying next tick");
                    }
                }
            }
        }
    }

    /// Try the store once; park the record in the durable queue on failure.
    pub async fn deliver(&self, record: DriftRecord) -> Result<(), PersistenceError> {
        match self.store.insert(&record).await {
            Ok(()) => {
                debug!(observation_id = %record.observation_id, "Drift record persisted");
                Ok(())
            }
            Err(e) => {
                warn!(
                    observation_id = %record.observation_id,
                    error = %e,
                    "Drift persistence deferred to local queue"
                );
                self.queue
                    .enqueue(QueuedDrift::failed(record, e.to_string()))
                    .await
            }
        }
    }

    /// Deliver up to one batch of queued records, oldest first.
    ///
    /// A record leaves the queue only after the store accepted it. Stops at
    /// the first transient failure and keeps the rest for the next tick. A
    /// record the store rejects is moved to the back of the queue so the
    /// records behind it still go out.
    pub async fn drain_once(&self) -> Result<DrainReport, PersistenceError> {
        if self.queue.is_empty().await? {
            return Ok(DrainReport::default());
        }

        if !self.store.is_available().await {
            debug!("Drift store unavailable, skipping drain");
            return Ok(DrainReport {
                delivered: 0,
                remaining: self.queue.len().await?,
            });
        }

        let mut delivered = 0;
        for mut entry in self.queue.pending(self.config.batch_size).await? {
            match self.store.insert(&entry.record).await {
                Ok(()) => {
                    self.queue.remove(entry.observation_id()).await?;
                    delivered += 1;
                }
                Err(e) if e.is_transient() => {
                    warn!(
                        observation_id = %entry.observation_id(),
                        attempts = entry.attempts + 1,
                        error = %e,
                        "Queued drift record still undeliverable"
                    );
                    entry.mark_failed(e.to_string());
                    self.queue.enqueue(entry).await?;
                    break;
                }
                Err(e) => {
                    error!(
                        observation_id = %entry.observation_id(),
                        attempts = entry.attempts + 1,
                        error = %e,
                        "Drift record rejected by store, kept in queue behind newer records"
                    );
                    entry.mark_failed(e.to_string());
                    entry.defer();
                    self.queue.enqueue(entry).await?;
                }
            }
        }

        Ok(DrainReport {
            delivered,
            remaining: self.queue.len().await?,
        })
    }

    async fn shutdown(
        &self,
        mut records: mpsc::Receiver<DriftRecord>,
    ) -> Result<(), PersistenceError> {
        records.close();

        let mut buffered = 0;
        while let Some(record) = records.recv().await {
            match self.queue.enqueue(QueuedDrift::new(record.clone())).await {
                Ok(()) => buffered += 1,
                Err(e) => error!(
                    observation_id = %record.observation_id,
                    record = ?record,
                    error = %e,
                    "Buffered drift record could not be queued at shutdown"
                ),
            }
        }

        let report = self.drain_once().await?;
        info!(
            buffered,
            delivered = report.delivered,
            remaining = report.remaining,
            "Drift sync worker stopped"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::{InMemoryDriftQueue, InMemoryDriftRecordStore};
    use crate::domain::foundation::ObservationId;

    /// Store that refuses one observation and accepts the rest.
    struct RejectingStore {
        inner: InMemoryDriftRecordStore,
        rejected: ObservationId,
    }

    #[async_trait]
    impl DriftRecordStore for RejectingStore {
        async fn insert(&self, record: &DriftRecord) -> Result<(), PersistenceError> {
            if record.observation_id == self.rejected {
                return Err(PersistenceError::Rejected {
                    status: 400,
                    body: "invalid row".to_string(),
                });
            }
            self.inner.insert(record).await
        }

        async fn is_available(&self) -> bool {
            true
        }
    }

    fn worker(
        store: &InMemoryDriftRecordStore,
        queue: &InMemoryDriftQueue,
        config: DriftSyncConfig,
    ) -> DriftSyncWorker {
        DriftSyncWorker::with_config(Arc::new(store.clone()), Arc::new(queue.clone()), config)
    }

    #[tokio::test]
    async fn deliver_writes_straight_to_available_store() {
        let store = InMemoryDriftRecordStore::new();
        let queue = InMemoryDriftQueue::new();
        let worker = worker(&store, &queue, DriftSyncConfig::default());

        worker.deliver(DriftRecord::test_fixture("SHP-1")).await.unwrap();

        assert_eq!(store.count().await, 1);
        assert!(queue.is_empty().await.unwrap());
    }

    #[tokio::test]
    async fn deliver_parks_record_when_store_fails() {
        let store = InMemoryDriftRecordStore::unavailable();
        let queue = InMemoryDriftQueue::new();
        let worker = worker(&store, &queue, DriftSyncConfig::default());

        worker.deliver(DriftRecord::test_fixture("SHP-1")).await.unwrap();

        assert_eq!(store.count().await, 0);
        let queued = queue.get(&ObservationId::new("SHP-1").unwrap()).await.unwrap();
        assert_eq!(queued.attempts, 1);
        assert!(queued.last_error.is_some());
    }

    #[tokio::test]
    async fn worker_keeps_running_after_a_record_cannot_be_queued() {
        struct BrokenQueue;

        #[async_trait]
        impl DriftQueue for BrokenQueue {
            async fn enqueue(&self, _entry: QueuedDrift) -> Result<(), PersistenceError> {
                Err(PersistenceError::Io("disk full".to_string()))
            }
            async fn pending(&self, _limit: usize) -> Result<Vec<QueuedDrift>, PersistenceError> {
                Ok(Vec::new())
            }
            async fn remove(&self, _id: &ObservationId) -> Result<(), PersistenceError> {
                Ok(())
            }
            async fn len(&self) -> Result<usize, PersistenceError> {
                Ok(0)
            }
        }

        let store = InMemoryDriftRecordStore::unavailable();
        let worker = DriftSyncWorker::with_config(
            Arc::new(store.clone()),
            Arc::new(BrokenQueue),
            DriftSyncConfig::default().with_poll_interval(Duration::from_millis(10)),
        );
        let (handle, receiver) = worker.channel();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let task = tokio::spawn(async move { worker.run(receiver, shutdown_rx).await });

        handle.publish(DriftRecord::test_fixture("SHP-1")).await.unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;
        store.set_available(true);
        handle.publish(DriftRecord::test_fixture("SHP-2")).await.unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;

        assert!(!task.is_finished());
        assert!(store.get(&ObservationId::new("SHP-2").unwrap()).await.is_some());

        shutdown_tx.send(true).unwrap();
        task.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn deliver_parks_record_with_very_long_id_in_file_queue() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let store = InMemoryDriftRecordStore::unavailable();
        let queue = crate::adapters::FileDriftQueue::new(temp_dir.path());
        let worker = DriftSyncWorker::new(Arc::new(store.clone()), Arc::new(queue.clone()));
        let id = format!("SHP-{}", "7/".repeat(150));

        worker.deliver(DriftRecord::test_fixture(&id)).await.unwrap();

        assert_eq!(queue.len().await.unwrap(), 1);
        store.set_available(true);
        assert_eq!(worker.drain_once().await.unwrap(), DrainReport { delivered: 1, remaining: 0 });
    }

    #[tokio::test]
    async fn drain_once_respects_batch_size() {
        let store = InMemoryDriftRecordStore::new();
        let queue = InMemoryDriftQueue::new();
        for i in 0..5 {
            queue
                .enqueue(QueuedDrift::new(DriftRecord::test_fixture(&format!("SHP-{}", i))))
                .await
                .unwrap();
        }
        let worker = worker(&store, &queue, DriftSyncConfig::default().with_batch_size(2));

        assert_eq!(worker.drain_once().await.unwrap(), DrainReport { delivered: 2, remaining: 3 });
        assert_eq!(worker.drain_once().await.unwrap(), DrainReport { delivered: 2, remaining: 1 });
        assert_eq!(worker.drain_once().await.unwrap(), DrainReport { delivered: 1, remaining: 0 });
        assert_eq!(store.count().await, 5);
    }

    #[tokio::test]
    async fn rejected_record_does_not_block_the_queue() {
        let inner = InMemoryDriftRecordStore::new();
        let store = RejectingStore {
            inner: inner.clone(),
            rejected: ObservationId::new("SHP-bad").unwrap(),
        };
        let queue = InMemoryDriftQueue::new();
        queue
            .enqueue(QueuedDrift::new(DriftRecord::test_fixture("SHP-bad")))
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(5)).await;
        queue
            .enqueue(QueuedDrift::new(DriftRecord::test_fixture("SHP-good")))
            .await
            .unwrap();
        let worker = DriftSyncWorker::with_config(
            Arc::new(store),
            Arc::new(queue.clone()),
            DriftSyncConfig::default().with_batch_size(1),
        );

        // The rejected head is moved back, the next drain reaches the good record.
        assert_eq!(worker.drain_once().await.unwrap(), DrainReport { delivered: 0, remaining: 2 });
        assert_eq!(worker.drain_once().await.unwrap(), DrainReport { delivered: 1, remaining: 1 });

        assert_eq!(inner.count().await, 1);
        assert!(inner.get(&ObservationId::new("SHP-good").unwrap()).await.is_some());
        let kept = queue.get(&ObservationId::new("SHP-bad").unwrap()).await.unwrap();
        assert_eq!(kept.attempts, 1);
        assert!(kept.last_error.unwrap().contains("400"));
    }

    #[tokio::test]
    async fn rejected_record_is_skipped_within_one_batch() {
        let inner = InMemoryDriftRecordStore::new();
        let store = RejectingStore {
            inner: inner.clone(),
            rejected: ObservationId::new("SHP-bad").unwrap(),
        };
        let queue = InMemoryDriftQueue::new();
        for id in ["SHP-bad", "SHP-1", "SHP-2"] {
            queue
                .enqueue(QueuedDrift::new(DriftRecord::test_fixture(id)))
                .await
                .unwrap();
            tokio::time::sleep(Duration::from_millis(2)).await;
        }
        let worker = DriftSyncWorker::with_config(
            Arc::new(store),
            Arc::new(queue.clone()),
            DriftSyncConfig::default(),
        );

        let report = worker.drain_once().await.unwrap();

        assert_eq!(report, DrainReport { delivered: 2, remaining: 1 });
        assert_eq!(inner.count().await, 2);
    }

    #[tokio::test]
    async fn drain_once_skips_when_store_offline() {
        let store = InMemoryDriftRecordStore::unavailable();
        let queue = InMemoryDriftQueue::new();
        queue
            .enqueue(QueuedDrift::new(DriftRecord::test_fixture("SHP-1")))
            .await
            .unwrap();
        let worker = worker(&store, &queue, DriftSyncConfig::default());

        let report = worker.drain_once().await.unwrap();

        assert_eq!(report, DrainReport { delivered: 0, remaining: 1 });
        assert_eq!(store.insert_calls(), 0);
    }

    #[tokio::test]
    async fn drain_once_with_empty_queue_returns_zero() {
        let store = InMemoryDriftRecordStore::new();
        let queue = InMemoryDriftQueue::new();
        let worker = worker(&store, &queue, DriftSyncConfig::default());

        assert_eq!(worker.drain_once().await.unwrap(), DrainReport::default());
    }

    #[tokio::test]
    async fn run_drains_leftovers_at_startup_and_stops_on_shutdown() {
        let store = InMemoryDriftRecordStore::new();
        let queue = InMemoryDriftQueue::new();
        queue
            .enqueue(QueuedDrift::new(DriftRecord::test_fixture("SHP-old")))
            .await
            .unwrap();

        let worker = worker(
            &store,
            &queue,
            DriftSyncConfig::default().with_poll_interval(Duration::from_millis(10)),
        );
        let (handle, receiver) = worker.channel();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let task = tokio::spawn(async move { worker.run(receiver, shutdown_rx).await });

        handle.publish(DriftRecord::test_fixture("SHP-new")).await.unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;

        shutdown_tx.send(true).unwrap();
        task.await.unwrap().unwrap();

        assert_eq!(store.count().await, 2);
        assert!(queue.is_empty().await.unwrap());
    }

    #[tokio::test]
    async fn offline_records_survive_shutdown_in_queue() {
        let store = InMemoryDriftRecordStore::unavailable();
        let queue = InMemoryDriftQueue::new();
        let worker = worker(
            &store,
            &queue,
            DriftSyncConfig::default().with_poll_interval(Duration::from_millis(10)),
        );
        let (handle, receiver) = worker.channel();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let task = tokio::spawn(async move { worker.run(receiver, shutdown_rx).await });

        for i in 0..3 {
            handle
                .publish(DriftRecord::test_fixture(&format!("SHP-{}", i)))
                .await
                .unwrap();
        }
        tokio::time::sleep(Duration::from_millis(30)).await;
        shutdown_tx.send(true).unwrap();
        task.await.unwrap().unwrap();

        assert_eq!(store.count().await, 0);
        assert_eq!(queue.len().await.unwrap(), 3);
        assert!(handle.is_closed());
    }

    #[tokio::test]
    async fn queued_records_flow_once_store_recovers() {
        let store = InMemoryDriftRecordStore::unavailable();
        let queue = InMemoryDriftQueue::new();
        let worker = worker(&store, &queue, DriftSyncConfig::default());

        worker.deliver(DriftRecord::test_fixture("SHP-1")).await.unwrap();
        worker.deliver(DriftRecord::test_fixture("SHP-1")).await.unwrap();
        assert_eq!(queue.len().await.unwrap(), 1);

        store.set_available(true);
        let report = worker.drain_once().await.unwrap();

        assert_eq!(report.delivered, 1);
        assert_eq!(store.count().await, 1);
    }

    #[tokio::test]
    async fn publish_after_worker_stopped_goes_to_queue() {
        let store = InMemoryDriftRecordStore::new();
        let queue = InMemoryDriftQueue::new();
        let worker = worker(&store, &queue, DriftSyncConfig::default());
        let (handle, receiver) = worker.channel();
        drop(receiver);

        handle.publish(DriftRecord::test_fixture("SHP-late")).await.unwrap();

        assert!(handle.is_closed());
        assert_eq!(queue.len().await.unwrap(), 1);
        assert_eq!(store.count().await, 0);
    }

    #[test]
    fn config_defaults_match_persistence_defaults() {
        let config = DriftSyncConfig::default();
        assert_eq!(config.poll_interval, Duration::from_millis(5000));
        assert_eq!(config.batch_size, 50);
    }
}
