//! Drift synchronization.
//!
//! Background delivery of drift records to the `DriftRecordStore`, backed by
//! a durable `DriftQueue` while the store is unreachable.

mod drift_sync_worker;

pub use drift_sync_worker::{DrainReport, DriftSyncConfig, DriftSyncHandle, DriftSyncWorker};
