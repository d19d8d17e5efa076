//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the domain to external systems:
//! - `storage` - Durable and in-memory drift queues
//! - `store` - Drift record stores (REST, in-memory)
//! - `sync` - Background worker delivering drift records

pub mod storage;
pub mod store;
pub mod sync;

pub use storage::{FileDriftQueue, InMemoryDriftQueue};
pub use store::{DriftLogRow, InMemoryDriftRecordStore, RestDriftRecordStore, RestDriftStoreConfig};
pub use sync::{DrainReport, DriftSyncConfig, DriftSyncHandle, DriftSyncWorker};
