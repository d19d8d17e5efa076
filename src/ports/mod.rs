//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the domain and the outside world. Adapters implement these ports.
//!
//! ## Persistence Ports
//!
//! - `DriftRecordStore` - External append-only drift log, idempotent by observation id
//! - `DriftQueue` - Durable local buffer for records awaiting delivery
//! - `DriftPublisher` - Non-blocking hand-off used by the record-outcome handler

mod drift_publisher;
mod drift_queue;
mod drift_record_store;

pub use drift_publisher::DriftPublisher;
pub use drift_queue::{DriftQueue, QueuedDrift};
pub use drift_record_store::{DriftRecordStore, PersistenceError};
