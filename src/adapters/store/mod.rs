//! Drift Record Store Adapters
//!
//! - **RestDriftRecordStore** - Appends rows to a remote `drift_logs` table
//! - **InMemoryDriftRecordStore** - In-memory log with an offline switch (testing/development)

mod in_memory_drift_store;
mod rest_drift_store;

pub use in_memory_drift_store::InMemoryDriftRecordStore;
pub use rest_drift_store::{DriftLogRow, RestDriftRecordStore, RestDriftStoreConfig};
