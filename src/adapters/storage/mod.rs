//! Drift Queue Adapters
//!
//! Implementations of the DriftQueue port for records awaiting delivery.
//!
//! ## Available Adapters
//!
//! - **FileDriftQueue** - One YAML file per observation, survives restarts
//! - **InMemoryDriftQueue** - Stores entries in memory (testing/development)
//!
//! ## Usage
//!
//! ```ignore
//! use adapters::storage::{FileDriftQueue, InMemoryDriftQueue};
//!
//! // Production: file-based queue
//! let queue = FileDriftQueue::new("./data/drift-queue");
//!
//! // Testing: in-memory queue
//! let queue = InMemoryDriftQueue::new();
//! ```

mod file_drift_queue;
mod in_memory_drift_queue;

pub use file_drift_queue::FileDriftQueue;
pub use in_memory_drift_queue::InMemoryDriftQueue;
