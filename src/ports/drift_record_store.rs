//! DriftRecordStore port - append-only persistence of drift records.
//!
//! The store is external and may be unreachable. Callers never let a
//! `PersistenceError` fail a computation; the drift sync worker parks the
//! record in the durable `DriftQueue` and retries.
//!
//! Implementations MUST be idempotent on `observation_id`: inserting a
//! record whose observation was already stored succeeds without creating a
//! second row.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::drift::DriftRecord;
use crate::domain::foundation::{DomainError, ErrorCode};

/// Failures talking to a drift record store or queue.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PersistenceError {
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Store rejected record with status {status}: {body}")]
    Rejected { status: u16, body: String },

    #[error("Serialization failed: {0}")]
    Serialization(String),

    #[error("I/O failed: {0}")]
    Io(String),
}

impl PersistenceError {
    pub fn unavailable(reason: impl Into<String>) -> Self {
        PersistenceError::Unavailable(reason.into())
    }

    /// True when a later attempt may succeed without changing the record.
    pub fn is_transient(&self) -> bool {
        matches!(self, PersistenceError::Unavailable(_) | PersistenceError::Io(_))
    }
}

impl From<std::io::Error> for PersistenceError {
    fn from(err: std::io::Error) -> Self {
        PersistenceError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for PersistenceError {
    fn from(err: serde_json::Error) -> Self {
        PersistenceError::Serialization(err.to_string())
    }
}

impl From<PersistenceError> for DomainError {
    fn from(err: PersistenceError) -> Self {
        DomainError::new(ErrorCode::PersistenceError, err.to_string())
    }
}

/// Port for the external append-only drift log.
#[async_trait]
pub trait DriftRecordStore: Send + Sync {
    /// Appends a record. Re-inserting a known observation is a no-op.
    async fn insert(&self, record: &DriftRecord) -> Result<(), PersistenceError>;

    /// Cheap connectivity check used before draining the local queue.
    async fn is_available(&self) -> bool;
}
