//! DriftPublisher port - hand-off of fresh drift records for persistence.
//!
//! Publishing must not wait on the external store. An implementation either
//! buffers the record for a background worker or writes it to the durable
//! `DriftQueue`; an error means the record could not be kept anywhere.

use async_trait::async_trait;

use super::PersistenceError;
use crate::domain::drift::DriftRecord;

#[async_trait]
pub trait DriftPublisher: Send + Sync {
    async fn publish(&self, record: DriftRecord) -> Result<(), PersistenceError>;
}
