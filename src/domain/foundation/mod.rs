//! Foundation module - Shared domain primitives.
//!
//! Contains value objects, identifiers, and error types
//! that form the vocabulary of the decision core.

mod errors;
mod ids;
mod timestamp;

pub use errors::{DomainError, ErrorCode, ValidationError};
pub use ids::{AlternativeId, ObservationId, WeightsVersion, MAX_FILE_STEM_LEN};
pub use timestamp::Timestamp;
