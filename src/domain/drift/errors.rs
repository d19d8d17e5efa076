//! Drift tracking errors.

use thiserror::Error;

use crate::domain::foundation::{DomainError, ErrorCode, ValidationError};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum DriftError {
    #[error("Invalid drift policy: {0}")]
    InvalidPolicy(String),

    #[error("Invalid drift input: {0}")]
    InvalidInput(#[from] ValidationError),
}

impl DriftError {
    pub fn policy(reason: impl Into<String>) -> Self {
        DriftError::InvalidPolicy(reason.into())
    }
}

impl From<DriftError> for DomainError {
    fn from(err: DriftError) -> Self {
        match err {
            DriftError::InvalidPolicy(_) => DomainError::new(ErrorCode::InvalidPolicy, err.to_string()),
            DriftError::InvalidInput(inner) => inner.into(),
        }
    }
}
