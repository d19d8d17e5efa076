//! Configuration error types

use thiserror::Error;

/// Errors that can occur during configuration loading
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration loading failed: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Validation failed: {0}")]
    ValidationFailed(#[from] ValidationError),
}

/// Errors that can occur during configuration validation
#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    #[error("Required configuration missing: {0}")]
    MissingRequired(&'static str),

    #[error("Blend weights must be non-negative and sum to 1 (topsis {topsis}, grey {grey})")]
    InvalidBlend { topsis: f64, grey: f64 },

    #[error("{field} out of range: {value}")]
    OutOfRange { field: &'static str, value: f64 },

    #[error("{0} must be greater than zero")]
    MustBePositive(&'static str),

    #[error("Invalid drift policy: {0}")]
    InvalidDriftPolicy(String),

    #[error("Invalid base weights: {0}")]
    InvalidBaseWeights(String),

    #[error("Invalid store URL format")]
    InvalidStoreUrl,

    #[error("Invalid log filter: {0}")]
    InvalidLogLevel(String),
}
