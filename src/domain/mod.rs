//! Domain layer containing the decision core.
//!
//! # Module Organization
//!
//! - `foundation` - Shared domain primitives (IDs, timestamps, errors)
//! - `mcda` - Pure ranking pipeline (AHP weights, grey normalization, TOPSIS, grey grade)
//! - `drift` - Outcome drift tracking and versioned weight snapshots

pub mod drift;
pub mod foundation;
pub mod mcda;
