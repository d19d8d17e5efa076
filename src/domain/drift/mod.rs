//! Adaptive drift tracking.
//!
//! Closes the loop between predicted and observed shipment outcomes: each
//! observation yields a `DriftRecord` and a new versioned `EngineWeights`
//! snapshot in the `WeightStore`.

mod errors;
mod policy;
mod record;
mod tracker;
mod weight_store;

pub use errors::DriftError;
pub use policy::DriftPolicy;
pub use record::{DriftKind, DriftRecord, OutcomeMetrics};
pub use tracker::{DriftObservation, DriftOutcome, DriftTracker};
pub use weight_store::WeightStore;
