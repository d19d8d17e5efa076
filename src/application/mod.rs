//! Application layer - Commands and Handlers.
//!
//! This layer orchestrates domain operations and coordinates between ports.
//! Errors leave this layer as `DomainError`.

pub mod handlers;

pub use handlers::{
    RankAlternativesCommand, RankAlternativesHandler, RankWithCurrentWeightsCommand,
    RankingResponse, RecordOutcomeCommand, RecordOutcomeHandler, RecordOutcomeResult,
};
