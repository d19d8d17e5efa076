//! Command handlers.
//!
//! - `RankAlternativesHandler` - ranking calls, explicit or snapshot weights
//! - `RecordOutcomeHandler` - drift feedback from observed outcomes

mod rank_alternatives;
mod record_outcome;

pub use rank_alternatives::{
    RankAlternativesCommand, RankAlternativesHandler, RankWithCurrentWeightsCommand,
    RankingResponse,
};
pub use record_outcome::{RecordOutcomeCommand, RecordOutcomeHandler, RecordOutcomeResult};
