//! RecordOutcomeHandler - feeds an observed shipment outcome back into the
//! engine weights.
//!
//! Drift is computed and applied synchronously. Persistence of the resulting
//! record is handed to a `DriftPublisher` and never fails the call.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

use crate::domain::drift::{DriftObservation, DriftRecord, DriftTracker, OutcomeMetrics};
use crate::domain::foundation::{AlternativeId, DomainError, ObservationId, WeightsVersion};
use crate::ports::DriftPublisher;

/// Command reporting what actually happened to a ranked alternative.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordOutcomeCommand {
    pub alternative_id: AlternativeId,
    pub observation_id: ObservationId,
    pub predicted_metrics: OutcomeMetrics,
    pub actual_metrics: OutcomeMetrics,
}

/// Result of recording an outcome.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordOutcomeResult {
    pub record: DriftRecord,
    /// Snapshot active after the call.
    pub weights_version: WeightsVersion,
    /// False when the observation had already been recorded.
    pub applied: bool,
    pub repeated_underperformance: bool,
}

/// Handler for drift feedback calls.
pub struct RecordOutcomeHandler {
    tracker: Arc<DriftTracker>,
    publisher: Arc<dyn DriftPublisher>,
}

impl RecordOutcomeHandler {
    pub fn new(tracker: Arc<DriftTracker>, publisher: Arc<dyn DriftPublisher>) -> Self {
        Self { tracker, publisher }
    }

    pub async fn handle(&self, cmd: RecordOutcomeCommand) -> Result<RecordOutcomeResult, DomainError> {
        // 1. Compute drift and install the next snapshot
        let outcome = self.tracker.record(DriftObservation {
            alternative_id: cmd.alternative_id,
            observation_id: cmd.observation_id,
            predicted: cmd.predicted_metrics,
            actual: cmd.actual_metrics,
        })?;

        // 2. Hand the record off; replays were already handed off the first time
        if outcome.applied {
            if let Err(e) = self.publisher.publish(outcome.record.clone()).await {
                warn!(
                    observation_id = %outcome.record.observation_id,
                    error = %e,
                    "Drift record could not be queued for persistence"
                );
            }
        } else {
            info!(
                observation_id = %outcome.record.observation_id,
                "Outcome already recorded, nothing applied"
            );
        }

        Ok(RecordOutcomeResult {
            weights_version: outcome.weights.version(),
            record: outcome.record,
            applied: outcome.applied,
            repeated_underperformance: outcome.repeated_underperformance,
        })
    }
}
