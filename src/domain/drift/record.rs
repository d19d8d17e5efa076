//! Drift records: what was predicted, what happened, and what changed.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::domain::foundation::{
    AlternativeId, ObservationId, Timestamp, ValidationError, WeightsVersion,
};

/// Delivery time (days) and cost of one shipment.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutcomeMetrics {
    pub time: f64,
    pub cost: f64,
}

impl OutcomeMetrics {
    pub fn new(time: f64, cost: f64) -> Result<Self, ValidationError> {
        if !time.is_finite() {
            return Err(ValidationError::invalid_format("time", "must be a finite number"));
        }
        if !cost.is_finite() {
            return Err(ValidationError::invalid_format("cost", "must be a finite number"));
        }
        Ok(Self { time, cost })
    }
}

/// Which metric drifted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DriftKind {
    Combined,
    DeliveryDelay,
    CostVariance,
}

impl DriftKind {
    /// More than a day off on time and more than 100 off on cost is
    /// combined; more than a day off on time alone is a delivery delay;
    /// anything else is cost variance.
    pub fn classify(drift_time: f64, drift_cost: f64) -> Self {
        let time_off = drift_time.abs() > 1.0;
        if time_off && drift_cost.abs() > 100.0 {
            DriftKind::Combined
        } else if time_off {
            DriftKind::DeliveryDelay
        } else {
            DriftKind::CostVariance
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DriftKind::Combined => "combined",
            DriftKind::DeliveryDelay => "delivery_delay",
            DriftKind::CostVariance => "cost_variance",
        }
    }
}

impl fmt::Display for DriftKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Append-only audit entry for one observed outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriftRecord {
    pub alternative_id: AlternativeId,
    pub observation_id: ObservationId,
    pub predicted: OutcomeMetrics,
    pub actual: OutcomeMetrics,
    pub drift_time: f64,
    pub drift_cost: f64,
    pub drift_magnitude: f64,
    pub drift_kind: DriftKind,
    /// Signed change proposed per criterion, before renormalization.
    pub proposed_weight_delta: BTreeMap<String, f64>,
    pub reasoning: String,
    /// Snapshot created from this record.
    pub weights_version: WeightsVersion,
    pub recorded_at: Timestamp,
}

impl DriftRecord {
    pub fn is_late(&self) -> bool {
        self.drift_time > 0.0
    }
}

#[cfg(test)]
impl DriftRecord {
    /// A late, over-budget record for the given observation.
    pub fn test_fixture(observation_id: &str) -> Self {
        let delta: BTreeMap<String, f64> = [("cost", 0.05), ("reliability", -0.05), ("time", 0.05)]
            .iter()
            .map(|(k, v)| (k.to_string(), *v))
            .collect();
        Self {
            alternative_id: AlternativeId::new("dhl").unwrap(),
            observation_id: ObservationId::new(observation_id).unwrap(),
            predicted: OutcomeMetrics { time: 5.0, cost: 1000.0 },
            actual: OutcomeMetrics { time: 8.0, cost: 1400.0 },
            drift_time: 3.0,
            drift_cost: 400.0,
            drift_magnitude: 5.0,
            drift_kind: DriftKind::Combined,
            proposed_weight_delta: delta,
            reasoning: reasoning(3.0, 400.0),
            weights_version: WeightsVersion::new(2),
            recorded_at: Timestamp::now(),
        }
    }
}

/// "Detected drift: delivery late, cost higher than expected".
pub(crate) fn reasoning(drift_time: f64, drift_cost: f64) -> String {
    format!(
        "Detected drift: delivery {}, cost {} than expected",
        if drift_time > 0.0 { "late" } else { "on-time" },
        if drift_cost > 0.0 { "higher" } else { "lower" }
    )
}
