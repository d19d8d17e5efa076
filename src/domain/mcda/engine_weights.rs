//! Versioned engine weight snapshots.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::DecisionError;
use crate::domain::foundation::{Timestamp, ValidationError, WeightsVersion};

/// Allowed deviation of a snapshot's weight sum from 1.
pub const WEIGHT_SUM_TOLERANCE: f64 = 1e-6;

/// Weights the engine starts from before any drift feedback.
pub const BASE_WEIGHTS: [(&str, f64); 3] = [("cost", 0.4), ("time", 0.3), ("reliability", 0.3)];

/// Immutable criterion → weight snapshot.
///
/// Snapshots are never edited; an update produces the successor with the
/// next version, so a ranking can always be replayed against the snapshot
/// that produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineWeights {
    version: WeightsVersion,
    weights: BTreeMap<String, f64>,
    created_at: Timestamp,
}

impl EngineWeights {
    /// Creates the first snapshot.
    pub fn initial(weights: BTreeMap<String, f64>) -> Result<Self, ValidationError> {
        Self::validate(&weights)?;
        Ok(Self {
            version: WeightsVersion::INITIAL,
            weights,
            created_at: Timestamp::now(),
        })
    }

    /// The built-in cost / time / reliability snapshot.
    pub fn baseline() -> Self {
        Self {
            version: WeightsVersion::INITIAL,
            weights: BASE_WEIGHTS
                .iter()
                .map(|(name, w)| (name.to_string(), *w))
                .collect(),
            created_at: Timestamp::now(),
        }
    }

    /// Creates the snapshot that follows this one.
    pub fn successor(&self, weights: BTreeMap<String, f64>) -> Result<Self, ValidationError> {
        Self::validate(&weights)?;
        Ok(Self {
            version: self.version.next(),
            weights,
            created_at: Timestamp::now(),
        })
    }

    pub fn version(&self) -> WeightsVersion {
        self.version
    }

    pub fn weights(&self) -> &BTreeMap<String, f64> {
        &self.weights
    }

    pub fn created_at(&self) -> Timestamp {
        self.created_at
    }

    pub fn get(&self, criterion: &str) -> Option<f64> {
        self.weights.get(criterion).copied()
    }

    /// Weights for the named criteria, in order, renormalized to sum to 1.
    pub fn select<S: AsRef<str>>(&self, criteria: &[S]) -> Result<Vec<f64>, DecisionError> {
        let picked = criteria
            .iter()
            .map(|name| {
                self.get(name.as_ref())
                    .ok_or_else(|| DecisionError::UnknownCriterion(name.as_ref().to_string()))
            })
            .collect::<Result<Vec<f64>, _>>()?;

        let total: f64 = picked.iter().sum();
        if total <= 0.0 {
            return Err(DecisionError::policy(
                "selected criteria carry no weight in the current snapshot",
            ));
        }
        Ok(picked.into_iter().map(|w| w / total).collect())
    }

    fn validate(weights: &BTreeMap<String, f64>) -> Result<(), ValidationError> {
        if weights.is_empty() {
            return Err(ValidationError::empty_field("weights"));
        }
        for (name, w) in weights {
            if !w.is_finite() || *w < 0.0 {
                return Err(ValidationError::out_of_range(name.as_str(), 0.0, 1.0, *w));
            }
        }
        let sum: f64 = weights.values().sum();
        if (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(ValidationError::out_of_range(
                "weights_sum",
                1.0 - WEIGHT_SUM_TOLERANCE,
                1.0 + WEIGHT_SUM_TOLERANCE,
                sum,
            ));
        }
        Ok(())
    }
}
