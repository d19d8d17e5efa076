//! Drift tracking configuration

use serde::Deserialize;
use std::collections::BTreeMap;

use super::error::ValidationError;
use crate::domain::drift::DriftPolicy;
use crate::domain::mcda::{EngineWeights, BASE_WEIGHTS, WEIGHT_SUM_TOLERANCE};

/// Adaptive drift tracking knobs and the initial weight snapshot
#[derive(Debug, Clone, Deserialize)]
pub struct DriftConfig {
    #[serde(default = "default_weight_step")]
    pub weight_step: f64,

    #[serde(default = "default_cost_scale")]
    pub cost_scale: f64,

    /// Days late tolerated before the time weight is raised
    #[serde(default = "default_time_tolerance_days")]
    pub time_tolerance_days: f64,

    /// Cost overrun tolerated before the cost weight is raised
    #[serde(default = "default_cost_tolerance")]
    pub cost_tolerance: f64,

    #[serde(default = "default_underperformance_threshold")]
    pub underperformance_threshold: usize,

    /// Weights of the first snapshot, by criterion name
    #[serde(default = "default_base_weights")]
    pub base_weights: BTreeMap<String, f64>,
}

impl DriftConfig {
    pub fn policy(&self) -> DriftPolicy {
        DriftPolicy {
            weight_step: self.weight_step,
            cost_scale: self.cost_scale,
            time_tolerance_days: self.time_tolerance_days,
            cost_tolerance: self.cost_tolerance,
            underperformance_threshold: self.underperformance_threshold,
            ..DriftPolicy::default()
        }
    }

    /// The snapshot the weight store starts from.
    pub fn initial_weights(&self) -> Result<EngineWeights, ValidationError> {
        EngineWeights::initial(self.base_weights.clone())
            .map_err(|e| ValidationError::InvalidBaseWeights(e.to_string()))
    }

    /// Validate drift configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.policy()
            .validate()
            .map_err(|e| ValidationError::InvalidDriftPolicy(e.to_string()))?;

        let sum: f64 = self.base_weights.values().sum();
        if (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(ValidationError::InvalidBaseWeights(format!(
                "weights sum to {}, expected 1",
                sum
            )));
        }
        self.initial_weights().map(|_| ())
    }
}

impl Default for DriftConfig {
    fn default() -> Self {
        Self {
            weight_step: default_weight_step(),
            cost_scale: default_cost_scale(),
            time_tolerance_days: default_time_tolerance_days(),
            cost_tolerance: default_cost_tolerance(),
            underperformance_threshold: default_underperformance_threshold(),
            base_weights: default_base_weights(),
        }
    }
}

fn default_weight_step() -> f64 {
    0.05
}

fn default_cost_scale() -> f64 {
    100.0
}

fn default_time_tolerance_days() -> f64 {
    1.0
}

fn default_cost_tolerance() -> f64 {
    200.0
}

fn default_underperformance_threshold() -> usize {
    2
}

fn default_base_weights() -> BTreeMap<String, f64> {
    BASE_WEIGHTS
        .iter()
        .map(|(name, weight)| (name.to_string(), *weight))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::WeightsVersion;

    #[test]
    fn test_drift_defaults() {
        let config = DriftConfig::default();
        assert_eq!(config.policy(), DriftPolicy::default());
        assert_eq!(config.base_weights.get("cost"), Some(&0.4));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_initial_weights_start_at_first_version() {
        let weights = DriftConfig::default().initial_weights().unwrap();
        assert_eq!(weights.version(), WeightsVersion::INITIAL);
        assert_eq!(weights.get("reliability"), Some(0.3));
    }

    #[test]
    fn test_step_out_of_range() {
        let config = DriftConfig {
            weight_step: 1.5,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ValidationError::InvalidDriftPolicy(_))
        ));
    }

    #[test]
    fn test_base_weights_must_sum_to_one() {
        let mut config = DriftConfig::default();
        config.base_weights.insert("cost".to_string(), 0.9);
        assert!(matches!(
            config.validate(),
            Err(ValidationError::InvalidBaseWeights(_))
        ));
    }
}
