//! Drift adjustment policy.
//!
//! None of these numbers are derived; they are tuning knobs with defaults.

use serde::{Deserialize, Serialize};

use super::DriftError;

/// Thresholds and step sizes used to turn an observed drift into a weight
/// adjustment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriftPolicy {
    /// Amount added to or removed from a weight per adjustment.
    pub weight_step: f64,
    /// Divisor bringing cost drift to the order of magnitude of day counts.
    pub cost_scale: f64,
    /// Days late before the time weight is raised.
    pub time_tolerance_days: f64,
    /// Currency units over prediction before the cost weight is raised.
    pub cost_tolerance: f64,
    /// Late deliveries tolerated per alternative before warning.
    pub underperformance_threshold: usize,
    pub time_criterion: String,
    pub cost_criterion: String,
    pub reliability_criterion: String,
}

impl Default for DriftPolicy {
    fn default() -> Self {
        Self {
            weight_step: 0.05,
            cost_scale: 100.0,
            time_tolerance_days: 1.0,
            cost_tolerance: 200.0,
            underperformance_threshold: 2,
            time_criterion: "time".to_string(),
            cost_criterion: "cost".to_string(),
            reliability_criterion: "reliability".to_string(),
        }
    }
}

impl DriftPolicy {
    pub fn validate(&self) -> Result<(), DriftError> {
        if !(self.weight_step > 0.0 && self.weight_step < 1.0) {
            return Err(DriftError::policy(format!(
                "weight step must lie in (0, 1), got {}",
                self.weight_step
            )));
        }
        if !(self.cost_scale > 0.0 && self.cost_scale.is_finite()) {
            return Err(DriftError::policy(format!(
                "cost scale must be positive, got {}",
                self.cost_scale
            )));
        }
        if !(self.time_tolerance_days >= 0.0 && self.cost_tolerance >= 0.0) {
            return Err(DriftError::policy("tolerances must be non-negative"));
        }
        for name in [
            &self.time_criterion,
            &self.cost_criterion,
            &self.reliability_criterion,
        ] {
            if name.trim().is_empty() {
                return Err(DriftError::policy("criterion names must not be blank"));
            }
        }
        Ok(())
    }
}
