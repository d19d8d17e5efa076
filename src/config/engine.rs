//! Ranking engine configuration

use serde::Deserialize;

use super::error::ValidationError;
use crate::domain::mcda::{
    BlendPolicy, DecisionError, DecisionOrchestrator, EngineSettings, CONSISTENCY_THRESHOLD,
    DEFAULT_DISTINGUISHING_COEFFICIENT, DEFAULT_UNCERTAINTY,
};

const BLEND_TOLERANCE: f64 = 1e-9;

/// Ranking pipeline tuning
#[derive(Debug, Clone, Deserialize)]
pub struct EngineConfig {
    /// Share of the TOPSIS closeness in the combined score
    #[serde(default = "default_topsis_weight")]
    pub topsis_weight: f64,

    /// Share of the grey relational grade in the combined score
    #[serde(default = "default_grey_weight")]
    pub grey_weight: f64,

    /// Grey relational distinguishing coefficient ζ
    #[serde(default = "default_distinguishing_coefficient")]
    pub distinguishing_coefficient: f64,

    /// Consistency ratio at or above which judgments are flagged
    #[serde(default = "default_consistency_threshold")]
    pub consistency_threshold: f64,

    /// Indeterminacy reported on neutrosophic weights
    #[serde(default = "default_uncertainty")]
    pub uncertainty: f64,

    /// Also require reciprocity and Saaty-scale entries
    #[serde(default)]
    pub strict_pairwise: bool,
}

impl EngineConfig {
    pub fn settings(&self) -> Result<EngineSettings, DecisionError> {
        Ok(EngineSettings {
            blend: BlendPolicy::new(self.topsis_weight, self.grey_weight)?,
            distinguishing_coefficient: self.distinguishing_coefficient,
            consistency_threshold: self.consistency_threshold,
            uncertainty: self.uncertainty,
            strict_pairwise: self.strict_pairwise,
        })
    }

    pub fn orchestrator(&self) -> Result<DecisionOrchestrator, DecisionError> {
        DecisionOrchestrator::new(self.settings()?)
    }

    /// Validate engine configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        let (topsis, grey) = (self.topsis_weight, self.grey_weight);
        if topsis < 0.0 || grey < 0.0 || ((topsis + grey) - 1.0).abs() > BLEND_TOLERANCE {
            return Err(ValidationError::InvalidBlend { topsis, grey });
        }
        if !(self.distinguishing_coefficient > 0.0 && self.distinguishing_coefficient <= 1.0) {
            return Err(ValidationError::OutOfRange {
                field: "distinguishing_coefficient",
                value: self.distinguishing_coefficient,
            });
        }
        if !(self.consistency_threshold > 0.0 && self.consistency_threshold <= 1.0) {
            return Err(ValidationError::OutOfRange {
                field: "consistency_threshold",
                value: self.consistency_threshold,
            });
        }
        if !(0.0..1.0).contains(&self.uncertainty) {
            return Err(ValidationError::OutOfRange {
                field: "uncertainty",
                value: self.uncertainty,
            });
        }
        Ok(())
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            topsis_weight: default_topsis_weight(),
            grey_weight: default_grey_weight(),
            distinguishing_coefficient: default_distinguishing_coefficient(),
            consistency_threshold: default_consistency_threshold(),
            uncertainty: default_uncertainty(),
            strict_pairwise: false,
        }
    }
}

fn default_topsis_weight() -> f64 {
    0.6
}

fn default_grey_weight() -> f64 {
    0.4
}

fn default_distinguishing_coefficient() -> f64 {
    DEFAULT_DISTINGUISHING_COEFFICIENT
}

fn default_consistency_threshold() -> f64 {
    CONSISTENCY_THRESHOLD
}

fn default_uncertainty() -> f64 {
    DEFAULT_UNCERTAINTY
}
