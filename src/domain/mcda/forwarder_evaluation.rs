//! Convenience ranking of named forwarders with named metrics.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::{
    DecisionError, DecisionMatrix, DecisionOrchestrator, PairwiseMatrix, Polarity, RankingRequest,
};

/// A forwarder and its raw metric values by criterion name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForwarderMetrics {
    pub name: String,
    pub metrics: BTreeMap<String, f64>,
}

impl ForwarderMetrics {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            metrics: BTreeMap::new(),
        }
    }

    pub fn with_metric(mut self, criterion: impl Into<String>, value: f64) -> Self {
        self.metrics.insert(criterion.into(), value);
        self
    }
}

/// Relative importance of one criterion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CriterionWeight {
    pub name: String,
    pub weight: f64,
}

impl CriterionWeight {
    pub fn new(name: impl Into<String>, weight: f64) -> Self {
        Self {
            name: name.into(),
            weight,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForwarderScore {
    pub forwarder: ForwarderMetrics,
    pub score: f64,
    /// 1-based position in the ranking.
    pub rank: usize,
}

impl DecisionOrchestrator {
    /// Scores forwarders against weighted criteria and returns them best
    /// first.
    ///
    /// Criterion weights are normalized to sum to 1 and must be positive.
    /// Polarity comes from the criterion name: anything mentioning "cost" is
    /// a cost criterion. A metric a forwarder lacks counts as 0.
    pub fn evaluate_forwarders(
        &self,
        forwarders: &[ForwarderMetrics],
        criteria: &[CriterionWeight],
    ) -> Result<Vec<ForwarderScore>, DecisionError> {
        if criteria.is_empty() {
            return Err(DecisionError::dimension("at least one criterion is required"));
        }

        let total: f64 = criteria.iter().map(|c| c.weight).sum();
        let weights: Vec<f64> = criteria.iter().map(|c| c.weight / total).collect();

        let rows = forwarders
            .iter()
            .map(|f| {
                criteria
                    .iter()
                    .map(|c| f.metrics.get(&c.name).copied().unwrap_or(0.0))
                    .collect()
            })
            .collect();

        let request = RankingRequest {
            decision_matrix: DecisionMatrix::new(rows)?,
            pairwise_matrix: PairwiseMatrix::from_weights(&weights)?,
            criteria_polarities: criteria
                .iter()
                .map(|c| Polarity::infer_from_name(&c.name))
                .collect(),
            alternative_names: forwarders.iter().map(|f| f.name.clone()).collect(),
        };
        let result = self.rank(&request)?;

        Ok(result
            .ranked
            .iter()
            .enumerate()
            .map(|(position, ranked)| ForwarderScore {
                forwarder: forwarders[ranked.index].clone(),
                score: ranked.combined_score,
                rank: position + 1,
            })
            .collect())
    }
}
