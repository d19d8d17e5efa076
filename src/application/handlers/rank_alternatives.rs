//! RankAlternativesHandler - ranks alternatives and shapes the wire response.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

use crate::domain::drift::WeightStore;
use crate::domain::foundation::{DomainError, WeightsVersion};
use crate::domain::mcda::{
    Confidence, Criterion, DecisionMatrix, DecisionOrchestrator, PairwiseMatrix, Polarity,
    RankedAlternative, RankingRequest, RankingResult, TopAlternative,
};

/// Command to rank alternatives from explicit pairwise judgments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankAlternativesCommand {
    pub decision_matrix: DecisionMatrix,
    pub pairwise_matrix: PairwiseMatrix,
    pub criteria_polarities: Vec<Polarity>,
    #[serde(default)]
    pub alternative_names: Option<Vec<String>>,
}

impl From<RankAlternativesCommand> for RankingRequest {
    fn from(cmd: RankAlternativesCommand) -> Self {
        RankingRequest {
            decision_matrix: cmd.decision_matrix,
            pairwise_matrix: cmd.pairwise_matrix,
            criteria_polarities: cmd.criteria_polarities,
            alternative_names: cmd.alternative_names.unwrap_or_default(),
        }
    }
}

/// Command to rank alternatives against the current weight snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankWithCurrentWeightsCommand {
    pub decision_matrix: DecisionMatrix,
    /// Named criteria in column order.
    pub criteria: Vec<Criterion>,
    #[serde(default)]
    pub alternative_names: Option<Vec<String>>,
}

/// Ranking result as returned to callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankingResponse {
    pub top_alternative: TopAlternative,
    pub all_scores: Vec<f64>,
    pub raw_topsis_scores: Vec<f64>,
    pub grey_grades: Vec<f64>,
    pub weights: Vec<f64>,
    pub consistency_ratio: f64,
    pub consistent: bool,
    pub execution_time_ms: f64,
    pub explanation: String,
    pub confidence: Confidence,
    pub ranked: Vec<RankedAlternative>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub weights_version: Option<WeightsVersion>,
}

impl From<RankingResult> for RankingResponse {
    fn from(result: RankingResult) -> Self {
        Self {
            top_alternative: result.top_alternative,
            all_scores: result.all_scores,
            raw_topsis_scores: result.topsis_scores,
            grey_grades: result.grey_grades,
            weights: result.weights,
            consistency_ratio: result.consistency_ratio,
            consistent: result.consistent,
            execution_time_ms: result.execution_time_ms,
            explanation: result.explanation,
            confidence: result.confidence,
            ranked: result.ranked,
            weights_version: result.weights_version,
        }
    }
}

/// Handler for ranking calls.
///
/// Ranking is pure and synchronous; it never touches persistence.
pub struct RankAlternativesHandler {
    orchestrator: Arc<DecisionOrchestrator>,
    weights: Arc<WeightStore>,
}

impl RankAlternativesHandler {
    pub fn new(orchestrator: Arc<DecisionOrchestrator>, weights: Arc<WeightStore>) -> Self {
        Self {
            orchestrator,
            weights,
        }
    }

    pub fn handle(&self, cmd: RankAlternativesCommand) -> Result<RankingResponse, DomainError> {
        let request = RankingRequest::from(cmd);
        let result = self.orchestrator.rank(&request)?;

        info!(
            top = %result.top_alternative.name,
            score = result.top_alternative.score,
            cr = result.consistency_ratio,
            "Ranked alternatives"
        );
        Ok(result.into())
    }

    /// Ranks with the weight snapshot active at call time.
    pub fn handle_with_current_weights(
        &self,
        cmd: RankWithCurrentWeightsCommand,
    ) -> Result<RankingResponse, DomainError> {
        let snapshot = self.weights.current();
        let names = cmd.alternative_names.unwrap_or_default();
        let result = self.orchestrator.rank_with_snapshot(
            &cmd.decision_matrix,
            &snapshot,
            &cmd.criteria,
            &names,
        )?;

        info!(
            top = %result.top_alternative.name,
            weights_version = %snapshot.version(),
            "Ranked alternatives with current weights"
        );
        Ok(result.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::ErrorCode;

    fn handler() -> RankAlternativesHandler {
        RankAlternativesHandler::new(
            Arc::new(DecisionOrchestrator::default()),
            Arc::new(WeightStore::default()),
        )
    }

    fn command() -> RankAlternativesCommand {
        RankAlternativesCommand {
            decision_matrix: DecisionMatrix::new(vec![
                vec![1.0, 2.0],
                vec![2.0, 1.0],
                vec![1.5, 1.5],
            ])
            .unwrap(),
            pairwise_matrix: PairwiseMatrix::new(vec![vec![1.0, 3.0], vec![1.0 / 3.0, 1.0]])
                .unwrap(),
            criteria_polarities: vec![Polarity::Cost, Polarity::Benefit],
            alternative_names: None,
        }
    }

    #[test]
    fn handle_returns_wire_response() {
        let response = handler().handle(command()).unwrap();

        assert_eq!(response.top_alternative.index, 0);
        assert_eq!(response.top_alternative.name, "Alternative 1");
        assert_eq!(response.all_scores.len(), 3);
        assert_eq!(response.raw_topsis_scores.len(), 3);
        assert!(response.consistent);
        assert!(response.weights_version.is_none());
    }

    #[test]
    fn response_serializes_camel_case() {
        let response = handler().handle(command()).unwrap();
        let json = serde_json::to_value(&response).unwrap();

        assert!(json.get("topAlternative").is_some());
        assert!(json.get("rawTopsisScores").is_some());
        assert!(json.get("consistencyRatio").is_some());
        assert!(json.get("executionTimeMs").is_some());
        assert!(json.get("weightsVersion").is_none());
    }

    #[test]
    fn command_deserializes_without_names() {
        let json = r#"{
            "decisionMatrix": [[1, 2], [2, 1]],
            "pairwiseMatrix": [[1, 3], [0.3333333333333333, 1]],
            "criteriaPolarities": ["cost", "benefit"]
        }"#;
        let cmd: RankAlternativesCommand = serde_json::from_str(json).unwrap();
        assert!(cmd.alternative_names.is_none());
        assert_eq!(cmd.criteria_polarities, vec![Polarity::Cost, Polarity::Benefit]);
    }

    #[test]
    fn dimension_mismatch_maps_to_domain_code() {
        let mut cmd = command();
        cmd.criteria_polarities.push(Polarity::Benefit);

        let err = handler().handle(cmd).unwrap_err();
        assert_eq!(err.code, ErrorCode::DimensionMismatch);
    }

    #[test]
    fn invalid_pairwise_maps_to_domain_code() {
        let mut cmd = command();
        cmd.pairwise_matrix = PairwiseMatrix::new(vec![vec![2.0, 3.0], vec![0.5, 1.0]]).unwrap();

        let err = handler().handle(cmd).unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidPairwiseMatrix);
    }

    #[test]
    fn current_weights_ranking_reports_snapshot_version() {
        let cmd = RankWithCurrentWeightsCommand {
            decision_matrix: DecisionMatrix::new(vec![
                vec![2000.0, 5.0, 0.90],
                vec![2500.0, 4.0, 0.95],
            ])
            .unwrap(),
            criteria: vec![
                Criterion::cost("cost"),
                Criterion::cost("time"),
                Criterion::benefit("reliability"),
            ],
            alternative_names: Some(vec!["DHL".to_string(), "Maersk".to_string()]),
        };

        let response = handler().handle_with_current_weights(cmd).unwrap();

        assert_eq!(response.weights_version, Some(WeightsVersion::INITIAL));
        assert!(response.consistency_ratio.abs() < 1e-9);
        assert!((response.weights[0] - 0.4).abs() < 1e-9);
    }

    #[test]
    fn unknown_criterion_maps_to_domain_code() {
        let cmd = RankWithCurrentWeightsCommand {
            decision_matrix: DecisionMatrix::new(vec![vec![1.0], vec![2.0]]).unwrap(),
            criteria: vec![Criterion::benefit("sustainability")],
            alternative_names: None,
        };

        let err = handler().handle_with_current_weights(cmd).unwrap_err();
        assert_eq!(err.code, ErrorCode::UnknownCriterion);
    }
}
