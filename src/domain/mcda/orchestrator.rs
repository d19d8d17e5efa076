//! Decision Orchestrator - validates inputs, runs the AHP → Grey → TOPSIS
//! pipeline, blends scores and explains the result.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Instant;
use tracing::{debug, warn};

use super::{
    AhpWeightEngine, AhpWeights, Criterion, DecisionError, DecisionMatrix, EngineWeights,
    GreyNormalizer, GreyRelationalGrader, MatrixValidator, NeutrosophicTriple, PairwiseMatrix,
    Polarity, TopsisRanker, CONSISTENCY_THRESHOLD, DEFAULT_DISTINGUISHING_COEFFICIENT,
    DEFAULT_UNCERTAINTY,
};
use crate::domain::foundation::WeightsVersion;

const BLEND_SUM_TOLERANCE: f64 = 1e-9;

/// Mix of TOPSIS closeness and grey relational grade in the combined score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BlendPolicy {
    topsis_weight: f64,
    grey_weight: f64,
}

impl BlendPolicy {
    /// Both weights must be non-negative and sum to 1.
    pub fn new(topsis_weight: f64, grey_weight: f64) -> Result<Self, DecisionError> {
        if !(topsis_weight >= 0.0 && grey_weight >= 0.0) {
            return Err(DecisionError::policy(format!(
                "blend weights must be non-negative, got topsis {} and grey {}",
                topsis_weight, grey_weight
            )));
        }
        if (topsis_weight + grey_weight - 1.0).abs() > BLEND_SUM_TOLERANCE {
            return Err(DecisionError::policy(format!(
                "blend weights must sum to 1, got {}",
                topsis_weight + grey_weight
            )));
        }
        Ok(Self {
            topsis_weight,
            grey_weight,
        })
    }

    pub fn topsis_weight(&self) -> f64 {
        self.topsis_weight
    }

    pub fn grey_weight(&self) -> f64 {
        self.grey_weight
    }

    pub fn combine(&self, topsis: f64, grey: f64) -> f64 {
        self.topsis_weight * topsis + self.grey_weight * grey
    }
}

impl Default for BlendPolicy {
    fn default() -> Self {
        Self {
            topsis_weight: 0.6,
            grey_weight: 0.4,
        }
    }
}

/// Tunable parameters of the ranking pipeline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngineSettings {
    pub blend: BlendPolicy,
    pub distinguishing_coefficient: f64,
    pub consistency_threshold: f64,
    pub uncertainty: f64,
    pub strict_pairwise: bool,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            blend: BlendPolicy::default(),
            distinguishing_coefficient: DEFAULT_DISTINGUISHING_COEFFICIENT,
            consistency_threshold: CONSISTENCY_THRESHOLD,
            uncertainty: DEFAULT_UNCERTAINTY,
            strict_pairwise: false,
        }
    }
}

/// Inputs of one ranking call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankingRequest {
    pub decision_matrix: DecisionMatrix,
    pub pairwise_matrix: PairwiseMatrix,
    pub criteria_polarities: Vec<Polarity>,
    #[serde(default)]
    pub alternative_names: Vec<String>,
}

/// How strongly the top score supports the recommendation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    High,
    Moderate,
    Cautious,
}

impl Confidence {
    pub fn from_score(score: f64) -> Self {
        if score > 0.8 {
            Confidence::High
        } else if score > 0.6 {
            Confidence::Moderate
        } else {
            Confidence::Cautious
        }
    }
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Confidence::High => write!(f, "high"),
            Confidence::Moderate => write!(f, "moderate"),
            Confidence::Cautious => write!(f, "cautious"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankedAlternative {
    pub index: usize,
    pub name: String,
    pub combined_score: f64,
    pub topsis_score: f64,
    pub grey_grade: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopAlternative {
    pub index: usize,
    pub name: String,
    pub score: f64,
}

/// Output of one ranking call. Fresh per call, never cached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankingResult {
    /// Alternatives by descending combined score, ties by input order.
    pub ranked: Vec<RankedAlternative>,
    pub top_alternative: TopAlternative,
    /// Combined, TOPSIS and grey scores in input order.
    pub all_scores: Vec<f64>,
    pub topsis_scores: Vec<f64>,
    pub grey_grades: Vec<f64>,
    pub weights: Vec<f64>,
    pub neutrosophic_weights: Vec<NeutrosophicTriple>,
    pub lambda_max: f64,
    pub consistency_index: f64,
    pub consistency_ratio: f64,
    pub consistent: bool,
    pub degenerate_columns: Vec<usize>,
    pub confidence: Confidence,
    pub execution_time_ms: f64,
    pub explanation: String,
    pub weights_version: Option<WeightsVersion>,
}

/// Composes validator, weight engine, normalizer, ranker and grader.
#[derive(Debug, Clone)]
pub struct DecisionOrchestrator {
    settings: EngineSettings,
    ahp: AhpWeightEngine,
    grader: GreyRelationalGrader,
}

impl Default for DecisionOrchestrator {
    fn default() -> Self {
        Self {
            settings: EngineSettings::default(),
            ahp: AhpWeightEngine::default(),
            grader: GreyRelationalGrader::default(),
        }
    }
}

impl DecisionOrchestrator {
    pub fn new(settings: EngineSettings) -> Result<Self, DecisionError> {
        if !(0.0..1.0).contains(&settings.uncertainty) {
            return Err(DecisionError::policy(format!(
                "uncertainty must lie in [0, 1), got {}",
                settings.uncertainty
            )));
        }
        let blend = BlendPolicy::new(
            settings.blend.topsis_weight(),
            settings.blend.grey_weight(),
        )?;
        Ok(Self {
            settings: EngineSettings { blend, ..settings },
            ahp: AhpWeightEngine::new(settings.consistency_threshold)?,
            grader: GreyRelationalGrader::new(settings.distinguishing_coefficient)?,
        })
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    /// Ranks alternatives from an explicit pairwise matrix.
    ///
    /// Fails with `DimensionMismatch` when the decision columns, pairwise
    /// size and polarity count disagree or no alternative is given, and
    /// with `InvalidPairwiseMatrix` when the validator reports violations.
    pub fn rank(&self, request: &RankingRequest) -> Result<RankingResult, DecisionError> {
        let started = Instant::now();
        let pairwise = &request.pairwise_matrix;
        check_shapes(
            &request.decision_matrix,
            pairwise.size(),
            &request.criteria_polarities,
            &request.alternative_names,
        )?;

        let report = if self.settings.strict_pairwise {
            MatrixValidator::validate_strict(pairwise)
        } else {
            MatrixValidator::validate(pairwise)
        };
        report.into_result()?;

        let ahp = self.ahp.compute(pairwise);
        if !ahp.consistent {
            warn!(
                cr = ahp.consistency_ratio,
                threshold = self.ahp.consistency_threshold(),
                "Pairwise judgments are inconsistent, results may be unreliable"
            );
        }

        self.score(
            started,
            &request.decision_matrix,
            ahp,
            &request.criteria_polarities,
            &request.alternative_names,
            None,
            None,
        )
    }

    /// Ranks alternatives with weights taken from a stored snapshot.
    ///
    /// The snapshot weights of the named criteria are renormalized and used
    /// as the TOPSIS weight vector directly. Criteria whose weight drifted
    /// to 0 still rank; they just stop separating alternatives. CR is 0.
    pub fn rank_with_snapshot(
        &self,
        decision: &DecisionMatrix,
        snapshot: &EngineWeights,
        criteria: &[Criterion],
        alternative_names: &[String],
    ) -> Result<RankingResult, DecisionError> {
        let started = Instant::now();
        let names: Vec<&str> = criteria.iter().map(|c| c.name.as_str()).collect();
        let polarities: Vec<Polarity> = criteria.iter().map(|c| c.polarity).collect();
        let weights = snapshot.select(&names)?;
        check_shapes(decision, weights.len(), &polarities, alternative_names)?;

        self.score(
            started,
            decision,
            AhpWeights::from_weights(weights),
            &polarities,
            alternative_names,
            Some(names.as_slice()),
            Some(snapshot.version()),
        )
    }

    #[allow(clippy::too_many_arguments)]
    fn score(
        &self,
        started: Instant,
        decision: &DecisionMatrix,
        ahp: AhpWeights,
        polarities: &[Polarity],
        alternative_names: &[String],
        criterion_names: Option<&[&str]>,
        weights_version: Option<WeightsVersion>,
    ) -> Result<RankingResult, DecisionError> {
        let alternatives = decision.alternative_count();
        let criteria = decision.criterion_count();

        let normalization = GreyNormalizer::normalize(decision, polarities)?;
        let topsis = TopsisRanker::rank(&normalization.matrix, &ahp.weights)?;
        let grey_grades = self.grader.grade(&normalization.matrix);

        let all_scores: Vec<f64> = topsis
            .scores
            .iter()
            .zip(&grey_grades)
            .map(|(t, g)| self.settings.blend.combine(*t, *g))
            .collect();

        let name_of = |i: usize| {
            alternative_names
                .get(i)
                .cloned()
                .unwrap_or_else(|| format!("Alternative {}", i + 1))
        };

        let mut ranked: Vec<RankedAlternative> = (0..alternatives)
            .map(|i| RankedAlternative {
                index: i,
                name: name_of(i),
                combined_score: all_scores[i],
                topsis_score: topsis.scores[i],
                grey_grade: grey_grades[i],
            })
            .collect();
        ranked.sort_by(|a, b| b.combined_score.total_cmp(&a.combined_score));

        let top_index = top_index(&all_scores);
        let top_alternative = TopAlternative {
            index: top_index,
            name: name_of(top_index),
            score: all_scores[top_index],
        };
        let confidence = Confidence::from_score(top_alternative.score);

        let explanation = explain(
            &ahp,
            &top_alternative,
            confidence,
            &normalization.degenerate_columns,
            criterion_names,
        );

        debug!(
            alternatives,
            criteria,
            top = top_alternative.index,
            score = top_alternative.score,
            "Ranking complete"
        );

        Ok(RankingResult {
            ranked,
            top_alternative,
            all_scores,
            topsis_scores: topsis.scores,
            grey_grades,
            neutrosophic_weights: ahp.neutrosophic_weights(self.settings.uncertainty),
            weights: ahp.weights,
            lambda_max: ahp.lambda_max,
            consistency_index: ahp.consistency_index,
            consistency_ratio: ahp.consistency_ratio,
            consistent: ahp.consistent,
            degenerate_columns: normalization.degenerate_columns,
            confidence,
            execution_time_ms: started.elapsed().as_secs_f64() * 1000.0,
            explanation,
            weights_version,
        })
    }
}

/// Decision columns, weight count and polarity count must agree, there must
/// be at least one alternative, and names are either absent or one per row.
fn check_shapes(
    decision: &DecisionMatrix,
    weight_count: usize,
    polarities: &[Polarity],
    alternative_names: &[String],
) -> Result<(), DecisionError> {
    let alternatives = decision.alternative_count();
    if alternatives == 0 {
        return Err(DecisionError::dimension(
            "decision matrix must contain at least one alternative",
        ));
    }
    let criteria = decision.criterion_count();
    if criteria != weight_count || criteria != polarities.len() {
        return Err(DecisionError::shapes(
            criteria,
            weight_count,
            polarities.len(),
        ));
    }
    if !alternative_names.is_empty() && alternative_names.len() != alternatives {
        return Err(DecisionError::dimension(format!(
            "{} alternative names given for {} alternatives",
            alternative_names.len(),
            alternatives
        )));
    }
    Ok(())
}

/// First index of the maximum score.
fn top_index(scores: &[f64]) -> usize {
    let mut best = 0;
    for (i, score) in scores.iter().enumerate().skip(1) {
        if *score > scores[best] {
            best = i;
        }
    }
    best
}

fn explain(
    ahp: &AhpWeights,
    top: &TopAlternative,
    confidence: Confidence,
    degenerate_columns: &[usize],
    criterion_names: Option<&[&str]>,
) -> String {
    let label = |j: usize| match criterion_names.and_then(|names| names.get(j)) {
        Some(name) => name.to_string(),
        None => format!("criterion {}", j + 1),
    };

    let weights = ahp
        .weights
        .iter()
        .enumerate()
        .map(|(j, w)| format!("{} {:.3}", label(j), w))
        .collect::<Vec<_>>()
        .join(", ");

    let mut text = format!(
        "Based on neutrosophic-grey analysis, {} ranks first with a {} confidence score of {:.2}. \
         Criterion weights: {}. Consistency ratio {:.3} ({}).",
        top.name,
        confidence,
        top.score,
        weights,
        ahp.consistency_ratio,
        if ahp.consistent {
            "consistent"
        } else {
            "inconsistent, treat the ranking with caution"
        }
    );

    if !degenerate_columns.is_empty() {
        let columns = degenerate_columns
            .iter()
            .map(|j| label(*j))
            .collect::<Vec<_>>()
            .join(", ");
        text.push_str(&format!(
            " No spread between alternatives on {}; those criteria do not separate them.",
            columns
        ));
    }

    text
}
