//! Multi-criteria decision analysis.
//!
//! The ranking pipeline: validate the pairwise judgments, derive
//! neutrosophic AHP weights, grey-normalize the decision matrix, then blend
//! TOPSIS closeness with the grey relational grade.
//!
//! Everything here is pure and synchronous. The only versioned state is the
//! `EngineWeights` snapshot passed in by reference.

mod ahp;
mod engine_weights;
mod errors;
mod forwarder_evaluation;
mod grey_normalizer;
mod grey_relational;
mod matrix;
mod matrix_validator;
mod neutrosophic;
mod orchestrator;
mod topsis;

pub use ahp::{
    random_index, AhpWeightEngine, AhpWeights, CONSISTENCY_THRESHOLD, DEFAULT_UNCERTAINTY,
    RANDOM_INDEX, RANDOM_INDEX_LARGE,
};
pub use engine_weights::{EngineWeights, BASE_WEIGHTS, WEIGHT_SUM_TOLERANCE};
pub use errors::{DecisionError, MatrixViolation, ViolationRule};
pub use forwarder_evaluation::{CriterionWeight, ForwarderMetrics, ForwarderScore};
pub use grey_normalizer::{GreyNormalization, GreyNormalizer};
pub use grey_relational::{GreyRelationalGrader, DEFAULT_DISTINGUISHING_COEFFICIENT};
pub use matrix::{Criterion, DecisionMatrix, Matrix, PairwiseMatrix, Polarity};
pub use matrix_validator::{
    MatrixValidator, ValidationReport, DIAGONAL_TOLERANCE, SAATY_SCALE, STRICT_TOLERANCE,
};
pub use neutrosophic::{
    defuzzify, NeutrosophicJudgment, NeutrosophicTriple, PairwiseJudgment, TriangularTruth,
};
pub use orchestrator::{
    BlendPolicy, Confidence, DecisionOrchestrator, EngineSettings, RankedAlternative,
    RankingRequest, RankingResult, TopAlternative,
};
pub use topsis::{Separation, TopsisOutcome, TopsisRanker};
