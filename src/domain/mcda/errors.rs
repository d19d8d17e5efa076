//! Decision pipeline errors.
//!
//! Structural problems with the inputs are fatal and surface as
//! `DecisionError`. Numeric edge cases (tied columns, identical rows) are
//! not errors; the components resolve them with documented defaults.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::domain::foundation::{DomainError, ErrorCode, ValidationError};

/// Rule broken by a pairwise matrix entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationRule {
    Empty,
    NotSquare,
    DiagonalNotOne,
    NonPositive,
    NotReciprocal,
    OffSaatyScale,
}

impl ViolationRule {
    pub fn describe(&self) -> &'static str {
        match self {
            ViolationRule::Empty => "matrix must not be empty",
            ViolationRule::NotSquare => "matrix must be square",
            ViolationRule::DiagonalNotOne => "diagonal entries must equal 1",
            ViolationRule::NonPositive => "entries must be strictly positive",
            ViolationRule::NotReciprocal => "entry [i][j] must equal 1 / [j][i]",
            ViolationRule::OffSaatyScale => "entries must lie on the Saaty 1/9..9 scale",
        }
    }
}

/// A single violation found by the matrix validator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatrixViolation {
    pub row: Option<usize>,
    pub col: Option<usize>,
    pub rule: ViolationRule,
    pub value: Option<f64>,
}

impl MatrixViolation {
    pub fn whole(rule: ViolationRule) -> Self {
        Self {
            row: None,
            col: None,
            rule,
            value: None,
        }
    }

    pub fn at(row: usize, col: usize, rule: ViolationRule, value: f64) -> Self {
        Self {
            row: Some(row),
            col: Some(col),
            rule,
            value: Some(value),
        }
    }
}

impl fmt::Display for MatrixViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.row, self.col, self.value) {
            (Some(i), Some(j), Some(v)) => {
                write!(f, "[{}][{}] = {}: {}", i, j, v, self.rule.describe())
            }
            (Some(i), _, _) => write!(f, "row {}: {}", i, self.rule.describe()),
            _ => write!(f, "{}", self.rule.describe()),
        }
    }
}

/// Fatal errors of a ranking request. No partial result accompanies them.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DecisionError {
    #[error("Invalid pairwise matrix: {}", join_violations(.violations))]
    InvalidPairwiseMatrix { violations: Vec<MatrixViolation> },

    #[error("Dimension mismatch: {detail}")]
    DimensionMismatch { detail: String },

    #[error("Criterion '{0}' has no weight in the current snapshot")]
    UnknownCriterion(String),

    #[error("Invalid policy: {0}")]
    InvalidPolicy(String),

    #[error("Invalid input: {0}")]
    InvalidInput(#[from] ValidationError),
}

impl DecisionError {
    /// Decision columns, pairwise size and polarity count disagree.
    pub fn shapes(decision_columns: usize, pairwise_size: usize, polarity_count: usize) -> Self {
        DecisionError::DimensionMismatch {
            detail: format!(
                "decision matrix has {} criteria, pairwise matrix is {}x{}, {} polarities given",
                decision_columns, pairwise_size, pairwise_size, polarity_count
            ),
        }
    }

    pub fn dimension(detail: impl Into<String>) -> Self {
        DecisionError::DimensionMismatch {
            detail: detail.into(),
        }
    }

    pub fn policy(reason: impl Into<String>) -> Self {
        DecisionError::InvalidPolicy(reason.into())
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            DecisionError::InvalidPairwiseMatrix { .. } => ErrorCode::InvalidPairwiseMatrix,
            DecisionError::DimensionMismatch { .. } => ErrorCode::DimensionMismatch,
            DecisionError::UnknownCriterion(_) => ErrorCode::UnknownCriterion,
            DecisionError::InvalidPolicy(_) => ErrorCode::InvalidPolicy,
            DecisionError::InvalidInput(_) => ErrorCode::ValidationFailed,
        }
    }
}

fn join_violations(violations: &[MatrixViolation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl From<DecisionError> for DomainError {
    fn from(err: DecisionError) -> Self {
        let domain = DomainError::new(err.code(), err.to_string());
        match &err {
            DecisionError::InvalidPairwiseMatrix { violations } => {
                domain.with_detail("violations", violations.len().to_string())
            }
            DecisionError::UnknownCriterion(name) => domain.with_detail("criterion", name.clone()),
            _ => domain,
        }
    }
}
