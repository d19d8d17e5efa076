//! Neutrosophic numbers: truth, indeterminacy and falsity memberships.

use serde::{Deserialize, Serialize};

use super::{Matrix, PairwiseMatrix};
use crate::domain::foundation::ValidationError;

/// Triangular truth membership `lower ≤ middle ≤ upper`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TriangularTruth {
    pub lower: f64,
    pub middle: f64,
    pub upper: f64,
}

/// Triangular neutrosophic number attached to a crisp weight.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NeutrosophicTriple {
    pub truth: TriangularTruth,
    pub indeterminacy: f64,
    pub falsity: f64,
}

impl NeutrosophicTriple {
    /// Spreads a crisp mean into a neutrosophic triple with uncertainty `u`.
    ///
    /// lower = max(0, mean·(1−u)), upper = min(1, mean·(1+u)),
    /// indeterminacy = u, falsity = 1 − mean·(1−u).
    pub fn from_mean(mean: f64, uncertainty: f64) -> Self {
        let shrunk = mean * (1.0 - uncertainty);
        Self {
            truth: TriangularTruth {
                lower: shrunk.max(0.0),
                middle: mean,
                upper: (mean * (1.0 + uncertainty)).min(1.0),
            },
            indeterminacy: uncertainty,
            falsity: 1.0 - shrunk,
        }
    }

    /// Crisp value `middle × (1 − indeterminacy)`.
    pub fn crisp(&self) -> f64 {
        self.truth.middle * (1.0 - self.indeterminacy)
    }
}

/// Defuzzifies triples and renormalizes the crisp values to sum to 1.
///
/// Returns an empty vector when the crisp values sum to zero.
pub fn defuzzify(triples: &[NeutrosophicTriple]) -> Vec<f64> {
    let crisp: Vec<f64> = triples.iter().map(NeutrosophicTriple::crisp).collect();
    let total: f64 = crisp.iter().sum();
    if total <= 0.0 {
        return Vec::new();
    }
    crisp.into_iter().map(|c| c / total).collect()
}

/// Expert judgment "criterion i is more important than criterion j" as
/// single-valued truth, indeterminacy and falsity memberships.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NeutrosophicJudgment {
    pub truth: f64,
    pub indeterminacy: f64,
    pub falsity: f64,
}

impl NeutrosophicJudgment {
    pub fn new(truth: f64, indeterminacy: f64, falsity: f64) -> Result<Self, ValidationError> {
        for (field, value) in [
            ("truth", truth),
            ("indeterminacy", indeterminacy),
            ("falsity", falsity),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ValidationError::out_of_range(field, 0.0, 1.0, value));
            }
        }
        Ok(Self {
            truth,
            indeterminacy,
            falsity,
        })
    }

    /// Score `T − F`, in [-1, 1].
    pub fn score(&self) -> f64 {
        self.truth - self.falsity
    }

    /// Pairwise ratio: `1 + s` for a non-negative score, `1 / (1 − s)`
    /// otherwise.
    pub fn pairwise_value(&self) -> f64 {
        let s = self.score();
        if s >= 0.0 {
            1.0 + s
        } else {
            1.0 / (1.0 - s)
        }
    }
}

/// A judgment placed at row `row`, column `col` of a pairwise matrix.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PairwiseJudgment {
    pub row: usize,
    pub col: usize,
    pub judgment: NeutrosophicJudgment,
}

impl PairwiseMatrix {
    /// Builds an `n × n` reciprocal matrix from neutrosophic judgments.
    ///
    /// Each judgment writes its pairwise value at `[row][col]` and the
    /// reciprocal at `[col][row]`; later judgments for the same pair win.
    /// Pairs without a judgment stay at 1.
    pub fn from_judgments(
        n: usize,
        judgments: &[PairwiseJudgment],
    ) -> Result<Self, ValidationError> {
        if n == 0 {
            return Err(ValidationError::empty_field("criteria"));
        }

        let mut cells = vec![1.0; n * n];
        for j in judgments {
            if j.row >= n || j.col >= n {
                return Err(ValidationError::invalid_format(
                    "judgments",
                    format!("pair ({}, {}) outside a {}x{} matrix", j.row, j.col, n, n),
                ));
            }
            if j.row == j.col {
                return Err(ValidationError::invalid_format(
                    "judgments",
                    format!("criterion {} cannot be compared with itself", j.row),
                ));
            }
            let value = j.judgment.pairwise_value();
            cells[j.row * n + j.col] = value;
            cells[j.col * n + j.row] = 1.0 / value;
        }

        Ok(Self::from_matrix(Matrix::from_fn(n, n, |i, k| cells[i * n + k])))
    }
}
