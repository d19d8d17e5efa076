//! Neutrosophic AHP Weight Engine - criterion weights and consistency.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{DecisionError, NeutrosophicTriple, PairwiseMatrix};

/// Saaty's random consistency index for n = 1..=10.
pub const RANDOM_INDEX: [f64; 10] = [0.0, 0.0, 0.58, 0.90, 1.12, 1.24, 1.32, 1.41, 1.45, 1.49];

/// Random index used for matrices larger than 10×10.
pub const RANDOM_INDEX_LARGE: f64 = 1.5;

/// Default consistency ratio below which judgments count as consistent.
pub const CONSISTENCY_THRESHOLD: f64 = 0.10;

/// Default uncertainty applied by the neutrosophic extension.
pub const DEFAULT_UNCERTAINTY: f64 = 0.1;

/// Returns the random index for an `n × n` matrix.
pub fn random_index(n: usize) -> f64 {
    match n {
        0 => 0.0,
        n if n <= RANDOM_INDEX.len() => RANDOM_INDEX[n - 1],
        _ => RANDOM_INDEX_LARGE,
    }
}

/// Weights and consistency figures derived from a pairwise matrix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AhpWeights {
    pub weights: Vec<f64>,
    pub lambda_max: f64,
    pub consistency_index: f64,
    pub consistency_ratio: f64,
    pub consistent: bool,
}

impl AhpWeights {
    /// Figures for a weight vector taken as given, as from a fully
    /// consistent matrix: λmax = n, CI = CR = 0.
    pub fn from_weights(weights: Vec<f64>) -> Self {
        Self {
            lambda_max: weights.len() as f64,
            weights,
            consistency_index: 0.0,
            consistency_ratio: 0.0,
            consistent: true,
        }
    }

    /// Neutrosophic triple for every weight under the given uncertainty.
    pub fn neutrosophic_weights(&self, uncertainty: f64) -> Vec<NeutrosophicTriple> {
        self.weights
            .iter()
            .map(|&w| NeutrosophicTriple::from_mean(w, uncertainty))
            .collect()
    }
}

/// Derives criterion weights using the column-normalization and row-average
/// approximation of the principal eigenvector.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AhpWeightEngine {
    consistency_threshold: f64,
}

impl Default for AhpWeightEngine {
    fn default() -> Self {
        Self {
            consistency_threshold: CONSISTENCY_THRESHOLD,
        }
    }
}

impl AhpWeightEngine {
    /// Creates an engine with a custom consistency threshold in (0, 1].
    pub fn new(consistency_threshold: f64) -> Result<Self, DecisionError> {
        if !(consistency_threshold > 0.0 && consistency_threshold <= 1.0) {
            return Err(DecisionError::policy(format!(
                "consistency threshold must lie in (0, 1], got {}",
                consistency_threshold
            )));
        }
        Ok(Self {
            consistency_threshold,
        })
    }

    pub fn consistency_threshold(&self) -> f64 {
        self.consistency_threshold
    }

    /// Computes weights, λmax, CI, CR and the consistency flag.
    ///
    /// # Algorithm
    /// 1. Divide each entry by its column sum.
    /// 2. Weight of row i = mean of normalized row i.
    /// 3. λmax = mean over i of (A·w)\[i\] / w\[i\].
    /// 4. CI = (λmax − n) / (n − 1), CR = CI / RI\[n\].
    ///
    /// # Edge Cases
    /// - n = 1: weight 1, CI = CR = 0
    /// - RI = 0 (n ≤ 2): CR = 0, every such matrix counts as consistent
    ///
    /// The matrix must already have passed the `MatrixValidator`.
    pub fn compute(&self, matrix: &PairwiseMatrix) -> AhpWeights {
        let a = matrix.as_matrix();
        let n = matrix.size();

        let col_sums: Vec<f64> = (0..n).map(|j| a.column(j).sum()).collect();
        let weights: Vec<f64> = a
            .iter_rows()
            .map(|row| {
                row.iter()
                    .zip(&col_sums)
                    .map(|(v, sum)| v / sum)
                    .sum::<f64>()
                    / n as f64
            })
            .collect();

        let aw = a.mul_vec(&weights);
        let lambda_max = aw
            .iter()
            .zip(&weights)
            .map(|(x, w)| x / w)
            .sum::<f64>()
            / n as f64;

        let consistency_index = if n > 1 {
            (lambda_max - n as f64) / (n as f64 - 1.0)
        } else {
            0.0
        };

        let ri = random_index(n);
        let consistency_ratio = if ri > 0.0 { consistency_index / ri } else { 0.0 };
        let consistent = consistency_ratio < self.consistency_threshold;

        debug!(
            criteria = n,
            lambda_max,
            ci = consistency_index,
            cr = consistency_ratio,
            consistent,
            "AHP weights computed"
        );

        AhpWeights {
            weights,
            lambda_max,
            consistency_index,
            consistency_ratio,
            consistent,
        }
    }
}
