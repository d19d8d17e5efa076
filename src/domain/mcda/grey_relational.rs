//! Grey Relational Grader - closeness of each alternative to the all-ones
//! reference sequence.

use super::{DecisionError, Matrix};

/// Standard distinguishing coefficient ζ.
pub const DEFAULT_DISTINGUISHING_COEFFICIENT: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GreyRelationalGrader {
    zeta: f64,
}

impl Default for GreyRelationalGrader {
    fn default() -> Self {
        Self {
            zeta: DEFAULT_DISTINGUISHING_COEFFICIENT,
        }
    }
}

impl GreyRelationalGrader {
    /// Creates a grader with a distinguishing coefficient in (0, 1].
    pub fn new(zeta: f64) -> Result<Self, DecisionError> {
        if !(zeta > 0.0 && zeta <= 1.0) {
            return Err(DecisionError::policy(format!(
                "distinguishing coefficient must lie in (0, 1], got {}",
                zeta
            )));
        }
        Ok(Self { zeta })
    }

    pub fn zeta(&self) -> f64 {
        self.zeta
    }

    /// Grey relational grade per row of a normalized matrix.
    ///
    /// # Algorithm
    /// diff = |1 − norm|, with global minDiff and maxDiff. Each cell gets
    /// (minDiff + ζ·maxDiff) / (diff + ζ·maxDiff); the grade is the row mean.
    ///
    /// # Edge Cases
    /// - maxDiff == 0: every cell equals the reference, every coefficient is 1
    /// - No criteria: every grade is 0
    pub fn grade(&self, normalized: &Matrix) -> Vec<f64> {
        if normalized.cols() == 0 {
            return vec![0.0; normalized.rows()];
        }

        let (min_diff, max_diff) = normalized
            .values()
            .map(|v| (1.0 - v).abs())
            .fold((f64::INFINITY, 0.0f64), |(lo, hi), d| (lo.min(d), hi.max(d)));

        if max_diff == 0.0 {
            return vec![1.0; normalized.rows()];
        }

        let numerator = min_diff + self.zeta * max_diff;
        normalized
            .iter_rows()
            .map(|row| {
                row.iter()
                    .map(|v| numerator / ((1.0 - v).abs() + self.zeta * max_diff))
                    .sum::<f64>()
                    / row.len() as f64
            })
            .collect()
    }
}
