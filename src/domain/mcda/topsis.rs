//! TOPSIS Ranker - closeness to the ideal solution.

use serde::{Deserialize, Serialize};

use super::{DecisionError, Matrix};

/// Euclidean distances of one alternative to the ideal and anti-ideal.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Separation {
    pub positive: f64,
    pub negative: f64,
}

impl Separation {
    /// Closeness coefficient `d− / (d+ + d−)`, 0.5 when both are zero.
    pub fn closeness(&self) -> f64 {
        let total = self.positive + self.negative;
        if total == 0.0 {
            0.5
        } else {
            self.negative / total
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopsisOutcome {
    pub scores: Vec<f64>,
    pub separations: Vec<Separation>,
}

pub struct TopsisRanker;

impl TopsisRanker {
    /// Scores each row of a normalized matrix.
    ///
    /// The normalized matrix already maps "best" to larger values for every
    /// criterion, so the ideal is the weighted column maximum and the
    /// anti-ideal the weighted column minimum.
    pub fn rank(normalized: &Matrix, weights: &[f64]) -> Result<TopsisOutcome, DecisionError> {
        if weights.len() != normalized.cols() {
            return Err(DecisionError::dimension(format!(
                "normalized matrix has {} criteria but {} weights were given",
                normalized.cols(),
                weights.len()
            )));
        }

        let weighted = Matrix::from_fn(normalized.rows(), normalized.cols(), |i, j| {
            normalized.get(i, j) * weights[j]
        });

        let ideal: Vec<f64> = (0..weighted.cols())
            .map(|j| weighted.column(j).fold(f64::NEG_INFINITY, f64::max))
            .collect();
        let anti_ideal: Vec<f64> = (0..weighted.cols())
            .map(|j| weighted.column(j).fold(f64::INFINITY, f64::min))
            .collect();

        let separations: Vec<Separation> = weighted
            .iter_rows()
            .map(|row| Separation {
                positive: euclidean(row, &ideal),
                negative: euclidean(row, &anti_ideal),
            })
            .collect();

        let scores = separations.iter().map(Separation::closeness).collect();

        Ok(TopsisOutcome {
            scores,
            separations,
        })
    }
}

fn euclidean(a: &[f64], b: &[f64]) -> f64 {
    a.iter()
        .zip(b)
        .map(|(x, y)| (x - y).powi(2))
        .sum::<f64>()
        .sqrt()
}
