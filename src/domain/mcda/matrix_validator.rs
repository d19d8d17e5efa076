//! Matrix Validator - structural checks on pairwise comparison matrices.

use serde::{Deserialize, Serialize};

use super::{DecisionError, MatrixViolation, PairwiseMatrix, ViolationRule};

/// Tolerance for the unit-diagonal check.
pub const DIAGONAL_TOLERANCE: f64 = 1e-9;

/// Tolerance for reciprocity and Saaty-scale checks in strict mode.
pub const STRICT_TOLERANCE: f64 = 1e-3;

/// The Saaty fundamental scale and its reciprocals.
pub const SAATY_SCALE: [f64; 17] = [
    1.0 / 9.0,
    1.0 / 8.0,
    1.0 / 7.0,
    1.0 / 6.0,
    1.0 / 5.0,
    1.0 / 4.0,
    1.0 / 3.0,
    1.0 / 2.0,
    1.0,
    2.0,
    3.0,
    4.0,
    5.0,
    6.0,
    7.0,
    8.0,
    9.0,
];

/// Outcome of validating a pairwise matrix.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub violations: Vec<MatrixViolation>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.violations.is_empty()
    }

    /// Converts a failing report into the fatal pipeline error.
    pub fn into_result(self) -> Result<(), DecisionError> {
        if self.is_valid() {
            Ok(())
        } else {
            Err(DecisionError::InvalidPairwiseMatrix {
                violations: self.violations,
            })
        }
    }
}

/// Pairwise matrix validation functions.
pub struct MatrixValidator;

impl MatrixValidator {
    /// Runs the structural checks in order: non-empty and square, unit
    /// diagonal, strictly positive entries.
    ///
    /// Shape failures stop the check early since cell rules are meaningless
    /// on a non-square matrix. Every cell violation is reported.
    pub fn validate(matrix: &PairwiseMatrix) -> ValidationReport {
        let m = matrix.as_matrix();
        let mut report = ValidationReport::default();

        if m.is_empty() {
            report.violations.push(MatrixViolation::whole(ViolationRule::Empty));
            return report;
        }
        if !m.is_square() {
            report.violations.push(MatrixViolation::whole(ViolationRule::NotSquare));
            return report;
        }

        let n = m.rows();
        for i in 0..n {
            let d = m.get(i, i);
            if (d - 1.0).abs() > DIAGONAL_TOLERANCE {
                report
                    .violations
                    .push(MatrixViolation::at(i, i, ViolationRule::DiagonalNotOne, d));
            }
        }

        for i in 0..n {
            for j in 0..n {
                let v = m.get(i, j);
                if v <= 0.0 {
                    report
                        .violations
                        .push(MatrixViolation::at(i, j, ViolationRule::NonPositive, v));
                }
            }
        }

        report
    }

    /// Basic checks plus reciprocity and Saaty-scale membership.
    ///
    /// Strict checks only run once the basic checks pass.
    pub fn validate_strict(matrix: &PairwiseMatrix) -> ValidationReport {
        let mut report = Self::validate(matrix);
        if !report.is_valid() {
            return report;
        }

        let m = matrix.as_matrix();
        let n = m.rows();
        for i in 0..n {
            for j in 0..n {
                let v = m.get(i, j);
                if j > i && (v * m.get(j, i) - 1.0).abs() > STRICT_TOLERANCE {
                    report
                        .violations
                        .push(MatrixViolation::at(i, j, ViolationRule::NotReciprocal, v));
                }
                if !Self::on_saaty_scale(v) {
                    report
                        .violations
                        .push(MatrixViolation::at(i, j, ViolationRule::OffSaatyScale, v));
                }
            }
        }

        report
    }

    fn on_saaty_scale(value: f64) -> bool {
        SAATY_SCALE
            .iter()
            .any(|s| (s - value).abs() <= STRICT_TOLERANCE)
    }
}
