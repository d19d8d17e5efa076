//! Grey Normalizer - per-criterion min/max rescaling into [0, 1].

use serde::{Deserialize, Serialize};

use super::{DecisionError, DecisionMatrix, Matrix, Polarity};

/// Normalized decision matrix plus the columns that had no spread.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GreyNormalization {
    pub matrix: Matrix,
    /// Columns where every alternative had the same raw value.
    pub degenerate_columns: Vec<usize>,
}

/// Grey relational normalization functions.
pub struct GreyNormalizer;

impl GreyNormalizer {
    /// Rescales each criterion column to [0, 1] so that 1 is always best.
    ///
    /// # Algorithm
    /// - Benefit: (v − min) / (max − min)
    /// - Cost: (max − v) / (max − min)
    ///
    /// # Edge Cases
    /// - max == min: every cell of the column is 1 and the column is
    ///   reported as degenerate
    pub fn normalize(
        matrix: &DecisionMatrix,
        polarities: &[Polarity],
    ) -> Result<GreyNormalization, DecisionError> {
        let m = matrix.as_matrix();
        if polarities.len() != m.cols() {
            return Err(DecisionError::dimension(format!(
                "decision matrix has {} criteria but {} polarities were given",
                m.cols(),
                polarities.len()
            )));
        }

        let bounds: Vec<(f64, f64)> = (0..m.cols())
            .map(|j| {
                m.column(j).fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
                    (lo.min(v), hi.max(v))
                })
            })
            .collect();

        let degenerate_columns: Vec<usize> = bounds
            .iter()
            .enumerate()
            .filter(|(_, (lo, hi))| hi == lo)
            .map(|(j, _)| j)
            .collect();

        let normalized = Matrix::from_fn(m.rows(), m.cols(), |i, j| {
            let (lo, hi) = bounds[j];
            if hi == lo {
                return 1.0;
            }
            let v = m.get(i, j);
            match polarities[j] {
                Polarity::Benefit => (v - lo) / (hi - lo),
                Polarity::Cost => (hi - v) / (hi - lo),
            }
        });

        Ok(GreyNormalization {
            matrix: normalized,
            degenerate_columns,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decision(rows: Vec<Vec<f64>>) -> DecisionMatrix {
        DecisionMatrix::new(rows).unwrap()
    }

    #[test]
    fn benefit_column_maps_min_to_zero_and_max_to_one() {
        let d = decision(vec![vec![0.88], vec![0.94], vec![0.91]]);
        let n = GreyNormalizer::normalize(&d, &[Polarity::Benefit]).unwrap();
        assert_eq!(n.matrix.get(0, 0), 0.0);
        assert_eq!(n.matrix.get(1, 0), 1.0);
        assert!((n.matrix.get(2, 0) - 0.5).abs() < 1e-12);
        assert!(n.degenerate_columns.is_empty());
    }

    #[test]
    fn cost_column_is_reversed() {
        let d = decision(vec![vec![2000.0], vec![2500.0], vec![3000.0]]);
        let n = GreyNormalizer::normalize(&d, &[Polarity::Cost]).unwrap();
        assert_eq!(n.matrix.get(0, 0), 1.0);
        assert_eq!(n.matrix.get(1, 0), 0.5);
        assert_eq!(n.matrix.get(2, 0), 0.0);
    }

    #[test]
    fn constant_column_becomes_all_ones() {
        let d = decision(vec![vec![5.0, 1.0], vec![5.0, 2.0], vec![5.0, 3.0]]);
        let n = GreyNormalizer::normalize(&d, &[Polarity::Cost, Polarity::Benefit]).unwrap();
        for i in 0..3 {
            assert_eq!(n.matrix.get(i, 0), 1.0);
        }
        assert_eq!(n.degenerate_columns, vec![0]);
        assert!(n.matrix.values().all(f64::is_finite));
    }

    #[test]
    fn single_alternative_is_degenerate_everywhere() {
        let d = decision(vec![vec![100.0, 3.0]]);
        let n = GreyNormalizer::normalize(&d, &[Polarity::Cost, Polarity::Benefit]).unwrap();
        assert_eq!(n.matrix.to_rows(), vec![vec![1.0, 1.0]]);
        assert_eq!(n.degenerate_columns, vec![0, 1]);
    }

    #[test]
    fn polarity_count_must_match_columns() {
        let d = decision(vec![vec![1.0, 2.0]]);
        let err = GreyNormalizer::normalize(&d, &[Polarity::Benefit]).unwrap_err();
        assert!(matches!(err, DecisionError::DimensionMismatch { .. }));
    }

    #[test]
    fn every_value_lands_in_unit_interval() {
        let d = decision(vec![
            vec![-3.0, 10.0, 0.5],
            vec![7.0, -2.0, 0.25],
            vec![1.0, 4.0, 0.75],
        ]);
        let n = GreyNormalizer::normalize(
            &d,
            &[Polarity::Benefit, Polarity::Cost, Polarity::Benefit],
        )
        .unwrap();
        assert!(n.matrix.values().all(|v| (0.0..=1.0).contains(&v)));
    }
}
