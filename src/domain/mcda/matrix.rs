//! Dense matrices with explicit dimensions, and the two decision inputs
//! built on them.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::foundation::ValidationError;

/// Row-major matrix of finite `f64` values.
///
/// Dimensions are fixed at construction; ragged rows and non-finite values
/// are rejected there, so every downstream computation can index freely.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Vec<f64>>", into = "Vec<Vec<f64>>")]
pub struct Matrix {
    rows: usize,
    cols: usize,
    data: Vec<f64>,
}

impl Matrix {
    /// Builds a matrix from nested rows, naming `field` in any error.
    pub fn try_from_rows(field: &str, rows: Vec<Vec<f64>>) -> Result<Self, ValidationError> {
        let row_count = rows.len();
        let cols = rows.first().map(Vec::len).unwrap_or(0);
        let mut data = Vec::with_capacity(row_count * cols);

        for (i, row) in rows.into_iter().enumerate() {
            if row.len() != cols {
                return Err(ValidationError::ragged_row(field, i, cols, row.len()));
            }
            for (j, value) in row.into_iter().enumerate() {
                if !value.is_finite() {
                    return Err(ValidationError::non_finite(field, i, j));
                }
                data.push(value);
            }
        }

        Ok(Self {
            rows: row_count,
            cols,
            data,
        })
    }

    /// Builds a `rows × cols` matrix by evaluating `f(i, j)` for each cell.
    pub fn from_fn(rows: usize, cols: usize, mut f: impl FnMut(usize, usize) -> f64) -> Self {
        let mut data = Vec::with_capacity(rows * cols);
        for i in 0..rows {
            for j in 0..cols {
                data.push(f(i, j));
            }
        }
        Self { rows, cols, data }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn is_empty(&self) -> bool {
        self.rows == 0 || self.cols == 0
    }

    pub fn is_square(&self) -> bool {
        self.rows == self.cols
    }

    /// Returns the value at `[i][j]`.
    ///
    /// # Panics
    /// Panics if the index is out of bounds.
    pub fn get(&self, i: usize, j: usize) -> f64 {
        assert!(i < self.rows && j < self.cols, "matrix index out of bounds");
        self.data[i * self.cols + j]
    }

    /// Returns row `i` as a slice.
    pub fn row(&self, i: usize) -> &[f64] {
        let start = i * self.cols;
        &self.data[start..start + self.cols]
    }

    /// Iterates over rows as slices.
    pub fn iter_rows(&self) -> impl Iterator<Item = &[f64]> + '_ {
        (0..self.rows).map(move |i| self.row(i))
    }

    /// Iterates over column `j` top to bottom.
    pub fn column(&self, j: usize) -> impl Iterator<Item = f64> + '_ {
        (0..self.rows).map(move |i| self.data[i * self.cols + j])
    }

    /// Iterates over every cell in row-major order.
    pub fn values(&self) -> impl Iterator<Item = f64> + '_ {
        self.data.iter().copied()
    }

    /// Returns the matrix as nested rows.
    pub fn to_rows(&self) -> Vec<Vec<f64>> {
        self.iter_rows().map(<[f64]>::to_vec).collect()
    }

    /// Multiplies the matrix by a column vector.
    pub fn mul_vec(&self, v: &[f64]) -> Vec<f64> {
        self.iter_rows()
            .map(|row| row.iter().zip(v).map(|(a, b)| a * b).sum())
            .collect()
    }
}

impl TryFrom<Vec<Vec<f64>>> for Matrix {
    type Error = ValidationError;

    fn try_from(rows: Vec<Vec<f64>>) -> Result<Self, Self::Error> {
        Self::try_from_rows("matrix", rows)
    }
}

impl From<Matrix> for Vec<Vec<f64>> {
    fn from(matrix: Matrix) -> Self {
        matrix.to_rows()
    }
}

/// Criterion polarity: whether larger raw values are better or worse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Polarity {
    Benefit,
    Cost,
}

impl Polarity {
    /// Infers polarity from a criterion name: anything mentioning "cost"
    /// is a cost criterion, everything else is a benefit.
    pub fn infer_from_name(name: &str) -> Self {
        if name.to_lowercase().contains("cost") {
            Polarity::Cost
        } else {
            Polarity::Benefit
        }
    }
}

impl fmt::Display for Polarity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Polarity::Benefit => write!(f, "benefit"),
            Polarity::Cost => write!(f, "cost"),
        }
    }
}

/// A named decision criterion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Criterion {
    pub name: String,
    pub polarity: Polarity,
}

impl Criterion {
    pub fn new(name: impl Into<String>, polarity: Polarity) -> Self {
        Self {
            name: name.into(),
            polarity,
        }
    }

    pub fn benefit(name: impl Into<String>) -> Self {
        Self::new(name, Polarity::Benefit)
    }

    pub fn cost(name: impl Into<String>) -> Self {
        Self::new(name, Polarity::Cost)
    }
}

/// Square matrix of pairwise importance judgments between criteria.
///
/// Construction only guarantees a rectangular, finite matrix. Squareness,
/// the unit diagonal and positivity are checked by the `MatrixValidator`
/// so that violations can be reported together.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Vec<f64>>", into = "Vec<Vec<f64>>")]
pub struct PairwiseMatrix(Matrix);

impl PairwiseMatrix {
    pub fn new(rows: Vec<Vec<f64>>) -> Result<Self, ValidationError> {
        Matrix::try_from_rows("pairwise_matrix", rows).map(Self)
    }

    pub(crate) fn from_matrix(matrix: Matrix) -> Self {
        Self(matrix)
    }

    /// Builds the perfectly consistent matrix `a[i][j] = w[i] / w[j]`.
    ///
    /// Every weight must be strictly positive.
    pub fn from_weights(weights: &[f64]) -> Result<Self, ValidationError> {
        if weights.is_empty() {
            return Err(ValidationError::empty_field("weights"));
        }
        if let Some(&bad) = weights.iter().find(|w| !w.is_finite() || **w <= 0.0) {
            return Err(ValidationError::out_of_range("weights", 0.0, f64::MAX, bad));
        }
        let n = weights.len();
        Ok(Self::from_matrix(Matrix::from_fn(n, n, |i, j| {
            if i == j {
                1.0
            } else {
                weights[i] / weights[j]
            }
        })))
    }

    /// Number of rows, which is the criterion count once validated.
    pub fn size(&self) -> usize {
        self.0.rows()
    }

    pub fn as_matrix(&self) -> &Matrix {
        &self.0
    }
}

impl TryFrom<Vec<Vec<f64>>> for PairwiseMatrix {
    type Error = ValidationError;

    fn try_from(rows: Vec<Vec<f64>>) -> Result<Self, Self::Error> {
        Self::new(rows)
    }
}

impl From<PairwiseMatrix> for Vec<Vec<f64>> {
    fn from(matrix: PairwiseMatrix) -> Self {
        matrix.0.to_rows()
    }
}

/// Raw `alternatives × criteria` decision matrix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Vec<f64>>", into = "Vec<Vec<f64>>")]
pub struct DecisionMatrix(Matrix);

impl DecisionMatrix {
    pub fn new(rows: Vec<Vec<f64>>) -> Result<Self, ValidationError> {
        Matrix::try_from_rows("decision_matrix", rows).map(Self)
    }

    pub fn alternative_count(&self) -> usize {
        self.0.rows()
    }

    pub fn criterion_count(&self) -> usize {
        self.0.cols()
    }

    pub fn as_matrix(&self) -> &Matrix {
        &self.0
    }
}

impl TryFrom<Vec<Vec<f64>>> for DecisionMatrix {
    type Error = ValidationError;

    fn try_from(rows: Vec<Vec<f64>>) -> Result<Self, Self::Error> {
        Self::new(rows)
    }
}

impl From<DecisionMatrix> for Vec<Vec<f64>> {
    fn from(matrix: DecisionMatrix) -> Self {
        matrix.0.to_rows()
    }
}
