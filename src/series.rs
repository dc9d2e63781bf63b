//! In-memory representation of per-execution kernel outputs.
//!
//! An [`ExecutionSeries`] holds one [`Execution`] per independent run of a kernel,
//! ordered by execution index. Series are built once by the reconstruction module
//! and are immutable afterwards.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Declared kind of the data stored in a series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataKind {
    /// One flat vector per execution (`Ejecucion,Indice,Valor`).
    Vector,
    /// One dense matrix per execution (`Ejecucion,Fila,Columna,Valor`).
    Matrix,
}

impl DataKind {
    /// Get a data kind by its lowercase name.
    pub fn get_by_name(name: &str) -> Option<Self> {
        match name {
            "vector" => Some(DataKind::Vector),
            "matrix" => Some(DataKind::Matrix),
            _ => None,
        }
    }
}

impl FromStr for DataKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::get_by_name(&s.to_ascii_lowercase())
            .ok_or_else(|| format!("unknown data kind '{s}' (expected vector or matrix)"))
    }
}

impl fmt::Display for DataKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataKind::Vector => write!(f, "vector"),
            DataKind::Matrix => write!(f, "matrix"),
        }
    }
}

/// Dimensions of a single execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Shape {
    Vector(usize),
    Matrix { rows: usize, cols: usize },
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Shape::Vector(len) => write!(f, "({len})"),
            Shape::Matrix { rows, cols } => write!(f, "({rows}, {cols})"),
        }
    }
}

/// Dense row-major matrix of `f64`.
#[derive(Debug, Clone, PartialEq)]
pub struct Matrix {
    rows: usize,
    cols: usize,
    data: Vec<f64>,
}

impl Matrix {
    /// Creates a `rows x cols` matrix filled with zeros. Callers bound the
    /// extents first.
    pub(crate) fn zeros(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            data: vec![0.0; rows * cols],
        }
    }

    /// Creates a matrix from row-major data. Returns `None` when the data length
    /// does not equal `rows * cols`.
    pub fn from_row_major(rows: usize, cols: usize, data: Vec<f64>) -> Option<Self> {
        if rows.checked_mul(cols) != Some(data.len()) {
            return None;
        }
        Some(Self { rows, cols, data })
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Value at a 0-based `(row, col)` position.
    pub fn get(&self, row: usize, col: usize) -> Option<f64> {
        if row >= self.rows || col >= self.cols {
            return None;
        }
        Some(self.data[row * self.cols + col])
    }

    pub(crate) fn set(&mut self, row: usize, col: usize, value: f64) {
        self.data[row * self.cols + col] = value;
    }

    /// Row-major view of every element.
    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }
}

/// The full output of one execution.
#[derive(Debug, Clone, PartialEq)]
pub enum Execution {
    Vector(Vec<f64>),
    Matrix(Matrix),
}

impl Execution {
    pub fn shape(&self) -> Shape {
        match self {
            Execution::Vector(values) => Shape::Vector(values.len()),
            Execution::Matrix(matrix) => Shape::Matrix {
                rows: matrix.rows(),
                cols: matrix.cols(),
            },
        }
    }

    /// Flattened values; matrices are returned row-major.
    pub fn values(&self) -> &[f64] {
        match self {
            Execution::Vector(values) => values,
            Execution::Matrix(matrix) => matrix.as_slice(),
        }
    }

    pub fn len(&self) -> usize {
        self.values().len()
    }

    pub fn is_empty(&self) -> bool {
        self.values().is_empty()
    }
}

/// Ordered sequence of executions sharing one declared [`DataKind`].
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionSeries {
    kind: DataKind,
    executions: Vec<Execution>,
}

impl ExecutionSeries {
    /// Builds a vector series; execution `i` of the result is `vectors[i]`.
    pub fn from_vectors(vectors: Vec<Vec<f64>>) -> Self {
        Self {
            kind: DataKind::Vector,
            executions: vectors.into_iter().map(Execution::Vector).collect(),
        }
    }

    /// Builds a matrix series; execution `i` of the result is `matrices[i]`.
    pub fn from_matrices(matrices: Vec<Matrix>) -> Self {
        Self {
            kind: DataKind::Matrix,
            executions: matrices.into_iter().map(Execution::Matrix).collect(),
        }
    }

    /// An empty series of the given kind (input with no executions).
    pub fn empty(kind: DataKind) -> Self {
        Self {
            kind,
            executions: Vec::new(),
        }
    }

    pub fn kind(&self) -> DataKind {
        self.kind
    }

    /// Number of executions.
    pub fn len(&self) -> usize {
        self.executions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.executions.is_empty()
    }

    /// Execution at a 0-based position (execution index `position + 1`).
    pub fn get(&self, position: usize) -> Option<&Execution> {
        self.executions.get(position)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Execution> {
        self.executions.iter()
    }

    pub fn executions(&self) -> &[Execution] {
        &self.executions
    }

    /// Returns the first execution whose shape differs from the first one, as
    /// `(position, expected, actual)`.
    pub fn first_shape_mismatch(&self) -> Option<(usize, Shape, Shape)> {
        let expected = self.executions.first()?.shape();
        self.executions
            .iter()
            .enumerate()
            .skip(1)
            .find(|(_, execution)| execution.shape() != expected)
            .map(|(position, execution)| (position, expected, execution.shape()))
    }
}

impl<'a> IntoIterator for &'a ExecutionSeries {
    type Item = &'a Execution;
    type IntoIter = std::slice::Iter<'a, Execution>;

    fn into_iter(self) -> Self::IntoIter {
        self.executions.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matrix_row_major_access() {
        let matrix = Matrix::from_row_major(2, 3, vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]).unwrap();
        assert_eq!(matrix.get(0, 2), Some(3.0));
        assert_eq!(matrix.get(1, 0), Some(4.0));
        assert_eq!(matrix.get(2, 0), None);
    }

    #[test]
    fn test_from_row_major_rejects_wrong_length() {
        assert!(Matrix::from_row_major(2, 2, vec![1.0, 2.0, 3.0]).is_none());
    }

    #[test]
    fn test_first_shape_mismatch() {
        let uniform = ExecutionSeries::from_vectors(vec![vec![1.0, 2.0], vec![3.0, 4.0]]);
        assert!(uniform.first_shape_mismatch().is_none());

        let ragged = ExecutionSeries::from_vectors(vec![vec![1.0, 2.0], vec![3.0]]);
        assert_eq!(
            ragged.first_shape_mismatch(),
            Some((1, Shape::Vector(2), Shape::Vector(1)))
        );
    }

    #[test]
    fn test_data_kind_from_str() {
        assert_eq!("Matrix".parse::<DataKind>(), Ok(DataKind::Matrix));
        assert_eq!("vector".parse::<DataKind>(), Ok(DataKind::Vector));
        assert!("tensor".parse::<DataKind>().is_err());
    }

    #[test]
    fn test_shape_display() {
        assert_eq!(Shape::Vector(4).to_string(), "(4)");
        assert_eq!(Shape::Matrix { rows: 2, cols: 3 }.to_string(), "(2, 3)");
    }
}
