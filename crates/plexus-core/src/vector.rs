use crate::error::{Error, Result};
use crate::matrix::Matrix;
use crate::shape::Shape;
use crate::tensor::Tensor;

// Vector — rank-1 tensor specialization

/// Which matrix axis a vector is repeated along in `expand_to_matrix`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    /// The vector spans a row (its size must equal the column count) and is
    /// repeated down every row.
    Row,
    /// The vector spans a column (its size must equal the row count) and is
    /// repeated across every column.
    Column,
}

/// A rank-1 tensor with linear-algebra operations.
#[derive(Debug, Clone)]
pub struct Vector {
    tensor: Tensor,
}

impl Vector {
    /// Create a zero-initialized vector.
    pub fn zeros(len: usize) -> Result<Self> {
        Ok(Vector {
            tensor: Tensor::zeros(len)?,
        })
    }

    /// Create a vector from a slice of values.
    pub fn from_slice(values: &[f64]) -> Result<Self> {
        Ok(Vector {
            tensor: Tensor::from_slice(values, values.len())?,
        })
    }

    /// Wrap a rank-1 tensor. Any other rank fails.
    pub fn from_tensor(tensor: Tensor) -> Result<Self> {
        if tensor.rank() != 1 {
            return Err(Error::RankMismatch {
                expected: 1,
                got: tensor.rank(),
            });
        }
        Ok(Vector { tensor })
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.tensor.elem_count()
    }

    /// Whether the vector has no elements. Shapes require positive dims, so
    /// this is always false for a constructed vector.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The underlying tensor.
    pub fn tensor(&self) -> &Tensor {
        &self.tensor
    }

    /// Consume the wrapper, returning the base tensor.
    pub fn into_tensor(self) -> Tensor {
        self.tensor
    }

    /// Sum of elementwise products with another vector of the same size.
    pub fn dot(&self, rhs: &Vector) -> Result<f64> {
        if rhs.len() != self.len() {
            return Err(Error::VectorSizeMismatch {
                op: "dot".to_string(),
                expected: self.len(),
                got: rhs.len(),
            });
        }
        Ok(self
            .tensor
            .data()
            .iter()
            .zip(rhs.tensor.data())
            .map(|(a, b)| a * b)
            .sum())
    }

    /// Euclidean norm: sqrt of the sum of squares.
    pub fn length(&self) -> f64 {
        self.tensor.sum_by(|v| v * v).sqrt()
    }

    /// Broadcast the vector into a `(rows, cols)` matrix by repetition along
    /// the chosen axis. The vector's size must match the target axis length.
    pub fn expand_to_matrix(&self, rows: usize, cols: usize, axis: Axis) -> Result<Matrix> {
        let expected = match axis {
            Axis::Row => cols,
            Axis::Column => rows,
        };
        if self.len() != expected {
            return Err(Error::VectorSizeMismatch {
                op: "expand_to_matrix".to_string(),
                expected,
                got: self.len(),
            });
        }
        let src = self.tensor.data();
        let mut out = vec![0.0; rows * cols];
        for i in 0..rows {
            for j in 0..cols {
                out[i * cols + j] = match axis {
                    Axis::Row => src[j],
                    Axis::Column => src[i],
                };
            }
        }
        Matrix::from_tensor(Tensor::from_parts(Shape::from((rows, cols)), out))
    }
}

impl std::ops::Deref for Vector {
    type Target = Tensor;

    fn deref(&self) -> &Tensor {
        &self.tensor
    }
}

impl TryFrom<Tensor> for Vector {
    type Error = Error;

    fn try_from(tensor: Tensor) -> Result<Self> {
        Vector::from_tensor(tensor)
    }
}
