use rayon::prelude::*;

use crate::error::{Error, Result};
use crate::tensor::{Nested, Tensor};
use crate::vector::Vector;

// Matrix — rank-2 tensor specialization
//
// A Matrix owns no state beyond its base tensor; the rank invariant is
// enforced at construction time and every operation that would change it
// produces a fresh Matrix. The matmul inner loop is parallelized over
// output rows.

/// A rank-2 tensor with linear-algebra operations.
#[derive(Debug, Clone)]
pub struct Matrix {
    tensor: Tensor,
}

impl Matrix {
    /// Create a zero-initialized matrix.
    pub fn zeros(rows: usize, cols: usize) -> Result<Self> {
        Ok(Matrix {
            tensor: Tensor::zeros((rows, cols))?,
        })
    }

    /// Wrap a rank-2 tensor. Any other rank fails.
    pub fn from_tensor(tensor: Tensor) -> Result<Self> {
        if tensor.rank() != 2 {
            return Err(Error::RankMismatch {
                expected: 2,
                got: tensor.rank(),
            });
        }
        Ok(Matrix { tensor })
    }

    /// Build a matrix from nested row data.
    pub fn from_rows(rows: impl Into<Nested>) -> Result<Self> {
        Self::from_tensor(Tensor::from_nested(rows)?)
    }

    /// Number of rows.
    pub fn rows(&self) -> usize {
        self.tensor.dims()[0]
    }

    /// Number of columns.
    pub fn cols(&self) -> usize {
        self.tensor.dims()[1]
    }

    /// The underlying tensor.
    pub fn tensor(&self) -> &Tensor {
        &self.tensor
    }

    /// Consume the wrapper, returning the base tensor.
    pub fn into_tensor(self) -> Tensor {
        self.tensor
    }

    /// A new matrix with swapped axes.
    pub fn transpose(&self) -> Matrix {
        let (m, n) = (self.rows(), self.cols());
        let src = self.tensor.data();
        let mut out = vec![0.0; m * n];
        for i in 0..m {
            for j in 0..n {
                out[j * m + i] = src[i * n + j];
            }
        }
        Matrix {
            tensor: Tensor::from_parts((n, m).into(), out),
        }
    }

    /// Standard matrix product. Inner dimensions must agree.
    pub fn matmul(&self, rhs: &Matrix) -> Result<Matrix> {
        let (m, k1) = (self.rows(), self.cols());
        let (k2, n) = (rhs.rows(), rhs.cols());
        if k1 != k2 {
            return Err(Error::MatmulShapeMismatch { m, k1, k2, n });
        }
        let a = self.tensor.data();
        let b = rhs.tensor.data();
        let mut out = vec![0.0; m * n];
        out.par_chunks_mut(n).enumerate().for_each(|(i, row)| {
            for k in 0..k1 {
                let aik = a[i * k1 + k];
                for (j, slot) in row.iter_mut().enumerate() {
                    *slot += aik * b[k * n + j];
                }
            }
        });
        Matrix::from_tensor(Tensor::from_slice(&out, (m, n))?)
    }

    /// Matrix × vector via row dot products. The vector's size must match
    /// the column count.
    pub fn vecmul(&self, v: &Vector) -> Result<Vector> {
        if v.len() != self.cols() {
            return Err(Error::VectorSizeMismatch {
                op: "vecmul".to_string(),
                expected: self.cols(),
                got: v.len(),
            });
        }
        let a = self.tensor.data();
        let x = v.tensor().data();
        let n = self.cols();
        let out: Vec<f64> = (0..self.rows())
            .map(|i| a[i * n..(i + 1) * n].iter().zip(x).map(|(p, q)| p * q).sum())
            .collect();
        Vector::from_slice(&out)
    }

    /// Frobenius inner product against an equal-shaped matrix: the sum of
    /// elementwise products.
    pub fn dot(&self, rhs: &Matrix) -> Result<f64> {
        Ok(self.tensor.mul(rhs.tensor())?.sum())
    }
}

impl std::ops::Deref for Matrix {
    type Target = Tensor;

    fn deref(&self) -> &Tensor {
        &self.tensor
    }
}

impl TryFrom<Tensor> for Matrix {
    type Error = Error;

    fn try_from(tensor: Tensor) -> Result<Self> {
        Matrix::from_tensor(tensor)
    }
}
