use std::fmt;

// Shape — N-dimensional shape representation
//
// A Shape describes the size of each dimension of a tensor:
//   - Vector: Shape([5])       — 1 dimension, 5 elements
//   - Matrix: Shape([3, 4])    — 2 dimensions, 12 elements
//
// The shape determines how many elements a tensor holds (product of all
// dims) and the row-major strides used to address a flat buffer. Dimension
// sizes must be positive; `validate` rejects malformed shapes.

/// N-dimensional shape of a tensor.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Shape(Vec<usize>);

impl Shape {
    /// Create a new shape from a vector of dimension sizes.
    pub fn new(dims: Vec<usize>) -> Self {
        Shape(dims)
    }

    /// The dimension sizes as a slice.
    pub fn dims(&self) -> &[usize] {
        &self.0
    }

    /// Number of dimensions (1 for vector, 2 for matrix, etc.).
    pub fn rank(&self) -> usize {
        self.0.len()
    }

    /// Total number of elements (product of all dimensions).
    pub fn elem_count(&self) -> usize {
        self.0.iter().product()
    }

    /// Check that every dimension size is positive and the shape is non-empty.
    pub fn validate(&self) -> crate::Result<()> {
        if self.0.is_empty() {
            return Err(crate::Error::MalformedShape { dim: 0, size: 0 });
        }
        for (dim, &size) in self.0.iter().enumerate() {
            if size == 0 {
                return Err(crate::Error::MalformedShape { dim, size });
            }
        }
        Ok(())
    }

    /// Compute the contiguous (row-major / C-order) strides for this shape.
    ///
    /// For shape [2, 3, 4], strides are [12, 4, 1]: moving one step in dim 0
    /// jumps 12 elements, one step in dim 2 jumps 1 element. The last
    /// dimension is contiguous.
    pub fn stride_contiguous(&self) -> Vec<usize> {
        let mut strides = vec![0usize; self.rank()];
        if self.rank() > 0 {
            strides[self.rank() - 1] = 1;
            for i in (0..self.rank() - 1).rev() {
                strides[i] = strides[i + 1] * self.0[i + 1];
            }
        }
        strides
    }

    /// Decompose a flat row-major index into a position vector.
    ///
    /// `pos` must have length `rank()`.
    pub fn position_of(&self, mut index: usize, pos: &mut [usize]) {
        for (slot, &stride) in pos.iter_mut().zip(self.stride_contiguous().iter()) {
            *slot = index / stride;
            index %= stride;
        }
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, d) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{d}")?;
        }
        write!(f, "]")
    }
}

impl From<Vec<usize>> for Shape {
    fn from(dims: Vec<usize>) -> Self {
        Shape(dims)
    }
}

impl From<&[usize]> for Shape {
    fn from(dims: &[usize]) -> Self {
        Shape(dims.to_vec())
    }
}

impl<const N: usize> From<[usize; N]> for Shape {
    fn from(dims: [usize; N]) -> Self {
        Shape(dims.to_vec())
    }
}

impl From<usize> for Shape {
    fn from(len: usize) -> Self {
        Shape(vec![len])
    }
}

impl From<(usize, usize)> for Shape {
    fn from((rows, cols): (usize, usize)) -> Self {
        Shape(vec![rows, cols])
    }
}
