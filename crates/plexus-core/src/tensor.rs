use crate::error::{Error, Result};
use crate::shape::Shape;

// Tensor — The fundamental data structure
//
// A Tensor is an n-dimensional array of f64 addressed by a Shape. The
// payload is a flat row-major buffer; the structural invariant is
// `data.len() == shape.elem_count()` at all times.
//
// IDENTITY AND COPY SEMANTICS:
//
//   Every tensor carries a monotonically increasing id. Operations never
//   mutate a shared tensor in place: they clone (minting a fresh id) and
//   then rewrite the clone's payload via traversal. Two tensors can be
//   equal in shape and values while still being distinct by id.
//
// TRAVERSAL:
//
//   `visit` walks every scalar leaf together with its position vector;
//   `traverse_mut` additionally lets the callback return a replacement
//   value to write back. Every elementwise op is clone-then-traverse.

/// Unique identifier for a tensor (global atomic counter).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TensorId(u64);

impl Default for TensorId {
    fn default() -> Self {
        Self::new()
    }
}

impl TensorId {
    /// Generate a new unique tensor ID.
    pub fn new() -> Self {
        use std::sync::atomic::{AtomicU64, Ordering};
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        TensorId(COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

/// Nested numeric construction data: a scalar, or a list of nested data.
///
/// Used by [`Tensor::from_nested`] to build a tensor whose shape is inferred
/// by measuring list lengths along the first axis at every depth.
#[derive(Debug, Clone)]
pub enum Nested {
    Value(f64),
    List(Vec<Nested>),
}

impl From<f64> for Nested {
    fn from(v: f64) -> Self {
        Nested::Value(v)
    }
}

impl From<Vec<f64>> for Nested {
    fn from(v: Vec<f64>) -> Self {
        Nested::List(v.into_iter().map(Nested::Value).collect())
    }
}

impl From<Vec<Vec<f64>>> for Nested {
    fn from(v: Vec<Vec<f64>>) -> Self {
        Nested::List(v.into_iter().map(Nested::from).collect())
    }
}

impl From<Vec<Vec<Vec<f64>>>> for Nested {
    fn from(v: Vec<Vec<Vec<f64>>>) -> Self {
        Nested::List(v.into_iter().map(Nested::from).collect())
    }
}

/// A right-hand operand for elementwise binary operations: either a tensor
/// of identical shape or a scalar broadcast to every element.
#[derive(Clone, Copy)]
pub enum Operand<'a> {
    Tensor(&'a Tensor),
    Scalar(f64),
}

impl<'a> From<&'a Tensor> for Operand<'a> {
    fn from(t: &'a Tensor) -> Self {
        Operand::Tensor(t)
    }
}

impl<'a> From<f64> for Operand<'a> {
    fn from(v: f64) -> Self {
        Operand::Scalar(v)
    }
}

/// An n-dimensional dense array of f64.
#[derive(Debug)]
pub struct Tensor {
    id: TensorId,
    shape: Shape,
    data: Vec<f64>,
}

// Manual Clone: a clone is value-equal but receives a fresh identity.
impl Clone for Tensor {
    fn clone(&self) -> Self {
        Tensor {
            id: TensorId::new(),
            shape: self.shape.clone(),
            data: self.data.clone(),
        }
    }
}

impl Tensor {
    // Construction

    /// Create a zero-initialized tensor of the given shape.
    pub fn zeros(shape: impl Into<Shape>) -> Result<Self> {
        let shape = shape.into();
        shape.validate()?;
        let data = vec![0.0; shape.elem_count()];
        Ok(Tensor {
            id: TensorId::new(),
            shape,
            data,
        })
    }

    /// Create a tensor from a flat row-major buffer and an explicit shape.
    pub fn from_slice(data: &[f64], shape: impl Into<Shape>) -> Result<Self> {
        let shape = shape.into();
        shape.validate()?;
        if data.len() != shape.elem_count() {
            return Err(Error::ElementCountMismatch {
                expected: shape.elem_count(),
                got: data.len(),
                shape,
            });
        }
        Ok(Tensor {
            id: TensorId::new(),
            shape,
            data: data.to_vec(),
        })
    }

    /// Create a tensor from nested numeric data, inferring the shape.
    ///
    /// The shape is measured along the first element at every depth; any
    /// sibling whose length disagrees fails with a data-shape error naming
    /// the offending depth.
    pub fn from_nested(data: impl Into<Nested>) -> Result<Self> {
        let nested = data.into();

        // Infer dims from the first child at each depth.
        let mut dims = Vec::new();
        let mut cursor = &nested;
        loop {
            match cursor {
                Nested::Value(_) => break,
                Nested::List(items) => {
                    if items.is_empty() {
                        return Err(Error::MalformedShape {
                            dim: dims.len(),
                            size: 0,
                        });
                    }
                    dims.push(items.len());
                    cursor = &items[0];
                }
            }
        }
        let shape = Shape::new(dims);
        shape.validate()?;

        let mut data = Vec::with_capacity(shape.elem_count());
        flatten_nested(&nested, shape.dims(), 0, &mut data)?;
        Ok(Tensor {
            id: TensorId::new(),
            shape,
            data,
        })
    }

    /// Build a tensor from parts already known to be consistent.
    pub(crate) fn from_parts(shape: Shape, data: Vec<f64>) -> Self {
        debug_assert_eq!(shape.elem_count(), data.len());
        Tensor {
            id: TensorId::new(),
            shape,
            data,
        }
    }

    // Accessors

    /// Unique tensor ID.
    pub fn id(&self) -> TensorId {
        self.id
    }

    /// The tensor's shape.
    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    /// The dimension sizes as a slice.
    pub fn dims(&self) -> &[usize] {
        self.shape.dims()
    }

    /// Number of dimensions.
    pub fn rank(&self) -> usize {
        self.shape.rank()
    }

    /// Total number of elements.
    pub fn elem_count(&self) -> usize {
        self.data.len()
    }

    /// The flat row-major payload.
    pub fn data(&self) -> &[f64] {
        &self.data
    }

    // Traversal

    /// Visit every scalar leaf with its position vector.
    pub fn visit(&self, mut f: impl FnMut(&[usize], f64)) {
        let mut pos = vec![0usize; self.rank()];
        for (i, &v) in self.data.iter().enumerate() {
            self.shape.position_of(i, &mut pos);
            f(&pos, v);
        }
    }

    /// Visit every scalar leaf; a returned `Some(v)` replaces the leaf.
    pub fn traverse_mut(&mut self, mut f: impl FnMut(&[usize], f64) -> Option<f64>) {
        let mut pos = vec![0usize; self.rank()];
        for i in 0..self.data.len() {
            self.shape.position_of(i, &mut pos);
            if let Some(v) = f(&pos, self.data[i]) {
                self.data[i] = v;
            }
        }
    }

    /// Clone, then rewrite every element through `f`.
    pub fn map(&self, f: impl Fn(f64) -> f64) -> Tensor {
        let mut out = self.clone();
        out.traverse_mut(|_, v| Some(f(v)));
        out
    }

    // Elementwise binary operations
    //
    // The right operand is either a tensor of identical shape or a scalar
    // broadcast; a tensor of any other shape fails naming the operation.

    fn binary<'a>(
        &self,
        op: &str,
        rhs: impl Into<Operand<'a>>,
        f: impl Fn(f64, f64) -> f64,
    ) -> Result<Tensor> {
        match rhs.into() {
            Operand::Scalar(s) => Ok(self.map(|v| f(v, s))),
            Operand::Tensor(t) => {
                if self.shape != t.shape {
                    return Err(Error::ShapeMismatch {
                        op: op.to_string(),
                        lhs: self.shape.clone(),
                        rhs: t.shape.clone(),
                    });
                }
                let mut out = self.clone();
                for (o, &r) in out.data.iter_mut().zip(t.data.iter()) {
                    *o = f(*o, r);
                }
                Ok(out)
            }
        }
    }

    /// Elementwise addition.
    pub fn add<'a>(&self, rhs: impl Into<Operand<'a>>) -> Result<Tensor> {
        self.binary("add", rhs, |a, b| a + b)
    }

    /// Elementwise subtraction.
    pub fn sub<'a>(&self, rhs: impl Into<Operand<'a>>) -> Result<Tensor> {
        self.binary("sub", rhs, |a, b| a - b)
    }

    /// Elementwise multiplication.
    pub fn mul<'a>(&self, rhs: impl Into<Operand<'a>>) -> Result<Tensor> {
        self.binary("mul", rhs, |a, b| a * b)
    }

    /// Elementwise division.
    pub fn div<'a>(&self, rhs: impl Into<Operand<'a>>) -> Result<Tensor> {
        self.binary("div", rhs, |a, b| a / b)
    }

    /// Elementwise exponentiation.
    pub fn pow<'a>(&self, rhs: impl Into<Operand<'a>>) -> Result<Tensor> {
        self.binary("pow", rhs, f64::powf)
    }

    // Unary math

    /// Elementwise negation.
    pub fn neg(&self) -> Tensor {
        self.map(|v| -v)
    }

    /// Elementwise absolute value.
    pub fn abs(&self) -> Tensor {
        self.map(f64::abs)
    }

    /// Elementwise natural logarithm.
    pub fn log(&self) -> Tensor {
        self.map(f64::ln)
    }

    /// Elementwise exponential.
    pub fn exp(&self) -> Tensor {
        self.map(f64::exp)
    }

    /// Elementwise square root.
    pub fn sqrt(&self) -> Tensor {
        self.map(f64::sqrt)
    }

    /// Elementwise sine.
    pub fn sin(&self) -> Tensor {
        self.map(f64::sin)
    }

    /// Elementwise cosine.
    pub fn cos(&self) -> Tensor {
        self.map(f64::cos)
    }

    /// Elementwise tangent.
    pub fn tan(&self) -> Tensor {
        self.map(f64::tan)
    }

    /// Elementwise hyperbolic tangent.
    pub fn tanh(&self) -> Tensor {
        self.map(f64::tanh)
    }

    // Reductions

    /// Sum of all elements.
    pub fn sum(&self) -> f64 {
        self.data.iter().sum()
    }

    /// Sum of all elements after applying a per-element mapping.
    pub fn sum_by(&self, f: impl Fn(f64) -> f64) -> f64 {
        self.data.iter().map(|&v| f(v)).sum()
    }

    /// Arithmetic mean of all elements.
    pub fn mean(&self) -> f64 {
        self.sum() / self.elem_count() as f64
    }

    /// Smallest element.
    pub fn min(&self) -> f64 {
        self.data.iter().copied().fold(f64::INFINITY, f64::min)
    }

    /// Largest element.
    pub fn max(&self) -> f64 {
        self.data.iter().copied().fold(f64::NEG_INFINITY, f64::max)
    }

    /// Index of the smallest element. Restricted to rank 1.
    pub fn argmin(&self) -> Result<usize> {
        self.check_rank_one()?;
        let mut best = 0;
        for (i, &v) in self.data.iter().enumerate() {
            if v < self.data[best] {
                best = i;
            }
        }
        Ok(best)
    }

    /// Index of the largest element. Restricted to rank 1.
    pub fn argmax(&self) -> Result<usize> {
        self.check_rank_one()?;
        let mut best = 0;
        for (i, &v) in self.data.iter().enumerate() {
            if v > self.data[best] {
                best = i;
            }
        }
        Ok(best)
    }

    fn check_rank_one(&self) -> Result<()> {
        if self.rank() > 1 {
            return Err(Error::RankMismatch {
                expected: 1,
                got: self.rank(),
            });
        }
        Ok(())
    }

    /// L2-normalize: divide every element by the Euclidean norm.
    ///
    /// A zero tensor is returned unchanged.
    pub fn normalize(&self) -> Tensor {
        let norm = self.sum_by(|v| v * v).sqrt();
        if norm == 0.0 {
            self.clone()
        } else {
            self.map(|v| v / norm)
        }
    }

    /// Clamp every element into `[lo, hi]`.
    pub fn clamp(&self, lo: f64, hi: f64) -> Tensor {
        self.map(|v| v.clamp(lo, hi))
    }

    /// Concatenate: both operands are flattened to 1-D and the buffers
    /// appended in row-major order.
    pub fn concat(&self, other: &Tensor) -> Tensor {
        let mut data = Vec::with_capacity(self.data.len() + other.data.len());
        data.extend_from_slice(&self.data);
        data.extend_from_slice(&other.data);
        let len = data.len();
        Tensor {
            id: TensorId::new(),
            shape: Shape::from(len),
            data,
        }
    }

    /// Flatten to a rank-1 tensor with the same elements.
    pub fn flatten(&self) -> Tensor {
        Tensor {
            id: TensorId::new(),
            shape: Shape::from(self.elem_count()),
            data: self.data.clone(),
        }
    }

    /// Structural equality: rank, then dimension sizes, then deep values.
    /// Identity is ignored.
    pub fn equals(&self, other: &Tensor) -> bool {
        self.shape == other.shape && self.data == other.data
    }

    /// Apply a combinator across several identically-shaped tensors,
    /// producing one new tensor. The slice passed to `f` holds one value
    /// per input tensor, in argument order.
    pub fn iterate(tensors: &[&Tensor], f: impl Fn(&[f64]) -> f64) -> Result<Tensor> {
        let first = tensors.first().ok_or(Error::msg("iterate: no tensors given"))?;
        for t in &tensors[1..] {
            if t.shape != first.shape {
                return Err(Error::ShapeMismatch {
                    op: "iterate".to_string(),
                    lhs: first.shape.clone(),
                    rhs: t.shape.clone(),
                });
            }
        }
        let mut out = (*first).clone();
        let mut row = vec![0.0; tensors.len()];
        for i in 0..out.data.len() {
            for (slot, t) in row.iter_mut().zip(tensors.iter()) {
                *slot = t.data[i];
            }
            out.data[i] = f(&row);
        }
        Ok(out)
    }

    // Positional access

    fn offset(&self, pos: &[usize]) -> Result<usize> {
        if pos.len() != self.rank() {
            return Err(Error::PositionLength {
                expected: self.rank(),
                got: pos.len(),
            });
        }
        let strides = self.shape.stride_contiguous();
        let mut offset = 0;
        for (dim, (&p, &size)) in pos.iter().zip(self.dims()).enumerate() {
            if p >= size {
                return Err(Error::IndexOutOfBounds {
                    dim,
                    size,
                    index: p,
                });
            }
            offset += p * strides[dim];
        }
        Ok(offset)
    }

    /// Read the element at a position. The position length must equal the
    /// rank and every coordinate must lie in `[0, dim_size)`.
    pub fn get(&self, pos: &[usize]) -> Result<f64> {
        Ok(self.data[self.offset(pos)?])
    }

    /// Write the element at a position, with the same bounds rules as `get`.
    pub fn set(&mut self, pos: &[usize], value: f64) -> Result<()> {
        let offset = self.offset(pos)?;
        self.data[offset] = value;
        Ok(())
    }
}

impl std::fmt::Display for Tensor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Tensor{} {:?}", self.shape, self.data)
    }
}

/// Flatten nested data into `out`, checking that every list at depth `d`
/// has the length the inferred shape promises.
fn flatten_nested(nested: &Nested, dims: &[usize], depth: usize, out: &mut Vec<f64>) -> Result<()> {
    match nested {
        Nested::Value(v) => {
            if depth != dims.len() {
                return Err(Error::NestedMismatch { depth });
            }
            out.push(*v);
            Ok(())
        }
        Nested::List(items) => {
            if depth >= dims.len() {
                return Err(Error::NestedMismatch { depth });
            }
            if items.len() != dims[depth] {
                return Err(Error::RaggedData {
                    depth,
                    expected: dims[depth],
                    got: items.len(),
                });
            }
            for item in items {
                flatten_nested(item, dims, depth + 1, out)?;
            }
            Ok(())
        }
    }
}
