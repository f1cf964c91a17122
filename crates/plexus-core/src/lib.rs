//! # plexus-core
//!
//! Tensor algebra primitives for Plexus.
//!
//! This crate provides:
//! - [`Tensor`] — rank-N dense array with copy-producing operations
//! - [`Matrix`] / [`Vector`] — rank-constrained specializations
//! - [`Shape`] — per-axis size vector with row-major strides
//! - [`Error`] / [`Result`] — the single error type shared by every
//!   Plexus crate

pub mod error;
pub mod matrix;
pub mod shape;
pub mod tensor;
pub mod vector;

pub use error::{Error, Result};
pub use matrix::Matrix;
pub use shape::Shape;
pub use tensor::{Nested, Operand, Tensor, TensorId};
pub use vector::{Axis, Vector};
