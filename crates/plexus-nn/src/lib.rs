//! # plexus-nn
//!
//! The layer catalogue and pluggable numeric contracts for Plexus.
//!
//! This crate provides:
//! - [`Dense`] — fully-connected layer with hand-written gradient rules
//! - [`Phase`] — the Created → Compiled → Initialized layer lifecycle
//! - [`Activation`], [`Loss`], [`Initializer`], [`Optimizer`] — the small
//!   contracts a layer delegates its formulas to
//! - [`registry`] — static tag → factory resolution

pub mod activation;
pub mod dense;
pub mod init;
pub mod layer;
pub mod loss;
pub mod optim;
pub mod registry;

pub use activation::{Activation, Identity, Relu, Sigmoid, Tanh};
pub use dense::{BiasGradient, Dense, DenseConfig, KEY_ACTIVATED, KEY_DELTA, KEY_LINEAR, KEY_WEIGHTS};
pub use init::{Constant, Fixed, Initializer, RandomUniform, Zeros};
pub use layer::Phase;
pub use loss::{CrossEntropy, Loss, MeanSquaredError, SquaredError};
pub use optim::{GradientDescent, Optimizer};
