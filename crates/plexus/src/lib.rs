//! # Plexus
//!
//! A deferred-dataflow neural network engine built from scratch in Rust.
//!
//! This is the top-level facade crate that re-exports everything you need.
//!
//! ## Usage
//!
//! ```rust
//! use plexus::prelude::*;
//! ```
//!
//! ## Architecture
//!
//! | Crate | Purpose |
//! |-------|----------|
//! | `plexus-core` | Tensor, Shape, Matrix, Vector algebra |
//! | `plexus-graph` | Deferred values/collections, layer graph, connector, wave processor |
//! | `plexus-nn` | Layers, activations, losses, initializers, optimizers |
//! | `plexus-data` | Sample/label feeds |
//!
//! ## Modules
//!
//! - [`network`] — Network facade: add/compile/init/predict/fit

/// Re-export core tensor algebra.
pub use plexus_core::{
    Axis, Error, Matrix, Nested, Operand, Result, Shape, Tensor, TensorId, Vector,
};

/// Re-export the deferred-dataflow graph machinery.
pub mod graph {
    pub use plexus_graph::*;
}

/// Re-export neural network components.
pub mod nn {
    pub use plexus_nn::*;
}

/// Re-export training-data feeds.
pub mod data {
    pub use plexus_data::*;
}

/// Network facade — builds, compiles and trains a layer graph.
pub mod network;

pub use network::{EpochLog, FitOptions, FitReport, Network};

/// Prelude: import this for the most common types.
pub mod prelude {
    pub use crate::data::{Feed, FeedItem, InMemoryFeed};
    pub use crate::graph::{
        shared, Connector, DeferredCollection, DeferredInputCollection, DeferredValue, Direction,
        Entity, Graph, GraphProcessor, GraphState, NodeId, NodeQuery, SharedCollection,
    };
    pub use crate::network::{EpochLog, FitOptions, FitReport, Network};
    pub use crate::nn::{
        Activation, BiasGradient, Constant, CrossEntropy, Dense, DenseConfig, Fixed,
        GradientDescent, Identity, Initializer, Loss, MeanSquaredError, Optimizer, Phase,
        RandomUniform, Relu, Sigmoid, SquaredError, Tanh, Zeros,
    };
    pub use crate::{Axis, Error, Matrix, Nested, Operand, Result, Shape, Tensor, Vector};
}
