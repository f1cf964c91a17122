//! # plexus-graph
//!
//! The dataflow machinery of Plexus: lazily-bound ("deferred") values, the
//! layer graph, and the wave scheduler.
//!
//! This crate provides:
//! - [`DeferredValue`] / [`DeferredCollection`] — shape-first slots that
//!   are declared at compile time and bound once per iteration
//! - [`DeferredInputCollection`] — a consumer's merged view of its
//!   producers' collections
//! - [`Entity`] — the contract every graph-wrapped layer implements
//! - [`Graph`] / [`GraphNode`] — cycle-safe structural model with a
//!   compile-state machine
//! - [`Connector`] — binds each node's inputs without a topological sort
//! - [`GraphProcessor`] — runs ready nodes in waves until exhaustion

pub mod collection;
pub mod connector;
pub mod deferred;
pub mod entity;
pub mod graph;
pub mod input;
pub mod node;
pub mod processor;

pub use collection::{shared, DeferredCollection, SharedCollection};
pub use connector::{Connector, Direction};
pub use deferred::DeferredValue;
pub use entity::Entity;
pub use graph::{Graph, GraphState, NodeQuery};
pub use input::DeferredInputCollection;
pub use node::{GraphNode, NodeId};
pub use processor::GraphProcessor;
