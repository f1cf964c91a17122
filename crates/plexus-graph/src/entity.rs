use std::any::Any;

use plexus_core::Result;

use crate::collection::SharedCollection;
use crate::input::DeferredInputCollection;

// Entity — the contract every graph-wrapped layer implements
//
// A graph node wraps one entity. The graph and the scheduler only ever talk
// to this trait object: compile/initialize for the lifecycle, forward and
// backward for the numeric passes, and the collection accessors for the
// connector's wiring work.
//
// An entity owns its two output collections (forward values and backward
// gradients) and is their only writer. The input collections are built for
// it by the node connector out of read-only views of its neighbors'
// outputs.

/// The polymorphic layer contract, dispatched via a trait object.
pub trait Entity {
    /// The entity's unique name within a graph.
    fn name(&self) -> &str;

    /// Whether this entity may legitimately sit at the start of the graph
    /// and consume the graph-level input feed.
    fn accepts_input(&self) -> bool {
        false
    }

    /// Whether this entity may legitimately sit at the end of the graph and
    /// produce the graph-level output.
    fn produces_output(&self) -> bool {
        false
    }

    /// Declare the shapes of every deferred slot this entity owns.
    /// Called once, during graph compilation, after input views are bound.
    /// Must not depend on other entities having compiled already.
    fn compile(&mut self) -> Result<()>;

    /// Materialize parameters (weights, biases). Called once, after the
    /// graph is compiled.
    fn initialize(&mut self) -> Result<()>;

    /// Run the forward computation, reading the forward input views and
    /// binding every forward output slot.
    fn forward(&mut self) -> Result<()>;

    /// Run the backward computation, reading the backward input views and
    /// binding every backward output slot.
    fn backward(&mut self) -> Result<()>;

    /// The collection this entity's forward pass writes.
    fn forward_output(&self) -> SharedCollection;

    /// The collection this entity's backward pass writes.
    fn backward_output(&self) -> SharedCollection;

    /// Replace the forward input view (connector use).
    fn set_forward_inputs(&mut self, inputs: DeferredInputCollection);

    /// Replace the backward input view (connector use).
    fn set_backward_inputs(&mut self, inputs: DeferredInputCollection);

    /// The forward input view.
    fn forward_inputs(&self) -> &DeferredInputCollection;

    /// The backward input view.
    fn backward_inputs(&self) -> &DeferredInputCollection;

    /// Fold accumulated gradients into the parameters, once per batch.
    fn apply_gradients(&mut self) -> Result<()> {
        Ok(())
    }

    /// Clear every bound output value between samples, keeping declared
    /// shapes.
    fn reset(&mut self) -> Result<()> {
        Ok(())
    }

    /// The loss recorded by the most recent label-driven backward pass.
    fn last_loss(&self) -> Option<f64> {
        None
    }

    /// Downcast support.
    fn as_any(&self) -> &dyn Any;

    /// Downcast support.
    fn as_any_mut(&mut self) -> &mut dyn Any;
}
