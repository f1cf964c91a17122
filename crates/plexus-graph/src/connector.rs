use plexus_core::{Error, Result};

use crate::graph::Graph;
use crate::input::DeferredInputCollection;
use crate::node::NodeId;

// Connector — binds every node's declared inputs without global sorting
//
// The connector is a strategy parameterized over direction. The direction
// decides, for each node:
//
//   - which adjacency list counts as "relevant" neighbors (input edges for
//     the forward pass, output edges for the backward pass),
//   - which graph-level shared feed applies,
//   - which collection on a neighbor is mergeable into this node (the
//     neighbor's forward outputs, or its backward gradients).
//
// For every node, connect() then applies three rules:
//
//   (a) a shared-feed entry keyed by the node's name binds as the node's
//       default entry;
//   (b) a node with zero relevant neighbors and no name match must consume
//       the single graph-level default entry — exactly once across the
//       whole graph; double consumption, an unconsumed declared default,
//       and a populated feed that leaves such a node without any entry
//       all fail at connect time;
//   (c) every relevant neighbor's mergeable collection is merged in, keyed
//       by the neighbor's name.
//
// The result is each node's complete named-input view, computed without a
// topological sort.

/// Which pass a connector (or a traversal) serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Backward,
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Direction::Forward => "forward",
            Direction::Backward => "backward",
        };
        write!(f, "{s}")
    }
}

/// Resolves how each node's declared inputs are bound for one direction.
pub struct Connector {
    direction: Direction,
}

impl Connector {
    /// Create a connector for one direction.
    pub fn new(direction: Direction) -> Self {
        Connector { direction }
    }

    /// Build and install the input view of every node in the graph.
    /// Run once per direction at compile time; views are rebuilt from
    /// scratch, never patched.
    pub fn connect(&self, graph: &mut Graph) -> Result<()> {
        let mut views: Vec<(NodeId, DeferredInputCollection)> = Vec::new();
        let mut default_consumer: Option<NodeId> = None;

        for id in graph.ids() {
            let node = graph.node(id)?;
            let name = node.name().to_string();
            let feed = graph.feed(self.direction);
            let mut inputs = DeferredInputCollection::new();

            // (a) name-matched feed entry becomes the node's default entry.
            let mut named = false;
            if let Ok(view) = feed.get(&name) {
                inputs.set_default(view.clone())?;
                named = true;
            }

            let neighbors = match self.direction {
                Direction::Forward => node.inputs().to_vec(),
                Direction::Backward => node.outputs().to_vec(),
            };

            // (b) boundary nodes fall back to the graph-level default entry.
            if neighbors.is_empty() && !named {
                match feed.default_entry() {
                    Some(view) => {
                        if let Some(first) = default_consumer {
                            return Err(Error::DefaultFeedConflict {
                                direction: self.direction.to_string(),
                                first: graph.node(first)?.name().to_string(),
                                second: name,
                            });
                        }
                        default_consumer = Some(id);
                        inputs.set_default(view.clone())?;
                    }
                    // A populated feed that leaves a boundary node with
                    // nothing to read is a wiring mistake; an entirely
                    // empty feed means this direction is unused.
                    None if !feed.is_empty() => {
                        return Err(Error::UnfedBoundary {
                            direction: self.direction.to_string(),
                            node: name,
                        });
                    }
                    None => {}
                }
            }

            // (c) merge every relevant neighbor's output, keyed by its name.
            for neighbor_id in neighbors {
                let neighbor = graph.node(neighbor_id)?;
                let view = match self.direction {
                    Direction::Forward => neighbor.entity().forward_output(),
                    Direction::Backward => neighbor.entity().backward_output(),
                };
                inputs.insert(neighbor.name(), view)?;
            }

            views.push((id, inputs));
        }

        if graph.feed(self.direction).has_default() && default_consumer.is_none() {
            return Err(Error::UnconsumedDefault {
                direction: self.direction.to_string(),
            });
        }

        for (id, inputs) in views {
            let entity = graph.node_mut(id)?.entity_mut();
            match self.direction {
                Direction::Forward => entity.set_forward_inputs(inputs),
                Direction::Backward => entity.set_backward_inputs(inputs),
            }
        }
        Ok(())
    }
}
