use plexus_core::{Error, Result};

use crate::graph::Graph;
use crate::node::{GraphNode, NodeId};

// GraphProcessor — the wave scheduler
//
// The processor never computes a static execution order. Each iteration it
// scans every unprocessed node, selects those whose readiness test holds,
// runs the step on all of them as one wave, marks them processed, and
// rescans. Readiness is re-evaluated every wave because one node's
// completion can unblock another's readiness mid-run.
//
// Nodes inside one wave must not depend on each other — dependencies are
// only ever satisfied by prior waves. A full scan that selects nothing
// while unprocessed nodes remain is a deterministic failure (a cycle that
// slipped past structural validation, or a forgotten binding), never a
// silent hang.

/// One scheduled node slot: a processed flag over a graph node.
#[derive(Debug, Clone, Copy)]
struct Slot {
    id: NodeId,
    processed: bool,
}

/// Drives a compiled graph in waves of ready nodes. The same processor,
/// given forward or backward closures, runs both passes.
pub struct GraphProcessor<'g> {
    graph: &'g mut Graph,
    slots: Vec<Slot>,
}

impl<'g> GraphProcessor<'g> {
    /// Wrap every node of the graph with an unprocessed slot.
    pub fn new(graph: &'g mut Graph) -> Self {
        let slots = graph
            .ids()
            .into_iter()
            .map(|id| Slot {
                id,
                processed: false,
            })
            .collect();
        GraphProcessor { graph, slots }
    }

    /// Run `step` on every node, in waves, until the graph is exhausted.
    ///
    /// `ready` is consulted for each unprocessed node at the start of every
    /// wave. Returns the executed waves in order; node order within a wave
    /// carries no meaning.
    pub fn process(
        &mut self,
        mut ready: impl FnMut(&GraphNode) -> Result<bool>,
        mut step: impl FnMut(&mut GraphNode) -> Result<()>,
    ) -> Result<Vec<Vec<NodeId>>> {
        let mut waves = Vec::new();
        loop {
            let mut wave = Vec::new();
            for slot in self.slots.iter().filter(|s| !s.processed) {
                if ready(self.graph.node(slot.id)?)? {
                    wave.push(slot.id);
                }
            }
            if wave.is_empty() {
                let remaining = self.slots.iter().filter(|s| !s.processed).count();
                if remaining == 0 {
                    return Ok(waves);
                }
                return Err(Error::UnresolvableSchedule { remaining });
            }
            for &id in &wave {
                step(self.graph.node_mut(id)?)?;
            }
            for slot in self.slots.iter_mut() {
                if wave.contains(&slot.id) {
                    slot.processed = true;
                }
            }
            waves.push(wave);
        }
    }

    /// Forward pass: a node is ready when every declared forward input slot
    /// is bound; the step runs the entity's forward computation.
    pub fn process_forward(&mut self) -> Result<Vec<Vec<NodeId>>> {
        self.process(
            |node| Ok(node.entity().forward_inputs().are_all_set()),
            |node| node.entity_mut().forward(),
        )
    }

    /// Backward pass: a node is ready when every declared backward input
    /// slot is bound; the step runs the entity's gradient computation.
    pub fn process_backward(&mut self) -> Result<Vec<Vec<NodeId>>> {
        self.process(
            |node| Ok(node.entity().backward_inputs().are_all_set()),
            |node| node.entity_mut().backward(),
        )
    }
}
