use plexus_core::{Error, Result};

use crate::connector::{Connector, Direction};
use crate::entity::Entity;
use crate::input::DeferredInputCollection;
use crate::node::{GraphNode, NodeId};

// Graph — directed-edge structural model with a compile-state machine
//
// Nodes live in an arena of slots addressed by stable NodeId handles;
// edges are plain index lists on each node. Cycle safety is enforced at
// link time with explicit reachability traversals, so a Compiled graph is
// structurally trustworthy and execution never has to re-validate it.
//
// The state machine is monotonic:
//
//   Created ──compile()──▶ Compiling ──verify──▶ Compiled
//
// Structural mutation (add/link/unlink/remove, feed wiring) checks the
// state first and fails fast outside Created.

/// The compile-state of a graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GraphState {
    #[default]
    Created,
    Compiling,
    Compiled,
}

impl std::fmt::Display for GraphState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            GraphState::Created => "created",
            GraphState::Compiling => "compiling",
            GraphState::Compiled => "compiled",
        };
        write!(f, "{s}")
    }
}

/// How to identify a node: by positional index, by name (first match), or
/// by arena handle.
#[derive(Debug, Clone)]
pub enum NodeQuery {
    Index(usize),
    Name(String),
    Id(NodeId),
}

impl From<usize> for NodeQuery {
    fn from(index: usize) -> Self {
        NodeQuery::Index(index)
    }
}

impl From<&str> for NodeQuery {
    fn from(name: &str) -> Self {
        NodeQuery::Name(name.to_string())
    }
}

impl From<NodeId> for NodeQuery {
    fn from(id: NodeId) -> Self {
        NodeQuery::Id(id)
    }
}

/// An ordered node registry with cycle-safe linking and a compile-state
/// machine, plus the two graph-level shared feeds the connector consults.
#[derive(Default)]
pub struct Graph {
    nodes: Vec<Option<GraphNode>>,
    state: GraphState,
    forward_feed: DeferredInputCollection,
    backward_feed: DeferredInputCollection,
}

impl Graph {
    /// Create an empty graph in the Created state.
    pub fn new() -> Self {
        Self::default()
    }

    /// The current compile-state.
    pub fn state(&self) -> GraphState {
        self.state
    }

    fn ensure_mutable(&self) -> Result<()> {
        if self.state != GraphState::Created {
            return Err(Error::GraphLocked {
                state: self.state.to_string(),
            });
        }
        Ok(())
    }

    // Structure

    /// Register a new node wrapping `entity`, then link it under each given
    /// parent. Fails on a duplicate entity name.
    pub fn add(&mut self, entity: Box<dyn Entity>, parents: &[NodeQuery]) -> Result<NodeId> {
        self.ensure_mutable()?;
        let name = entity.name().to_string();
        if self.iter().any(|n| n.name() == name) {
            return Err(Error::DuplicateEntity { name });
        }
        let id = NodeId(self.nodes.len());
        self.nodes.push(Some(GraphNode::new(id, entity)));
        for parent in parents {
            let parent_id = self.find(parent.clone())?;
            self.link(parent_id, id)?;
        }
        Ok(id)
    }

    /// Create an edge from `output` to `input`.
    ///
    /// Before committing, four reachability checks (forward and backward
    /// from each endpoint) guarantee the new edge introduces no cycle.
    /// An edge that already exists is left as is.
    pub fn link(&mut self, output: impl Into<NodeQuery>, input: impl Into<NodeQuery>) -> Result<()> {
        self.ensure_mutable()?;
        let from = self.find(output)?;
        let to = self.find(input)?;
        if self.node(from)?.outputs().contains(&to) {
            return Ok(());
        }
        let circular = from == to
            || self.reachable(to, from, Direction::Forward)?
            || self.reachable(from, to, Direction::Backward)?
            || self.reachable(from, from, Direction::Forward)?
            || self.reachable(to, to, Direction::Forward)?;
        if circular {
            return Err(Error::CircularGraph {
                from: self.node(from)?.name().to_string(),
                to: self.node(to)?.name().to_string(),
            });
        }
        self.node_mut(from)?.outputs_mut().push(to);
        self.node_mut(to)?.inputs_mut().push(from);
        Ok(())
    }

    /// Remove the edge from `output` to `input`, repairing both adjacency
    /// lists.
    pub fn unlink(
        &mut self,
        output: impl Into<NodeQuery>,
        input: impl Into<NodeQuery>,
    ) -> Result<()> {
        self.ensure_mutable()?;
        let from = self.find(output)?;
        let to = self.find(input)?;
        if !self.node(from)?.outputs().contains(&to) {
            return Err(Error::MissingEdge {
                from: self.node(from)?.name().to_string(),
                to: self.node(to)?.name().to_string(),
            });
        }
        self.node_mut(from)?.outputs_mut().retain(|&n| n != to);
        self.node_mut(to)?.inputs_mut().retain(|&n| n != from);
        Ok(())
    }

    /// Remove a node, detaching every edge that touches it. Returns the
    /// wrapped entity.
    pub fn remove(&mut self, query: impl Into<NodeQuery>) -> Result<Box<dyn Entity>> {
        self.ensure_mutable()?;
        let id = self.find(query)?;
        for slot in self.nodes.iter_mut().flatten() {
            slot.inputs_mut().retain(|&n| n != id);
            slot.outputs_mut().retain(|&n| n != id);
        }
        let node = self.nodes[id.0].take().ok_or(Error::UnknownEntity {
            identifier: format!("node #{}", id.0),
        })?;
        Ok(node.into_entity())
    }

    /// Resolve a node identifier. Unresolved lookups fail naming the
    /// identifier.
    pub fn find(&self, query: impl Into<NodeQuery>) -> Result<NodeId> {
        match query.into() {
            NodeQuery::Id(id) => {
                self.node(id)?;
                Ok(id)
            }
            NodeQuery::Index(index) => self
                .iter()
                .nth(index)
                .map(GraphNode::id)
                .ok_or(Error::UnknownEntity {
                    identifier: format!("index {index}"),
                }),
            NodeQuery::Name(name) => self
                .iter()
                .find(|n| n.name() == name)
                .map(GraphNode::id)
                .ok_or(Error::UnknownEntity { identifier: name }),
        }
    }

    // Access

    /// The node behind a handle.
    pub fn node(&self, id: NodeId) -> Result<&GraphNode> {
        self.nodes
            .get(id.0)
            .and_then(Option::as_ref)
            .ok_or(Error::UnknownEntity {
                identifier: format!("node #{}", id.0),
            })
    }

    /// The node behind a handle, mutably.
    pub fn node_mut(&mut self, id: NodeId) -> Result<&mut GraphNode> {
        self.nodes
            .get_mut(id.0)
            .and_then(Option::as_mut)
            .ok_or(Error::UnknownEntity {
                identifier: format!("node #{}", id.0),
            })
    }

    /// Iterate over live nodes in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &GraphNode> {
        self.nodes.iter().flatten()
    }

    /// Handles of every live node, in registration order.
    pub fn ids(&self) -> Vec<NodeId> {
        self.iter().map(GraphNode::id).collect()
    }

    /// Number of live nodes.
    pub fn len(&self) -> usize {
        self.iter().count()
    }

    /// Whether the graph holds no nodes.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Nodes with no incoming edges.
    pub fn sources(&self) -> Vec<NodeId> {
        self.iter()
            .filter(|n| n.inputs().is_empty())
            .map(GraphNode::id)
            .collect()
    }

    /// Nodes with no outgoing edges.
    pub fn sinks(&self) -> Vec<NodeId> {
        self.iter()
            .filter(|n| n.outputs().is_empty())
            .map(GraphNode::id)
            .collect()
    }

    /// Whether `target` can be reached from `start` following edges in the
    /// given direction. `start == target` tests for a cycle through the
    /// node itself, not the trivial empty path.
    pub fn reachable(&self, start: NodeId, target: NodeId, direction: Direction) -> Result<bool> {
        let mut visited = vec![false; self.nodes.len()];
        let mut stack = match direction {
            Direction::Forward => self.node(start)?.outputs().to_vec(),
            Direction::Backward => self.node(start)?.inputs().to_vec(),
        };
        while let Some(id) = stack.pop() {
            if id == target {
                return Ok(true);
            }
            if visited[id.0] {
                continue;
            }
            visited[id.0] = true;
            let node = self.node(id)?;
            match direction {
                Direction::Forward => stack.extend_from_slice(node.outputs()),
                Direction::Backward => stack.extend_from_slice(node.inputs()),
            }
        }
        Ok(false)
    }

    // Feeds

    /// The graph-level shared feed for a direction.
    pub fn feed(&self, direction: Direction) -> &DeferredInputCollection {
        match direction {
            Direction::Forward => &self.forward_feed,
            Direction::Backward => &self.backward_feed,
        }
    }

    /// Mutable access to the forward shared feed. Feed wiring is structural
    /// and only allowed before compilation.
    pub fn forward_feed_mut(&mut self) -> Result<&mut DeferredInputCollection> {
        self.ensure_mutable()?;
        Ok(&mut self.forward_feed)
    }

    /// Mutable access to the backward shared feed.
    pub fn backward_feed_mut(&mut self) -> Result<&mut DeferredInputCollection> {
        self.ensure_mutable()?;
        Ok(&mut self.backward_feed)
    }

    // Compilation

    /// Compile the graph: bind every node's input views (both directions),
    /// run each entity's own compile step, then verify connectivity.
    ///
    /// Entity compile order is irrelevant — each entity declares its own
    /// shapes from its already-bound input view, never from another
    /// entity's compile results.
    pub fn compile(&mut self) -> Result<()> {
        self.ensure_mutable()?;
        self.state = GraphState::Compiling;

        Connector::new(Direction::Forward).connect(self)?;
        Connector::new(Direction::Backward).connect(self)?;

        for id in self.ids() {
            self.node_mut(id)?.entity_mut().compile()?;
        }

        self.verify()?;
        self.state = GraphState::Compiled;
        Ok(())
    }

    /// Verification pass: every node must have at least one edge; a node
    /// with no inputs is legitimate only if its entity accepts graph input;
    /// symmetrically for sinks and declared outputs.
    fn verify(&self) -> Result<()> {
        for node in self.iter() {
            if node.inputs().is_empty() && node.outputs().is_empty() {
                return Err(Error::Disconnected {
                    node: node.name().to_string(),
                });
            }
            if node.inputs().is_empty() && !node.entity().accepts_input() {
                return Err(Error::UnfedSource {
                    node: node.name().to_string(),
                });
            }
            if node.outputs().is_empty() && !node.entity().produces_output() {
                return Err(Error::UnterminatedSink {
                    node: node.name().to_string(),
                });
            }
        }
        Ok(())
    }
}

impl std::fmt::Debug for Graph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Graph")
            .field("state", &self.state)
            .field("nodes", &self.iter().map(GraphNode::name).collect::<Vec<_>>())
            .finish()
    }
}
