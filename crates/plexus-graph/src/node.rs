use crate::entity::Entity;

/// Stable handle to a node slot in the graph arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub usize);

/// A graph node: one wrapped entity plus input- and output-edge adjacency
/// lists. Edges are only ever created through `Graph::link`, which performs
/// the cycle checks before committing.
pub struct GraphNode {
    id: NodeId,
    entity: Box<dyn Entity>,
    inputs: Vec<NodeId>,
    outputs: Vec<NodeId>,
}

impl GraphNode {
    pub(crate) fn new(id: NodeId, entity: Box<dyn Entity>) -> Self {
        GraphNode {
            id,
            entity,
            inputs: Vec::new(),
            outputs: Vec::new(),
        }
    }

    /// This node's arena handle.
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// The wrapped entity's name.
    pub fn name(&self) -> &str {
        self.entity.name()
    }

    /// The wrapped entity.
    pub fn entity(&self) -> &dyn Entity {
        self.entity.as_ref()
    }

    /// The wrapped entity, mutably.
    pub fn entity_mut(&mut self) -> &mut dyn Entity {
        self.entity.as_mut()
    }

    pub(crate) fn into_entity(self) -> Box<dyn Entity> {
        self.entity
    }

    /// Nodes with an edge into this node.
    pub fn inputs(&self) -> &[NodeId] {
        &self.inputs
    }

    /// Nodes this node has an edge into.
    pub fn outputs(&self) -> &[NodeId] {
        &self.outputs
    }

    pub(crate) fn inputs_mut(&mut self) -> &mut Vec<NodeId> {
        &mut self.inputs
    }

    pub(crate) fn outputs_mut(&mut self) -> &mut Vec<NodeId> {
        &mut self.outputs
    }
}

impl std::fmt::Debug for GraphNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GraphNode")
            .field("id", &self.id)
            .field("name", &self.entity.name())
            .field("inputs", &self.inputs)
            .field("outputs", &self.outputs)
            .finish()
    }
}
