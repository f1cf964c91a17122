use crate::shape::Shape;

/// All errors that can occur within Plexus.
///
/// This enum captures every failure mode: shape and dimension errors from the
/// tensor core, deferred-value state errors, structural graph errors, and the
/// scheduler's stuck-schedule error. Using a single error type across the
/// library simplifies error propagation.
///
/// Every variant carries the offending name, key, dimension or index so a
/// caller can locate the failing model definition without reading engine
/// internals.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    // Tensor core

    /// Elementwise operation between two tensors of different shapes.
    #[error("{op}: shape mismatch between {lhs} and {rhs}")]
    ShapeMismatch { op: String, lhs: Shape, rhs: Shape },

    /// Operation requires a specific rank (number of dimensions).
    #[error("rank mismatch: expected rank {expected}, got {got}")]
    RankMismatch { expected: usize, got: usize },

    /// A shape with a non-positive dimension size.
    #[error("malformed shape: dimension {dim} has size {size}")]
    MalformedShape { dim: usize, size: usize },

    /// Nested construction data with inconsistent lengths at some depth.
    #[error("malformed nested data at depth {depth}: expected length {expected}, got {got}")]
    RaggedData {
        depth: usize,
        expected: usize,
        got: usize,
    },

    /// Nested construction data mixing scalars and lists at the same depth.
    #[error("malformed nested data at depth {depth}: inconsistent nesting")]
    NestedMismatch { depth: usize },

    /// Element count mismatch when creating a tensor from a flat buffer.
    #[error("element count mismatch: shape {shape} requires {expected} elements, got {got}")]
    ElementCountMismatch {
        shape: Shape,
        expected: usize,
        got: usize,
    },

    /// Positional access with the wrong number of coordinates.
    #[error("position length mismatch: expected {expected} coordinates, got {got}")]
    PositionLength { expected: usize, got: usize },

    /// Positional access with a coordinate outside `[0, size)`.
    #[error("index out of bounds: dimension {dim} has size {size}, got index {index}")]
    IndexOutOfBounds {
        dim: usize,
        size: usize,
        index: usize,
    },

    /// Matrix multiplication inner-dimension mismatch.
    #[error("matmul shape mismatch: [{m}x{k1}] @ [{k2}x{n}], inner dims must match")]
    MatmulShapeMismatch {
        m: usize,
        k1: usize,
        k2: usize,
        n: usize,
    },

    /// A vector whose size does not match the dimension it is applied to.
    #[error("{op}: vector size mismatch: expected {expected}, got {got}")]
    VectorSizeMismatch {
        op: String,
        expected: usize,
        got: usize,
    },

    // Deferred values

    /// A deferred value was used before its shape was declared.
    #[error("deferred value '{key}' has not been declared")]
    NotDeclared { key: String },

    /// A deferred value's shape was declared twice.
    #[error("deferred value '{key}' is already declared")]
    AlreadyDeclared { key: String },

    /// A deferred value was read before any tensor was bound to it.
    #[error("deferred value '{key}' is declared but not set")]
    NotSet { key: String },

    /// A tensor bound to a deferred value disagrees with the declared shape.
    #[error("invalid value for '{key}': declared shape {declared}, got {got}")]
    InvalidValue {
        key: String,
        declared: Shape,
        got: Shape,
    },

    /// A named collection entry was looked up but does not exist.
    #[error("key '{key}' not found")]
    KeyNotFound { key: String },

    /// A named collection entry was inserted twice.
    #[error("duplicate key '{key}'")]
    DuplicateKey { key: String },

    /// A collection operation needed a default key but none is declared.
    #[error("collection has no default key")]
    MissingDefault,

    // Graph structure

    /// Two graph entities share a name.
    #[error("duplicate entity '{name}' in graph")]
    DuplicateEntity { name: String },

    /// A node lookup that resolved nothing.
    #[error("unknown entity '{identifier}'")]
    UnknownEntity { identifier: String },

    /// A link that would close a cycle.
    #[error("circular graph: linking '{from}' -> '{to}' would create a cycle")]
    CircularGraph { from: String, to: String },

    /// Structural mutation attempted after compilation began.
    #[error("graph is {state}: structural changes are only allowed before compile")]
    GraphLocked { state: String },

    /// An edge that does not exist.
    #[error("no edge from '{from}' to '{to}'")]
    MissingEdge { from: String, to: String },

    /// A node with no edges at all.
    #[error("node '{node}' is disconnected")]
    Disconnected { node: String },

    /// A node with no incoming edges whose entity does not accept graph input.
    #[error("node '{node}' has no incoming edges and does not accept input")]
    UnfedSource { node: String },

    /// A node with no outgoing edges whose entity does not produce graph output.
    #[error("node '{node}' has no outgoing edges and does not produce output")]
    UnterminatedSink { node: String },

    /// The graph-level default feed entry was claimed by two nodes.
    #[error("{direction} default feed consumed twice: by '{first}' and '{second}'")]
    DefaultFeedConflict {
        direction: String,
        first: String,
        second: String,
    },

    /// The graph-level default feed entry was declared but never consumed.
    #[error("{direction} default feed was declared but no node consumed it")]
    UnconsumedDefault { direction: String },

    /// A boundary node the populated feed provides no entry for.
    #[error("{direction} feed has no entry for boundary node '{node}'")]
    UnfedBoundary { direction: String, node: String },

    // Scheduling

    /// The processor scanned every unprocessed node and none was ready.
    #[error("unresolvable execution order: {remaining} nodes can never become ready")]
    UnresolvableSchedule { remaining: usize },

    // Layer lifecycle

    /// A lifecycle method called out of order.
    #[error("layer '{layer}': expected phase {expected}, actual phase {actual}")]
    InvalidPhase {
        layer: String,
        expected: String,
        actual: String,
    },

    /// A registry lookup with an unknown tag.
    #[error("unknown {kind} '{name}'")]
    UnknownComponent { kind: String, name: String },

    // Data feeds

    /// A feed read past its last item.
    #[error("feed exhausted: offset {offset} of {count}")]
    FeedExhausted { offset: usize, count: usize },

    /// Generic message for cases not covered above.
    #[error("{0}")]
    Msg(String),
}

impl Error {
    /// Create an error from any string message.
    pub fn msg(s: impl Into<String>) -> Self {
        Error::Msg(s.into())
    }
}

/// Convenience Result type used throughout Plexus.
pub type Result<T> = std::result::Result<T, Error>;

/// Macro for early return with a formatted error message.
/// Usage: `bail!("something went wrong: {}", detail)`
#[macro_export]
macro_rules! bail {
    ($($arg:tt)*) => {
        return Err($crate::Error::Msg(format!($($arg)*)))
    };
}
