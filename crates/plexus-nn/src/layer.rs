use plexus_core::{Error, Result};

// Layer lifecycle — three ordered phases
//
// A layer moves through Created → Compiled → Initialized; forward and
// backward are usable only once Initialized. Each transition is callable
// exactly once, and an out-of-order call fails with a precondition error
// naming the expected vs. actual phase.

/// The lifecycle phase of a layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Created,
    Compiled,
    Initialized,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Phase::Created => "created",
            Phase::Compiled => "compiled",
            Phase::Initialized => "initialized",
        };
        write!(f, "{s}")
    }
}

impl Phase {
    /// Check a lifecycle precondition, naming the layer on failure.
    pub fn expect(self, layer: &str, expected: Phase) -> Result<()> {
        if self != expected {
            return Err(Error::InvalidPhase {
                layer: layer.to_string(),
                expected: expected.to_string(),
                actual: self.to_string(),
            });
        }
        Ok(())
    }
}
