use plexus_core::{Error, Result, Shape, Tensor};

// DeferredValue — a slot whose shape is fixed before its data is known
//
// Layers declare the shapes of their inputs and outputs at compile time and
// bind actual tensors much later, once per training iteration. The three
// states are explicit:
//
//   Undeclared ──declare──▶ Declared ──set──▶ Bound
//                              ▲                │
//                              └────── unset ───┘
//
// `declare` is one-shot. `unset` keeps the declared shape so the slot can be
// reused across iterations without re-declaring. A bound tensor's shape must
// equal the declared shape exactly.
//
// The methods take a `key` argument purely so errors can name the slot; a
// standalone value has no name of its own.

/// A lazily-bound tensor slot with an explicit three-state lifecycle.
#[derive(Debug, Clone, Default)]
pub enum DeferredValue {
    /// No shape known yet.
    #[default]
    Undeclared,
    /// Shape fixed, no tensor bound.
    Declared(Shape),
    /// Shape fixed and a tensor of exactly that shape bound.
    Bound { shape: Shape, value: Tensor },
}

impl DeferredValue {
    /// Create an undeclared value.
    pub fn new() -> Self {
        DeferredValue::Undeclared
    }

    /// Fix the shape. Calling this twice fails.
    pub fn declare(&mut self, key: &str, shape: Shape) -> Result<()> {
        match self {
            DeferredValue::Undeclared => {
                shape.validate()?;
                *self = DeferredValue::Declared(shape);
                Ok(())
            }
            _ => Err(Error::AlreadyDeclared {
                key: key.to_string(),
            }),
        }
    }

    /// Bind a tensor. Fails before declaration, or when the tensor's shape
    /// disagrees with the declared shape.
    pub fn set(&mut self, key: &str, value: Tensor) -> Result<()> {
        let shape = match self {
            DeferredValue::Undeclared => {
                return Err(Error::NotDeclared {
                    key: key.to_string(),
                })
            }
            DeferredValue::Declared(shape) => shape,
            DeferredValue::Bound { shape, .. } => shape,
        };
        if value.shape() != shape {
            return Err(Error::InvalidValue {
                key: key.to_string(),
                declared: shape.clone(),
                got: value.shape().clone(),
            });
        }
        *self = DeferredValue::Bound {
            shape: shape.clone(),
            value,
        };
        Ok(())
    }

    /// Read the bound tensor. Fails before any `set`.
    pub fn get(&self, key: &str) -> Result<&Tensor> {
        match self {
            DeferredValue::Bound { value, .. } => Ok(value),
            DeferredValue::Undeclared => Err(Error::NotDeclared {
                key: key.to_string(),
            }),
            DeferredValue::Declared(_) => Err(Error::NotSet {
                key: key.to_string(),
            }),
        }
    }

    /// Clear the bound tensor, keeping the declared shape.
    pub fn unset(&mut self) {
        if let DeferredValue::Bound { shape, .. } = self {
            *self = DeferredValue::Declared(shape.clone());
        }
    }

    /// The declared shape, if any.
    pub fn shape(&self) -> Option<&Shape> {
        match self {
            DeferredValue::Undeclared => None,
            DeferredValue::Declared(shape) => Some(shape),
            DeferredValue::Bound { shape, .. } => Some(shape),
        }
    }

    /// Whether a shape has been declared.
    pub fn is_declared(&self) -> bool {
        !matches!(self, DeferredValue::Undeclared)
    }

    /// Whether a tensor is currently bound.
    pub fn is_set(&self) -> bool {
        matches!(self, DeferredValue::Bound { .. })
    }
}
