use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use plexus_core::{Error, Result, Shape, Tensor};

use crate::deferred::DeferredValue;

// DeferredCollection — named deferred slots with a designated default
//
// A collection is declared once, at layer-compile time, by the layer that
// owns it. Values are then set and unset repeatedly across training
// iterations without re-declaring. Exactly one writer exists per
// collection; everyone else holds a SharedCollection handle and only reads
// through it.

/// A shared handle to a collection. Consumers treat it as read-only.
pub type SharedCollection = Arc<RwLock<DeferredCollection>>;

/// Wrap a collection in a shared handle.
pub fn shared(collection: DeferredCollection) -> SharedCollection {
    Arc::new(RwLock::new(collection))
}

/// A map from string key to [`DeferredValue`] with one designated default
/// key. Keys are unique; the default key must be among the declared keys.
#[derive(Debug, Clone, Default)]
pub struct DeferredCollection {
    values: HashMap<String, DeferredValue>,
    default_key: Option<String>,
}

impl DeferredCollection {
    /// Create an empty collection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a new slot. A duplicate key fails.
    pub fn declare(&mut self, key: &str, shape: impl Into<Shape>) -> Result<()> {
        if self.values.contains_key(key) {
            return Err(Error::AlreadyDeclared {
                key: key.to_string(),
            });
        }
        let mut value = DeferredValue::new();
        value.declare(key, shape.into())?;
        self.values.insert(key.to_string(), value);
        Ok(())
    }

    /// Declare a new slot and designate it as the collection's default.
    /// Fails if a default key is already designated.
    pub fn declare_default(&mut self, key: &str, shape: impl Into<Shape>) -> Result<()> {
        if let Some(existing) = &self.default_key {
            return Err(Error::AlreadyDeclared {
                key: existing.clone(),
            });
        }
        self.declare(key, shape)?;
        self.default_key = Some(key.to_string());
        Ok(())
    }

    /// The designated default key, if any.
    pub fn default_key(&self) -> Option<&str> {
        self.default_key.as_deref()
    }

    /// Bind a tensor to a declared slot.
    pub fn set(&mut self, key: &str, value: Tensor) -> Result<()> {
        match self.values.get_mut(key) {
            Some(slot) => slot.set(key, value),
            None => Err(Error::NotDeclared {
                key: key.to_string(),
            }),
        }
    }

    /// Read a copy of the tensor bound to a slot.
    pub fn get(&self, key: &str) -> Result<Tensor> {
        match self.values.get(key) {
            Some(slot) => Ok(slot.get(key)?.clone()),
            None => Err(Error::KeyNotFound {
                key: key.to_string(),
            }),
        }
    }

    /// Bind a tensor to the default slot.
    pub fn set_default(&mut self, value: Tensor) -> Result<()> {
        let key = self.default_key.clone().ok_or(Error::MissingDefault)?;
        self.set(&key, value)
    }

    /// Read a copy of the tensor bound to the default slot.
    pub fn get_default(&self) -> Result<Tensor> {
        let key = self.default_key.as_deref().ok_or(Error::MissingDefault)?;
        self.get(key)
    }

    /// The declared shape of a slot.
    pub fn shape_of(&self, key: &str) -> Result<&Shape> {
        match self.values.get(key) {
            Some(slot) => slot.shape().ok_or(Error::NotDeclared {
                key: key.to_string(),
            }),
            None => Err(Error::KeyNotFound {
                key: key.to_string(),
            }),
        }
    }

    /// Clear the tensor bound to one slot, keeping its declared shape.
    pub fn unset(&mut self, key: &str) -> Result<()> {
        match self.values.get_mut(key) {
            Some(slot) => {
                slot.unset();
                Ok(())
            }
            None => Err(Error::KeyNotFound {
                key: key.to_string(),
            }),
        }
    }

    /// Clear every bound tensor, keeping all declared shapes.
    pub fn unset_all(&mut self) {
        for slot in self.values.values_mut() {
            slot.unset();
        }
    }

    /// Whether a slot exists under this key.
    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Whether a slot is currently bound.
    pub fn is_set(&self, key: &str) -> bool {
        self.values.get(key).map(DeferredValue::is_set).unwrap_or(false)
    }

    /// Whether every declared slot is bound. An empty collection counts as
    /// fully set.
    pub fn are_all_set(&self) -> bool {
        self.values.values().all(DeferredValue::is_set)
    }

    /// Whether every slot has a declared shape.
    pub fn are_all_declared(&self) -> bool {
        self.values.values().all(DeferredValue::is_declared)
    }

    /// The declared keys, sorted for deterministic iteration.
    pub fn keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self.values.keys().map(String::as_str).collect();
        keys.sort_unstable();
        keys
    }

    /// Number of declared slots.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether no slots are declared.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Copy every bound value from a peer collection into this one by key.
    ///
    /// The peer's default key is remapped onto this collection's default
    /// key. Fails if a target key was never declared here. Unbound peer
    /// slots are skipped.
    pub fn assign(&mut self, other: &DeferredCollection) -> Result<()> {
        for key in other.keys() {
            let slot = &other.values[key];
            if !slot.is_set() {
                continue;
            }
            let value = slot.get(key)?.clone();
            if other.default_key.as_deref() == Some(key) {
                let target = self.default_key.clone().ok_or(Error::MissingDefault)?;
                self.set(&target, value)?;
            } else {
                self.set(key, value)?;
            }
        }
        Ok(())
    }
}
