use std::collections::HashMap;

use plexus_core::{Error, Result};

use crate::collection::SharedCollection;

// DeferredInputCollection — a consumer's merged view of producers
//
// Each graph node receives one of these per direction (forward inputs,
// backward inputs), built by the node connector at compile time. Entries
// map a producer's name to a read-only view of that producer's deferred
// collection; one reserved slot holds the node's "default" entry (the
// graph-level feed, or a name-matched feed entry).
//
// The collection is rebuilt across compilations, never mutated in place.

/// A map from producer name to a read-only deferred collection view, plus
/// one reserved default slot.
#[derive(Clone, Default)]
pub struct DeferredInputCollection {
    entries: HashMap<String, SharedCollection>,
    default: Option<SharedCollection>,
}

impl DeferredInputCollection {
    /// Create an empty input collection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a named producer entry. A duplicate name fails.
    pub fn insert(&mut self, name: &str, view: SharedCollection) -> Result<()> {
        if self.entries.contains_key(name) {
            return Err(Error::DuplicateKey {
                key: name.to_string(),
            });
        }
        self.entries.insert(name.to_string(), view);
        Ok(())
    }

    /// Bind the reserved default entry. A second bind fails.
    pub fn set_default(&mut self, view: SharedCollection) -> Result<()> {
        if self.default.is_some() {
            return Err(Error::DuplicateKey {
                key: "default".to_string(),
            });
        }
        self.default = Some(view);
        Ok(())
    }

    /// The reserved default entry, if bound.
    pub fn default_entry(&self) -> Option<&SharedCollection> {
        self.default.as_ref()
    }

    /// Whether the reserved default entry is bound.
    pub fn has_default(&self) -> bool {
        self.default.is_some()
    }

    /// Look up a named producer entry.
    pub fn get(&self, name: &str) -> Result<&SharedCollection> {
        self.entries.get(name).ok_or(Error::KeyNotFound {
            key: name.to_string(),
        })
    }

    /// Look up a named producer entry, falling back to the default entry
    /// when the name is absent. This is the locally-recovered variant of
    /// `get`; callers that must not fall back use `get` directly.
    pub fn get_or_default(&self, name: &str) -> Result<&SharedCollection> {
        match self.entries.get(name) {
            Some(view) => Ok(view),
            None => self.default.as_ref().ok_or(Error::KeyNotFound {
                key: name.to_string(),
            }),
        }
    }

    /// Producer names, sorted for deterministic iteration.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.entries.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Number of named entries (the default slot not included).
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether there are no named entries and no default entry.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty() && self.default.is_none()
    }

    /// Fold another input collection's entries into this one.
    ///
    /// An incoming default entry is stored under `default_name_override`
    /// when one is given, otherwise into this collection's default slot.
    /// Existing keys fail with a duplicate-key error unless `force` permits
    /// overwriting.
    pub fn merge(
        &mut self,
        other: &DeferredInputCollection,
        default_name_override: Option<&str>,
        force: bool,
    ) -> Result<()> {
        if let Some(view) = &other.default {
            match default_name_override {
                Some(name) => {
                    if self.entries.contains_key(name) && !force {
                        return Err(Error::DuplicateKey {
                            key: name.to_string(),
                        });
                    }
                    self.entries.insert(name.to_string(), view.clone());
                }
                None => {
                    if self.default.is_some() && !force {
                        return Err(Error::DuplicateKey {
                            key: "default".to_string(),
                        });
                    }
                    self.default = Some(view.clone());
                }
            }
        }
        for name in other.names() {
            if self.entries.contains_key(name) && !force {
                return Err(Error::DuplicateKey {
                    key: name.to_string(),
                });
            }
            self.entries.insert(name.to_string(), other.entries[name].clone());
        }
        Ok(())
    }

    /// Project a named subset of entries into a new input collection.
    ///
    /// Missing keys fail unless `allow_missing` tolerates them.
    pub fn filter(&self, keys: &[&str], allow_missing: bool) -> Result<DeferredInputCollection> {
        let mut out = DeferredInputCollection::new();
        for &key in keys {
            match self.entries.get(key) {
                Some(view) => out.entries.insert(key.to_string(), view.clone()),
                None if allow_missing => continue,
                None => {
                    return Err(Error::KeyNotFound {
                        key: key.to_string(),
                    })
                }
            };
        }
        Ok(out)
    }

    /// Whether every slot of every producer's collection is bound,
    /// including the default entry. This is the readiness predicate the
    /// scheduler consults.
    pub fn are_all_set(&self) -> bool {
        self.views().all(|view| {
            view.read().expect("collection lock poisoned").are_all_set()
        })
    }

    /// Whether every slot of every producer's collection has a declared
    /// shape, including the default entry.
    pub fn are_all_declared(&self) -> bool {
        self.views().all(|view| {
            view.read()
                .expect("collection lock poisoned")
                .are_all_declared()
        })
    }

    fn views(&self) -> impl Iterator<Item = &SharedCollection> {
        self.entries.values().chain(self.default.iter())
    }
}

impl std::fmt::Debug for DeferredInputCollection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeferredInputCollection")
            .field("entries", &self.names())
            .field("default", &self.default.is_some())
            .finish()
    }
}
