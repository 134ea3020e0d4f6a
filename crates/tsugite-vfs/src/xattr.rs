//! Extended attribute mappings.
//!
//! The adapter mutates the map returned by `Filesystem::xattr` in place.
//! A fresh [`Xattrs`] is therefore write-only scratch space: the changes
//! vanish with it. A backend that wants attributes to persist stores one
//! `Xattrs` per path and hands out clones, which share the same backing map.

use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Shared, mutable mapping of attribute name to value bytes.
#[derive(Debug, Clone, Default)]
pub struct Xattrs {
    inner: Arc<RwLock<BTreeMap<String, Vec<u8>>>>,
}

impl Xattrs {
    /// A new, unshared, empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Value of `name`, if set.
    pub fn get(&self, name: &str) -> Option<Vec<u8>> {
        self.inner.read().get(name).cloned()
    }

    /// Insert or replace `name`. Returns the previous value.
    pub fn set(&self, name: impl Into<String>, value: impl Into<Vec<u8>>) -> Option<Vec<u8>> {
        self.inner.write().insert(name.into(), value.into())
    }

    /// Remove `name`. Returns the removed value.
    pub fn remove(&self, name: &str) -> Option<Vec<u8>> {
        self.inner.write().remove(name)
    }

    /// Attribute names in sorted order.
    pub fn names(&self) -> Vec<String> {
        self.inner.read().keys().cloned().collect()
    }

    /// Number of attributes.
    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    /// Returns true if no attributes are set.
    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }

    /// Returns true if both handles refer to the same backing map.
    pub fn shares_with(&self, other: &Xattrs) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}
