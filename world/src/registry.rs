//! Non-owning index from unit identifiers to pool handles.

use std::collections::BTreeMap;

use holdout_core::UnitId;

/// Maps live unit identifiers to the handles that address them.
///
/// The registry never owns the referenced instances. Removing an entry does
/// not release anything; callers pair every `unregister` with the matching
/// pool release at the same call site.
#[derive(Clone, Debug)]
pub struct Registry<H> {
    entries: BTreeMap<UnitId, H>,
}

impl<H: Copy + std::fmt::Debug> Registry<H> {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    /// Records `handle` under `id`. Returns `false` without overwriting if `id` is taken.
    pub fn register(&mut self, id: UnitId, handle: H) -> bool {
        if let Some(existing) = self.entries.get(&id) {
            tracing::warn!(unit = id.get(), ?existing, ?handle, "registry collision");
            return false;
        }
        let _ = self.entries.insert(id, handle);
        true
    }

    /// Removes `id`. Returns `false` if it was not registered.
    pub fn unregister(&mut self, id: UnitId) -> bool {
        if self.entries.remove(&id).is_none() {
            tracing::debug!(unit = id.get(), "registry miss on unregister");
            return false;
        }
        true
    }

    /// Resolves `id` to its handle.
    #[must_use]
    pub fn lookup(&self, id: UnitId) -> Option<H> {
        self.entries.get(&id).copied()
    }

    /// Iterates the registered handles in identifier order.
    pub fn values(&self) -> impl Iterator<Item = H> + '_ {
        self.entries.values().copied()
    }

    /// Iterates `(identifier, handle)` pairs in identifier order.
    pub fn iter(&self) -> impl Iterator<Item = (UnitId, H)> + '_ {
        self.entries.iter().map(|(id, handle)| (*id, *handle))
    }

    /// Number of registered identifiers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Reports whether nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<H: Copy + std::fmt::Debug> Default for Registry<H> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_refuses_to_overwrite() {
        let mut registry = Registry::new();
        assert!(registry.register(UnitId::new(1), 10_u32));
        assert!(!registry.register(UnitId::new(1), 20_u32));
        assert_eq!(registry.lookup(UnitId::new(1)), Some(10));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn unregister_reports_misses() {
        let mut registry = Registry::new();
        assert!(registry.register(UnitId::new(3), 'a'));
        assert!(registry.unregister(UnitId::new(3)));
        assert!(!registry.unregister(UnitId::new(3)));
        assert!(registry.lookup(UnitId::new(3)).is_none());
        assert!(registry.is_empty());
    }

    #[test]
    fn values_follow_identifier_order() {
        let mut registry = Registry::new();
        for id in [5, 1, 3] {
            assert!(registry.register(UnitId::new(id), id * 10));
        }
        assert_eq!(registry.values().collect::<Vec<_>>(), vec![10, 30, 50]);
        let ids: Vec<_> = registry.iter().map(|(id, _)| id.get()).collect();
        assert_eq!(ids, vec![1, 3, 5]);
    }
}
