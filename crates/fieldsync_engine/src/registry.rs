//! Field registry: bind-time bookkeeping and lookups.
//!
//! Pure data, no I/O. Fields keep their bind order, which is the canonical
//! field order everywhere else in the engine.

use fieldsync_core::{CacheError, CacheResult, FieldBinding, FieldState};

/// One registered field: its binding plus cached values and state.
#[derive(Debug)]
pub(crate) struct Slot<V, O> {
    /// The collaborator-supplied declaration for this field.
    pub(crate) binding: FieldBinding<V, O>,
    /// Current lifecycle state.
    pub(crate) state: FieldState,
    /// Last known value, local or remote.
    pub(crate) local: Option<V>,
    /// Snapshot of the last fetch, used only for reconciliation.
    pub(crate) remote: Option<V>,
}

/// The set of registered fields, in bind order.
pub(crate) struct Registry<V, O> {
    slots: Vec<Slot<V, O>>,
    bound: bool,
}

impl<V, O> Registry<V, O> {
    pub(crate) fn new() -> Self {
        Self {
            slots: Vec::new(),
            bound: false,
        }
    }

    /// Installs the field set. Each field is registered exactly once;
    /// rebinding and duplicate names are rejected.
    pub(crate) fn bind(&mut self, bindings: Vec<FieldBinding<V, O>>) -> CacheResult<()> {
        if self.bound {
            return Err(CacheError::AlreadyBound);
        }
        let mut slots: Vec<Slot<V, O>> = Vec::with_capacity(bindings.len());
        for binding in bindings {
            if slots.iter().any(|s| s.binding.name() == binding.name()) {
                return Err(CacheError::DuplicateField(binding.name().to_string()));
            }
            slots.push(Slot {
                binding,
                state: FieldState::Unsynced,
                local: None,
                remote: None,
            });
        }
        self.slots = slots;
        self.bound = true;
        Ok(())
    }

    pub(crate) fn index_of(&self, name: &str) -> CacheResult<usize> {
        self.slots
            .iter()
            .position(|s| s.binding.name() == name)
            .ok_or_else(|| CacheError::UnknownField(name.to_string()))
    }

    pub(crate) fn slot(&self, name: &str) -> CacheResult<&Slot<V, O>> {
        let idx = self.index_of(name)?;
        Ok(&self.slots[idx])
    }

    pub(crate) fn slot_mut(&mut self, name: &str) -> CacheResult<&mut Slot<V, O>> {
        let idx = self.index_of(name)?;
        Ok(&mut self.slots[idx])
    }

    pub(crate) fn slots(&self) -> &[Slot<V, O>] {
        &self.slots
    }

    pub(crate) fn slots_mut(&mut self) -> &mut [Slot<V, O>] {
        &mut self.slots
    }

    /// Field names in bind order.
    pub(crate) fn names(&self) -> Vec<String> {
        self.slots
            .iter()
            .map(|s| s.binding.name().to_string())
            .collect()
    }
}

impl<V: Clone + PartialEq, O> Registry<V, O> {
    /// Reconciliation sweep after a fetch: every non-dirty field whose
    /// remote snapshot differs from its local value takes the remote value
    /// and becomes synced. Dirty fields are never touched; the remote store
    /// has not seen their local write yet.
    pub(crate) fn reconcile(&mut self) {
        for slot in &mut self.slots {
            if slot.state.is_dirty() {
                continue;
            }
            let Some(remote) = &slot.remote else {
                continue;
            };
            if slot.local.as_ref() != Some(remote) {
                slot.local = Some(remote.clone());
                slot.state = FieldState::Synced;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn binding(name: &str) -> FieldBinding<String, ()> {
        FieldBinding::new(name)
    }

    #[test]
    fn bind_preserves_order_and_starts_unsynced() {
        let mut registry = Registry::new();
        registry
            .bind(vec![binding("b"), binding("a"), binding("c")])
            .unwrap();

        assert_eq!(registry.names(), vec!["b", "a", "c"]);
        for slot in registry.slots() {
            assert_eq!(slot.state, FieldState::Unsynced);
            assert!(slot.local.is_none());
            assert!(slot.remote.is_none());
        }
    }

    #[test]
    fn rebinding_is_rejected() {
        let mut registry = Registry::new();
        registry.bind(vec![binding("a")]).unwrap();

        let err = registry.bind(vec![binding("b")]).unwrap_err();
        assert!(matches!(err, CacheError::AlreadyBound));
        assert_eq!(registry.names(), vec!["a"]);
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let mut registry = Registry::new();
        let err = registry
            .bind(vec![binding("a"), binding("a")])
            .unwrap_err();
        assert!(matches!(err, CacheError::DuplicateField(name) if name == "a"));
    }

    #[test]
    fn unknown_field_lookup_fails() {
        let mut registry = Registry::new();
        registry.bind(vec![binding("a")]).unwrap();

        let err = registry.slot("missing").unwrap_err();
        assert!(matches!(err, CacheError::UnknownField(name) if name == "missing"));
    }

    #[test]
    fn reconcile_adopts_remote_values() {
        let mut registry = Registry::new();
        registry.bind(vec![binding("a")]).unwrap();

        registry.slot_mut("a").unwrap().remote = Some("remote".to_string());
        registry.reconcile();

        let slot = registry.slot("a").unwrap();
        assert_eq!(slot.local.as_deref(), Some("remote"));
        assert_eq!(slot.state, FieldState::Synced);
    }

    #[test]
    fn reconcile_never_touches_dirty_fields() {
        let mut registry = Registry::new();
        registry.bind(vec![binding("a")]).unwrap();

        {
            let slot = registry.slot_mut("a").unwrap();
            slot.local = Some("local edit".to_string());
            slot.state = FieldState::Dirty;
            slot.remote = Some("remote".to_string());
        }
        registry.reconcile();

        let slot = registry.slot("a").unwrap();
        assert_eq!(slot.local.as_deref(), Some("local edit"));
        assert_eq!(slot.state, FieldState::Dirty);
    }

    #[test]
    fn reconcile_skips_fields_without_remote_snapshot() {
        let mut registry = Registry::new();
        registry.bind(vec![binding("a")]).unwrap();

        registry.reconcile();

        let slot = registry.slot("a").unwrap();
        assert_eq!(slot.state, FieldState::Unsynced);
        assert!(slot.local.is_none());
    }
}
