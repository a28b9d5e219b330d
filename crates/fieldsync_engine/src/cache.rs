//! The remote-backed field cache.

use crate::registry::Registry;
use crate::single_flight::SingleFlight;
use fieldsync_core::{CacheError, CacheResult, FieldBinding, FieldState};
use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;
use tracing::trace;

/// Everything guarded by the cache mutex. The lock is only ever held
/// between suspension points, never across an `.await`.
pub(crate) struct Inner<V, O> {
    pub(crate) registry: Registry<V, O>,
    pub(crate) deployed: bool,
    pub(crate) obsolete: bool,
}

/// A per-record cache of named fields backed by a slow, pay-per-write
/// remote store.
///
/// `V` is the field value type; `O` is the opaque options payload handed
/// through to remote setters on [flush](FieldCache::flush).
///
/// One cache instance wraps one remote record. Reads are lazy: the first
/// access to any field fetches the whole dataset in one concurrent batch,
/// and concurrent readers share that single in-flight fetch. Writes are
/// buffered locally and committed in as few remote operations as possible
/// on flush.
///
/// # Example
///
/// ```
/// use fieldsync_engine::{FieldBinding, FieldCache};
///
/// # async fn demo() -> fieldsync_engine::CacheResult<()> {
/// let cache: FieldCache<String> = FieldCache::new();
/// cache.bind(vec![
///     FieldBinding::new("owner").with_getter(|| async { Ok("alice".to_string()) }),
/// ])?;
/// cache.mark_deployed();
///
/// let owner = cache.get("owner").await?;
/// assert_eq!(owner.as_deref(), Some("alice"));
/// # Ok(())
/// # }
/// ```
pub struct FieldCache<V, O = ()> {
    pub(crate) inner: Arc<Mutex<Inner<V, O>>>,
    pub(crate) sync_flight: SingleFlight<CacheResult<()>>,
}

impl<V, O> FieldCache<V, O>
where
    V: Clone + PartialEq + Send + 'static,
    O: Clone + Send + 'static,
{
    /// Creates a fresh cache with no fields bound.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                registry: Registry::new(),
                deployed: false,
                obsolete: false,
            })),
            sync_flight: SingleFlight::new(),
        }
    }

    /// Installs the field declarations. Every field starts unsynced.
    ///
    /// Binding happens exactly once per cache; a second call fails with
    /// [`CacheError::AlreadyBound`], a repeated field name with
    /// [`CacheError::DuplicateField`].
    pub fn bind(&self, bindings: Vec<FieldBinding<V, O>>) -> CacheResult<()> {
        self.inner.lock().registry.bind(bindings)
    }

    /// Returns true once the backing record exists remotely.
    #[must_use]
    pub fn is_deployed(&self) -> bool {
        self.inner.lock().deployed
    }

    /// Signals that the backing record now exists remotely, enabling
    /// fetch and flush. Idempotent.
    pub fn mark_deployed(&self) {
        self.inner.lock().deployed = true;
    }

    /// Returns true once the backing record was destroyed.
    #[must_use]
    pub fn is_obsolete(&self) -> bool {
        self.inner.lock().obsolete
    }

    /// Signals that the backing record was destroyed. Irreversible; every
    /// subsequent `get`/`set`/`sync`/`flush` fails fast with
    /// [`CacheError::Obsolete`] and performs no remote I/O.
    pub fn mark_obsolete(&self) {
        self.inner.lock().obsolete = true;
    }

    /// Reads a field.
    ///
    /// On the first read of an unsynced field of a deployed record this
    /// triggers a full dataset sync and awaits it. Otherwise the local
    /// value is returned immediately; an undeployed record is purely
    /// local, so nothing is fetched for it.
    pub async fn get(&self, field: &str) -> CacheResult<Option<V>> {
        let needs_sync = {
            let inner = self.inner.lock();
            if inner.obsolete {
                return Err(CacheError::Obsolete);
            }
            let slot = inner.registry.slot(field)?;
            inner.deployed && slot.state.needs_fetch()
        };

        if needs_sync {
            self.sync().await?;
        }

        let inner = self.inner.lock();
        Ok(inner.registry.slot(field)?.local.clone())
    }

    /// Buffers a local write. No remote I/O happens until
    /// [flush](FieldCache::flush).
    ///
    /// The field becomes dirty if the value differs from the current local
    /// value, or unconditionally on a first write to a still-unsynced field
    /// so that an initial write is never silently dropped.
    pub fn set(&self, field: &str, value: V) -> CacheResult<()> {
        let mut inner = self.inner.lock();
        if inner.obsolete {
            return Err(CacheError::Obsolete);
        }
        let slot = inner.registry.slot_mut(field)?;

        let first_write = slot.state.is_unsynced();
        let changed = slot.local.as_ref() != Some(&value);
        if changed || first_write {
            slot.state = FieldState::Dirty;
        }
        slot.local = Some(value);
        trace!(field, state = %slot.state, "buffered local write");
        Ok(())
    }

    /// Returns the lifecycle state of one field.
    ///
    /// Purely local introspection; collaborators use it to choose between
    /// a single-field and a combined multi-field remote update before
    /// calling flush. Stays readable after the record becomes obsolete.
    pub fn field_state(&self, field: &str) -> CacheResult<FieldState> {
        let inner = self.inner.lock();
        Ok(inner.registry.slot(field)?.state)
    }

    /// Field names in bind order.
    #[must_use]
    pub fn field_names(&self) -> Vec<String> {
        self.inner.lock().registry.names()
    }
}

impl<V, O> Default for FieldCache<V, O>
where
    V: Clone + PartialEq + Send + 'static,
    O: Clone + Send + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<V, O> fmt::Debug for FieldCache<V, O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.lock();
        f.debug_struct("FieldCache")
            .field("fields", &inner.registry.names())
            .field("deployed", &inner.deployed)
            .field("obsolete", &inner.obsolete)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cache_with(names: &[&str]) -> FieldCache<String> {
        let cache = FieldCache::new();
        cache
            .bind(names.iter().map(|name| FieldBinding::new(*name)).collect())
            .unwrap();
        cache
    }

    #[test]
    fn fresh_cache_is_neither_deployed_nor_obsolete() {
        let cache: FieldCache<String> = FieldCache::new();
        assert!(!cache.is_deployed());
        assert!(!cache.is_obsolete());
        assert!(cache.field_names().is_empty());
    }

    #[test]
    fn lifecycle_flags_are_idempotent_and_monotonic() {
        let cache: FieldCache<String> = FieldCache::new();

        cache.mark_deployed();
        cache.mark_deployed();
        assert!(cache.is_deployed());

        cache.mark_obsolete();
        cache.mark_obsolete();
        assert!(cache.is_obsolete());
        // Deployment is unaffected by obsolescence.
        assert!(cache.is_deployed());
    }

    #[test]
    fn bound_fields_start_unsynced() {
        let cache = cache_with(&["a", "b"]);
        assert_eq!(cache.field_state("a").unwrap(), FieldState::Unsynced);
        assert_eq!(cache.field_state("b").unwrap(), FieldState::Unsynced);
        assert_eq!(cache.field_names(), vec!["a", "b"]);
    }

    #[test]
    fn write_marks_dirty_and_remembers_value() {
        let cache = cache_with(&["a"]);

        cache.set("a", "one".to_string()).unwrap();
        assert_eq!(cache.field_state("a").unwrap(), FieldState::Dirty);

        // A repeated identical write stays dirty.
        cache.set("a", "one".to_string()).unwrap();
        assert_eq!(cache.field_state("a").unwrap(), FieldState::Dirty);
    }

    #[test]
    fn writes_after_obsolete_fail_without_effect() {
        let cache = cache_with(&["a"]);
        cache.mark_obsolete();

        let err = cache.set("a", "x".to_string()).unwrap_err();
        assert!(matches!(err, CacheError::Obsolete));
        assert_eq!(cache.field_state("a").unwrap(), FieldState::Unsynced);
    }

    #[test]
    fn unknown_field_is_rejected() {
        let cache = cache_with(&["a"]);
        let err = cache.set("missing", "x".to_string()).unwrap_err();
        assert!(matches!(err, CacheError::UnknownField(name) if name == "missing"));
    }

    #[tokio::test]
    async fn undeployed_reads_stay_local() {
        let cache = cache_with(&["a"]);

        // Nothing remote to contact yet: reads resolve locally.
        assert_eq!(cache.get("a").await.unwrap(), None);

        cache.set("a", "local".to_string()).unwrap();
        assert_eq!(cache.get("a").await.unwrap().as_deref(), Some("local"));
    }

    #[test]
    fn field_state_stays_readable_after_obsolete() {
        let cache = cache_with(&["a"]);
        cache.set("a", "x".to_string()).unwrap();
        cache.mark_obsolete();

        assert_eq!(cache.field_state("a").unwrap(), FieldState::Dirty);
    }

    #[test]
    fn debug_output_names_fields() {
        let cache = cache_with(&["a"]);
        let rendered = format!("{cache:?}");
        assert!(rendered.contains("\"a\""));
        assert!(rendered.contains("deployed: false"));
    }
}
