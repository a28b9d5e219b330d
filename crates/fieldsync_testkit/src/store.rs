//! A scripted mock remote store.

use crate::fault::fault;
use crate::gate::Gate;
use fieldsync_core::{shared_getter, RemoteGetter};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

struct StoreInner<V> {
    values: Mutex<HashMap<String, V>>,
    reads: Mutex<HashMap<String, usize>>,
    fail_reads: AtomicBool,
    read_gate: Mutex<Option<Gate>>,
}

/// A mock remote store for testing getters.
///
/// Values are scripted per field with [`set_value`](MockStore::set_value);
/// [`getter_for`](MockStore::getter_for) builds a [`RemoteGetter`] that
/// counts every invocation, optionally waits on a gate, and optionally
/// fails. Clones share the same scripted state and counters.
pub struct MockStore<V> {
    inner: Arc<StoreInner<V>>,
}

impl<V> MockStore<V>
where
    V: Clone + Send + Sync + 'static,
{
    /// Creates an empty mock store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Arc::new(StoreInner {
                values: Mutex::new(HashMap::new()),
                reads: Mutex::new(HashMap::new()),
                fail_reads: AtomicBool::new(false),
                read_gate: Mutex::new(None),
            }),
        }
    }

    /// Scripts the remote value of one field.
    pub fn set_value(&self, field: impl Into<String>, value: V) {
        self.inner.values.lock().unwrap().insert(field.into(), value);
    }

    /// Makes every subsequent read fail (or succeed again).
    pub fn fail_reads(&self, fail: bool) {
        self.inner.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// Holds every subsequent read at the given gate until it opens.
    ///
    /// Reads are counted before the gate, so a test can observe that a
    /// fetch has started while it is still in flight.
    pub fn gate_reads(&self, gate: Gate) {
        *self.inner.read_gate.lock().unwrap() = Some(gate);
    }

    /// Number of reads issued for one field.
    #[must_use]
    pub fn read_count(&self, field: &str) -> usize {
        self.inner
            .reads
            .lock()
            .unwrap()
            .get(field)
            .copied()
            .unwrap_or(0)
    }

    /// Total number of reads issued across all fields.
    #[must_use]
    pub fn total_reads(&self) -> usize {
        self.inner.reads.lock().unwrap().values().sum()
    }

    /// Builds a remote getter for one field of this store.
    #[must_use]
    pub fn getter_for(&self, field: &str) -> RemoteGetter<V> {
        let inner = Arc::clone(&self.inner);
        let field = field.to_string();
        shared_getter(move || {
            let inner = Arc::clone(&inner);
            let field = field.clone();
            async move {
                *inner.reads.lock().unwrap().entry(field.clone()).or_insert(0) += 1;

                let gate = inner.read_gate.lock().unwrap().clone();
                if let Some(gate) = gate {
                    gate.wait().await;
                }

                if inner.fail_reads.load(Ordering::SeqCst) {
                    return Err(fault(format!("read of '{field}' failed")));
                }
                inner
                    .values
                    .lock()
                    .unwrap()
                    .get(&field)
                    .cloned()
                    .ok_or_else(|| fault(format!("no value scripted for '{field}'")))
            }
        })
    }
}

impl<V> Default for MockStore<V>
where
    V: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<V> Clone for MockStore<V> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn getter_returns_scripted_value_and_counts_reads() {
        let store = MockStore::new();
        store.set_value("owner", "alice".to_string());

        let getter = store.getter_for("owner");
        assert_eq!(getter().await.unwrap(), "alice");
        assert_eq!(getter().await.unwrap(), "alice");

        assert_eq!(store.read_count("owner"), 2);
        assert_eq!(store.total_reads(), 2);
    }

    #[tokio::test]
    async fn unscripted_field_fails() {
        let store: MockStore<String> = MockStore::new();
        let getter = store.getter_for("missing");

        let err = getter().await.unwrap_err();
        assert!(err.to_string().contains("missing"));
        assert_eq!(store.read_count("missing"), 1);
    }

    #[tokio::test]
    async fn injected_read_faults_toggle() {
        let store = MockStore::new();
        store.set_value("a", 1u64);
        let getter = store.getter_for("a");

        store.fail_reads(true);
        assert!(getter().await.is_err());

        store.fail_reads(false);
        assert_eq!(getter().await.unwrap(), 1);
    }
}
