//! Read-through sync: one concurrent batch fetch of the whole dataset.

use crate::cache::{FieldCache, Inner};
use fieldsync_core::{CacheError, CacheResult, RemoteGetter};
use futures::future::try_join_all;
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{debug, trace};

impl<V, O> FieldCache<V, O>
where
    V: Clone + PartialEq + Send + 'static,
    O: Clone + Send + 'static,
{
    /// Fetches every unsynced remote-gettable field in one concurrent
    /// batch and reconciles the results into the local cache.
    ///
    /// Single-flight: callers arriving while a sync is in flight join it
    /// and observe the same outcome; a burst of N concurrent reads
    /// produces exactly one batch of remote getter calls. The in-flight
    /// handle is cleared on completion, success or failure, so the next
    /// call starts a fresh attempt.
    ///
    /// All-or-nothing: if any getter fails the whole sync fails with
    /// [`CacheError::RemoteRead`] and no reconciliation is applied.
    /// Dirty fields are never overwritten; local edits win over whatever
    /// the remote store reports, because the store has not seen them yet.
    pub async fn sync(&self) -> CacheResult<()> {
        {
            let inner = self.inner.lock();
            if inner.obsolete {
                return Err(CacheError::Obsolete);
            }
            if !inner.deployed {
                return Err(CacheError::Undeployed);
            }
        }

        let inner = Arc::clone(&self.inner);
        self.sync_flight
            .join_or_start(move || fetch_and_reconcile(inner))
            .await
    }
}

/// The body of one sync run. Getter results are captured together before
/// any reconciliation, so no field is reconciled while another getter is
/// still outstanding.
async fn fetch_and_reconcile<V, O>(inner: Arc<Mutex<Inner<V, O>>>) -> CacheResult<()>
where
    V: Clone + PartialEq + Send + 'static,
    O: 'static,
{
    let pending: Vec<(usize, RemoteGetter<V>)> = {
        let guard = inner.lock();
        guard
            .registry
            .slots()
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.state.needs_fetch())
            .filter_map(|(idx, slot)| slot.binding.remote_getter().map(|getter| (idx, getter)))
            .collect()
    };

    if pending.is_empty() {
        trace!("sync: nothing to fetch");
        return Ok(());
    }

    debug!(fields = pending.len(), "fetching remote fields");
    let fetches: Vec<_> = pending.iter().map(|(_, getter)| getter()).collect();
    let values = try_join_all(fetches)
        .await
        .map_err(CacheError::RemoteRead)?;

    let mut guard = inner.lock();
    for ((idx, _), value) in pending.into_iter().zip(values) {
        guard.registry.slots_mut()[idx].remote = Some(value);
    }
    guard.registry.reconcile();
    debug!("sync complete");
    Ok(())
}
