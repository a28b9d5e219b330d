//! Write-deduplicating flush: commit all dirty fields in as few remote
//! operations as possible.

use crate::cache::FieldCache;
use fieldsync_core::{
    CacheError, CacheResult, FieldState, OperationHandle, RemoteError, RemoteSetter,
};
use futures::future::join_all;
use std::sync::Arc;
use tracing::{debug, trace, warn};

/// One distinct setter and the dirty fields it commits, with each field's
/// local value snapshotted at flush time.
struct SetterGroup<V, O> {
    setter: RemoteSetter<O>,
    fields: Vec<(usize, Option<V>)>,
}

/// The result of one [flush](FieldCache::flush): the handles of the remote
/// operations that were issued, plus the causes of any setter calls that
/// were rejected outright.
///
/// Setter calls fail independently, so a flush can be partial: the handles
/// of the setters that succeeded are always returned and can be settled,
/// even when other setters were rejected. Fields owned by rejected setters
/// stay dirty and are picked up by a later flush; the acknowledged commits
/// are not re-issued.
#[derive(Debug)]
pub struct FlushOutcome {
    handles: Vec<OperationHandle>,
    failures: Vec<RemoteError>,
}

impl FlushOutcome {
    /// Returns true if every invoked setter produced a handle.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    /// Causes of the setter calls that were rejected, in canonical field
    /// order. Empty for a complete flush.
    #[must_use]
    pub fn failures(&self) -> &[RemoteError] {
        &self.failures
    }

    /// The aggregate write error, if any setter call was rejected.
    #[must_use]
    pub fn error(&self) -> Option<CacheError> {
        if self.failures.is_empty() {
            None
        } else {
            Some(CacheError::RemoteWrite(self.failures.clone()))
        }
    }

    /// Consumes the outcome, keeping only the handles of the issued remote
    /// operations, in canonical field order. Rejected calls have no handle.
    #[must_use]
    pub fn into_handles(self) -> Vec<OperationHandle> {
        self.handles
    }

    /// Splits the outcome into issued handles and rejection causes.
    #[must_use]
    pub fn into_parts(self) -> (Vec<OperationHandle>, Vec<RemoteError>) {
        (self.handles, self.failures)
    }
}

impl<V, O> FieldCache<V, O>
where
    V: Clone + PartialEq + Send + 'static,
    O: Clone + Send + 'static,
{
    /// Commits every dirty field to the remote store.
    ///
    /// A sync is performed first, so a flush never builds remote writes
    /// against an unsynced dataset. Dirty fields are then grouped by the
    /// identity of their registered setter (`Arc::ptr_eq`): a setter shared
    /// by several fields is invoked exactly once and commits them
    /// atomically. Each distinct setter is invoked concurrently with its
    /// own independent clone of `options`.
    ///
    /// The returned [`FlushOutcome`] carries one [`OperationHandle`] per
    /// issued remote operation, each augmented with a commit hook that
    /// transitions the setter's fields from dirty to synced once the
    /// operation is acknowledged. Fields stay dirty until a handle is
    /// [settled](OperationHandle::settle) — `flush` returning does not
    /// itself imply consistency.
    ///
    /// Setter invocations that fail before producing a handle are reported
    /// through [`FlushOutcome::failures`]; the other setter calls are driven
    /// to completion regardless, their handles are still returned, and their
    /// remote operations stand on their own (no partial rollback). Fields
    /// owned by a rejected setter stay dirty for a later flush.
    ///
    /// Fails with [`CacheError::Obsolete`], [`CacheError::Undeployed`], or
    /// [`CacheError::RemoteRead`] before any setter is invoked.
    pub async fn flush(&self, options: O) -> CacheResult<FlushOutcome> {
        {
            let inner = self.inner.lock();
            if inner.obsolete {
                return Err(CacheError::Obsolete);
            }
        }

        // Never flush against stale assumptions about which fields are
        // already consistent remotely.
        self.sync().await?;

        let groups: Vec<SetterGroup<V, O>> = {
            let inner = self.inner.lock();
            let mut groups: Vec<SetterGroup<V, O>> = Vec::new();
            for (idx, slot) in inner.registry.slots().iter().enumerate() {
                if !slot.state.needs_flush() {
                    continue;
                }
                let Some(setter) = slot.binding.remote_setter() else {
                    // Purely local field; nothing to commit.
                    continue;
                };
                let snapshot = (idx, slot.local.clone());
                match groups
                    .iter_mut()
                    .find(|group| Arc::ptr_eq(&group.setter, &setter))
                {
                    Some(group) => group.fields.push(snapshot),
                    None => groups.push(SetterGroup {
                        setter,
                        fields: vec![snapshot],
                    }),
                }
            }
            groups
        };

        if groups.is_empty() {
            trace!("flush: no dirty fields to commit");
            return Ok(FlushOutcome {
                handles: Vec::new(),
                failures: Vec::new(),
            });
        }
        debug!(setters = groups.len(), "flushing dirty fields");

        let calls: Vec<_> = groups
            .iter()
            .map(|group| (group.setter)(options.clone()))
            .collect();
        let outcomes = join_all(calls).await;

        let mut handles = Vec::with_capacity(outcomes.len());
        let mut failures: Vec<RemoteError> = Vec::new();
        for (group, outcome) in groups.into_iter().zip(outcomes) {
            match outcome {
                Ok(mut handle) => {
                    let inner = Arc::clone(&self.inner);
                    let flushed = group.fields;
                    handle.chain_commit_hook(Box::new(move || {
                        let mut guard = inner.lock();
                        for (idx, value) in &flushed {
                            let slot = &mut guard.registry.slots_mut()[*idx];
                            // A newer local write wins over this
                            // acknowledgement: the field stays dirty.
                            if slot.state.is_dirty() && slot.local == *value {
                                slot.state = FieldState::Synced;
                                slot.remote = value.clone();
                            }
                        }
                    }));
                    handles.push(handle);
                }
                Err(cause) => failures.push(cause),
            }
        }

        if !failures.is_empty() {
            warn!(rejected = failures.len(), "flush was partial");
        }
        Ok(FlushOutcome { handles, failures })
    }
}
