//! # Fieldsync Engine
//!
//! A remote-backed field synchronization cache.
//!
//! The cache lets application code treat a handful of named attributes whose
//! authoritative values live in a slow, pay-per-write remote store as
//! ordinary local properties. It provides:
//! - Per-field staleness and dirtiness tracking (unsynced / dirty / synced)
//! - Lazy read-through: the first read of any field fetches the whole
//!   dataset in one concurrent batch
//! - Single-flight fetches: concurrent readers share one in-flight sync
//! - Write batching: local writes are buffered and committed on flush,
//!   with setters deduplicated by identity so one remote operation can
//!   commit several fields atomically
//! - Lifecycle gating: no remote I/O before the backing record is deployed
//!   or after it is destroyed
//!
//! ## Key Invariants
//!
//! - A dirty field always reflects the most recent local write; a fetch
//!   never overwrites it
//! - A burst of N concurrent reads produces exactly one batch of remote
//!   getter calls
//! - A setter shared by several dirty fields is invoked exactly once per
//!   flush
//! - Fields stay dirty until the remote store acknowledges their commit;
//!   callers observe that through the returned operation handles
//! - Setter calls fail independently: a partial flush still hands back the
//!   handles of the setters that succeeded, so their commits are never lost
//!   or re-issued
//! - A failed sync leaves local state exactly as it was
//!
//! The remote calls themselves are supplied by the collaborator through
//! [`FieldBinding`]s; the engine never constructs remote operations itself.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod cache;
mod flush;
mod registry;
mod single_flight;
mod sync;

pub use cache::FieldCache;
pub use flush::FlushOutcome;

// Re-export the contract types so consumers only need one crate.
pub use fieldsync_core::{
    shared_getter, shared_setter, CacheError, CacheResult, CommitHook, FieldBinding, FieldState,
    OperationHandle, RemoteError, RemoteGetter, RemoteSetter,
};
