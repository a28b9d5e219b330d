//! # Fieldsync Core
//!
//! Contract types shared between the fieldsync cache engine and its
//! collaborators.
//!
//! This crate provides:
//! - Per-field lifecycle states (unsynced / dirty / synced)
//! - Field bindings declaring remote getter/setter capabilities
//! - Operation handles with chainable commit hooks
//! - The error taxonomy for cache operations
//!
//! No I/O happens here; the remote calls themselves are supplied by the
//! collaborator as boxed futures and driven by `fieldsync_engine`.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod binding;
mod error;
mod handle;
mod state;

pub use binding::{shared_getter, shared_setter, FieldBinding, RemoteGetter, RemoteSetter};
pub use error::{CacheError, CacheResult, RemoteError};
pub use handle::{CommitHook, OperationHandle};
pub use state::FieldState;
