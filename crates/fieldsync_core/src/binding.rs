//! Field bindings: the per-field contract supplied by the collaborator.

use crate::error::RemoteError;
use crate::handle::OperationHandle;
use futures::future::BoxFuture;
use futures::FutureExt;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

/// Fetches the authoritative value of one field from the remote store.
pub type RemoteGetter<V> =
    Arc<dyn Fn() -> BoxFuture<'static, Result<V, RemoteError>> + Send + Sync>;

/// Commits one or more fields to the remote store in a single operation.
///
/// The setter receives the flush options payload (its own independent clone
/// per call) and returns an [`OperationHandle`] for the issued operation.
pub type RemoteSetter<O> =
    Arc<dyn Fn(O) -> BoxFuture<'static, Result<OperationHandle, RemoteError>> + Send + Sync>;

/// Wraps a getter closure into a shareable [`RemoteGetter`].
pub fn shared_getter<V, F, Fut>(f: F) -> RemoteGetter<V>
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<V, RemoteError>> + Send + 'static,
{
    Arc::new(move || f().boxed())
}

/// Wraps a setter closure into a shareable [`RemoteSetter`].
///
/// Flush deduplicates setters by identity (`Arc::ptr_eq`): fields that must
/// be committed atomically by one remote operation must be bound to clones
/// of the *same* `RemoteSetter`, which this helper constructs once.
pub fn shared_setter<O, F, Fut>(f: F) -> RemoteSetter<O>
where
    F: Fn(O) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<OperationHandle, RemoteError>> + Send + 'static,
{
    Arc::new(move |options| f(options).boxed())
}

/// Declares one field of the cache and its remote capabilities.
///
/// A field with no remote getter is never fetched; a field with no remote
/// setter is never flushed. A field with neither is purely local.
pub struct FieldBinding<V, O> {
    name: String,
    getter: Option<RemoteGetter<V>>,
    setter: Option<RemoteSetter<O>>,
}

impl<V, O> FieldBinding<V, O> {
    /// Creates a binding for a purely local field.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            getter: None,
            setter: None,
        }
    }

    /// Attaches a remote getter.
    #[must_use]
    pub fn with_getter<F, Fut>(self, f: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<V, RemoteError>> + Send + 'static,
    {
        self.with_shared_getter(shared_getter(f))
    }

    /// Attaches an already-shared remote getter.
    #[must_use]
    pub fn with_shared_getter(mut self, getter: RemoteGetter<V>) -> Self {
        self.getter = Some(getter);
        self
    }

    /// Attaches a remote setter owned by this field alone.
    #[must_use]
    pub fn with_setter<F, Fut>(self, f: F) -> Self
    where
        F: Fn(O) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<OperationHandle, RemoteError>> + Send + 'static,
    {
        self.with_shared_setter(shared_setter(f))
    }

    /// Attaches a remote setter that may be shared with other fields.
    ///
    /// Bind the same [`RemoteSetter`] (clones of one `Arc`) to every field
    /// the remote operation commits atomically; flush will invoke it once.
    #[must_use]
    pub fn with_shared_setter(mut self, setter: RemoteSetter<O>) -> Self {
        self.setter = Some(setter);
        self
    }

    /// Returns the field name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns true if the field can be fetched from the remote store.
    #[must_use]
    pub fn has_remote_getter(&self) -> bool {
        self.getter.is_some()
    }

    /// Returns true if the field can be committed to the remote store.
    #[must_use]
    pub fn has_remote_setter(&self) -> bool {
        self.setter.is_some()
    }

    /// Returns a clone of the remote getter, if any.
    #[must_use]
    pub fn remote_getter(&self) -> Option<RemoteGetter<V>> {
        self.getter.clone()
    }

    /// Returns a clone of the remote setter, if any.
    #[must_use]
    pub fn remote_setter(&self) -> Option<RemoteSetter<O>> {
        self.setter.clone()
    }
}

impl<V, O> Clone for FieldBinding<V, O> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            getter: self.getter.clone(),
            setter: self.setter.clone(),
        }
    }
}

impl<V, O> fmt::Debug for FieldBinding<V, O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldBinding")
            .field("name", &self.name)
            .field("has_remote_getter", &self.has_remote_getter())
            .field("has_remote_setter", &self.has_remote_setter())
            .finish()
    }
}
