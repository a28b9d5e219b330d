//! Operation handles returned by remote setters.

use crate::error::RemoteError;
use futures::future::BoxFuture;
use futures::FutureExt;
use std::fmt;
use std::future::Future;

/// A hook fired exactly once after the remote store acknowledges a commit.
pub type CommitHook = Box<dyn FnOnce() + Send + 'static>;

/// An in-progress remote commitment returned by a remote setter.
///
/// The handle pairs the acknowledgement future of the remote operation with
/// an explicit, optional commit hook. The flush engine chains its own hook
/// onto whatever hook the collaborator installed; chained hooks run in
/// installation order (original first).
///
/// A handle does nothing until it is [settled](OperationHandle::settle):
/// `flush` returning handles does not itself imply the writes are committed.
pub struct OperationHandle {
    acknowledgement: BoxFuture<'static, Result<(), RemoteError>>,
    on_committed: Option<CommitHook>,
}

impl OperationHandle {
    /// Creates a handle from the remote operation's acknowledgement future.
    pub fn new<F>(acknowledgement: F) -> Self
    where
        F: Future<Output = Result<(), RemoteError>> + Send + 'static,
    {
        Self {
            acknowledgement: acknowledgement.boxed(),
            on_committed: None,
        }
    }

    /// Creates a handle whose remote operation is already acknowledged.
    #[must_use]
    pub fn resolved() -> Self {
        Self::new(futures::future::ready(Ok(())))
    }

    /// Returns the handle with a commit hook chained onto it.
    #[must_use]
    pub fn with_commit_hook<H>(mut self, hook: H) -> Self
    where
        H: FnOnce() + Send + 'static,
    {
        self.chain_commit_hook(Box::new(hook));
        self
    }

    /// Chains a commit hook onto the handle.
    ///
    /// If a hook is already installed it is preserved: the composed hook
    /// calls the original, then the new one.
    pub fn chain_commit_hook(&mut self, hook: CommitHook) {
        self.on_committed = Some(match self.on_committed.take() {
            Some(original) => Box::new(move || {
                original();
                hook();
            }),
            None => hook,
        });
    }

    /// Returns true if a commit hook is installed.
    #[must_use]
    pub fn has_commit_hook(&self) -> bool {
        self.on_committed.is_some()
    }

    /// Drives the remote operation to acknowledgement, then fires the commit
    /// hook chain.
    ///
    /// If the remote store rejects the operation, the hook chain is not
    /// fired and the rejection is returned.
    pub async fn settle(self) -> Result<(), RemoteError> {
        self.acknowledgement.await?;
        if let Some(hook) = self.on_committed {
            hook();
        }
        Ok(())
    }
}

impl fmt::Debug for OperationHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OperationHandle")
            .field("has_commit_hook", &self.has_commit_hook())
            .finish_non_exhaustive()
    }
}
