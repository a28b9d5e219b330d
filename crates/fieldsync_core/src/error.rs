//! Error types for cache operations.

use std::sync::Arc;
use thiserror::Error;

/// Result type for cache operations.
pub type CacheResult<T> = Result<T, CacheError>;

/// An opaque failure reported by a collaborator's remote getter or setter.
///
/// Collaborator errors are kept behind an `Arc` so that a single failure can
/// be observed by every caller joined onto the same in-flight operation.
pub type RemoteError = Arc<dyn std::error::Error + Send + Sync + 'static>;

/// Errors that can occur during cache operations.
///
/// The enum is `Clone` (remote causes live behind [`RemoteError`]) so that
/// the outcome of a single-flight sync can be handed to every waiter.
#[derive(Error, Debug, Clone)]
pub enum CacheError {
    /// Operation attempted after the backing record was destroyed.
    #[error("backing record is obsolete; no further remote access is possible")]
    Obsolete,

    /// Remote fetch attempted before the backing record exists.
    #[error("backing record has not been deployed; nothing to fetch against")]
    Undeployed,

    /// Field name not registered at bind time.
    #[error("unknown field '{0}'")]
    UnknownField(String),

    /// `bind` called on a cache that already holds field bindings.
    #[error("field bindings are already installed")]
    AlreadyBound,

    /// The same field name appeared more than once in one `bind` call.
    #[error("field '{0}' declared more than once")]
    DuplicateField(String),

    /// A remote getter failed during a sync; no reconciliation was applied.
    #[error("remote read failed during sync")]
    RemoteRead(#[source] RemoteError),

    /// One or more remote setters rejected during a flush; the fields they
    /// own remain dirty.
    #[error("remote write failed: {} setter call(s) rejected", .0.len())]
    RemoteWrite(Vec<RemoteError>),
}

impl CacheError {
    /// Wraps a getter failure as a sync error.
    pub fn remote_read(cause: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::RemoteRead(Arc::new(cause))
    }

    /// Wraps setter failures as a flush error.
    pub fn remote_write(causes: Vec<RemoteError>) -> Self {
        Self::RemoteWrite(causes)
    }

    /// Returns true if the failure came from the remote store and the caller
    /// may retry the operation. The cache itself never retries.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, CacheError::RemoteRead(_) | CacheError::RemoteWrite(_))
    }

    /// Returns true if the cache will never accept another operation.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, CacheError::Obsolete)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Error)]
    #[error("remote store unavailable")]
    struct StoreDown;

    #[test]
    fn retryable_errors() {
        assert!(CacheError::remote_read(StoreDown).is_retryable());
        assert!(CacheError::remote_write(vec![Arc::new(StoreDown)]).is_retryable());
        assert!(!CacheError::Obsolete.is_retryable());
        assert!(!CacheError::Undeployed.is_retryable());
        assert!(!CacheError::UnknownField("balance".into()).is_retryable());
    }

    #[test]
    fn terminal_errors() {
        assert!(CacheError::Obsolete.is_terminal());
        assert!(!CacheError::Undeployed.is_terminal());
    }

    #[test]
    fn error_display() {
        let err = CacheError::UnknownField("owner".into());
        assert_eq!(err.to_string(), "unknown field 'owner'");

        let err = CacheError::remote_write(vec![Arc::new(StoreDown), Arc::new(StoreDown)]);
        assert!(err.to_string().contains("2 setter call(s)"));
    }

    #[test]
    fn remote_read_preserves_cause() {
        let err = CacheError::remote_read(StoreDown);
        let source = std::error::Error::source(&err).expect("cause attached");
        assert_eq!(source.to_string(), "remote store unavailable");
    }

    #[test]
    fn errors_are_cloneable() {
        let err = CacheError::remote_read(StoreDown);
        let other = err.clone();
        assert_eq!(err.to_string(), other.to_string());
    }
}
