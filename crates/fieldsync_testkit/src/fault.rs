//! Injectable failures for mock remote operations.

use fieldsync_core::RemoteError;
use std::sync::Arc;
use thiserror::Error;

/// A deliberately injected remote failure.
#[derive(Debug, Error)]
#[error("injected fault: {0}")]
pub struct InjectedFault(pub String);

/// Wraps a message into a [`RemoteError`] carrying an [`InjectedFault`].
pub fn fault(message: impl Into<String>) -> RemoteError {
    Arc::new(InjectedFault(message.into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fault_preserves_message() {
        let err = fault("read of 'owner' failed");
        assert_eq!(err.to_string(), "injected fault: read of 'owner' failed");
    }
}
