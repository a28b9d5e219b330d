//! A mock remote setter.

use crate::fault::fault;
use fieldsync_core::{shared_setter, OperationHandle, RemoteSetter};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

struct SetterInner<O> {
    calls: Mutex<Vec<O>>,
    fail_invocation: AtomicBool,
    fail_acknowledgement: AtomicBool,
}

/// A mock remote setter that counts invocations and captures the options
/// payload of every call.
///
/// [`remote_setter`](MockSetter::remote_setter) always returns clones of
/// one underlying [`RemoteSetter`], so binding it to several fields gives
/// them a shared setter identity — the engine will invoke it once per
/// flush for all of them.
pub struct MockSetter<O> {
    inner: Arc<SetterInner<O>>,
    setter: RemoteSetter<O>,
}

impl<O> MockSetter<O>
where
    O: Send + 'static,
{
    /// Creates a mock setter that acknowledges immediately.
    #[must_use]
    pub fn new() -> Self {
        let inner = Arc::new(SetterInner {
            calls: Mutex::new(Vec::new()),
            fail_invocation: AtomicBool::new(false),
            fail_acknowledgement: AtomicBool::new(false),
        });

        let shared = Arc::clone(&inner);
        let setter = shared_setter(move |options: O| {
            let inner = Arc::clone(&shared);
            async move {
                inner.calls.lock().unwrap().push(options);
                if inner.fail_invocation.load(Ordering::SeqCst) {
                    return Err(fault("setter invocation rejected"));
                }
                if inner.fail_acknowledgement.load(Ordering::SeqCst) {
                    Ok(OperationHandle::new(async {
                        Err(fault("commit rejected by remote store"))
                    }))
                } else {
                    Ok(OperationHandle::resolved())
                }
            }
        });

        Self { inner, setter }
    }

    /// The shared setter to bind to one or more fields.
    #[must_use]
    pub fn remote_setter(&self) -> RemoteSetter<O> {
        Arc::clone(&self.setter)
    }

    /// Makes every subsequent invocation fail before producing a handle.
    pub fn fail_invocation(&self, fail: bool) {
        self.inner.fail_invocation.store(fail, Ordering::SeqCst);
    }

    /// Makes the handles of subsequent invocations reject on settle.
    pub fn fail_acknowledgement(&self, fail: bool) {
        self.inner.fail_acknowledgement.store(fail, Ordering::SeqCst);
    }

    /// Number of times the setter was invoked.
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.inner.calls.lock().unwrap().len()
    }
}

impl<O> MockSetter<O>
where
    O: Clone + Send + 'static,
{
    /// The options payload captured by each invocation, in call order.
    #[must_use]
    pub fn captured_options(&self) -> Vec<O> {
        self.inner.calls.lock().unwrap().clone()
    }
}

impl<O> Default for MockSetter<O>
where
    O: Send + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<O> Clone for MockSetter<O> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            setter: Arc::clone(&self.setter),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn invocations_are_counted_and_options_captured() {
        let setter = MockSetter::new();
        let remote = setter.remote_setter();

        let handle = remote("first".to_string()).await.unwrap();
        handle.settle().await.unwrap();
        remote("second".to_string()).await.unwrap();

        assert_eq!(setter.call_count(), 2);
        assert_eq!(setter.captured_options(), vec!["first", "second"]);
    }

    #[test]
    fn remote_setter_keeps_one_identity() {
        let setter: MockSetter<()> = MockSetter::new();
        let a = setter.remote_setter();
        let b = setter.remote_setter();
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[tokio::test]
    async fn invocation_fault_rejects_before_handle() {
        let setter: MockSetter<()> = MockSetter::new();
        setter.fail_invocation(true);

        let err = (setter.remote_setter())(()).await.unwrap_err();
        assert!(err.to_string().contains("invocation rejected"));
        assert_eq!(setter.call_count(), 1);
    }

    #[tokio::test]
    async fn acknowledgement_fault_rejects_on_settle() {
        let setter: MockSetter<()> = MockSetter::new();
        setter.fail_acknowledgement(true);

        let handle = (setter.remote_setter())(()).await.unwrap();
        let err = handle.settle().await.unwrap_err();
        assert!(err.to_string().contains("commit rejected"));
    }
}
