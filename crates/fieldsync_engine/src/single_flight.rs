//! Single-flight execution of one shared asynchronous operation.

use futures::future::{BoxFuture, Shared};
use futures::FutureExt;
use parking_lot::Mutex;
use std::future::Future;
use std::sync::Arc;

type SharedRun<T> = Shared<BoxFuture<'static, T>>;

/// At most one run of an operation at a time; concurrent callers join the
/// in-flight run and observe its outcome.
///
/// The slot is cleared by the run itself on completion, success or failure,
/// so the next caller after completion starts a fresh attempt.
pub(crate) struct SingleFlight<T: Clone> {
    slot: Arc<Mutex<Option<SharedRun<T>>>>,
}

impl<T> SingleFlight<T>
where
    T: Clone + Send + Sync + 'static,
{
    pub(crate) fn new() -> Self {
        Self {
            slot: Arc::new(Mutex::new(None)),
        }
    }

    /// Joins the in-flight run if one exists, otherwise starts the future
    /// produced by `run`. The returned future is shared: every caller
    /// resolves to the same outcome.
    pub(crate) fn join_or_start<F, Fut>(&self, run: F) -> SharedRun<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T> + Send + 'static,
    {
        let mut slot = self.slot.lock();
        if let Some(in_flight) = slot.as_ref() {
            return in_flight.clone();
        }

        let cell = Arc::clone(&self.slot);
        let fut = run();
        let shared = async move {
            let outcome = fut.await;
            cell.lock().take();
            outcome
        }
        .boxed()
        .shared();

        *slot = Some(shared.clone());
        shared
    }

    /// Returns true while a run is in flight.
    #[cfg(test)]
    pub(crate) fn is_in_flight(&self) -> bool {
        self.slot.lock().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::channel::oneshot;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn concurrent_callers_share_one_run() {
        let flight: SingleFlight<usize> = SingleFlight::new();
        let started = Arc::new(AtomicUsize::new(0));
        let (release, gate) = oneshot::channel::<()>();
        let gate = gate.shared();

        let first = {
            let started = Arc::clone(&started);
            let gate = gate.clone();
            flight.join_or_start(move || async move {
                started.fetch_add(1, Ordering::SeqCst);
                let _ = gate.await;
                7
            })
        };
        // Second caller must join, not start a fresh run.
        let second = flight.join_or_start(|| async { unreachable!("joined run starts once") });
        assert!(flight.is_in_flight());

        release.send(()).unwrap();
        let (a, b) = futures::join!(first, second);
        assert_eq!((a, b), (7, 7));
        assert_eq!(started.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn slot_clears_after_completion() {
        let flight: SingleFlight<u8> = SingleFlight::new();

        let run = flight.join_or_start(|| async { 1 });
        assert_eq!(run.await, 1);
        assert!(!flight.is_in_flight());

        // A later call starts a fresh run with a fresh outcome.
        let run = flight.join_or_start(|| async { 2 });
        assert_eq!(run.await, 2);
    }

    #[tokio::test]
    async fn failure_outcome_is_shared_and_then_cleared() {
        let flight: SingleFlight<Result<(), String>> = SingleFlight::new();

        let first = flight.join_or_start(|| async { Err("boom".to_string()) });
        let second = flight.join_or_start(|| async { unreachable!() });

        let (a, b) = futures::join!(first, second);
        assert_eq!(a, Err("boom".to_string()));
        assert_eq!(b, Err("boom".to_string()));
        assert!(!flight.is_in_flight());
    }
}
