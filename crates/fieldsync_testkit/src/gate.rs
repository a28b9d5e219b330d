//! A reusable latch for holding mock remote operations in flight.

use futures::channel::oneshot;
use futures::future::Shared;
use futures::FutureExt;

/// The waiting side of a gate. Cloneable; every clone waits for the same
/// [`GateControl::open`] call.
///
/// Tests hand a gate to mock getters/setters to keep an operation
/// deterministically in flight while concurrent callers pile up.
#[derive(Clone)]
pub struct Gate {
    opened: Shared<oneshot::Receiver<()>>,
}

impl Gate {
    /// Creates a closed gate and its control handle.
    #[must_use]
    pub fn new() -> (GateControl, Gate) {
        let (sender, receiver) = oneshot::channel();
        (
            GateControl {
                sender: Some(sender),
            },
            Gate {
                opened: receiver.shared(),
            },
        )
    }

    /// Suspends until the gate is opened. Dropping the control also opens
    /// the gate, so a forgotten control cannot hang a test forever.
    pub async fn wait(&self) {
        let _ = self.opened.clone().await;
    }
}

/// Opens a [`Gate`].
pub struct GateControl {
    sender: Option<oneshot::Sender<()>>,
}

impl GateControl {
    /// Releases every waiter, current and future. Idempotent.
    pub fn open(&mut self) {
        if let Some(sender) = self.sender.take() {
            let _ = sender.send(());
        }
    }
}

impl Drop for GateControl {
    fn drop(&mut self) {
        self.open();
    }
}
