//! Interrupt/Kill signal trap consulted by [`crate::session::Session`].
//!
//! Installed once, on the session's first `start()`. Receiving either signal
//! injects an external cancellation cause into `Session::destroy`.

use tokio::signal::unix::{signal, SignalKind};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

/// What fired the trap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrapCause {
    Interrupt,
    Kill,
}

impl TrapCause {
    pub fn message(self) -> &'static str {
        match self {
            TrapCause::Interrupt => "interrupted",
            TrapCause::Kill => "killed",
        }
    }
}

/// Owns the background task listening for SIGINT/SIGTERM. Dropping or
/// calling [`SignalTrap::release`] stops listening; neither signal fires
/// twice because the listener task exits after its first delivery.
pub struct SignalTrap {
    handle: Option<JoinHandle<()>>,
}

impl SignalTrap {
    /// Install handlers for SIGINT and SIGTERM. The returned receiver fires
    /// exactly once, with whichever signal arrived first.
    pub fn install() -> (Self, oneshot::Receiver<TrapCause>) {
        let (tx, rx) = oneshot::channel();
        let handle = tokio::spawn(async move {
            let mut int = match signal(SignalKind::interrupt()) {
                Ok(s) => s,
                Err(_) => return,
            };
            let mut term = match signal(SignalKind::terminate()) {
                Ok(s) => s,
                Err(_) => return,
            };
            tokio::select! {
                _ = int.recv() => {
                    let _ = tx.send(TrapCause::Interrupt);
                }
                _ = term.recv() => {
                    let _ = tx.send(TrapCause::Kill);
                }
            }
        });
        (
            Self {
                handle: Some(handle),
            },
            rx,
        )
    }

    /// Stop listening for signals. Idempotent.
    pub fn release(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

impl Drop for SignalTrap {
    fn drop(&mut self) {
        self.release();
    }
}
