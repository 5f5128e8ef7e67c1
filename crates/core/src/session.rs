//! Per-run context threading cancellation, options, and directories through
//! the engine, addons, and commands.
//!
//! The session is the closest thing this crate has to a Go-style
//! `context.Context`: descendant work (the engine, its dispatcher, every
//! service container) is handed a `CancellationToken` derived from the
//! session's own, so cancelling the session cascades outward without any
//! component polling a shared flag.

use std::any::Any;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;

use crate::address::Address;
use crate::error::Error;
use crate::event::Event;
use crate::option_store::OptionStore;
use crate::service_info::ServiceInfo;
use crate::signal_trap::SignalTrap;
use happy_collab::{Level, Logger, Variable};

/// Recommended event channel capacity: buffered, enough to absorb a burst
/// of dispatches without a dispatcher-lag backpressure cliff.
pub const EVENT_CHANNEL_CAPACITY: usize = 100;

/// Type-erased addon API handle, downcast by callers via [`Session::api`].
pub type ApiHandle = Arc<dyn Any + Send + Sync>;

struct Disposal {
    /// `None` once the session has been destroyed; the enqueue in
    /// [`Session::dispatch`] checks and clones this under the same lock it
    /// is cleared under, so a dispatch either observes a live sender or
    /// observes disposal — never a send racing a close.
    sender: Option<mpsc::Sender<Event>>,
}

/// Per-run context: logger, options, readiness/done signals, the signal
/// trap, the service directory, the addon API directory, and the buffered
/// event channel. Created before commands are parsed, started just before
/// command execution, destroyed exactly once on shutdown.
pub struct Session {
    logger: Arc<dyn Logger>,
    options: OptionStore,
    self_address: Address,
    cancel: CancellationToken,

    ready_tx: watch::Sender<bool>,
    ready_rx: watch::Receiver<bool>,
    done_tx: watch::Sender<bool>,
    done_rx: watch::Receiver<bool>,

    disposed: AtomicBool,
    terminal_error: Mutex<Option<Error>>,
    disposal: Mutex<Disposal>,
    event_rx: Mutex<Option<mpsc::Receiver<Event>>>,

    services: RwLock<HashMap<Address, Arc<ServiceInfo>>>,
    apis: RwLock<HashMap<String, ApiHandle>>,

    signal_trap: Mutex<Option<SignalTrap>>,
    started: AtomicBool,
}

impl Session {
    /// Construct a session with `self_address` as the process's own
    /// identity (see [`Address::current`]).
    pub fn new(logger: Arc<dyn Logger>, options: OptionStore, self_address: Address) -> Arc<Self> {
        let (ready_tx, ready_rx) = watch::channel(false);
        let (done_tx, done_rx) = watch::channel(false);
        let (tx, rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);

        Arc::new(Self {
            logger,
            options,
            self_address,
            cancel: CancellationToken::new(),
            ready_tx,
            ready_rx,
            done_tx,
            done_rx,
            disposed: AtomicBool::new(false),
            terminal_error: Mutex::new(None),
            disposal: Mutex::new(Disposal { sender: Some(tx) }),
            event_rx: Mutex::new(Some(rx)),
            services: RwLock::new(HashMap::new()),
            apis: RwLock::new(HashMap::new()),
            signal_trap: Mutex::new(None),
            started: AtomicBool::new(false),
        })
    }

    pub fn logger(&self) -> &Arc<dyn Logger> {
        &self.logger
    }

    pub fn options(&self) -> &OptionStore {
        &self.options
    }

    pub fn address(&self) -> &Address {
        &self.self_address
    }

    /// Cancellation token for descendant work (engine, dispatcher,
    /// per-service containers all derive a child token from this one).
    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Take the receiving half of the event channel. Only the dispatcher
    /// should call this, and only once; subsequent calls return `None`.
    pub fn take_event_receiver(&self) -> Option<mpsc::Receiver<Event>> {
        self.event_rx.lock().take()
    }

    /// Install the interrupt/kill signal trap and begin listening. Called
    /// once, just before command execution; a second call is a no-op.
    pub fn start(self: &Arc<Self>) {
        if self.started.swap(true, Ordering::SeqCst) {
            return;
        }
        let (trap, rx) = SignalTrap::install();
        *self.signal_trap.lock() = Some(trap);

        let session = Arc::clone(self);
        tokio::spawn(async move {
            if let Ok(cause) = rx.await {
                session
                    .logger
                    .notice("signal trap fired", &[("cause", cause.message())]);
                session.destroy(Some(Error::Application(cause.message().to_string())));
            }
        });
    }

    /// One-shot signal closed when the engine has started the main loop AND
    /// initialized all services.
    pub async fn ready(&self) {
        let mut rx = self.ready_rx.clone();
        if *rx.borrow() {
            return;
        }
        let _ = rx.changed().await;
    }

    pub fn is_ready(&self) -> bool {
        *self.ready_rx.borrow()
    }

    /// Engine-internal: mark the session ready. Idempotent.
    pub fn set_ready(&self) {
        let _ = self.ready_tx.send(true);
    }

    /// One-shot signal closed exactly once at destruction.
    pub async fn done(&self) {
        let mut rx = self.done_rx.clone();
        if *rx.borrow() {
            return;
        }
        let _ = rx.changed().await;
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::SeqCst)
    }

    /// Idempotent: the first call sets the terminal error (defaulting to
    /// `session destroyed` if `None`), cascades cancellation, closes
    /// `Done`, releases the signal trap, and stops accepting new
    /// dispatches. Subsequent calls return immediately.
    pub fn destroy(&self, err: Option<Error>) {
        if self.disposed.swap(true, Ordering::SeqCst) {
            return;
        }
        *self.terminal_error.lock() = Some(err.unwrap_or(Error::SessionDestroyed));
        self.disposal.lock().sender = None;
        self.cancel.cancel();
        if let Some(mut trap) = self.signal_trap.lock().take() {
            trap.release();
        }
        let _ = self.done_tx.send(true);
    }

    /// The terminal error, or `None` if not destroyed.
    pub fn err(&self) -> Option<Error> {
        self.terminal_error.lock().clone()
    }

    /// Enqueue `ev` into the event channel. A no-op, logged at debug, once
    /// the session is disposed. Bounded: if the channel is full, this
    /// awaits the dispatcher draining it rather than dropping the event.
    pub async fn dispatch(&self, ev: Event) {
        let sender = {
            let guard = self.disposal.lock();
            match &guard.sender {
                Some(tx) => tx.clone(),
                None => {
                    self.logger.debug(
                        "dispatch on disposed session, dropping event",
                        &[("event", &ev.event_key())],
                    );
                    return;
                }
            }
        };
        if sender.send(ev).await.is_err() {
            self.logger
                .debug("event channel closed during dispatch", &[]);
        }
    }

    pub fn get(&self, key: &str) -> Variable {
        self.options.get(key)
    }

    pub fn set(&self, key: &str, value: Variable) -> Result<(), Error> {
        self.options.set(key, value)
    }

    pub fn has(&self, key: &str) -> bool {
        self.options.has(key)
    }

    /// Directory lookup; fails with [`Error::ServiceUnknown`] for an
    /// address never registered.
    pub fn service_info(&self, addr: &Address) -> Result<Arc<ServiceInfo>, Error> {
        self.services
            .read()
            .get(addr)
            .cloned()
            .ok_or_else(|| Error::ServiceUnknown(addr.to_string()))
    }

    pub fn service_infos(&self) -> Vec<Arc<ServiceInfo>> {
        self.services.read().values().cloned().collect()
    }

    /// Engine-internal: publish a service's directory entry.
    pub fn set_service_info(&self, info: Arc<ServiceInfo>) {
        self.services.write().insert(info.address().clone(), info);
    }

    /// Engine/addon-internal: publish an addon's API handle under its name.
    pub fn register_api(&self, name: impl Into<String>, api: ApiHandle) {
        self.apis.write().insert(name.into(), api);
    }

    /// Look up an addon's API handle by name, downcast to `T`.
    pub fn api<T: Any + Send + Sync>(&self, name: &str) -> Option<Arc<T>> {
        self.apis
            .read()
            .get(name)
            .cloned()
            .and_then(|handle| handle.downcast::<T>().ok())
    }

    pub fn log(&self, level: Level, message: &str) {
        self.logger.log(level, message, &[]);
    }
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
