//! Error taxonomy for the engine: registration conflicts, the main loop, and
//! per-service lifecycle/tick/tock failures (spec §7's `engine`/`service`
//! kinds).

use happy_core::Error as CoreError;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// A service was registered (or the engine started) after the engine
    /// left the `new`/`registered` states.
    #[error("engine already {0}")]
    AlreadyRunning(&'static str),

    /// Two services resolved to the same address.
    #[error("service address {0} already registered")]
    DuplicateAddress(String),

    /// `Engine::service_register` received `None` where a `Service` was required.
    #[error("cannot register a nil service")]
    NilService,

    /// A service (or the engine's own app loop) declared `on_tock` without `on_tick`.
    #[error("{0} declares on_tock without on_tick")]
    TockWithoutTick(String),

    /// Dispatched `services.*` request, or a direct `ServiceLoader` request,
    /// named an address with no registered container.
    #[error("unknown service {0}")]
    UnknownService(String),

    /// `on_initialize` failed.
    #[error("service {service} failed to initialize: {reason}")]
    InitializeFailed { service: String, reason: String },

    /// `on_start` failed.
    #[error("service {service} failed to start: {reason}")]
    StartFailed { service: String, reason: String },

    /// `on_stop` failed.
    #[error("service {service} failed to stop: {reason}")]
    StopFailed { service: String, reason: String },

    /// `on_tick` or `on_tock` returned an error; the service (or main loop)
    /// is stopped.
    #[error("{service} tick/tock failed: {reason}")]
    TickFailed { service: String, reason: String },

    /// A listener returned an error (recorded in the service's ledger, does
    /// not stop the service — surfaced only for callers that want it).
    #[error("listener for {scope}.{key} on {service} failed: {reason}")]
    ListenerFailed {
        service: String,
        scope: String,
        key: String,
        reason: String,
    },

    #[error(transparent)]
    Core(#[from] CoreError),
}

pub type Result<T> = std::result::Result<T, EngineError>;
