//! Error taxonomy for the core runtime.
//!
//! One flat enum rather than per-module error types: `Address`, `OptionStore`
//! and `Session` are tightly coupled (a `Session::get` proxies the option
//! store; an `Address` parse failure surfaces through session construction),
//! so this crate groups their error kinds into one enum rather than one per module.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    /// Misconfiguration at construction.
    #[error("application error: {0}")]
    Application(String),

    /// Malformed or out-of-scheme address.
    #[error("addressing error: {0}")]
    Addr(String),

    /// `OptionStore::set` on an entry already flagged read-only.
    #[error("option {key:?} is read-only")]
    OptionReadonly { key: String },

    /// `OptionStore::set` rejected by the entry's validator.
    #[error("option {key:?} failed validation: {reason}")]
    OptionValidation { key: String, reason: String },

    /// `OptionStore::set`/`get` against a schema-restricted, absent key.
    #[error("unknown option key {key:?}")]
    OptionUnknownKey { key: String },

    /// `Session::service_info` against an address never registered.
    #[error("unknown service {0}")]
    ServiceUnknown(String),

    /// Terminal marker recorded once a session has been destroyed.
    /// Not an anomaly when expected — callers distinguish this from other
    /// errors to avoid logging it as a failure.
    #[error("session destroyed")]
    SessionDestroyed,
}

impl Error {
    pub fn is_session_destroyed(&self) -> bool {
        matches!(self, Error::SessionDestroyed)
    }
}

pub type Result<T> = std::result::Result<T, Error>;
