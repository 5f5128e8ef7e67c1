//! Logger collaborator.
//!
//! The engine never talks to a logging backend directly; it talks to this
//! trait. The production implementation is a thin facade over `tracing`, the
//! same crate the rest of the workspace already uses for structured logging.

use parking_lot::RwLock;
use std::sync::Arc;

/// Log levels, ordered from most to least verbose.
///
/// `tracing::Level` only has five variants; the richer vocabulary this
/// framework exposes to user code is modeled as distinct `Level`s here and
/// mapped down onto `tracing`'s levels plus a `kind` field in `log`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Level {
    SystemDebug,
    Debug,
    Info,
    Task,
    Ok,
    Notice,
    Warn,
    NotImplemented,
    Deprecated,
    Issue,
    Error,
    Out,
}

impl Level {
    fn tracing_level(self) -> tracing::Level {
        match self {
            Level::SystemDebug | Level::Debug => tracing::Level::DEBUG,
            Level::Warn | Level::Deprecated | Level::NotImplemented => tracing::Level::WARN,
            Level::Error | Level::Issue => tracing::Level::ERROR,
            Level::Info | Level::Task | Level::Ok | Level::Notice | Level::Out => {
                tracing::Level::INFO
            }
        }
    }

    fn kind(self) -> &'static str {
        match self {
            Level::SystemDebug => "system_debug",
            Level::Debug => "debug",
            Level::Info => "info",
            Level::Task => "task",
            Level::Ok => "ok",
            Level::Notice => "notice",
            Level::Warn => "warn",
            Level::NotImplemented => "not_implemented",
            Level::Deprecated => "deprecated",
            Level::Issue => "issue",
            Level::Error => "error",
            Level::Out => "out",
        }
    }
}

/// A single structured attribute attached to a log record.
pub type Attr<'a> = (&'a str, &'a str);

/// Logger collaborator. Thread-safe: `SetLevel` may race with `log` from any
/// number of tasks, so implementations must guard their own minimum-level
/// state.
pub trait Logger: Send + Sync + 'static {
    /// Emit a record at `level` with a free-text message and structured attributes.
    fn log(&self, level: Level, message: &str, attrs: &[Attr<'_>]);

    /// Set the minimum level that will actually be emitted.
    fn set_level(&self, level: Level);

    /// Current minimum level.
    fn level(&self) -> Level;

    /// The underlying sink this logger writes through, so a sub-component
    /// (an addon's own sub-logger, a cron job's error reporter) can attach
    /// itself to the same destination instead of going through `Logger`
    /// itself. Cloneable and cheap, matching `tracing::Dispatch`'s own
    /// `Arc`-backed clone.
    fn handler(&self) -> tracing::Dispatch;

    fn system_debug(&self, message: &str, attrs: &[Attr<'_>]) {
        self.log(Level::SystemDebug, message, attrs)
    }
    fn debug(&self, message: &str, attrs: &[Attr<'_>]) {
        self.log(Level::Debug, message, attrs)
    }
    fn info(&self, message: &str, attrs: &[Attr<'_>]) {
        self.log(Level::Info, message, attrs)
    }
    fn task(&self, message: &str, attrs: &[Attr<'_>]) {
        self.log(Level::Task, message, attrs)
    }
    fn ok(&self, message: &str, attrs: &[Attr<'_>]) {
        self.log(Level::Ok, message, attrs)
    }
    fn notice(&self, message: &str, attrs: &[Attr<'_>]) {
        self.log(Level::Notice, message, attrs)
    }
    fn warn(&self, message: &str, attrs: &[Attr<'_>]) {
        self.log(Level::Warn, message, attrs)
    }
    fn not_implemented(&self, message: &str, attrs: &[Attr<'_>]) {
        self.log(Level::NotImplemented, message, attrs)
    }
    fn deprecated(&self, message: &str, attrs: &[Attr<'_>]) {
        self.log(Level::Deprecated, message, attrs)
    }
    fn issue(&self, message: &str, attrs: &[Attr<'_>]) {
        self.log(Level::Issue, message, attrs)
    }
    fn error(&self, message: &str, attrs: &[Attr<'_>]) {
        self.log(Level::Error, message, attrs)
    }
    fn out(&self, message: &str, attrs: &[Attr<'_>]) {
        self.log(Level::Out, message, attrs)
    }
}

/// Production logger: formats attributes and forwards to `tracing` macros at
/// the mapped level, gated by a runtime-adjustable minimum [`Level`].
#[derive(Clone)]
pub struct TracingLogger {
    min_level: Arc<RwLock<Level>>,
}

impl Default for TracingLogger {
    fn default() -> Self {
        Self::new(Level::Info)
    }
}

impl TracingLogger {
    pub fn new(min_level: Level) -> Self {
        Self {
            min_level: Arc::new(RwLock::new(min_level)),
        }
    }
}

impl Logger for TracingLogger {
    fn log(&self, level: Level, message: &str, attrs: &[Attr<'_>]) {
        if level < *self.min_level.read() {
            return;
        }
        let kind = level.kind();
        let fields: String = attrs
            .iter()
            .map(|(k, v)| format!(" {k}={v}"))
            .collect::<Vec<_>>()
            .join("");
        match level.tracing_level() {
            tracing::Level::DEBUG => tracing::debug!(kind, "{message}{fields}"),
            tracing::Level::WARN => tracing::warn!(kind, "{message}{fields}"),
            tracing::Level::ERROR => tracing::error!(kind, "{message}{fields}"),
            _ => tracing::info!(kind, "{message}{fields}"),
        }
    }

    fn set_level(&self, level: Level) {
        *self.min_level.write() = level;
    }

    fn level(&self) -> Level {
        *self.min_level.read()
    }

    /// `log()` forwards to `tracing`'s own macros rather than a `Dispatch`
    /// this struct owns, so the handle returned here is whatever dispatcher
    /// is currently installed as the default (the one `log()` is actually
    /// writing through).
    fn handler(&self) -> tracing::Dispatch {
        tracing::dispatcher::get_default(|d| d.clone())
    }
}

/// Discards everything. Used by tests that don't care about log output.
#[derive(Clone, Copy, Default)]
pub struct NoOpLogger;

impl Logger for NoOpLogger {
    fn log(&self, _level: Level, _message: &str, _attrs: &[Attr<'_>]) {}
    fn set_level(&self, _level: Level) {}
    fn level(&self) -> Level {
        Level::Out
    }

    fn handler(&self) -> tracing::Dispatch {
        tracing::Dispatch::none()
    }
}

#[cfg(test)]
#[path = "logger_tests.rs"]
mod tests;
