//! Declarative bundle of lifecycle callbacks, tick/tock callbacks, event
//! listeners, and a cron schedule (spec §3 "Service (declarative)").
//!
//! Every callback is optional; absent hooks are no-ops. A language with
//! closures models the spec's optional-function-field design directly, so
//! `Service` is a plain struct of `Option<Arc<dyn Fn…>>` fields built up
//! through a small fluent builder, the way the teacher's own value types
//! (e.g. `Job`, `Runbook`) are assembled.

use chrono::{DateTime, Utc};
use happy_core::{Event, Session};
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use crate::cron::Cron;
use crate::error::EngineError;

pub type AsyncResult = Pin<Box<dyn Future<Output = Result<(), String>> + Send>>;

pub type OnLifecycle = Arc<dyn Fn(Arc<Session>) -> AsyncResult + Send + Sync>;
pub type OnTick = Arc<dyn Fn(Arc<Session>, DateTime<Utc>, Duration) -> AsyncResult + Send + Sync>;
pub type OnTock = Arc<dyn Fn(Arc<Session>, Duration, f64) -> AsyncResult + Send + Sync>;
pub type Listener = Arc<dyn Fn(Arc<Session>, Event) -> AsyncResult + Send + Sync>;
pub type CronSetup = Arc<dyn Fn(&Cron) -> Result<(), EngineError> + Send + Sync>;

/// Wrap a synchronous closure as an [`AsyncResult`]-returning callback,
/// since most example services have no need for `.await` of their own.
pub fn sync<F>(f: F) -> AsyncResult
where
    F: Future<Output = Result<(), String>> + Send + 'static,
{
    Box::pin(f)
}

#[derive(Default, Clone)]
pub struct ListenerTable {
    exact: HashMap<(String, String), Vec<Listener>>,
    any: Vec<Listener>,
}

impl ListenerTable {
    pub fn on(&mut self, scope: impl Into<String>, key: impl Into<String>, listener: Listener) {
        self.exact
            .entry((scope.into(), key.into()))
            .or_default()
            .push(listener);
    }

    pub fn on_any(&mut self, listener: Listener) {
        self.any.push(listener);
    }

    pub fn keys(&self) -> impl Iterator<Item = &(String, String)> {
        self.exact.keys()
    }

    /// Listeners for `(scope, key)` followed by "any" listeners, in
    /// registration order within each group.
    pub fn matching(&self, scope: &str, key: &str) -> Vec<Listener> {
        let mut out = self
            .exact
            .get(&(scope.to_string(), key.to_string()))
            .cloned()
            .unwrap_or_default();
        out.extend(self.any.iter().cloned());
        out
    }
}

/// A long-running worker: optional lifecycle, tick/tock, listener, and cron
/// callbacks, identified by a slug unique within the engine.
#[derive(Clone)]
pub struct Service {
    slug: String,
    on_initialize: Option<OnLifecycle>,
    on_start: Option<OnLifecycle>,
    on_stop: Option<OnLifecycle>,
    on_tick: Option<OnTick>,
    on_tock: Option<OnTock>,
    listeners: ListenerTable,
    cron_setup: Option<CronSetup>,
}

impl Service {
    pub fn new(slug: impl Into<String>) -> Self {
        Self {
            slug: slug.into(),
            on_initialize: None,
            on_start: None,
            on_stop: None,
            on_tick: None,
            on_tock: None,
            listeners: ListenerTable::default(),
            cron_setup: None,
        }
    }

    pub fn slug(&self) -> &str {
        &self.slug
    }

    pub fn on_initialize(mut self, f: OnLifecycle) -> Self {
        self.on_initialize = Some(f);
        self
    }

    pub fn on_start(mut self, f: OnLifecycle) -> Self {
        self.on_start = Some(f);
        self
    }

    pub fn on_stop(mut self, f: OnLifecycle) -> Self {
        self.on_stop = Some(f);
        self
    }

    pub fn on_tick(mut self, f: OnTick) -> Self {
        self.on_tick = Some(f);
        self
    }

    pub fn on_tock(mut self, f: OnTock) -> Self {
        self.on_tock = Some(f);
        self
    }

    pub fn on_event(mut self, scope: impl Into<String>, key: impl Into<String>, f: Listener) -> Self {
        self.listeners.on(scope, key, f);
        self
    }

    pub fn on_any_event(mut self, f: Listener) -> Self {
        self.listeners.on_any(f);
        self
    }

    pub fn cron(mut self, setup: CronSetup) -> Self {
        self.cron_setup = Some(setup);
        self
    }

    /// A registration error if `on_tock` is declared without `on_tick`
    /// (spec §9: "this specification forbids it").
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.on_tock.is_some() && self.on_tick.is_none() {
            return Err(EngineError::TockWithoutTick(self.slug.clone()));
        }
        Ok(())
    }

    pub(crate) fn initializer(&self) -> Option<&OnLifecycle> {
        self.on_initialize.as_ref()
    }

    pub(crate) fn starter(&self) -> Option<&OnLifecycle> {
        self.on_start.as_ref()
    }

    pub(crate) fn stopper(&self) -> Option<&OnLifecycle> {
        self.on_stop.as_ref()
    }

    pub(crate) fn ticker(&self) -> Option<&OnTick> {
        self.on_tick.as_ref()
    }

    pub(crate) fn tocker(&self) -> Option<&OnTock> {
        self.on_tock.as_ref()
    }

    pub(crate) fn listeners(&self) -> &ListenerTable {
        &self.listeners
    }

    pub(crate) fn cron_setup(&self) -> Option<&CronSetup> {
        self.cron_setup.as_ref()
    }
}

#[cfg(test)]
#[path = "service_tests.rs"]
mod tests;
