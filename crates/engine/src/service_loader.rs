//! On-demand, blocking "wait until these services are running" primitive
//! (spec §4.7).
//!
//! `Load()` is not restartable: the first call synthesizes a
//! `services.start.services` event and polls the session's directory; a
//! second call returns the same one-shot signal.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use happy_collab::Variable;
use happy_core::{Address, Event, Session};
use parking_lot::Mutex;
use tokio::sync::watch;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
const POLL_INTERVAL: Duration = Duration::from_millis(250);

pub struct ServiceLoader {
    session: Arc<Session>,
    targets: Vec<Address>,
    pre_errors: Vec<String>,
    started: Mutex<bool>,
    done_tx: watch::Sender<bool>,
    done_rx: watch::Receiver<bool>,
    errors: Mutex<Option<Vec<String>>>,
}

impl ServiceLoader {
    /// Resolve each `name` against `session`'s own address; names that fail
    /// to resolve are collected as pre-errors rather than panicking.
    pub fn new(session: Arc<Session>, names: &[&str]) -> Self {
        let mut targets = Vec::with_capacity(names.len());
        let mut pre_errors = Vec::new();
        for name in names {
            match session.address().resolve_service(name) {
                Ok(addr) => targets.push(addr),
                Err(e) => pre_errors.push(e.to_string()),
            }
        }
        let (done_tx, done_rx) = watch::channel(false);
        Self {
            session,
            targets,
            pre_errors,
            started: Mutex::new(false),
            done_tx,
            done_rx,
            errors: Mutex::new(None),
        }
    }

    /// Begin loading on first call; returns the same one-shot signal on
    /// every call. Closes once every requested service reports running, a
    /// requested service records an error, or the timeout elapses.
    pub async fn load(self: &Arc<Self>) {
        {
            let mut started = self.started.lock();
            if *started {
                drop(started);
                self.closed().await;
                return;
            }
            *started = true;
        }

        if !self.pre_errors.is_empty() {
            *self.errors.lock() = Some(self.pre_errors.clone());
            let _ = self.done_tx.send(true);
            return;
        }

        let timeout = self
            .session
            .get("app.service.loader.timeout")
            .as_duration()
            .unwrap_or(DEFAULT_TIMEOUT);

        let mut payload = HashMap::new();
        for (i, addr) in self.targets.iter().enumerate() {
            payload.insert(format!("service.{i}"), Variable::String(addr.to_string()));
        }
        self.session
            .dispatch(Event::new("services", "start.services", Some(payload), None))
            .await;

        let loader = Arc::clone(self);
        let result = tokio::time::timeout(timeout, async move { loader.poll_until_running().await }).await;

        match result {
            Ok(errors) => *self.errors.lock() = errors,
            Err(_) => {
                let remaining: Vec<String> = self
                    .targets
                    .iter()
                    .filter(|addr| {
                        !self
                            .session
                            .service_info(addr)
                            .map(|info| info.is_running())
                            .unwrap_or(false)
                    })
                    .map(|addr| format!("service {addr} did not load on time"))
                    .collect();
                *self.errors.lock() = if remaining.is_empty() { None } else { Some(remaining) };
            }
        }
        let _ = self.done_tx.send(true);
    }

    /// Poll every 250ms until every target reports running, or one records
    /// an error (surfaced immediately, ending the load).
    async fn poll_until_running(&self) -> Option<Vec<String>> {
        loop {
            let mut pending = false;
            let mut errors = Vec::new();
            for addr in &self.targets {
                match self.session.service_info(addr) {
                    Ok(info) => {
                        if info.is_running() {
                            continue;
                        }
                        if let Some((_, message)) = info.errors().last() {
                            errors.push(format!("service {addr} failed to load: {message}"));
                        } else {
                            pending = true;
                        }
                    }
                    Err(e) => errors.push(format!("service {addr}: {e}")),
                }
            }
            if !errors.is_empty() {
                return Some(errors);
            }
            if !pending {
                return None;
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }

    /// A one-shot signal closed once loading has finished (successfully,
    /// with an error, or on timeout).
    pub async fn closed(&self) {
        let mut rx = self.done_rx.clone();
        if *rx.borrow() {
            return;
        }
        let _ = rx.changed().await;
    }

    pub fn is_closed(&self) -> bool {
        *self.done_rx.borrow()
    }

    /// Only meaningful after the signal has closed; an empty `Vec` means
    /// every requested service loaded successfully.
    pub fn err(&self) -> Option<Vec<String>> {
        if !self.is_closed() {
            return Some(vec!["ServiceLoader::err called before Load completed".to_string()]);
        }
        self.errors.lock().clone()
    }
}

#[cfg(test)]
#[path = "service_loader_tests.rs"]
mod tests;
