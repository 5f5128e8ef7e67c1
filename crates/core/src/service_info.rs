//! Observable state of one registered service.
//!
//! Shared between the session's service directory and the engine's
//! container by reference, guarded by a single internal lock (see
//! `DESIGN.md`'s "cyclic graphs avoided" note) — never copied out, always
//! held behind `Arc<ServiceInfo>`. Mutated only by the engine.

use crate::address::Address;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::Serialize;
use std::collections::BTreeMap;

struct State {
    running: bool,
    start: Option<DateTime<Utc>>,
    stop: Option<DateTime<Utc>>,
    /// timestamp -> error message. Preserved across restarts.
    errors: BTreeMap<DateTime<Utc>, String>,
}

pub struct ServiceInfo {
    slug: String,
    address: Address,
    state: RwLock<State>,
}

impl ServiceInfo {
    pub fn new(slug: impl Into<String>, address: Address) -> Self {
        Self {
            slug: slug.into(),
            address,
            state: RwLock::new(State {
                running: false,
                start: None,
                stop: None,
                errors: BTreeMap::new(),
            }),
        }
    }

    pub fn slug(&self) -> &str {
        &self.slug
    }

    pub fn address(&self) -> &Address {
        &self.address
    }

    pub fn is_running(&self) -> bool {
        self.state.read().running
    }

    pub fn start_time(&self) -> Option<DateTime<Utc>> {
        self.state.read().start
    }

    pub fn stop_time(&self) -> Option<DateTime<Utc>> {
        self.state.read().stop
    }

    /// `running: false -> true`; the start timestamp is overwritten even on
    /// a restart.
    pub fn mark_started(&self) {
        let mut state = self.state.write();
        state.running = true;
        state.start = Some(Utc::now());
    }

    /// `running: true -> false`; the stop timestamp is overwritten, the
    /// error ledger is preserved.
    pub fn mark_stopped(&self) {
        let mut state = self.state.write();
        state.running = false;
        state.stop = Some(Utc::now());
    }

    /// Append `message` to the error ledger, keyed by the current time.
    pub fn record_error(&self, message: impl Into<String>) {
        let mut state = self.state.write();
        let now = Utc::now();
        state.errors.insert(now, message.into());
    }

    /// Snapshot of the error ledger, oldest first.
    pub fn errors(&self) -> Vec<(DateTime<Utc>, String)> {
        self.state
            .read()
            .errors
            .iter()
            .map(|(t, m)| (*t, m.clone()))
            .collect()
    }

    pub fn error_count(&self) -> usize {
        self.state.read().errors.len()
    }

    /// Point-in-time copy of this service's state, for a `status` command
    /// or any other read-only reporting surface.
    pub fn snapshot(&self) -> ServiceInfoSnapshot {
        let state = self.state.read();
        ServiceInfoSnapshot {
            slug: self.slug.clone(),
            address: self.address.to_string(),
            running: state.running,
            start: state.start,
            stop: state.stop,
            error_count: state.errors.len(),
            last_error: state.errors.values().last().cloned(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ServiceInfoSnapshot {
    pub slug: String,
    pub address: String,
    pub running: bool,
    pub start: Option<DateTime<Utc>>,
    pub stop: Option<DateTime<Utc>>,
    pub error_count: usize,
    pub last_error: Option<String>,
}

#[cfg(test)]
#[path = "service_info_tests.rs"]
mod tests;
