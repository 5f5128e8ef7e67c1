//! Immutable event record dispatched through the session's event channel.

use chrono::{DateTime, Utc};
use happy_collab::Variable;
use std::collections::HashMap;

/// `(scope, key, time, payload?, err?)`. Created by the dispatcher/sources,
/// consumed once by the dispatcher, then broadcast to listeners. Never
/// mutated after creation.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    scope: String,
    key: String,
    time: DateTime<Utc>,
    payload: Option<HashMap<String, Variable>>,
    err: Option<String>,
}

impl Event {
    /// The sole constructor used by engine-emitted events. Trusts its
    /// caller for the `scope`/`key` non-empty invariant, matching the
    /// engine's own emission sites which always pass literals; use
    /// [`Event::is_valid`] at any external boundary that can't make that
    /// guarantee.
    pub fn new(
        scope: impl Into<String>,
        key: impl Into<String>,
        payload: Option<HashMap<String, Variable>>,
        err: Option<String>,
    ) -> Self {
        Self {
            scope: scope.into(),
            key: key.into(),
            time: Utc::now(),
            payload,
            err,
        }
    }

    pub fn scope(&self) -> &str {
        &self.scope
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// `scope.key`, the dispatcher's routing key.
    pub fn event_key(&self) -> String {
        format!("{}.{}", self.scope, self.key)
    }

    pub fn time(&self) -> DateTime<Utc> {
        self.time
    }

    pub fn payload(&self) -> Option<&HashMap<String, Variable>> {
        self.payload.as_ref()
    }

    pub fn get(&self, key: &str) -> Variable {
        self.payload
            .as_ref()
            .and_then(|p| p.get(key))
            .cloned()
            .unwrap_or(Variable::None)
    }

    pub fn err(&self) -> Option<&str> {
        self.err.as_deref()
    }

    pub fn is_valid(&self) -> bool {
        !self.scope.is_empty() && !self.key.is_empty()
    }

    /// `(scope, key)` pair identifying this event's class.
    pub fn class(&self) -> (&str, &str) {
        (&self.scope, &self.key)
    }
}

#[cfg(test)]
#[path = "event_tests.rs"]
mod tests;
