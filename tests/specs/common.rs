//! Shared fixtures for the scenario tests (spec §8's "Concrete scenarios").
//!
//! These tests exercise `happy-core`/`happy-engine`/`happy-collab` together
//! through their public API, the way a real addon author would, rather than
//! reaching into crate-private state the way each crate's own unit tests do.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use happy_collab::{NoOpLogger, Variable};
use happy_core::{Address, Event, OptionStore, Session};

pub fn session() -> Arc<Session> {
    Session::new(
        Arc::new(NoOpLogger),
        OptionStore::default(),
        Address::parse("happy://localhost/specs").unwrap(),
    )
}

/// Poll `check` every 10ms for up to 2s before panicking.
pub async fn wait_until(mut check: impl FnMut() -> bool) {
    for _ in 0..200 {
        if check() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("condition never became true within 2s");
}

/// A `services.start.services` event naming `addrs` as `service.0`, `service.1`, ...
pub fn start_services_event(addrs: &[&Address]) -> Event {
    let mut payload = HashMap::new();
    for (i, addr) in addrs.iter().enumerate() {
        payload.insert(format!("service.{i}"), Variable::String(addr.to_string()));
    }
    Event::new("services", "start.services", Some(payload), None)
}
