//! Example services bundled as a single addon, registered by `run` to
//! exercise the engine end to end: a ticking heartbeat and an event
//! listener that echoes whatever it is sent.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use happy_collab::Variable;
use happy_core::OptionKind;
use happy_engine::{Addon, DefaultOption, Service};

/// `heartbeat`: ticks at the engine's tick period, logging a beat count
/// every `demo.heartbeat.every_n_ticks` ticks (default 50).
fn heartbeat() -> Service {
    let beats = Arc::new(AtomicU64::new(0));
    Service::new("heartbeat").on_tick(Arc::new(move |session, _now, _delta| {
        let beats = beats.clone();
        Box::pin(async move {
            let n = beats.fetch_add(1, Ordering::SeqCst) + 1;
            let every = session.get("demo.heartbeat.every_n_ticks").as_int().unwrap_or(50).max(1) as u64;
            if n % every == 0 {
                session.logger().task(&format!("heartbeat: {n} ticks"), &[]);
            }
            Ok(())
        })
    }))
}

/// `echo`: listens for `demo.ping` events and logs their payload.
fn echo() -> Service {
    Service::new("echo").on_event(
        "demo",
        "ping",
        Arc::new(|session, event| {
            Box::pin(async move {
                session
                    .logger()
                    .info("echo received demo.ping", &[("key", &event.event_key())]);
                Ok(())
            })
        }),
    )
}

/// Bundles the example services under the `demo` addon namespace, seeding
/// `demo.heartbeat.every_n_ticks` as a user-tunable default.
pub fn addon() -> Addon {
    Addon::new("demo")
        .description("example services exercising the engine's tick/tock and event paths")
        .version(env!("CARGO_PKG_VERSION"))
        .default_option(DefaultOption::new(
            "heartbeat.every_n_ticks",
            Variable::Int(50),
            OptionKind::Setting,
            false,
        ))
        .service(heartbeat())
        .service(echo())
}

#[cfg(test)]
#[path = "demo_tests.rs"]
mod tests;
