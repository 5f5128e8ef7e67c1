//! "Interrupt signal delivered after session ready. Destroy runs with the
//! interrupt cause; every registered running service's on_stop is invoked;
//! Done closes."
//!
//! Delivers a real SIGINT to this test process via `kill`, the same signal
//! `happy_core::SignalTrap` listens for. Serialized against every other test
//! in this binary: nothing else here calls `Session::start`, but a real
//! signal is process-wide, not per-task.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use happy_engine::{Engine, Service};
use serial_test::serial;

use crate::common::{session, start_services_event, wait_until};

fn send_sigint_to_self() {
    let pid = std::process::id().to_string();
    let status = std::process::Command::new("kill")
        .args(["-INT", &pid])
        .status()
        .expect("the `kill` utility should be available to signal this process");
    assert!(status.success(), "kill -INT should succeed");
}

#[tokio::test]
#[serial(sigint)]
async fn interrupt_stops_running_services_and_closes_done() {
    let sess = session();
    sess.start();

    let engine = Engine::new(sess.clone());
    let stopped = Arc::new(AtomicBool::new(false));
    let stopped_clone = stopped.clone();
    let svc = Service::new("worker").on_stop(Arc::new(move |_sess| {
        let flag = stopped_clone.clone();
        Box::pin(async move {
            flag.store(true, Ordering::SeqCst);
            Ok(())
        })
    }));
    let addr = engine.register(svc).unwrap();
    engine.start().await.unwrap();

    sess.dispatch(start_services_event(&[&addr])).await;
    wait_until(|| sess.service_info(&addr).map(|i| i.is_running()).unwrap_or(false)).await;

    // Mirrors the CLI binary's own `run()`: block on `Done`, then stop the
    // engine, which waits for each running container's own cancellation
    // before invoking its `on_stop`.
    let sess_for_shutdown = sess.clone();
    let engine_for_shutdown = engine.clone();
    let shutdown = tokio::spawn(async move {
        sess_for_shutdown.done().await;
        engine_for_shutdown.stop().await;
    });

    send_sigint_to_self();

    tokio::time::timeout(Duration::from_secs(5), shutdown)
        .await
        .expect("shutdown should complete within 5s")
        .expect("shutdown task should not panic");

    assert!(stopped.load(Ordering::SeqCst));
    assert!(!sess.service_info(&addr).unwrap().is_running());
}
