//! "Service with listener for (x, y) returning error. Dispatch two x.y
//! events. The listener is invoked twice; two errors are recorded in
//! ServiceInfo; the service is still running."

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use happy_core::Event;
use happy_engine::{Engine, Service};

use crate::common::{session, start_services_event, wait_until};

#[tokio::test]
async fn failing_listener_is_recorded_twice_without_stopping_the_service() {
    let sess = session();
    let engine = Engine::new(sess.clone());

    let invocations = Arc::new(AtomicUsize::new(0));
    let invocations_clone = invocations.clone();
    let svc = Service::new("watcher").on_event(
        "x",
        "y",
        Arc::new(move |_sess, _ev| {
            let counter = invocations_clone.clone();
            Box::pin(async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err("listener exploded".to_string())
            })
        }),
    );
    let addr = engine.register(svc).unwrap();
    engine.start().await.unwrap();

    sess.dispatch(start_services_event(&[&addr])).await;
    wait_until(|| sess.service_info(&addr).map(|i| i.is_running()).unwrap_or(false)).await;

    sess.dispatch(Event::new("x", "y", None, None)).await;
    sess.dispatch(Event::new("x", "y", None, None)).await;

    wait_until(|| invocations.load(Ordering::SeqCst) == 2).await;
    wait_until(|| sess.service_info(&addr).map(|i| i.error_count()).unwrap_or(0) == 2).await;
    assert!(sess.service_info(&addr).unwrap().is_running());

    engine.stop().await;
}
