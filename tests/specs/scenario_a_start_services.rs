//! "Register services S1 (tick no-op) and S2 (no tick). Start engine.
//! Dispatch `services.start.services` with both addresses. Both ServiceInfos
//! report running within 500ms; both `on_start` callbacks ran exactly once."

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use happy_engine::{Engine, Service};

use crate::common::{session, start_services_event, wait_until};

#[tokio::test]
async fn both_services_report_running_and_on_start_ran_once() {
    let sess = session();
    let engine = Engine::new(sess.clone());

    let s1_starts = Arc::new(AtomicUsize::new(0));
    let s1_starts_clone = s1_starts.clone();
    let s1 = Service::new("s1")
        .on_start(Arc::new(move |_sess| {
            let counter = s1_starts_clone.clone();
            Box::pin(async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(())
            })
        }))
        .on_tick(Arc::new(|_sess, _now, _delta| Box::pin(async { Ok(()) })));

    let s2_starts = Arc::new(AtomicUsize::new(0));
    let s2_starts_clone = s2_starts.clone();
    let s2 = Service::new("s2").on_start(Arc::new(move |_sess| {
        let counter = s2_starts_clone.clone();
        Box::pin(async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })
    }));

    let addr1 = engine.register(s1).unwrap();
    let addr2 = engine.register(s2).unwrap();
    engine.start().await.unwrap();

    let started = std::time::Instant::now();
    sess.dispatch(start_services_event(&[&addr1, &addr2])).await;

    wait_until(|| {
        sess.service_info(&addr1).map(|i| i.is_running()).unwrap_or(false)
            && sess.service_info(&addr2).map(|i| i.is_running()).unwrap_or(false)
    })
    .await;

    assert!(started.elapsed() < Duration::from_millis(500));
    assert_eq!(s1_starts.load(Ordering::SeqCst), 1);
    assert_eq!(s2_starts.load(Ordering::SeqCst), 1);

    engine.stop().await;
}
