//! "Construct a ServiceLoader for three registered services where S3's
//! on_start returns error E. Invoke Load with timeout 2s. The signal closes
//! in under 2s; Err() wraps E; S1 and S2 report running; S3 reports
//! not-running with E in its ledger."

use std::sync::Arc;
use std::time::Duration;

use happy_engine::{Engine, Service, ServiceLoader};

use crate::common::session;

#[tokio::test]
async fn third_services_start_failure_surfaces_without_blocking_the_other_two() {
    let sess = session();
    sess.options()
        .set(
            "app.service.loader.timeout",
            happy_collab::Variable::Duration(Duration::from_secs(2)),
        )
        .unwrap();

    let engine = Engine::new(sess.clone());
    engine.register(Service::new("s1")).unwrap();
    engine.register(Service::new("s2")).unwrap();
    engine
        .register(
            Service::new("s3").on_start(Arc::new(|_sess| {
                Box::pin(async { Err("s3 refuses to start".to_string()) })
            })),
        )
        .unwrap();
    engine.start().await.unwrap();

    let loader = Arc::new(ServiceLoader::new(sess.clone(), &["s1", "s2", "s3"]));
    let start = std::time::Instant::now();
    loader.load().await;
    let elapsed = start.elapsed();

    assert!(elapsed < Duration::from_secs(2), "load took {elapsed:?}");
    assert!(loader.is_closed());

    let errors = loader.err().expect("s3's failure should surface as an error");
    assert!(errors.iter().any(|e| e.contains("s3 refuses to start")));

    let s1_addr = sess.address().resolve_service("s1").unwrap();
    let s2_addr = sess.address().resolve_service("s2").unwrap();
    let s3_addr = sess.address().resolve_service("s3").unwrap();
    assert!(sess.service_info(&s1_addr).unwrap().is_running());
    assert!(sess.service_info(&s2_addr).unwrap().is_running());

    let s3_info = sess.service_info(&s3_addr).unwrap();
    assert!(!s3_info.is_running());
    assert!(s3_info.errors().iter().any(|(_, msg)| msg.contains("s3 refuses to start")));

    engine.stop().await;
}
