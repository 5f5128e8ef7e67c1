use super::*;
use happy_collab::NoOpLogger;
use std::sync::atomic::{AtomicUsize, Ordering};

#[tokio::test]
async fn job_fires_on_every_interval() {
    let cron = Cron::new(Arc::new(NoOpLogger));
    let fired = Arc::new(AtomicUsize::new(0));
    let counter = fired.clone();
    cron.job(
        "@every 10ms",
        Arc::new(move || {
            let counter = counter.clone();
            Box::pin(async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(())
            })
        }),
    )
    .unwrap();
    cron.start();
    tokio::time::sleep(std::time::Duration::from_millis(45)).await;
    cron.stop().await;
    assert!(fired.load(Ordering::SeqCst) >= 2);
}

#[tokio::test]
async fn invalid_expression_is_rejected() {
    let cron = Cron::new(Arc::new(NoOpLogger));
    let err = cron
        .job("not a cron expr", Arc::new(|| Box::pin(async { Ok(()) })))
        .unwrap_err();
    assert!(matches!(err, EngineError::StartFailed { .. }));
}
