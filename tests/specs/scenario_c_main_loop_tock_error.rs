//! "Main loop with on_tick returning nil and on_tock returning error E on
//! the 5th iteration. Engine emits `engine.app.tock.err` with E in payload;
//! session is destroyed with E."

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use happy_core::Error as CoreError;
use happy_engine::Engine;

use crate::common::session;

#[tokio::test]
async fn fifth_tock_failure_emits_error_event_and_destroys_the_session() {
    let sess = session();
    let mut rx = sess.take_event_receiver().unwrap();

    let tock_calls = Arc::new(AtomicUsize::new(0));
    let tock_calls_clone = tock_calls.clone();
    let engine = Engine::new(sess.clone())
        .with_app_tick(Arc::new(|_sess, _now, _delta| Box::pin(async { Ok(()) })))
        .with_app_tock(Arc::new(move |_sess, _delta, _tps| {
            let calls = tock_calls_clone.clone();
            Box::pin(async move {
                if calls.fetch_add(1, Ordering::SeqCst) + 1 == 5 {
                    Err("tock blew up on the fifth beat".to_string())
                } else {
                    Ok(())
                }
            })
        }));

    engine.start().await.unwrap();

    let ev = tokio::time::timeout(Duration::from_secs(2), rx.recv())
        .await
        .expect("engine.app.tock.err should be dispatched")
        .expect("event channel should still be open");
    assert_eq!(ev.event_key(), "engine.app.tock.err");
    assert_eq!(ev.get("error").as_str(), Some("tock blew up on the fifth beat"));

    tokio::time::timeout(Duration::from_secs(2), sess.done())
        .await
        .expect("session should be destroyed after the tock failure");
    match sess.err() {
        Some(CoreError::Application(reason)) => {
            assert_eq!(reason, "tock blew up on the fifth beat");
        }
        other => panic!("expected Application error, got {other:?}"),
    }

    engine.stop().await;
}
