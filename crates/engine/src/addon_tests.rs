use super::*;
use happy_collab::NoOpLogger;
use happy_core::{Address, OptionStore, Session};
use std::sync::atomic::{AtomicUsize, Ordering};

fn session() -> Arc<Session> {
    Session::new(
        Arc::new(NoOpLogger),
        OptionStore::default(),
        Address::parse("happy://localhost/test").unwrap(),
    )
}

#[tokio::test]
async fn register_seeds_prefixed_defaults() {
    let sess = session();
    let engine = Engine::new(sess.clone());
    let addon = Addon::new("widgets").default_option(DefaultOption::new(
        "enabled",
        Variable::Bool(true),
        OptionKind::Config,
        false,
    ));
    addon.register(sess.clone(), &engine).await.unwrap();
    assert_eq!(sess.get("widgets.enabled"), Variable::Bool(true));
}

#[tokio::test]
async fn register_runs_on_register_hook() {
    let sess = session();
    let engine = Engine::new(sess.clone());
    let ran = Arc::new(AtomicUsize::new(0));
    let ran_clone = ran.clone();
    let addon = Addon::new("widgets").on_register(Arc::new(move |_sess| {
        let ran_clone = ran_clone.clone();
        Box::pin(async move {
            ran_clone.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })
    }));
    addon.register(sess, &engine).await.unwrap();
    assert_eq!(ran.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn register_fails_when_on_register_hook_errors() {
    let sess = session();
    let engine = Engine::new(sess.clone());
    let addon = Addon::new("widgets")
        .on_register(Arc::new(|_sess| Box::pin(async { Err("bad config".to_string()) })));
    let err = addon.register(sess, &engine).await.unwrap_err();
    assert!(matches!(err, EngineError::InitializeFailed { reason, .. } if reason == "bad config"));
}

#[tokio::test]
async fn register_adds_services_to_the_engine() {
    let sess = session();
    let engine = Engine::new(sess.clone());
    let addon = Addon::new("widgets").service(Service::new("worker"));
    addon.register(sess.clone(), &engine).await.unwrap();
    let addr = sess.address().resolve_service("worker").unwrap();
    assert!(sess.service_info(&addr).is_ok());
}

#[tokio::test]
async fn register_declares_events_on_the_engine() {
    let sess = session();
    let engine = Engine::new(sess.clone());
    let addon = Addon::new("widgets").event("widgets", "refreshed");
    addon.register(sess, &engine).await.unwrap();
    assert!(engine.declared_events.read().contains(&("widgets".to_string(), "refreshed".to_string())));
}

#[tokio::test]
async fn register_publishes_api_handle() {
    let sess = session();
    let engine = Engine::new(sess.clone());
    let addon = Addon::new("widgets").api(Arc::new(42u32));
    addon.register(sess.clone(), &engine).await.unwrap();
    assert_eq!(sess.api::<u32>("widgets").map(|v| *v), Some(42));
}

#[tokio::test]
async fn duplicate_service_across_addons_surfaces_as_duplicate_address() {
    let sess = session();
    let engine = Engine::new(sess.clone());
    let a1 = Addon::new("a").service(Service::new("worker"));
    let a2 = Addon::new("b").service(Service::new("worker"));
    a1.register(sess.clone(), &engine).await.unwrap();
    let err = a2.register(sess, &engine).await.unwrap_err();
    assert!(matches!(err, EngineError::DuplicateAddress(_)));
}
