use super::*;
use happy_collab::NoOpLogger;
use happy_core::{Address, OptionStore, Session};
use happy_engine::Engine;

fn session() -> Arc<happy_core::Session> {
    Session::new(
        Arc::new(NoOpLogger),
        OptionStore::default(),
        Address::parse("happy://localhost/test").unwrap(),
    )
}

#[tokio::test]
async fn addon_registers_heartbeat_and_echo_under_the_demo_namespace() {
    let sess = session();
    let engine = Engine::new(sess.clone());
    addon().register(sess.clone(), &engine).await.unwrap();

    assert_eq!(sess.get("demo.heartbeat.every_n_ticks"), Variable::Int(50));
    let heartbeat_addr = sess.address().resolve_service("heartbeat").unwrap();
    let echo_addr = sess.address().resolve_service("echo").unwrap();
    assert!(sess.service_info(&heartbeat_addr).is_ok());
    assert!(sess.service_info(&echo_addr).is_ok());
}
