//! "Two services declare the same address. The second registration returns
//! a service error; only the first appears in the directory."

use happy_engine::{Engine, EngineError, Service};

use crate::common::session;

#[tokio::test]
async fn second_registration_of_the_same_slug_is_rejected() {
    let sess = session();
    let engine = Engine::new(sess.clone());

    let first = engine.register(Service::new("dup")).unwrap();
    let err = engine.register(Service::new("dup")).unwrap_err();
    assert!(matches!(err, EngineError::DuplicateAddress(addr) if addr == first.to_string()));

    assert_eq!(sess.service_infos().len(), 1);
    assert_eq!(sess.service_info(&first).unwrap().slug(), "dup");
}
