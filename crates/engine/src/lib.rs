// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Happy runtime engine: service registry, dispatcher, and the tick/tock
//! loops that drive both the engine itself and every registered service.

mod addon;
mod container;
mod cron;
mod engine;
mod error;
mod service;
mod service_loader;

pub use addon::{Addon, DefaultOption, OnRegister};
pub use cron::Cron;
pub use error::{EngineError, Result};
pub use engine::Engine;
pub use service::{sync, AsyncResult, CronSetup, Listener, ListenerTable, OnLifecycle, OnTick, OnTock, Service};
pub use service_loader::ServiceLoader;
