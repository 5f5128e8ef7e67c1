// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! happy-core: Address, Event, OptionStore, ServiceInfo, and Session — the
//! data model and per-run context of the `happy` engine.

pub mod address;
pub mod error;
pub mod event;
pub mod option_store;
pub mod service_info;
pub mod session;
pub mod signal_trap;

pub use address::Address;
pub use error::{Error, Result};
pub use event::Event;
pub use option_store::{OptionKind, OptionStore, Validator};
pub use service_info::{ServiceInfo, ServiceInfoSnapshot};
pub use session::{ApiHandle, Session, EVENT_CHANNEL_CAPACITY};
pub use signal_trap::{SignalTrap, TrapCause};
