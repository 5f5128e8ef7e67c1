#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! happy-collab: narrow interfaces for the collaborators the engine consumes
//! but does not own — logging, the typed scalar/variable container, the flag
//! parser driving command dispatch, and the cron expression library.
//!
//! Each trait here has exactly one production implementation and one
//! `Fake`/`NoOp` implementation for use by other crates' tests, following the
//! adapter pattern this workspace uses throughout (trait + `Clone + Send +
//! Sync + 'static` bound + test double behind `test-support`).

pub mod cron_lib;
pub mod duration_fmt;
pub mod flag_parser;
pub mod logger;
pub mod variable;

pub use cron_lib::{CronAction, CronError, CronLibrary, ExternalCronLibrary};
pub use duration_fmt::parse_duration;
pub use flag_parser::{ActiveSet, FlagParser};
pub use logger::{Level, Logger, NoOpLogger, TracingLogger};
pub use variable::{NamedVariable, Variable, VariableError, VariableLibrary, VariableMap};

#[cfg(any(test, feature = "test-support"))]
pub use flag_parser::FakeFlagParser;
