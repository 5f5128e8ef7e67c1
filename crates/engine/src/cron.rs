//! Per-service cron instance (spec §4.9): a thin facade over
//! [`happy_collab::CronLibrary`] that a service's `cron_setup` callback uses
//! to register jobs during `container.initialize`. Not started until
//! `container.start`.

use happy_collab::{CronAction, CronLibrary, Logger};
use std::sync::Arc;

use crate::error::EngineError;

pub struct Cron {
    library: Arc<dyn CronLibrary>,
}

impl Cron {
    pub fn new(logger: Arc<dyn Logger>) -> Self {
        Self {
            library: Arc::new(happy_collab::ExternalCronLibrary::new(logger)),
        }
    }

    /// Schedule `action` per `expr` (six-field cron syntax, or `@every <duration>`).
    pub fn job(&self, expr: &str, action: CronAction) -> Result<u64, EngineError> {
        self.library
            .job(expr, action)
            .map_err(|e| EngineError::StartFailed {
                service: "cron".to_string(),
                reason: e.to_string(),
            })
    }

    /// Begin firing scheduled jobs.
    pub fn start(&self) {
        self.library.start();
    }

    /// Stop firing new jobs; waits for any currently executing job to finish.
    pub async fn stop(&self) {
        self.library.stop().await;
    }
}

#[cfg(test)]
#[path = "cron_tests.rs"]
mod tests;
