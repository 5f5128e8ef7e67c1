//! Cron collaborator: a thin wrapper over the `cron` crate's six-field
//! (with seconds) expression parser, plus `@every <duration>` macro support.
//!
//! A bare interval string isn't rich enough for six-field-with-seconds
//! schedules, so this module pulls in the real `cron` crate instead of
//! reinventing expression parsing by hand.

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::duration_fmt::parse_duration;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CronError {
    #[error("invalid cron expression {expr:?}: {reason}")]
    InvalidExpression { expr: String, reason: String },
    #[error("cron library already stopped")]
    AlreadyStopped,
}

/// A job's action. Boxed so the library doesn't need to be generic over
/// every callback's concrete future type.
pub type CronAction =
    Arc<dyn Fn() -> Pin<Box<dyn Future<Output = Result<(), String>> + Send>> + Send + Sync>;

/// Thin wrapper over an external cron parser. `Job` schedules, `Start`
/// begins firing, `Stop` returns only after currently executing jobs finish.
/// A job that returns an error is logged but does not cancel future runs.
#[async_trait]
pub trait CronLibrary: Send + Sync + 'static {
    /// Schedule `action` to run according to `expr` (six-field cron syntax,
    /// or the `@every <duration>` macro). Returns an opaque job id.
    fn job(&self, expr: &str, action: CronAction) -> Result<u64, CronError>;

    /// Begin firing scheduled jobs.
    fn start(&self);

    /// Stop firing new jobs and wait for any currently executing job to finish.
    async fn stop(&self);
}

enum Schedule {
    Every(std::time::Duration),
    Expr(cron::Schedule),
}

impl Schedule {
    fn parse(expr: &str) -> Result<Self, CronError> {
        if let Some(rest) = expr.strip_prefix("@every ") {
            let d = parse_duration(rest).map_err(|reason| CronError::InvalidExpression {
                expr: expr.to_string(),
                reason,
            })?;
            return Ok(Schedule::Every(d));
        }
        let schedule = expr
            .parse::<cron::Schedule>()
            .map_err(|e| CronError::InvalidExpression {
                expr: expr.to_string(),
                reason: e.to_string(),
            })?;
        Ok(Schedule::Expr(schedule))
    }

    fn next_delay(&self, last_fire: &mut Option<std::time::Instant>) -> std::time::Duration {
        match self {
            Schedule::Every(d) => {
                let now = std::time::Instant::now();
                let delay = match last_fire {
                    Some(prev) => d.saturating_sub(now.saturating_duration_since(*prev)),
                    None => *d,
                };
                *last_fire = Some(now);
                delay
            }
            Schedule::Expr(schedule) => {
                let now = Utc::now();
                schedule
                    .upcoming(Utc)
                    .take(1)
                    .next()
                    .map(|next| (next - now).to_std().unwrap_or_default())
                    .unwrap_or_default()
            }
        }
    }
}

struct Job {
    handle: JoinHandle<()>,
}

/// Production `CronLibrary`, spawning one `tokio` task per registered job.
pub struct ExternalCronLibrary {
    logger: Arc<dyn crate::logger::Logger>,
    jobs: Mutex<Vec<(Schedule, CronAction)>>,
    running: Mutex<Option<Vec<Job>>>,
    stop_tx: watch::Sender<bool>,
    stop_rx: watch::Receiver<bool>,
}

impl ExternalCronLibrary {
    pub fn new(logger: Arc<dyn crate::logger::Logger>) -> Self {
        let (stop_tx, stop_rx) = watch::channel(false);
        Self {
            logger,
            jobs: Mutex::new(Vec::new()),
            running: Mutex::new(None),
            stop_tx,
            stop_rx,
        }
    }
}

#[async_trait]
impl CronLibrary for ExternalCronLibrary {
    fn job(&self, expr: &str, action: CronAction) -> Result<u64, CronError> {
        let schedule = Schedule::parse(expr)?;
        let mut jobs = self.jobs.lock();
        jobs.push((schedule, action));
        Ok(jobs.len() as u64 - 1)
    }

    fn start(&self) {
        let mut running = self.running.lock();
        if running.is_some() {
            return;
        }
        let jobs = std::mem::take(&mut *self.jobs.lock());
        let mut handles = Vec::with_capacity(jobs.len());
        for (mut schedule, action) in jobs {
            let mut stop_rx = self.stop_rx.clone();
            let logger = self.logger.clone();
            let handle = tokio::spawn(async move {
                let mut last_fire = None;
                loop {
                    let delay = schedule.next_delay(&mut last_fire);
                    tokio::select! {
                        _ = tokio::time::sleep(delay) => {}
                        _ = stop_rx.changed() => {
                            if *stop_rx.borrow() {
                                return;
                            }
                        }
                    }
                    if *stop_rx.borrow() {
                        return;
                    }
                    if let Err(err) = (action)().await {
                        logger.error("cron job failed", &[("error", &err)]);
                    }
                }
            });
            handles.push(Job { handle });
        }
        *running = Some(handles);
    }

    async fn stop(&self) {
        let _ = self.stop_tx.send(true);
        let handles = self.running.lock().take();
        if let Some(handles) = handles {
            for job in handles {
                let _ = job.handle.await;
            }
        }
    }
}

#[cfg(test)]
#[path = "cron_lib_tests.rs"]
mod tests;
