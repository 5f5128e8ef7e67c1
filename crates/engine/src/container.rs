//! Private engine-owned wrapper binding a user [`Service`] to its runtime
//! state, its own cancellation (descended from the engine's), and its
//! optional [`Cron`] instance (spec §3 "ServiceContainer", §4.5).

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use happy_core::{Event, ServiceInfo, Session};
use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;

use crate::cron::Cron;
use crate::error::EngineError;
use crate::service::Service;

pub struct ServiceContainer {
    service: Service,
    info: Arc<ServiceInfo>,
    cancel: Mutex<CancellationToken>,
    cron: Mutex<Option<Cron>>,
    stopping: AtomicBool,
}

impl ServiceContainer {
    pub fn new(service: Service, info: Arc<ServiceInfo>, parent: &CancellationToken) -> Self {
        Self {
            service,
            info,
            cancel: Mutex::new(parent.child_token()),
            cron: Mutex::new(None),
            stopping: AtomicBool::new(false),
        }
    }

    pub fn service(&self) -> &Service {
        &self.service
    }

    pub fn info(&self) -> &Arc<ServiceInfo> {
        &self.info
    }

    pub fn cancellation(&self) -> CancellationToken {
        self.cancel.lock().clone()
    }

    /// Replace the container's cancellation with a fresh child of `parent`.
    /// Called before each `start()`, so a restarted service isn't left
    /// observing the previous run's already-cancelled token.
    pub fn rearm(&self, parent: &CancellationToken) {
        *self.cancel.lock() = parent.child_token();
    }

    /// Invokes `on_initialize` if present, then lets a declared cron setup
    /// register jobs on a freshly instantiated (not yet started) [`Cron`].
    pub async fn initialize(&self, sess: Arc<Session>) -> Result<(), EngineError> {
        if let Some(init) = self.service.initializer() {
            init(sess.clone())
                .await
                .map_err(|reason| EngineError::InitializeFailed {
                    service: self.service.slug().to_string(),
                    reason,
                })?;
        }
        if let Some(setup) = self.service.cron_setup() {
            let cron = Cron::new(sess.logger().clone());
            setup(&cron)?;
            *self.cron.lock() = Some(cron);
        }
        Ok(())
    }

    /// Invokes `on_start`; starts the cron (if any) only on success. Failure
    /// leaves the container not-running with the error recorded.
    pub async fn start(&self, sess: Arc<Session>) -> Result<(), EngineError> {
        self.stopping.store(false, Ordering::SeqCst);
        if let Some(start) = self.service.starter() {
            if let Err(reason) = start(sess.clone()).await {
                self.info.record_error(reason.clone());
                return Err(EngineError::StartFailed {
                    service: self.service.slug().to_string(),
                    reason,
                });
            }
        }
        if let Some(cron) = self.cron.lock().as_ref() {
            cron.start();
        }
        self.info.mark_started();
        Ok(())
    }

    /// Invokes `on_stop`; stops the cron (waiting for in-flight jobs) before
    /// recording the stop timestamp. Idempotent: a second concurrent call
    /// (e.g. a tick failure racing the engine's own shutdown) is a no-op.
    pub async fn stop(&self, sess: Arc<Session>) -> Result<(), EngineError> {
        if self.stopping.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        let stop_result = if let Some(stop) = self.service.stopper() {
            stop(sess).await
        } else {
            Ok(())
        };
        if let Some(cron) = self.cron.lock().as_ref() {
            cron.stop().await;
        }
        self.info.mark_stopped();
        stop_result.map_err(|reason| EngineError::StopFailed {
            service: self.service.slug().to_string(),
            reason,
        })
    }

    /// One tick+tock iteration. Returns the error that should stop the
    /// service, if any.
    pub async fn tick(
        &self,
        sess: Arc<Session>,
        last_tick: &mut std::time::Instant,
        ticks_this_second: &mut u32,
        second_start: &mut std::time::Instant,
    ) -> Option<EngineError> {
        let Some(on_tick) = self.service.ticker() else {
            return None;
        };
        let now = Utc::now();
        let delta = last_tick.elapsed();
        *last_tick = std::time::Instant::now();

        let tick_started = std::time::Instant::now();
        if let Err(reason) = on_tick(sess.clone(), now, delta).await {
            return Some(EngineError::TickFailed {
                service: self.service.slug().to_string(),
                reason,
            });
        }
        let tick_delta = tick_started.elapsed();

        *ticks_this_second += 1;
        if second_start.elapsed() >= Duration::from_secs(1) {
            *ticks_this_second = 1;
            *second_start = std::time::Instant::now();
        }
        let tps = *ticks_this_second as f64;

        if let Some(on_tock) = self.service.tocker() {
            if let Err(reason) = on_tock(sess, tick_delta, tps).await {
                return Some(EngineError::TickFailed {
                    service: self.service.slug().to_string(),
                    reason,
                });
            }
        }
        None
    }

    /// Fan out `ev` to every listener matching its `(scope, key)`, plus any
    /// "any" listeners, in registration order. A listener error is recorded
    /// in the ledger and logged; it never stops the service.
    pub async fn handle_event(&self, sess: Arc<Session>, ev: Event) {
        for listener in self.service.listeners().matching(ev.scope(), ev.key()) {
            if let Err(reason) = listener(sess.clone(), ev.clone()).await {
                self.info.record_error(reason.clone());
                sess.logger().error(
                    "service listener failed",
                    &[
                        ("service", self.service.slug()),
                        ("event", &ev.event_key()),
                        ("error", &reason),
                    ],
                );
            }
        }
    }
}

#[cfg(test)]
#[path = "container_tests.rs"]
mod tests;
