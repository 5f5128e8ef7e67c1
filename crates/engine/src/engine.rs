//! Registry of services, dispatcher loop, main tick/tock loop, orchestrated
//! start/stop (spec §4.6) — the hard part of the runtime.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::{Duration, Instant};

use happy_collab::Variable;
use happy_core::{Address, Event, Session};
use parking_lot::{Mutex, RwLock};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::container::ServiceContainer;
use crate::error::EngineError;
use crate::service::{OnTick, OnTock, Service};

/// Default tick period when `app.throttle.ticks` is unset or non-positive
/// (spec §4.5/§4.6).
const DEFAULT_TICK_PERIOD: Duration = Duration::from_micros(100);

/// `new -> registered* -> starting -> running -> stopping -> stopped`.
/// Transitions are one-way; `Engine::start`/`stop` reject re-entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EngineState {
    New,
    Starting,
    Running,
    Stopping,
    Stopped,
}

/// Built-in events the dispatcher routes internally; declared up front so
/// §3's "system scopes are only honored when declared" always holds for them.
const BUILTIN_EVENTS: &[(&str, &str)] = &[
    ("services", "start.services"),
    ("services", "stop.services"),
    ("services", "service.started"),
    ("services", "service.stopped"),
    ("engine", "app.tick.err"),
    ("engine", "app.tock.err"),
];

pub struct Engine {
    session: Arc<Session>,
    state: RwLock<EngineState>,
    cancel: CancellationToken,
    dispatcher_cancel: CancellationToken,
    containers: RwLock<HashMap<Address, Arc<ServiceContainer>>>,
    declared_events: RwLock<HashSet<(String, String)>>,
    app_on_tick: RwLock<Option<OnTick>>,
    app_on_tock: RwLock<Option<OnTock>>,
    main_loop_handle: Mutex<Option<JoinHandle<()>>>,
    dispatcher_handle: Mutex<Option<JoinHandle<()>>>,
}

impl Engine {
    pub fn new(session: Arc<Session>) -> Arc<Self> {
        let cancel = session.cancellation().child_token();
        let dispatcher_cancel = cancel.child_token();
        let declared_events = BUILTIN_EVENTS
            .iter()
            .map(|(s, k)| (s.to_string(), k.to_string()))
            .collect();
        Arc::new(Self {
            session,
            state: RwLock::new(EngineState::New),
            cancel,
            dispatcher_cancel,
            containers: RwLock::new(HashMap::new()),
            declared_events: RwLock::new(declared_events),
            app_on_tick: RwLock::new(None),
            app_on_tock: RwLock::new(None),
            main_loop_handle: Mutex::new(None),
            dispatcher_handle: Mutex::new(None),
        })
    }

    /// The main loop's own per-iteration work, independent of any service.
    pub fn with_app_tick(self: Arc<Self>, f: OnTick) -> Arc<Self> {
        *self.app_on_tick.write() = Some(f);
        self
    }

    /// The main loop's post-tick measurement hook. Declaring this without
    /// an `app_tick` is rejected the same way a service's `on_tock` without
    /// `on_tick` is (spec §4.6 step 2).
    pub fn with_app_tock(self: Arc<Self>, f: OnTock) -> Arc<Self> {
        *self.app_on_tock.write() = Some(f);
        self
    }

    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    /// Declare `(scope, key)` into the event registration table (§3), so an
    /// addon's events (or a synthetic key from a service's listener table)
    /// are honored by engine-internal routing.
    pub fn declare_event(&self, scope: impl Into<String>, key: impl Into<String>) {
        self.declared_events.write().insert((scope.into(), key.into()));
    }

    fn transition_to_registered_ok(&self) -> Result<(), EngineError> {
        match *self.state.read() {
            EngineState::New => Ok(()),
            _ => Err(EngineError::AlreadyRunning("running")),
        }
    }

    /// Resolve `service`'s slug to an address under the session's host,
    /// reject duplicates, publish its `ServiceInfo` into the session
    /// directory, and store the container. Rejects registration once the
    /// engine has left `new`.
    pub fn register(&self, service: Service) -> Result<Address, EngineError> {
        self.transition_to_registered_ok()?;
        service.validate()?;

        let addr = self.session.address().resolve_service(service.slug())?;

        let mut containers = self.containers.write();
        if containers.contains_key(&addr) {
            return Err(EngineError::DuplicateAddress(addr.to_string()));
        }

        let info = Arc::new(happy_core::ServiceInfo::new(service.slug(), addr.clone()));
        self.session.set_service_info(info.clone());
        let container = Arc::new(ServiceContainer::new(service, info, &self.cancel));
        containers.insert(addr.clone(), container);
        Ok(addr)
    }

    fn tick_period(&self) -> Duration {
        let d = self.session.get("app.throttle.ticks").as_duration().unwrap_or(DEFAULT_TICK_PERIOD);
        if d.is_zero() {
            DEFAULT_TICK_PERIOD
        } else {
            d
        }
    }

    /// Orchestrates §4.6's `Start(sess)` sequence: validates the app-level
    /// tock-without-tick rule, spawns the main loop and per-service
    /// initializers, waits for both, then starts the dispatcher and marks
    /// the session ready.
    pub async fn start(self: &Arc<Self>) -> Result<(), EngineError> {
        {
            let mut state = self.state.write();
            if *state != EngineState::New {
                return Err(EngineError::AlreadyRunning("started"));
            }
            *state = EngineState::Starting;
        }

        if self.app_on_tock.read().is_some() && self.app_on_tick.read().is_none() {
            return Err(EngineError::TockWithoutTick("app".to_string()));
        }

        let (loop_ready_tx, mut loop_ready_rx) = watch::channel(false);
        let main_loop = tokio::spawn(self.clone().run_main_loop(loop_ready_tx));

        let containers: Vec<Arc<ServiceContainer>> = self.containers.read().values().cloned().collect();
        let mut init_results = Vec::with_capacity(containers.len());
        for container in &containers {
            for (scope, key) in container.service().listeners().keys() {
                self.declare_event(scope.clone(), key.clone());
            }
            init_results.push(container.initialize(self.session.clone()).await);
        }

        let _ = loop_ready_rx.changed().await;
        let loop_ok = *loop_ready_rx.borrow();

        if let Some(err) = init_results.into_iter().find_map(|r| r.err()) {
            main_loop.abort();
            self.session
                .destroy(Some(happy_core::Error::Application(err.to_string())));
            return Err(err);
        }
        if !loop_ok {
            main_loop.abort();
            let err = EngineError::StartFailed {
                service: "app".to_string(),
                reason: "main loop did not complete a tick+tock cycle".to_string(),
            };
            self.session
                .destroy(Some(happy_core::Error::Application(err.to_string())));
            return Err(err);
        }

        *self.main_loop_handle.lock() = Some(main_loop);
        let dispatcher = tokio::spawn(self.clone().run_dispatcher());
        *self.dispatcher_handle.lock() = Some(dispatcher);
        self.session.set_ready();
        *self.state.write() = EngineState::Running;
        Ok(())
    }

    /// The app-level tick/tock loop, independent of any registered
    /// service. Signals readiness the first time a tick+tock pair
    /// completes without error; a non-nil error emits `engine.app.tick.err`
    /// / `engine.app.tock.err` and ends the loop.
    async fn run_main_loop(self: Arc<Self>, ready_tx: watch::Sender<bool>) {
        let period = self.tick_period();
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        let mut last_tick = Instant::now();

        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => return,
                _ = ticker.tick() => {}
            }

            let Some(on_tick) = self.app_on_tick.read().clone() else {
                let _ = ready_tx.send(true);
                continue;
            };
            let now = chrono::Utc::now();
            let delta = last_tick.elapsed();
            last_tick = Instant::now();

            if let Err(reason) = on_tick(self.session.clone(), now, delta).await {
                self.emit_loop_error("app.tick.err", reason).await;
                return;
            }

            let tick_delta = last_tick.elapsed();
            let on_tock = self.app_on_tock.read().clone();
            if let Some(on_tock) = on_tock {
                if let Err(reason) = on_tock(self.session.clone(), tick_delta, 1.0).await {
                    self.emit_loop_error("app.tock.err", reason).await;
                    return;
                }
            }
            let _ = ready_tx.send(true);
        }
    }

    async fn emit_loop_error(&self, key: &str, reason: String) {
        let mut payload = HashMap::new();
        payload.insert("error".to_string(), Variable::String(reason.clone()));
        self.session
            .dispatch(Event::new("engine", key, Some(payload), Some(reason.clone())))
            .await;
        self.session
            .destroy(Some(happy_core::Error::Application(reason)));
    }

    /// Single task consuming the session's event channel until the
    /// dispatcher's context is cancelled. Handles `services.*` system
    /// events directly; fans every event out to every registered container
    /// in its own task (§4.6, §5 ordering guarantees).
    async fn run_dispatcher(self: Arc<Self>) {
        let Some(mut rx) = self.session.take_event_receiver() else {
            return;
        };
        loop {
            let ev = tokio::select! {
                _ = self.dispatcher_cancel.cancelled() => return,
                maybe_ev = rx.recv() => match maybe_ev {
                    Some(ev) => ev,
                    None => return,
                },
            };

            if !self
                .declared_events
                .read()
                .contains(&(ev.scope().to_string(), ev.key().to_string()))
            {
                self.session
                    .logger()
                    .debug("event not implemented", &[("event", &ev.event_key())]);
            }

            match (ev.scope(), ev.key()) {
                ("services", "start.services") => {
                    for addr in addresses_in_payload(&ev) {
                        let engine = self.clone();
                        tokio::spawn(async move { engine.service_start(addr).await });
                    }
                }
                ("services", "stop.services") => {
                    for addr in addresses_in_payload(&ev) {
                        let engine = self.clone();
                        tokio::spawn(async move { engine.service_stop(addr, None).await });
                    }
                }
                _ => {}
            }

            let containers: Vec<Arc<ServiceContainer>> = self.containers.read().values().cloned().collect();
            let session = self.session.clone();
            for container in containers {
                let session = session.clone();
                let ev = ev.clone();
                tokio::spawn(async move { container.handle_event(session, ev).await });
            }
        }
    }

    /// Starts the container at `addr` (invoking `on_start`) and, on
    /// success, spawns its per-service tick loop. A no-op if the service
    /// is already running or unknown.
    async fn service_start(self: Arc<Self>, addr: Address) {
        let Some(container) = self.containers.read().get(&addr).cloned() else {
            self.session
                .logger()
                .warn("services.start.services: unknown service", &[("service", &addr.to_string())]);
            return;
        };
        if container.info().is_running() {
            return;
        }
        container.rearm(&self.cancel);
        if let Err(err) = container.start(self.session.clone()).await {
            self.session
                .logger()
                .error("service failed to start", &[("service", &addr.to_string()), ("error", &err.to_string())]);
            return;
        }

        self.session
            .dispatch(Event::new(
                "services",
                "service.started",
                Some(address_payload(&addr)),
                None,
            ))
            .await;

        tokio::spawn(self.clone().run_service_tick_loop(container, addr));
    }

    async fn run_service_tick_loop(self: Arc<Self>, container: Arc<ServiceContainer>, addr: Address) {
        if container.service().ticker().is_none() {
            container.cancellation().cancelled().await;
            return;
        }

        let period = self.tick_period();
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        let mut last_tick = Instant::now();
        let mut ticks_this_second = 0u32;
        let mut second_start = Instant::now();

        loop {
            tokio::select! {
                _ = container.cancellation().cancelled() => return,
                _ = ticker.tick() => {}
            }
            if let Some(err) = container
                .tick(self.session.clone(), &mut last_tick, &mut ticks_this_second, &mut second_start)
                .await
            {
                self.service_stop(addr, Some(err.to_string())).await;
                return;
            }
        }
    }

    /// Cancels the container's run (breaking its tick loop), invokes
    /// `on_stop`, and emits `services.service.stopped`. `err`, if present,
    /// is recorded in the service's ledger before stopping — the path a
    /// tick/tock failure takes. A no-op if the service isn't running.
    async fn service_stop(self: Arc<Self>, addr: Address, err: Option<String>) {
        let Some(container) = self.containers.read().get(&addr).cloned() else {
            return;
        };
        if !container.info().is_running() {
            return;
        }
        if let Some(reason) = err {
            container.info().record_error(reason);
        }
        container.cancellation().cancel();
        if let Err(e) = container.stop(self.session.clone()).await {
            self.session
                .logger()
                .error("service failed to stop", &[("service", &addr.to_string()), ("error", &e.to_string())]);
        }
        self.session
            .dispatch(Event::new(
                "services",
                "service.stopped",
                Some(address_payload(&addr)),
                None,
            ))
            .await;
    }

    /// Cancels the main loop and dispatcher (waiting for each to exit),
    /// then stops every running service concurrently, returning only once
    /// every stop has finished (§4.6).
    pub async fn stop(self: &Arc<Self>) {
        {
            let mut state = self.state.write();
            if *state == EngineState::Stopping || *state == EngineState::Stopped {
                return;
            }
            *state = EngineState::Stopping;
        }

        self.cancel.cancel();
        if let Some(handle) = self.main_loop_handle.lock().take() {
            let _ = handle.await;
        }
        self.dispatcher_cancel.cancel();
        if let Some(handle) = self.dispatcher_handle.lock().take() {
            let _ = handle.await;
        }

        let containers: Vec<(Address, Arc<ServiceContainer>)> = self
            .containers
            .read()
            .iter()
            .filter(|(_, c)| c.info().is_running())
            .map(|(a, c)| (a.clone(), c.clone()))
            .collect();

        let stops: Vec<_> = containers
            .into_iter()
            .map(|(addr, container)| {
                let session = self.session.clone();
                tokio::spawn(async move {
                    container.cancellation().cancelled().await;
                    let _ = container.stop(session).await;
                })
            })
            .collect();
        for handle in stops {
            let _ = handle.await;
        }

        *self.state.write() = EngineState::Stopped;
    }

    pub fn is_running(&self) -> bool {
        *self.state.read() == EngineState::Running
    }
}

fn address_payload(addr: &Address) -> HashMap<String, Variable> {
    let mut payload = HashMap::new();
    payload.insert("address".to_string(), Variable::String(addr.to_string()));
    payload
}

fn addresses_in_payload(ev: &Event) -> Vec<Address> {
    let Some(payload) = ev.payload() else {
        return Vec::new();
    };
    let mut keys: Vec<&String> = payload.keys().filter(|k| k.starts_with("service.")).collect();
    keys.sort();
    keys.into_iter()
        .filter_map(|k| payload.get(k))
        .filter_map(|v| v.as_str())
        .filter_map(|s| Address::parse(s).ok())
        .collect()
}

#[cfg(test)]
#[path = "engine_tests.rs"]
mod tests;
