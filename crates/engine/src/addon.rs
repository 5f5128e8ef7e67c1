//! Composition unit contributing commands, services, settings, events, and
//! an API handle (spec §4.8).
//!
//! Registration is driven by the application host, not the engine directly
//! — `Addon::register` is the narrow entry point a `happy` binary's startup
//! sequence calls once per addon, in the order addons were loaded.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use happy_collab::Variable;
use happy_core::{ApiHandle, OptionKind, Session};

use crate::engine::Engine;
use crate::error::EngineError;
use crate::service::Service;

pub type OnRegister =
    Arc<dyn Fn(Arc<Session>) -> Pin<Box<dyn Future<Output = Result<(), String>> + Send>> + Send + Sync>;

/// A default option entry an addon wants seeded into the session's
/// `OptionStore`, prefixed by the addon's name (`<addon>.<key>`).
#[derive(Clone)]
pub struct DefaultOption {
    pub key: String,
    pub value: Variable,
    pub kind: OptionKind,
    pub readonly: bool,
}

impl DefaultOption {
    pub fn new(key: impl Into<String>, value: Variable, kind: OptionKind, readonly: bool) -> Self {
        Self {
            key: key.into(),
            value,
            kind,
            readonly,
        }
    }
}

/// Metadata plus the bundle of services/events/options/API an addon
/// contributes. Built by addon authors, handed to the host once.
#[derive(Clone)]
pub struct Addon {
    name: String,
    description: String,
    version: String,
    default_options: Vec<DefaultOption>,
    events: Vec<(String, String)>,
    services: Vec<Service>,
    api: Option<ApiHandle>,
    on_register: Option<OnRegister>,
}

impl Addon {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            version: "0.0.0".to_string(),
            default_options: Vec::new(),
            events: Vec::new(),
            services: Vec::new(),
            api: None,
            on_register: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    pub fn default_option(mut self, option: DefaultOption) -> Self {
        self.default_options.push(option);
        self
    }

    pub fn event(mut self, scope: impl Into<String>, key: impl Into<String>) -> Self {
        self.events.push((scope.into(), key.into()));
        self
    }

    pub fn service(mut self, service: Service) -> Self {
        self.services.push(service);
        self
    }

    pub fn api<T: Send + Sync + 'static>(mut self, api: Arc<T>) -> Self {
        self.api = Some(api as ApiHandle);
        self
    }

    pub fn on_register(mut self, f: OnRegister) -> Self {
        self.on_register = Some(f);
        self
    }

    /// Validate default options against `store` (schema-restricted stores
    /// reject unknown keys even before this addon writes them), merge
    /// prefixed defaults into `store`, invoke `on_register`, register every
    /// declared event and service on `engine`, and publish the API handle.
    ///
    /// Options are merged with `<addon-name>.` prefixed keys so two
    /// addons can each own an `enabled` setting without colliding.
    pub async fn register(&self, session: Arc<Session>, engine: &Engine) -> Result<(), EngineError> {
        let mut defaults = Vec::with_capacity(self.default_options.len());
        for opt in &self.default_options {
            let prefixed = format!("{}.{}", self.name, opt.key);
            defaults.push((prefixed, opt.value.clone(), opt.kind, opt.readonly));
        }
        session.options().set_defaults(defaults);

        if let Some(on_register) = &self.on_register {
            on_register(session.clone())
                .await
                .map_err(|reason| EngineError::InitializeFailed {
                    service: format!("addon:{}", self.name),
                    reason,
                })?;
        }

        for (scope, key) in &self.events {
            engine.declare_event(scope, key);
        }

        for service in self.services.clone() {
            engine.register(service)?;
        }

        if let Some(api) = self.api.clone() {
            session.register_api(self.name.clone(), api);
        }

        Ok(())
    }
}

#[cfg(test)]
#[path = "addon_tests.rs"]
mod tests;
