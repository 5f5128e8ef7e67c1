//! Canonical identifier for hosts, instances, and services:
//! `happy://<host>/<instance>[/service/<name>]`.

use crate::error::Error;
use serde::{Deserialize, Serialize};
use std::fmt;

const SCHEME: &str = "happy://";

/// A URL-like identifier. Constructed once per service registration (or
/// once as the process's own identity via [`Address::current`]), then
/// immutable.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Address {
    host: String,
    instance: String,
    service: Option<String>,
}

impl Address {
    /// Build an Address directly from parts, skipping string parsing.
    /// `instance` must be non-empty; this is an internal constructor used
    /// by `Parse`/`Current`/`ResolveService`, which all uphold the invariant.
    fn from_parts(host: String, instance: String, service: Option<String>) -> Result<Self, Error> {
        if instance.is_empty() {
            return Err(Error::Addr("instance must be non-empty".to_string()));
        }
        Ok(Self {
            host,
            instance,
            service,
        })
    }

    /// Parse `happy://<host>/<instance>[/service/<name>]`.
    ///
    /// A raw reference beginning with the scheme is absolute. Malformed
    /// input fails with [`Error::Addr`]; this never panics.
    pub fn parse(raw: &str) -> Result<Self, Error> {
        let rest = raw.strip_prefix(SCHEME).ok_or_else(|| {
            Error::Addr(format!("address {raw:?} does not start with {SCHEME:?}"))
        })?;

        let mut parts = rest.splitn(2, '/');
        let host = parts
            .next()
            .filter(|h| !h.is_empty())
            .ok_or_else(|| Error::Addr(format!("address {raw:?} has no host")))?
            .to_string();

        let path = parts.next().unwrap_or("");
        let mut segments = path.split('/').filter(|s| !s.is_empty());

        let instance = segments
            .next()
            .ok_or_else(|| Error::Addr(format!("address {raw:?} has no instance")))?
            .to_string();

        let service = match (segments.next(), segments.next()) {
            (None, None) => None,
            (Some("service"), Some(name)) if !name.is_empty() => Some(name.to_string()),
            _ => {
                return Err(Error::Addr(format!(
                    "address {raw:?} must match /<instance>/service/<name>"
                )))
            }
        };

        Self::from_parts(host, instance, service)
    }

    /// The process's own identity, derived from the hostname and the
    /// running binary's name. Falls back to stable defaults rather than
    /// failing, since this always needs to succeed at session construction.
    pub fn current() -> Self {
        let host = std::env::var("HOSTNAME")
            .ok()
            .filter(|h| !h.is_empty())
            .unwrap_or_else(|| "localhost".to_string());
        let instance = std::env::current_exe()
            .ok()
            .and_then(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()))
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| "happy".to_string());
        Self {
            host,
            instance,
            service: None,
        }
    }

    /// Resolve `name` to a service Address under this Address's host/instance.
    ///
    /// Rejects names that would resolve outside `/<instance>/service/` —
    /// in particular empty names and names containing a path separator.
    pub fn resolve_service(&self, name: &str) -> Result<Self, Error> {
        if name.is_empty() || name.contains('/') {
            return Err(Error::Addr(format!(
                "service name {name:?} would resolve outside /{}/service/",
                self.instance
            )));
        }
        Self::from_parts(self.host.clone(), self.instance.clone(), Some(name.to_string()))
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn instance(&self) -> &str {
        &self.instance
    }

    pub fn service(&self) -> Option<&str> {
        self.service.as_deref()
    }

    pub fn is_service(&self) -> bool {
        self.service.is_some()
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{SCHEME}{}/{}", self.host, self.instance)?;
        if let Some(service) = &self.service {
            write!(f, "/service/{service}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "address_tests.rs"]
mod tests;
