//! The typed scalar container ("variable library") consulted by
//! `OptionStore` whenever it needs to coerce a raw setting into something
//! typed, and handed back directly for `Get(key)` misses (a zero-typed
//! `Variable` rather than an error).
//!
//! Kept deliberately narrow: it offers the scalar kinds the core needs and
//! nothing of the full breadth a general-purpose value library might have.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use crate::duration_fmt::parse_duration;

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum VariableError {
    #[error("invalid variable key {key:?}: must match ^[a-z][a-z0-9_.-]*[a-z0-9]$")]
    InvalidKey { key: String },
    #[error("cannot parse {input:?} as {kind}")]
    ParseFailed { input: String, kind: String },
    #[error("unknown variable kind {kind:?}")]
    UnknownKind { kind: String },
    #[error("variable {name:?} is readonly")]
    Readonly { name: String },
}

/// A scalar value. Kinds track a `{bool, int*, uint*, float*, complex*,
/// string, bytes, runes, duration, map, array}` family, collapsed onto
/// Rust's native widths rather than reproducing every bit-width variant.
#[derive(Debug, Clone, PartialEq)]
pub enum Variable {
    Bool(bool),
    Int(i64),
    Uint(u64),
    Float(f64),
    String(String),
    Bytes(Vec<u8>),
    Duration(Duration),
    Array(Vec<Variable>),
    /// The zero value returned by a missing `Get(key)`.
    None,
}

impl Default for Variable {
    fn default() -> Self {
        Variable::None
    }
}

impl Variable {
    pub fn kind(&self) -> &'static str {
        match self {
            Variable::Bool(_) => "bool",
            Variable::Int(_) => "int",
            Variable::Uint(_) => "uint",
            Variable::Float(_) => "float",
            Variable::String(_) => "string",
            Variable::Bytes(_) => "bytes",
            Variable::Duration(_) => "duration",
            Variable::Array(_) => "array",
            Variable::None => "none",
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Variable::None)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Variable::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Variable::String(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Variable::Int(i) => Some(*i),
            Variable::Uint(u) => i64::try_from(*u).ok(),
            _ => None,
        }
    }

    pub fn as_duration(&self) -> Option<Duration> {
        match self {
            Variable::Duration(d) => Some(*d),
            _ => None,
        }
    }

    /// Parse a string into a `Variable` of the requested kind.
    ///
    /// `kind` is one of `bool`, `int`, `uint`, `float`, `string`, `duration`.
    pub fn parse(kind: &str, input: &str) -> Result<Variable, VariableError> {
        match kind {
            "bool" => input
                .parse::<bool>()
                .map(Variable::Bool)
                .map_err(|_| VariableError::ParseFailed {
                    input: input.to_string(),
                    kind: "bool".to_string(),
                }),
            "int" => input
                .parse::<i64>()
                .map(Variable::Int)
                .map_err(|_| VariableError::ParseFailed {
                    input: input.to_string(),
                    kind: "int".to_string(),
                }),
            "uint" => input
                .parse::<u64>()
                .map(Variable::Uint)
                .map_err(|_| VariableError::ParseFailed {
                    input: input.to_string(),
                    kind: "uint".to_string(),
                }),
            "float" => input
                .parse::<f64>()
                .map(Variable::Float)
                .map_err(|_| VariableError::ParseFailed {
                    input: input.to_string(),
                    kind: "float".to_string(),
                }),
            "string" => Ok(Variable::String(input.to_string())),
            "duration" => parse_duration(input)
                .map(Variable::Duration)
                .map_err(|_| VariableError::ParseFailed {
                    input: input.to_string(),
                    kind: "duration".to_string(),
                }),
            other => Err(VariableError::UnknownKind {
                kind: other.to_string(),
            }),
        }
    }

    /// Build a `Variable` directly from a Rust scalar.
    pub fn new_value<T: Into<Variable>>(value: T) -> Variable {
        value.into()
    }
}

impl From<bool> for Variable {
    fn from(v: bool) -> Self {
        Variable::Bool(v)
    }
}
impl From<i64> for Variable {
    fn from(v: i64) -> Self {
        Variable::Int(v)
    }
}
impl From<u64> for Variable {
    fn from(v: u64) -> Self {
        Variable::Uint(v)
    }
}
impl From<f64> for Variable {
    fn from(v: f64) -> Self {
        Variable::Float(v)
    }
}
impl From<String> for Variable {
    fn from(v: String) -> Self {
        Variable::String(v)
    }
}
impl From<&str> for Variable {
    fn from(v: &str) -> Self {
        Variable::String(v.to_string())
    }
}
impl From<Duration> for Variable {
    fn from(v: Duration) -> Self {
        Variable::Duration(v)
    }
}

/// Validate a variable key against `^[a-z][a-z0-9_.-]*[a-z0-9]$`, after trimming.
pub fn validate_key(key: &str) -> Result<String, VariableError> {
    let trimmed = key.trim();
    let bytes = trimmed.as_bytes();
    let valid = !bytes.is_empty()
        && bytes[0].is_ascii_lowercase()
        && bytes.last().is_some_and(|b| b.is_ascii_lowercase() || b.is_ascii_digit())
        && bytes
            .iter()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || matches!(b, b'_' | b'.' | b'-'));
    if valid {
        Ok(trimmed.to_string())
    } else {
        Err(VariableError::InvalidKey {
            key: key.to_string(),
        })
    }
}

/// A single named, typed slot. The collaborator trait the core consumes
/// instead of reaching into `VariableMap`'s storage directly: `new` pins a
/// name and an initial value, optionally as readonly, and every later `set`
/// on a readonly instance is rejected rather than silently applied.
pub trait VariableLibrary: Send + Sync + 'static {
    /// Construct a named variable. Fails if `name` doesn't pass [`validate_key`].
    fn new(name: &str, value: Variable, readonly: bool) -> Result<Self, VariableError>
    where
        Self: Sized;

    fn name(&self) -> &str;
    fn get(&self) -> Variable;
    fn is_readonly(&self) -> bool;

    /// Replace the stored value. Errors with [`VariableError::Readonly`] if
    /// this instance was constructed with `readonly: true`.
    fn set(&self, value: Variable) -> Result<(), VariableError>;
}

/// Production `VariableLibrary`: a validated name, a fixed readonly flag, and
/// the current value behind a `parking_lot::RwLock` — matching the teacher's
/// own preference for `parking_lot` over heavier concurrency primitives.
pub struct NamedVariable {
    name: String,
    readonly: bool,
    value: RwLock<Variable>,
}

impl VariableLibrary for NamedVariable {
    fn new(name: &str, value: Variable, readonly: bool) -> Result<Self, VariableError> {
        let name = validate_key(name)?;
        Ok(Self {
            name,
            readonly,
            value: RwLock::new(value),
        })
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn get(&self) -> Variable {
        self.value.read().clone()
    }

    fn is_readonly(&self) -> bool {
        self.readonly
    }

    fn set(&self, value: Variable) -> Result<(), VariableError> {
        if self.readonly {
            return Err(VariableError::Readonly {
                name: self.name.clone(),
            });
        }
        *self.value.write() = value;
        Ok(())
    }
}

/// Concurrent map of validated keys to [`NamedVariable`] slots, wrapping a
/// `parking_lot::RwLock<HashMap<..>>` rather than pulling in a lock-free
/// concurrent-map crate.
#[derive(Default)]
pub struct VariableMap {
    inner: RwLock<HashMap<String, Arc<dyn VariableLibrary>>>,
}

impl VariableMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a fresh variable, replacing any prior entry under `key`
    /// regardless of its readonly state — this is the constructor path, not
    /// an update.
    pub fn declare(
        &self,
        key: &str,
        value: Variable,
        readonly: bool,
    ) -> Result<(), VariableError> {
        let variable = NamedVariable::new(key, value, readonly)?;
        let key = variable.name().to_string();
        self.inner.write().insert(key, Arc::new(variable));
        Ok(())
    }

    /// Set `key` to `value`. An existing readonly entry rejects the write;
    /// a missing key is declared fresh as read/write.
    pub fn store(&self, key: &str, value: Variable) -> Result<(), VariableError> {
        let key = validate_key(key)?;
        let existing = self.inner.read().get(&key).cloned();
        match existing {
            Some(variable) => variable.set(value),
            None => {
                let variable = NamedVariable::new(&key, value, false)?;
                self.inner.write().insert(key, Arc::new(variable));
                Ok(())
            }
        }
    }

    pub fn load(&self, key: &str) -> Variable {
        self.inner
            .read()
            .get(key)
            .map(|v| v.get())
            .unwrap_or(Variable::None)
    }

    pub fn load_and_delete(&self, key: &str) -> Variable {
        self.inner
            .write()
            .remove(key)
            .map(|v| v.get())
            .unwrap_or(Variable::None)
    }

    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Visit every (key, value) pair. `f` returning `false` stops iteration early.
    pub fn range<F: FnMut(&str, &Variable) -> bool>(&self, mut f: F) {
        for (k, v) in self.inner.read().iter() {
            if !f(k, &v.get()) {
                break;
            }
        }
    }

    /// All entries whose key starts with `prefix`, sorted by key.
    pub fn load_with_prefix(&self, prefix: &str) -> Vec<(String, Variable)> {
        let mut out: Vec<(String, Variable)> = self
            .inner
            .read()
            .iter()
            .filter(|(k, _)| k.starts_with(prefix))
            .map(|(k, v)| (k.clone(), v.get()))
            .collect();
        out.sort_by(|a, b| a.0.cmp(&b.0));
        out
    }
}

#[cfg(test)]
#[path = "variable_tests.rs"]
mod tests;
