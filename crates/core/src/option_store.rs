//! A mapping from dotted string keys to typed values, with three kinds per
//! entry (`config`, `setting`, `ephemeral`) and an optional per-key
//! validator.

use crate::error::Error;
use happy_collab::Variable;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

/// How an entry was intended to be used. The store doesn't enforce
/// different mutation rules per kind beyond `readonly` — `kind` is
/// informational: the `config`/`setting`/`ephemeral` split (process-wide vs.
/// user-tunable vs. scratch) exists for callers that want to filter or
/// render the store, e.g. a future `status` command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionKind {
    Config,
    Setting,
    Ephemeral,
}

pub type Validator = Arc<dyn Fn(&Variable) -> std::result::Result<(), String> + Send + Sync>;

struct Entry {
    kind: OptionKind,
    value: Variable,
    readonly: bool,
    assigned: bool,
    validator: Option<Validator>,
}

/// Reads are lock-free snapshots (shared read guard); writes take an
/// exclusive lock. When `schema_restricted` is set, `Set`/`Get` on a key
/// absent from the store is rejected unless a wildcard `*` validator has
/// been installed via [`OptionStore::set_wildcard_validator`].
pub struct OptionStore {
    entries: RwLock<HashMap<String, Entry>>,
    schema_restricted: bool,
    wildcard_validator: RwLock<Option<Validator>>,
}

impl Default for OptionStore {
    fn default() -> Self {
        Self::new(false)
    }
}

impl OptionStore {
    pub fn new(schema_restricted: bool) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            schema_restricted,
            wildcard_validator: RwLock::new(None),
        }
    }

    pub fn set_wildcard_validator(&self, validator: Validator) {
        *self.wildcard_validator.write() = Some(validator);
    }

    /// Declare `key` up front (e.g. from an addon's default-options schema),
    /// without going through the readonly/validation rules of [`Self::set`].
    pub fn declare(
        &self,
        key: impl Into<String>,
        value: Variable,
        kind: OptionKind,
        readonly: bool,
        validator: Option<Validator>,
    ) {
        self.entries.write().insert(
            key.into(),
            Entry {
                kind,
                value,
                readonly,
                assigned: false,
                validator,
            },
        );
    }

    pub fn set(&self, key: &str, val: Variable) -> std::result::Result<(), Error> {
        let mut entries = self.entries.write();
        match entries.get_mut(key) {
            Some(entry) => {
                if entry.readonly && entry.assigned {
                    return Err(Error::OptionReadonly {
                        key: key.to_string(),
                    });
                }
                if let Some(validator) = &entry.validator {
                    validator(&val).map_err(|reason| Error::OptionValidation {
                        key: key.to_string(),
                        reason,
                    })?;
                }
                entry.value = val;
                entry.assigned = true;
                Ok(())
            }
            None => {
                if self.schema_restricted {
                    let wildcard = self.wildcard_validator.read().clone();
                    let Some(validator) = wildcard else {
                        return Err(Error::OptionUnknownKey {
                            key: key.to_string(),
                        });
                    };
                    validator(&val).map_err(|reason| Error::OptionValidation {
                        key: key.to_string(),
                        reason,
                    })?;
                }
                entries.insert(
                    key.to_string(),
                    Entry {
                        kind: OptionKind::Setting,
                        value: val,
                        readonly: false,
                        assigned: true,
                        validator: None,
                    },
                );
                Ok(())
            }
        }
    }

    /// Returns a zero-typed [`Variable`] when `key` is missing.
    pub fn get(&self, key: &str) -> Variable {
        self.entries
            .read()
            .get(key)
            .map(|e| e.value.clone())
            .unwrap_or(Variable::None)
    }

    pub fn has(&self, key: &str) -> bool {
        self.entries.read().contains_key(key)
    }

    pub fn kind_of(&self, key: &str) -> Option<OptionKind> {
        self.entries.read().get(key).map(|e| e.kind)
    }

    /// Write each default whose key is not yet present.
    pub fn set_defaults(&self, defaults: impl IntoIterator<Item = (String, Variable, OptionKind, bool)>) {
        let mut entries = self.entries.write();
        for (key, value, kind, readonly) in defaults {
            entries.entry(key).or_insert(Entry {
                kind,
                value,
                readonly,
                assigned: false,
                validator: None,
            });
        }
    }
}

#[cfg(test)]
#[path = "option_store_tests.rs"]
mod tests;
