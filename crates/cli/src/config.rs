//! Seeds an [`OptionStore`] from a TOML profile file (spec §10.3:
//! addon settings and profile preferences, keyed by a dotted path).
//! Core runtime state is never persisted here.

use happy_core::{OptionKind, OptionStore};
use happy_collab::Variable;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("reading {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("parsing {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },
}

/// Load `path` and merge each leaf value into `store` as a `setting`
/// default (never overriding a value already present), dotting nested
/// table keys (`[addon]\nkey = 1` becomes `addon.key`).
pub fn load_into(store: &OptionStore, path: &Path) -> Result<(), ConfigError> {
    let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.display().to_string(),
        source,
    })?;
    let parsed: toml::Value = raw.parse().map_err(|source| ConfigError::Parse {
        path: path.display().to_string(),
        source,
    })?;

    let mut defaults = Vec::new();
    flatten(String::new(), &parsed, &mut defaults);
    store.set_defaults(defaults);
    Ok(())
}

fn flatten(prefix: String, value: &toml::Value, out: &mut Vec<(String, Variable, OptionKind, bool)>) {
    match value {
        toml::Value::Table(table) => {
            for (key, val) in table {
                let dotted = if prefix.is_empty() {
                    key.clone()
                } else {
                    format!("{prefix}.{key}")
                };
                flatten(dotted, val, out);
            }
        }
        leaf if !prefix.is_empty() => {
            if let Some(variable) = leaf_to_variable(leaf) {
                out.push((prefix, variable, OptionKind::Setting, false));
            }
        }
        _ => {}
    }
}

fn leaf_to_variable(value: &toml::Value) -> Option<Variable> {
    match value {
        toml::Value::Boolean(b) => Some(Variable::Bool(*b)),
        toml::Value::Integer(i) => Some(Variable::Int(*i)),
        toml::Value::Float(f) => Some(Variable::Float(*f)),
        toml::Value::String(s) => Some(Variable::String(s.clone())),
        _ => None,
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
