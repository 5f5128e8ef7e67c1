//! Flag parsing collaborator.
//!
//! The engine and addon command dispatch never depend on `clap` directly;
//! they depend on this trait. The production implementation lives in the
//! `happy` binary crate, which is free to build it on top of `clap` — this
//! crate stays dependency-free of any particular argument-parsing library.

use std::collections::HashMap;

/// One flag set in the leaf-first chain identifying the invoked command.
///
/// For `happy services restart --force web`, `GetActiveSets()` returns
/// `[restart, services, happy]` (leaf first), each carrying the flags/args
/// bound at that level.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ActiveSet {
    pub name: String,
    pub args: HashMap<String, String>,
}

impl ActiveSet {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            args: HashMap::new(),
        }
    }

    pub fn with_arg(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.args.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.args.get(key).map(|s| s.as_str())
    }
}

/// Per-command flag sets, argument extraction, subcommand dispatch.
pub trait FlagParser: Send + Sync + 'static {
    /// Leaf-first chain of flag sets identifying the invoked command, e.g.
    /// `[restart, services, happy]` for `happy services restart`.
    fn get_active_sets(&self) -> Vec<ActiveSet>;

    /// Look up a string-valued flag, searching the active sets leaf-first.
    fn get_string(&self, key: &str) -> Option<String> {
        self.get_active_sets()
            .iter()
            .find_map(|set| set.get(key).map(str::to_string))
    }

    /// Look up a boolean-valued flag; missing or unparsable defaults to `false`.
    fn get_bool(&self, key: &str) -> bool {
        self.get_string(key)
            .map(|v| v == "true" || v == "1")
            .unwrap_or(false)
    }
}

/// Test double: active sets are set up ahead of time rather than parsed from argv.
#[cfg(any(test, feature = "test-support"))]
#[derive(Debug, Clone, Default)]
pub struct FakeFlagParser {
    sets: Vec<ActiveSet>,
}

#[cfg(any(test, feature = "test-support"))]
impl FakeFlagParser {
    pub fn new(sets: Vec<ActiveSet>) -> Self {
        Self { sets }
    }
}

#[cfg(any(test, feature = "test-support"))]
impl FlagParser for FakeFlagParser {
    fn get_active_sets(&self) -> Vec<ActiveSet> {
        self.sets.clone()
    }
}

#[cfg(test)]
#[path = "flag_parser_tests.rs"]
mod tests;
