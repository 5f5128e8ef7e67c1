//! Production [`happy_collab::FlagParser`] over a parsed `clap::ArgMatches`
//! tree. The engine and its addons only ever see the trait; this module is
//! the one place in the workspace that knows about `clap`.

use clap::ArgMatches;
use happy_collab::{ActiveSet, FlagParser};

/// Wraps the top-level matches plus the leaf-first chain of subcommand
/// names used to reach them, so `get_active_sets` can walk back out to the
/// root without re-parsing argv.
pub struct ClapFlagParser {
    sets: Vec<ActiveSet>,
}

impl ClapFlagParser {
    /// Flatten `matches`' subcommand chain into leaf-first [`ActiveSet`]s.
    /// `root_name` labels the top-level set (the binary name).
    pub fn new(root_name: &str, matches: &ArgMatches) -> Self {
        let mut chain = Vec::new();
        collect(root_name, matches, &mut chain);
        chain.reverse();
        Self { sets: chain }
    }
}

fn collect(name: &str, matches: &ArgMatches, chain: &mut Vec<ActiveSet>) {
    let mut set = ActiveSet::new(name);
    for id in matches.ids() {
        let key = id.as_str();
        if let Ok(Some(value)) = matches.try_get_one::<String>(key) {
            set = set.with_arg(key, value.clone());
        } else if let Ok(Some(flag)) = matches.try_get_one::<bool>(key) {
            set = set.with_arg(key, flag.to_string());
        }
    }
    chain.push(set);
    if let Some((sub_name, sub_matches)) = matches.subcommand() {
        collect(sub_name, sub_matches, chain);
    }
}

impl FlagParser for ClapFlagParser {
    fn get_active_sets(&self) -> Vec<ActiveSet> {
        self.sets.clone()
    }
}

#[cfg(test)]
#[path = "flag_parser_tests.rs"]
mod tests;
