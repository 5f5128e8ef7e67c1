//! Narrow banner/version print path. A full templated banner system is out
//! of scope; this gives `--version` a concrete callsite.

use crate::color::{codes, fg256, should_colorize, RESET};

pub fn version_line() -> String {
    format!("happy {}", env!("CARGO_PKG_VERSION"))
}

/// Printed for bare `--version`. Colorized unless `--no-color`/`NO_COLOR`
/// disables it or stdout isn't a TTY.
pub fn print_version(no_color: bool) {
    if !no_color && should_colorize() {
        println!("{}{}{}", fg256(codes::HEADER), version_line(), RESET);
    } else {
        println!("{}", version_line());
    }
}

#[cfg(test)]
#[path = "banner_tests.rs"]
mod tests;
