//! Small duration string parser shared by the cron library and the option
//! store's duration-typed entries (e.g. `app.throttle.ticks`, `"30m"`, `"6h"`).

use std::time::Duration;

/// Parse a duration string like `"30s"`, `"5m"`, `"1h"`, `"100us"` into a [`Duration`].
///
/// A bare number with no suffix is interpreted as whole seconds.
pub fn parse_duration(s: &str) -> Result<Duration, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("empty duration string".to_string());
    }

    let (num_str, suffix) = s
        .char_indices()
        .find(|(_, c)| !c.is_ascii_digit())
        .map(|(i, _)| (&s[..i], &s[i..]))
        .unwrap_or((s, ""));

    let num: u64 = num_str
        .parse()
        .map_err(|_| format!("invalid number in duration: {s}"))?;

    let suffix = suffix.trim();
    match suffix {
        "ns" => Ok(Duration::from_nanos(num)),
        "us" | "\u{3bc}s" => Ok(Duration::from_micros(num)),
        "ms" | "millis" | "millisecond" | "milliseconds" => Ok(Duration::from_millis(num)),
        "" | "s" | "sec" | "secs" | "second" | "seconds" => Ok(Duration::from_secs(num)),
        "m" | "min" | "mins" | "minute" | "minutes" => Ok(Duration::from_secs(num * 60)),
        "h" | "hr" | "hrs" | "hour" | "hours" => Ok(Duration::from_secs(num * 3600)),
        "d" | "day" | "days" => Ok(Duration::from_secs(num * 86400)),
        other => Err(format!("unknown duration suffix: {other}")),
    }
}

#[cfg(test)]
#[path = "duration_fmt_tests.rs"]
mod tests;
