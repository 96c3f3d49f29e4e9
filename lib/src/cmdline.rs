//! Helpers for `key=value` tokens on a boot-style command line.
//!
//! Tokens are separated by ASCII whitespace. Parsers never fail: a value
//! that does not parse leaves the caller's current setting alone.

/// Iterate `(key, value)` pairs. Tokens without `=` yield an empty value.
pub fn tokens(cmdline: &str) -> impl Iterator<Item = (&str, &str)> {
    cmdline
        .split_ascii_whitespace()
        .map(|token| token.split_once('=').unwrap_or((token, "")))
}

/// Parse the usual boolean spellings, falling back to `current`.
pub fn parse_on_off(value: &str, current: bool) -> bool {
    const ON: [&str; 5] = ["on", "true", "yes", "enabled", "1"];
    const OFF: [&str; 5] = ["off", "false", "no", "disabled", "0"];
    if ON.iter().any(|v| value.eq_ignore_ascii_case(v)) {
        true
    } else if OFF.iter().any(|v| value.eq_ignore_ascii_case(v)) {
        false
    } else {
        current
    }
}

/// Parse a positive decimal number that fits in `i16`, else `current`.
pub fn parse_dimension(value: &str, current: i16) -> i16 {
    match value.parse::<i16>() {
        Ok(v) if v > 0 => v,
        _ => current,
    }
}
