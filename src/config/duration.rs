// src/config/duration.rs

use std::time::Duration;

/// Accepted suffixes and their length in milliseconds. `ms` must come before
/// `s` and `m` since it ends with one and starts with the other.
const UNITS: [(&str, u64); 4] = [("ms", 1), ("h", 3_600_000), ("m", 60_000), ("s", 1_000)];

/// Parse a duration string like `"250ms"`, `"3s"`, `"2m"` or `"1h"`.
///
/// A bare number without a unit is rejected so that `"3"` can't silently
/// mean three milliseconds to one reader and three seconds to another.
pub fn parse_duration(s: &str) -> Result<Duration, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("empty duration string".to_string());
    }
    if s.ends_with(|c: char| c.is_ascii_digit()) {
        return Err(format!("duration '{s}' is missing a unit suffix"));
    }

    let (amount, millis_per_unit) = UNITS
        .iter()
        .find_map(|(suffix, millis)| s.strip_suffix(suffix).map(|rest| (rest.trim(), *millis)))
        .ok_or_else(|| format!("unsupported unit in duration '{s}'; expected ms, s, m or h"))?;

    let amount: u64 = amount
        .parse()
        .map_err(|e| format!("invalid number in duration '{s}': {e}"))?;

    amount
        .checked_mul(millis_per_unit)
        .map(Duration::from_millis)
        .ok_or_else(|| format!("duration '{s}' is too large"))
}
