//! Human-friendly duration literals.

use std::sync::OnceLock;

use regex::Regex;

use crate::error::{Error, Result};

// "30m", "3h", "3h30m", "2d", "1d3h", "1d3h30m" (1d = 24h)
fn duration_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(?:(\d+)d)?(?:(\d+)h)?(?:(\d+)m)?$").unwrap())
}

/// Parse a duration string into minutes. Empty, zero, and malformed
/// durations are errors.
pub fn parse_duration(input: &str) -> Result<i64> {
    let s = input.trim().to_lowercase();
    if s.is_empty() {
        return Err(Error::Validation("empty duration".into()));
    }

    let caps = duration_pattern().captures(&s).ok_or_else(|| {
        Error::Validation(format!(
            "invalid duration format '{s}' (expected e.g. 30m, 3h, 1d3h30m)"
        ))
    })?;

    let part = |idx: usize| -> i64 {
        caps.get(idx)
            .and_then(|m| m.as_str().parse().ok())
            .unwrap_or(0)
    };

    let total = part(1) * 24 * 60 + part(2) * 60 + part(3);
    if total <= 0 {
        return Err(Error::Validation("duration must be positive".into()));
    }

    Ok(total)
}

/// Render a minute count as "1h 30m", "1d 1h 0m", "30m".
pub fn format_minutes(minutes: i64) -> String {
    if minutes <= 0 {
        return "0m".to_string();
    }

    let days = minutes / (24 * 60);
    let rem = minutes % (24 * 60);
    let hours = rem / 60;
    let mins = rem % 60;

    let mut parts = Vec::new();
    if days > 0 {
        parts.push(format!("{days}d"));
    }
    if hours > 0 || days > 0 {
        parts.push(format!("{hours}h"));
    }
    parts.push(format!("{mins}m"));

    parts.join(" ")
}
