//! Duration parsing utilities.

use std::time::Duration;

use anyhow::{bail, Context};

/// Parse a duration string like "1h", "30m", "300s", "300" into seconds.
///
/// Plain numbers are seconds.
pub fn parse_duration_to_secs(s: &str) -> anyhow::Result<i64> {
    let s = s.trim();
    if s.is_empty() {
        bail!("Empty duration string");
    }

    for (suffix, unit, multiplier) in [('h', "hours", 3600), ('m', "minutes", 60), ('s', "seconds", 1)] {
        if let Some(num_str) = s.strip_suffix(suffix) {
            let value: i64 = num_str
                .parse()
                .with_context(|| format!("Invalid {unit} value: {num_str}"))?;
            return Ok(value * multiplier);
        }
    }

    s.parse::<i64>()
        .with_context(|| format!("Invalid duration value: {s}"))
}

/// Parse a sync timeout; must be positive.
pub fn parse_timeout(s: &str) -> anyhow::Result<Duration> {
    let secs = parse_duration_to_secs(s)?;
    if secs <= 0 {
        bail!("Timeout must be positive, got {s}");
    }
    Ok(Duration::from_secs(secs as u64))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_duration_suffixes() {
        assert_eq!(parse_duration_to_secs("300").unwrap(), 300);
        assert_eq!(parse_duration_to_secs("30s").unwrap(), 30);
        assert_eq!(parse_duration_to_secs("5m").unwrap(), 300);
        assert_eq!(parse_duration_to_secs(" 1h ").unwrap(), 3600);
    }

    #[test]
    fn test_parse_duration_rejects_garbage() {
        assert!(parse_duration_to_secs("").is_err());
        let err = parse_duration_to_secs("xm").unwrap_err();
        assert_eq!(err.to_string(), "Invalid minutes value: x");
    }

    #[test]
    fn test_parse_timeout() {
        assert_eq!(parse_timeout("2m").unwrap(), Duration::from_secs(120));
        assert!(parse_timeout("0").is_err());
        assert!(parse_timeout("-5s").is_err());
    }
}
