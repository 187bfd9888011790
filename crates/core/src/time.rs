use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::error::{Result, TracespecError};

pub fn parse_time_or_relative(input: &str) -> Result<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(input) {
        return Ok(ts.with_timezone(&Utc));
    }

    if let Ok(duration) = parse_duration_str(input) {
        return ago(duration);
    }

    Err(TracespecError::Parse(format!(
        "expected RFC3339 time or duration, got {input}"
    )))
}

pub fn parse_duration_str(input: &str) -> Result<Duration> {
    humantime::parse_duration(input)
        .map_err(|e| TracespecError::Parse(format!("invalid duration {input}: {e}")))
}

/// Cutoff for a lookback expressed in whole hours.
pub fn hours_ago(hours: u64) -> Result<DateTime<Utc>> {
    ago(Duration::from_secs(hours.saturating_mul(3600)))
}

fn ago(duration: Duration) -> Result<DateTime<Utc>> {
    let delta = chrono::Duration::from_std(duration)
        .map_err(|e| TracespecError::Parse(format!("failed to parse duration to chrono: {e}")))?;
    Utc::now()
        .checked_sub_signed(delta)
        .ok_or_else(|| TracespecError::Parse(format!("lookback out of range: {duration:?}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_rfc3339() {
        let ts = parse_time_or_relative("2026-01-01T00:00:00Z").unwrap();
        assert_eq!(ts.to_rfc3339(), "2026-01-01T00:00:00+00:00");
    }

    #[test]
    fn parses_duration() {
        let now = Utc::now();
        let ts = parse_time_or_relative("5m").unwrap();
        assert!(ts < now);
    }

    #[test]
    fn relative_input_goes_through_duration_parser() {
        assert_eq!(parse_duration_str("90m").unwrap(), Duration::from_secs(5400));
        let cutoff = parse_time_or_relative("90m").unwrap();
        let elapsed = Utc::now() - cutoff;
        assert!(elapsed >= chrono::Duration::minutes(89));
        assert!(elapsed < chrono::Duration::minutes(91));
    }

    #[test]
    fn rejects_invalid() {
        assert!(parse_time_or_relative("nope").is_err());
        assert!(parse_duration_str("soon").is_err());
    }

    #[test]
    fn hours_ago_is_in_the_past() {
        let cutoff = hours_ago(1).unwrap();
        let elapsed = Utc::now() - cutoff;
        assert!(elapsed >= chrono::Duration::minutes(59));
        assert!(hours_ago(u64::MAX).is_err());
    }
}
