//! Daemon-mode run schedule.

use std::str::FromStr;
use std::time::Duration;

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::config::parse_duration;

/// Minimum interval between runs (1 second).
pub const MIN_INTERVAL: Duration = Duration::from_secs(1);

/// Schedule parsing error.
#[derive(Debug, Error)]
#[error("invalid schedule '{input}': not a duration ({duration}) or cron expression ({cron})")]
pub struct ScheduleError {
    input: String,
    duration: String,
    cron: String,
}

/// When to start the next export run.
#[derive(Debug, Clone)]
pub enum Schedule {
    /// Fixed interval between runs.
    ///
    /// Interval is clamped to a minimum of 1 second.
    Interval(Duration),

    /// Cron expression: `sec min hour day month weekday` (6-field).
    /// Example: `"0 0 * * * *"` = every hour at minute 0
    Cron {
        expr: String,
        schedule: Box<cron::Schedule>,
    },
}

impl Schedule {
    /// Create an interval schedule.
    ///
    /// Interval is clamped to a minimum of 1 second.
    pub fn interval(duration: Duration) -> Self {
        if duration < MIN_INTERVAL {
            tracing::warn!(min_interval = ?MIN_INTERVAL,
                "Interval duration is less than minimum allowed. Using minimum duration."
            );
            Self::Interval(MIN_INTERVAL)
        } else {
            Self::Interval(duration)
        }
    }

    /// Create a cron schedule with immediate validation.
    ///
    /// # Errors
    /// Returns the cron parser's message if the expression is invalid.
    pub fn cron(expr: impl AsRef<str>) -> Result<Self, String> {
        let expr = expr.as_ref().trim();
        let schedule = cron::Schedule::from_str(expr).map_err(|e| e.to_string())?;
        Ok(Self::Cron {
            expr: expr.to_string(),
            schedule: Box::new(schedule),
        })
    }

    /// Parse `1h`-style durations first, then cron expressions.
    ///
    /// # Errors
    /// Returns `ScheduleError` if the input is neither.
    pub fn parse(input: &str) -> Result<Self, ScheduleError> {
        let duration = match parse_duration(input) {
            Ok(d) => return Ok(Self::interval(d)),
            Err(e) => e,
        };
        Self::cron(input).map_err(|cron| ScheduleError {
            input: input.to_string(),
            duration,
            cron,
        })
    }

    /// Delay from `now` until the next run should start.
    ///
    /// Returns `None` when a cron schedule has no future occurrence.
    pub fn next_delay(&self, now: DateTime<Utc>) -> Option<Duration> {
        match self {
            Self::Interval(d) => Some(*d),
            Self::Cron { schedule, .. } => {
                let next = schedule.after(&now).next()?;
                Some((next - now).to_std().unwrap_or(Duration::ZERO))
            }
        }
    }
}

impl FromStr for Schedule {
    type Err = ScheduleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl std::fmt::Display for Schedule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Interval(d) => write!(f, "every {}", humantime::format_duration(*d)),
            Self::Cron { expr, .. } => write!(f, "cron: {}", expr),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(secs: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(secs, 0).unwrap()
    }

    #[test]
    fn test_parse_interval() {
        let schedule = Schedule::parse("1h").unwrap();
        assert!(matches!(schedule, Schedule::Interval(d) if d == Duration::from_secs(3600)));
        assert_eq!(schedule.to_string(), "every 1h");
    }

    #[test]
    fn test_interval_clamped_to_minimum() {
        let schedule = Schedule::parse("100ms").unwrap();
        assert!(matches!(schedule, Schedule::Interval(d) if d == MIN_INTERVAL));
    }

    #[test]
    fn test_parse_cron() {
        let schedule: Schedule = "0 0 * * * *".parse().unwrap();
        assert!(matches!(schedule, Schedule::Cron { ref expr, .. } if expr == "0 0 * * * *"));
        assert_eq!(schedule.to_string(), "cron: 0 0 * * * *");
    }

    #[test]
    fn test_parse_invalid() {
        let err = Schedule::parse("every tuesday").unwrap_err();
        assert!(err.to_string().starts_with("invalid schedule 'every tuesday'"));
    }

    #[test]
    fn test_interval_next_delay() {
        let schedule = Schedule::interval(Duration::from_secs(90));
        assert_eq!(schedule.next_delay(at(0)), Some(Duration::from_secs(90)));
    }

    #[test]
    fn test_cron_next_delay() {
        // 2023-11-14T22:13:20Z; next top of the hour is 23:00:00.
        let schedule = Schedule::cron("0 0 * * * *").unwrap();
        assert_eq!(
            schedule.next_delay(at(1_700_000_000)),
            Some(Duration::from_secs(46 * 60 + 40))
        );
    }

    #[test]
    fn test_cron_without_future_occurrence() {
        let schedule = Schedule::cron("0 0 0 1 1 * 2000").unwrap();
        assert_eq!(schedule.next_delay(at(1_700_000_000)), None);
    }
}
