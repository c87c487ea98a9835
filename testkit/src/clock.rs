//! The virtual clock that drives time-based behavior under test.

use chrono::{DateTime, SecondsFormat, TimeDelta, Utc};

use crate::{Error, Result};

/// The test's notion of "now". Only ever moves forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VirtualClock {
    now: DateTime<Utc>,
}

impl VirtualClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self { now }
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.now
    }

    /// Applies `adjustment`, failing without changing the clock if the
    /// result lies in the past.
    pub fn adjust(&mut self, adjustment: &dyn TimeAdjustment) -> Result<DateTime<Utc>> {
        let to = adjustment.step(self.now);
        if to < self.now {
            return Err(Error::ReverseTime { from: self.now, to });
        }
        self.now = to;
        Ok(to)
    }
}

/// Describes how to move the virtual clock.
pub trait TimeAdjustment: Send + Sync {
    /// Computes the new time from the current one.
    fn step(&self, now: DateTime<Utc>) -> DateTime<Utc>;

    /// Human-readable description, such as "by 3s" or "to 2024-01-01T00:00:00Z".
    fn description(&self) -> String;
}

/// Moves the clock to a fixed point in time.
#[derive(Debug, Clone, Copy)]
pub struct ToTime(DateTime<Utc>);

impl TimeAdjustment for ToTime {
    fn step(&self, _now: DateTime<Utc>) -> DateTime<Utc> {
        self.0
    }

    fn description(&self) -> String {
        format!("to {}", format_time(&self.0))
    }
}

/// Moves the clock forward by a fixed duration.
#[derive(Debug, Clone, Copy)]
pub struct ByDuration(TimeDelta);

impl TimeAdjustment for ByDuration {
    fn step(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now + self.0
    }

    fn description(&self) -> String {
        format!("by {}", format_duration(self.0))
    }
}

pub fn to_time(t: DateTime<Utc>) -> ToTime {
    ToTime(t)
}

/// # Panics
///
/// Panics if `d` is negative.
pub fn by_duration(d: TimeDelta) -> ByDuration {
    if d < TimeDelta::zero() {
        panic!("by_duration(): duration must not be negative, got {}", format_duration(d));
    }
    ByDuration(d)
}

/// Formats a time as RFC 3339, without fractional seconds when they are zero.
pub fn format_time(t: &DateTime<Utc>) -> String {
    t.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

/// Formats a duration compactly, such as "3s", "1m30s", "2h" or "250ms".
pub fn format_duration(d: TimeDelta) -> String {
    let ms = d.num_milliseconds();
    if ms < 0 {
        return format!("-{}", format_duration(-d));
    }
    if ms == 0 {
        return "0s".to_owned();
    }
    if ms < 1000 {
        return format!("{ms}ms");
    }

    let hours = ms / 3_600_000;
    let minutes = ms % 3_600_000 / 60_000;
    let seconds = ms % 60_000 / 1000;
    let millis = ms % 1000;

    let mut out = String::new();
    if hours > 0 {
        out.push_str(&format!("{hours}h"));
    }
    if minutes > 0 || (hours > 0 && (seconds > 0 || millis > 0)) {
        out.push_str(&format!("{minutes}m"));
    }
    if millis > 0 {
        let fraction = format!("{millis:03}");
        out.push_str(&format!("{seconds}.{}s", fraction.trim_end_matches('0')));
    } else if seconds > 0 {
        out.push_str(&format!("{seconds}s"));
    }
    out
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
    }

    #[test]
    fn durations_format_compactly() {
        assert_eq!(format_duration(TimeDelta::seconds(3)), "3s");
        assert_eq!(format_duration(TimeDelta::seconds(90)), "1m30s");
        assert_eq!(format_duration(TimeDelta::hours(2)), "2h");
        assert_eq!(format_duration(TimeDelta::seconds(3601)), "1h0m1s");
        assert_eq!(format_duration(TimeDelta::milliseconds(1500)), "1.5s");
        assert_eq!(format_duration(TimeDelta::milliseconds(250)), "250ms");
        assert_eq!(format_duration(TimeDelta::zero()), "0s");
    }

    #[test]
    fn adjustments_describe_themselves() {
        assert_eq!(by_duration(TimeDelta::seconds(3)).description(), "by 3s");
        assert_eq!(to_time(start()).description(), "to 2024-01-01T00:00:00Z");
    }

    #[test]
    fn clock_moves_forward() {
        let mut clock = VirtualClock::new(start());
        let now = clock.adjust(&by_duration(TimeDelta::minutes(5))).unwrap();
        assert_eq!(now, start() + TimeDelta::minutes(5));
        assert_eq!(clock.now(), now);
    }

    #[test]
    fn reversing_time_fails_without_changing_the_clock() {
        let mut clock = VirtualClock::new(start());
        let past = start() - TimeDelta::seconds(1);
        let err = clock.adjust(&to_time(past)).unwrap_err();
        assert_eq!(
            err.to_string(),
            "adjusting the clock to 2023-12-31T23:59:59Z would reverse time"
        );
        assert_eq!(clock.now(), start());
    }

    #[test]
    #[should_panic(expected = "duration must not be negative")]
    fn negative_durations_panic() {
        by_duration(TimeDelta::seconds(-3));
    }
}
