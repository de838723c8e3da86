// Countdown to a contest's lock time.

use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::config::CountdownSection;

const MS_PER_SECOND: i64 = 1000;
const MS_PER_MINUTE: i64 = 60 * MS_PER_SECOND;
const MS_PER_HOUR: i64 = 60 * MS_PER_MINUTE;
const MS_PER_DAY: i64 = 24 * MS_PER_HOUR;

/// At or below this many minutes the countdown is critical.
pub const CRITICAL_MINUTES: i64 = 60;
/// At or below this many minutes the countdown is urgent.
pub const URGENT_MINUTES: i64 = 24 * 60;

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CountdownFormat {
    /// `1d 2h 3m`
    #[default]
    Compact,
    /// `1 day, 2 hours, 3 minutes`
    Verbose,
}

impl CountdownFormat {
    /// Parse a config value. Unknown values fall back to compact.
    pub fn parse(value: &str) -> Self {
        match value {
            "verbose" => CountdownFormat::Verbose,
            _ => CountdownFormat::Compact,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CountdownOptions {
    pub show_days: bool,
    pub show_hours: bool,
    pub show_minutes: bool,
    pub show_seconds: bool,
    pub format: CountdownFormat,
    pub update_interval: Duration,
}

impl Default for CountdownOptions {
    fn default() -> Self {
        CountdownOptions {
            show_days: true,
            show_hours: true,
            show_minutes: true,
            show_seconds: true,
            format: CountdownFormat::Compact,
            update_interval: Duration::from_secs(1),
        }
    }
}

impl From<&CountdownSection> for CountdownOptions {
    fn from(section: &CountdownSection) -> Self {
        CountdownOptions {
            show_seconds: section.show_seconds,
            format: CountdownFormat::parse(&section.format),
            update_interval: Duration::from_millis(section.update_interval_ms),
            ..CountdownOptions::default()
        }
    }
}

// ---------------------------------------------------------------------------
// TimeUnits
// ---------------------------------------------------------------------------

/// A non-negative distance broken into whole units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TimeUnits {
    pub days: i64,
    pub hours: i64,
    pub minutes: i64,
    pub seconds: i64,
}

impl TimeUnits {
    pub fn from_millis(distance: i64) -> Self {
        let distance = distance.max(0);
        TimeUnits {
            days: distance / MS_PER_DAY,
            hours: (distance % MS_PER_DAY) / MS_PER_HOUR,
            minutes: (distance % MS_PER_HOUR) / MS_PER_MINUTE,
            seconds: (distance % MS_PER_MINUTE) / MS_PER_SECOND,
        }
    }

    pub fn total_minutes(&self) -> i64 {
        self.days * 24 * 60 + self.hours * 60 + self.minutes
    }
}

// ---------------------------------------------------------------------------
// Urgency
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Urgency {
    Normal,
    Urgent,
    Critical,
    Expired,
}

impl Urgency {
    pub fn for_units(units: &TimeUnits) -> Self {
        let minutes = units.total_minutes();
        if minutes <= CRITICAL_MINUTES {
            Urgency::Critical
        } else if minutes <= URGENT_MINUTES {
            Urgency::Urgent
        } else {
            Urgency::Normal
        }
    }
}

// ---------------------------------------------------------------------------
// Countdown
// ---------------------------------------------------------------------------

/// What to display for a countdown at one instant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CountdownView {
    pub text: String,
    pub urgency: Urgency,
}

impl CountdownView {
    pub fn is_expired(&self) -> bool {
        self.urgency == Urgency::Expired
    }
}

#[derive(Debug, Clone)]
pub struct Countdown {
    target: DateTime<Utc>,
    options: CountdownOptions,
}

impl Countdown {
    pub fn new(target: DateTime<Utc>, options: CountdownOptions) -> Self {
        Countdown { target, options }
    }

    pub fn target(&self) -> DateTime<Utc> {
        self.target
    }

    pub fn update_interval(&self) -> Duration {
        self.options.update_interval
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.target < now
    }

    pub fn render(&self, now: DateTime<Utc>) -> CountdownView {
        let distance = (self.target - now).num_milliseconds();
        if distance < 0 {
            return CountdownView {
                text: "Expired".to_string(),
                urgency: Urgency::Expired,
            };
        }

        let units = TimeUnits::from_millis(distance);
        let text = match self.options.format {
            CountdownFormat::Compact => self.compact(&units),
            CountdownFormat::Verbose => self.verbose(&units),
        };
        CountdownView {
            text,
            urgency: Urgency::for_units(&units),
        }
    }

    /// Units to show, as `(value, compact suffix, verbose noun)`.
    fn visible_parts(&self, u: &TimeUnits) -> Vec<(i64, &'static str, &'static str)> {
        let opts = &self.options;
        let mut parts = Vec::with_capacity(4);
        if opts.show_days && u.days > 0 {
            parts.push((u.days, "d", "day"));
        }
        if opts.show_hours && (u.hours > 0 || u.days > 0) {
            parts.push((u.hours, "h", "hour"));
        }
        if opts.show_minutes && (u.minutes > 0 || u.hours > 0 || u.days > 0) {
            parts.push((u.minutes, "m", "minute"));
        }
        if opts.show_seconds && u.days == 0 {
            parts.push((u.seconds, "s", "second"));
        }
        parts
    }

    fn compact(&self, units: &TimeUnits) -> String {
        let parts: Vec<String> = self
            .visible_parts(units)
            .into_iter()
            .map(|(value, suffix, _)| format!("{value}{suffix}"))
            .collect();
        if parts.is_empty() {
            "0s".to_string()
        } else {
            parts.join(" ")
        }
    }

    fn verbose(&self, units: &TimeUnits) -> String {
        let parts: Vec<String> = self
            .visible_parts(units)
            .into_iter()
            .map(|(value, _, noun)| {
                let plural = if value == 1 { "" } else { "s" };
                format!("{value} {noun}{plural}")
            })
            .collect();
        if parts.is_empty() {
            "0 seconds".to_string()
        } else {
            parts.join(", ")
        }
    }
}

/// Short relative time used on contest cards.
pub fn time_until(target: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let diff = (target - now).num_milliseconds();
    if diff <= 0 {
        return "Expired".to_string();
    }
    let u = TimeUnits::from_millis(diff);
    if u.days > 0 {
        format!("{}d {}h", u.days, u.hours)
    } else if u.hours > 0 {
        format!("{}h {}m", u.hours, u.minutes)
    } else {
        format!("{}m", u.minutes)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 19, 12, 0, 0).unwrap()
    }

    fn countdown(offset: chrono::Duration, format: CountdownFormat) -> CountdownView {
        let options = CountdownOptions {
            format,
            ..CountdownOptions::default()
        };
        Countdown::new(now() + offset, options).render(now())
    }

    #[test]
    fn time_units_split() {
        let ms = MS_PER_DAY + 2 * MS_PER_HOUR + 3 * MS_PER_MINUTE + 4 * MS_PER_SECOND + 999;
        assert_eq!(
            TimeUnits::from_millis(ms),
            TimeUnits { days: 1, hours: 2, minutes: 3, seconds: 4 }
        );
    }

    #[test]
    fn compact_hides_seconds_when_days_remain() {
        let view = countdown(
            chrono::Duration::days(1) + chrono::Duration::hours(2) + chrono::Duration::minutes(3),
            CountdownFormat::Compact,
        );
        assert_eq!(view.text, "1d 2h 3m");
        assert_eq!(view.urgency, Urgency::Normal);
    }

    #[test]
    fn compact_shows_zero_hours_when_days_remain() {
        let view = countdown(
            chrono::Duration::days(2) + chrono::Duration::minutes(5),
            CountdownFormat::Compact,
        );
        assert_eq!(view.text, "2d 0h 5m");
    }

    #[test]
    fn compact_under_a_minute_is_seconds_only() {
        let view = countdown(chrono::Duration::seconds(42), CountdownFormat::Compact);
        assert_eq!(view.text, "42s");
        assert_eq!(view.urgency, Urgency::Critical);
    }

    #[test]
    fn compact_zero_distance() {
        let view = countdown(chrono::Duration::zero(), CountdownFormat::Compact);
        assert_eq!(view.text, "0s");
        assert!(!view.is_expired());
    }

    #[test]
    fn verbose_pluralises() {
        let view = countdown(
            chrono::Duration::hours(1) + chrono::Duration::minutes(2) + chrono::Duration::seconds(1),
            CountdownFormat::Verbose,
        );
        assert_eq!(view.text, "1 hour, 2 minutes, 1 second");
        assert_eq!(view.urgency, Urgency::Urgent);
    }

    #[test]
    fn verbose_empty_when_all_units_hidden() {
        let options = CountdownOptions {
            show_seconds: false,
            format: CountdownFormat::Verbose,
            ..CountdownOptions::default()
        };
        let view = Countdown::new(now() + chrono::Duration::seconds(10), options).render(now());
        assert_eq!(view.text, "0 seconds");
    }

    #[test]
    fn past_target_is_expired() {
        let view = countdown(-chrono::Duration::seconds(1), CountdownFormat::Compact);
        assert_eq!(view.text, "Expired");
        assert!(view.is_expired());
    }

    #[test]
    fn urgency_thresholds() {
        let at = |minutes| Urgency::for_units(&TimeUnits::from_millis(minutes * MS_PER_MINUTE));
        assert_eq!(at(60), Urgency::Critical);
        assert_eq!(at(61), Urgency::Urgent);
        assert_eq!(at(24 * 60), Urgency::Urgent);
        assert_eq!(at(24 * 60 + 1), Urgency::Normal);
    }

    #[test]
    fn time_until_formats() {
        let n = now();
        assert_eq!(time_until(n, n), "Expired");
        assert_eq!(time_until(n + chrono::Duration::hours(50), n), "2d 2h");
        assert_eq!(time_until(n + chrono::Duration::minutes(90), n), "1h 30m");
        assert_eq!(time_until(n + chrono::Duration::seconds(150), n), "2m");
    }

    #[test]
    fn options_from_config_section() {
        let section = CountdownSection {
            format: "verbose".into(),
            show_seconds: false,
            update_interval_ms: 500,
        };
        let options = CountdownOptions::from(&section);
        assert_eq!(options.format, CountdownFormat::Verbose);
        assert!(!options.show_seconds);
        assert!(options.show_days);
        assert_eq!(options.update_interval, Duration::from_millis(500));
    }
}
