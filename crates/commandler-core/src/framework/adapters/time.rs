use std::time::Duration;

use crate::foundation::value::{TimeUnit, Value};
use crate::framework::adapter::{AdaptContext, Adapter};

const ALL_UNITS: [TimeUnit; 7] = [
    TimeUnit::Days,
    TimeUnit::Hours,
    TimeUnit::Minutes,
    TimeUnit::Seconds,
    TimeUnit::Milliseconds,
    TimeUnit::Microseconds,
    TimeUnit::Nanoseconds,
];

/// Parses a unit name such as `h`, `mins` or `Milliseconds`.
///
/// Case and spaces are ignored.
pub fn parse_time_unit(input: &str) -> Option<TimeUnit> {
    let normalized: String = input
        .chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect();

    Some(match normalized.as_str() {
        "days" | "day" | "d" => TimeUnit::Days,
        "hours" | "hour" | "h" => TimeUnit::Hours,
        "minutes" | "minute" | "mins" | "min" | "m" => TimeUnit::Minutes,
        "seconds" | "second" | "secs" | "sec" | "s" => TimeUnit::Seconds,
        "milliseconds" | "millisecond" | "millisecs" | "millisec" | "millis" | "milli" | "ms" => {
            TimeUnit::Milliseconds
        }
        "microseconds" | "microsecond" | "microsec" | "micros" | "micro" | "mic" | "mis" => {
            TimeUnit::Microseconds
        }
        "nanoseconds" | "nanosecond" | "nanosecs" | "nanosec" | "nanos" | "nano" | "ns" | "n" => {
            TimeUnit::Nanoseconds
        }
        _ => return None,
    })
}

/// Adapts unit names to [`TimeUnit`], optionally restricted to a subset.
#[derive(Debug, Clone)]
pub struct TimeUnitAdapter {
    units: Vec<TimeUnit>,
}

impl TimeUnitAdapter {
    pub fn with_units(units: &[TimeUnit]) -> Self {
        Self {
            units: units.to_vec(),
        }
    }

    pub fn parse(&self, input: &str) -> Option<TimeUnit> {
        parse_time_unit(input).filter(|unit| self.units.contains(unit))
    }
}

impl Default for TimeUnitAdapter {
    fn default() -> Self {
        Self::with_units(&ALL_UNITS)
    }
}

impl Adapter for TimeUnitAdapter {
    fn adapt(&self, input: &str, _ctx: &AdaptContext<'_>) -> Option<Value> {
        self.parse(input).map(Value::TimeUnit)
    }
}

/// Adapts inputs like `1h30m` or `2 days 4 hours` to a [`Duration`].
///
/// Amounts of the same unit are summed. Microseconds are not accepted, so
/// `mic` and friends fail rather than being mistaken for minutes.
#[derive(Debug, Clone)]
pub struct DurationAdapter {
    units: TimeUnitAdapter,
}

impl Default for DurationAdapter {
    fn default() -> Self {
        Self {
            units: TimeUnitAdapter::with_units(&[
                TimeUnit::Days,
                TimeUnit::Hours,
                TimeUnit::Minutes,
                TimeUnit::Seconds,
                TimeUnit::Milliseconds,
                TimeUnit::Nanoseconds,
            ]),
        }
    }
}

impl DurationAdapter {
    pub fn parse(&self, input: &str) -> Option<Duration> {
        let mut rest = input.trim();
        if rest.is_empty() {
            return None;
        }

        let mut total = Duration::ZERO;
        while !rest.is_empty() {
            let digits = rest
                .find(|c: char| !c.is_ascii_digit())
                .unwrap_or(rest.len());
            let amount: u64 = rest[..digits].parse().ok()?;
            rest = &rest[digits..];

            let unit_len = rest
                .find(|c: char| !(c.is_ascii_alphabetic() || c == ' '))
                .unwrap_or(rest.len());
            let unit = self.units.parse(&rest[..unit_len])?;
            rest = &rest[unit_len..];

            total = total.saturating_add(unit.duration(amount));
        }
        Some(total)
    }
}

impl Adapter for DurationAdapter {
    fn adapt(&self, input: &str, _ctx: &AdaptContext<'_>) -> Option<Value> {
        self.parse(input).map(Value::Duration)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unit_spellings() {
        assert_eq!(parse_time_unit("d"), Some(TimeUnit::Days));
        assert_eq!(parse_time_unit("Hours"), Some(TimeUnit::Hours));
        assert_eq!(parse_time_unit("m"), Some(TimeUnit::Minutes));
        assert_eq!(parse_time_unit(" secs "), Some(TimeUnit::Seconds));
        assert_eq!(parse_time_unit("ms"), Some(TimeUnit::Milliseconds));
        assert_eq!(parse_time_unit("mic"), Some(TimeUnit::Microseconds));
        assert_eq!(parse_time_unit("n"), Some(TimeUnit::Nanoseconds));
        assert_eq!(parse_time_unit("fortnight"), None);
    }

    #[test]
    fn test_restricted_units() {
        let adapter = TimeUnitAdapter::with_units(&[TimeUnit::Hours]);
        assert_eq!(adapter.parse("h"), Some(TimeUnit::Hours));
        assert_eq!(adapter.parse("m"), None);
    }

    #[test]
    fn test_compact_duration() {
        let adapter = DurationAdapter::default();
        assert_eq!(adapter.parse("1h30m"), Some(Duration::from_secs(5_400)));
        assert_eq!(adapter.parse("90s"), Some(Duration::from_secs(90)));
    }

    #[test]
    fn test_spaced_duration() {
        let adapter = DurationAdapter::default();
        assert_eq!(
            adapter.parse("2 days 4 hours"),
            Some(Duration::from_secs(2 * 86_400 + 4 * 3_600))
        );
    }

    #[test]
    fn test_repeated_units_are_summed() {
        let adapter = DurationAdapter::default();
        assert_eq!(adapter.parse("1m1m"), Some(Duration::from_secs(120)));
    }

    #[test]
    fn test_invalid_durations() {
        let adapter = DurationAdapter::default();
        assert_eq!(adapter.parse(""), None);
        assert_eq!(adapter.parse("30"), None);
        assert_eq!(adapter.parse("h"), None);
        assert_eq!(adapter.parse("5 micros"), None);
        assert_eq!(adapter.parse("5x"), None);
        assert_eq!(adapter.parse("1h-2m"), None);
    }
}
