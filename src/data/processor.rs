//! Data Processor Module
//! Derived per-row fields: time parts, normalized category labels, time slots.

use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime, Timelike};

/// Weekday labels, Monday first (matches `DayOfWeek` = 0 for Monday).
pub const WEEKDAYS: [&str; 7] = [
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
    "Sunday",
];

/// Canonical weather order for road-traffic heatmaps.
pub const WEATHER_ORDER: [&str; 6] = ["Clear", "Fog", "Rain", "Snow", "Thunderstorm", "Other"];

/// Order periods for last-mile analysis.
pub const DAY_PERIODS: [&str; 3] = [
    "Morning (6h-12h)",
    "Afternoon (12h-18h)",
    "Evening/Night (18h-6h)",
];

const DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

/// Time parts extracted from one timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeParts {
    pub year: i32,
    pub month: u32,
    pub hour: u32,
    /// 0 = Monday
    pub weekday: u32,
}

/// Handles derivation of per-row fields from raw columns.
pub struct DataProcessor;

impl DataProcessor {
    /// Parse a timestamp string, tolerating fractional seconds and a bare date.
    pub fn parse_datetime(raw: &str) -> Option<NaiveDateTime> {
        let raw = raw.trim();
        DATETIME_FORMATS
            .iter()
            .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
            .or_else(|| {
                Self::parse_date(raw).and_then(|d| d.and_hms_opt(0, 0, 0))
            })
    }

    pub fn parse_date(raw: &str) -> Option<NaiveDate> {
        let raw = raw.trim();
        // Date prefix of a full timestamp is accepted too
        let date_part = raw.get(..10).unwrap_or(raw);
        NaiveDate::parse_from_str(date_part, "%Y-%m-%d").ok()
    }

    /// Hour from a `%H:%M:%S` clock string.
    pub fn parse_hour(raw: &str) -> Option<u32> {
        NaiveTime::parse_from_str(raw.trim(), "%H:%M:%S")
            .ok()
            .map(|t| t.hour())
    }

    pub fn time_parts(raw: &str) -> Option<TimeParts> {
        Self::parse_datetime(raw).map(|dt| TimeParts {
            year: dt.year(),
            month: dt.month(),
            hour: dt.hour(),
            weekday: dt.weekday().num_days_from_monday(),
        })
    }

    /// Extract time parts for a whole column.
    pub fn time_parts_column(values: &[Option<String>]) -> Vec<Option<TimeParts>> {
        values
            .iter()
            .map(|v| v.as_deref().and_then(Self::time_parts))
            .collect()
    }

    pub fn weekday_name(index: u32) -> Option<&'static str> {
        WEEKDAYS.get(index as usize).copied()
    }

    /// Weekday name for a date string.
    pub fn weekday_of(raw: &str) -> Option<&'static str> {
        Self::parse_date(raw).and_then(|d| Self::weekday_name(d.weekday().num_days_from_monday()))
    }

    /// Map English or French weather labels to the canonical English set.
    pub fn normalize_weather(raw: Option<&str>) -> &'static str {
        let Some(raw) = raw else {
            return "Other";
        };
        match raw.trim().to_lowercase().as_str() {
            "clear" | "clair" => "Clear",
            "fog" | "brouillard" => "Fog",
            "rain" | "pluie" => "Rain",
            "snow" | "neige" => "Snow",
            "thunderstorm" | "orage" => "Thunderstorm",
            _ => "Other",
        }
    }

    /// Two-hour slot label, e.g. hour 13 -> "12h-14h".
    pub fn two_hour_slot(hour: u32) -> String {
        let start = (hour.min(23) / 2) * 2;
        format!("{}h-{}h", start, start + 2)
    }

    /// All two-hour slot labels in chronological order.
    pub fn two_hour_slots() -> Vec<String> {
        (0..24).step_by(2).map(Self::two_hour_slot).collect()
    }

    /// Period of day for an order hour.
    pub fn day_period(hour: u32) -> &'static str {
        match hour {
            6..=11 => DAY_PERIODS[0],
            12..=17 => DAY_PERIODS[1],
            _ => DAY_PERIODS[2],
        }
    }

    /// Whether a label equals any accepted alias (labels differ by locale
    /// between dataset exports).
    pub fn matches_any(value: &str, aliases: &[&str]) -> bool {
        aliases.iter().any(|alias| value.eq_ignore_ascii_case(alias))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn time_parts_from_fractional_timestamp() {
        let parts = DataProcessor::time_parts("2016-02-08 05:46:00.000000000").unwrap();
        assert_eq!(parts.year, 2016);
        assert_eq!(parts.month, 2);
        assert_eq!(parts.hour, 5);
        // 2016-02-08 was a Monday
        assert_eq!(parts.weekday, 0);
    }

    #[test]
    fn weather_labels_from_both_locales() {
        assert_eq!(DataProcessor::normalize_weather(Some("Pluie")), "Rain");
        assert_eq!(DataProcessor::normalize_weather(Some(" rain ")), "Rain");
        assert_eq!(DataProcessor::normalize_weather(Some("Haze")), "Other");
        assert_eq!(DataProcessor::normalize_weather(None), "Other");
    }

    #[test]
    fn slots_and_periods() {
        assert_eq!(DataProcessor::two_hour_slot(13), "12h-14h");
        assert_eq!(DataProcessor::two_hour_slots().len(), 12);
        assert_eq!(DataProcessor::day_period(6), DAY_PERIODS[0]);
        assert_eq!(DataProcessor::day_period(18), DAY_PERIODS[2]);
        assert_eq!(DataProcessor::day_period(3), DAY_PERIODS[2]);
    }

    #[test]
    fn clock_and_weekday_parsing() {
        assert_eq!(DataProcessor::parse_hour("11:30:00"), Some(11));
        assert_eq!(DataProcessor::parse_hour("NaN"), None);
        assert_eq!(DataProcessor::weekday_of("2022-03-19"), Some("Saturday"));
    }
}
