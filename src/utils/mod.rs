//! Some utility functions

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer};

use crate::calendar::{CalendarMonth, DayCell};

/// Whether an ISO date (or datetime) string falls on the given `YYYY-MM-DD` day.
///
/// This is a plain prefix comparison: no timezone conversion is applied to `date`.
pub fn matches_day(date: &str, ymd: &str) -> bool {
    date.starts_with(ymd)
}

/// The `YYYY-MM-DD` part of an ISO date or datetime string
pub fn day_key(date: &str) -> &str {
    date.get(..10).unwrap_or(date)
}

/// Decodes a percent-encoded cookie value
pub fn percent_decode(raw: &str) -> String {
    let query = format!("v={}", raw.replace('+', "%2B"));
    url::form_urlencoded::parse(query.as_bytes())
        .next()
        .map(|(_, value)| value.into_owned())
        .unwrap_or_else(|| raw.to_string())
}

/// Parses the timestamps the server sends, either RFC 3339 (`2025-03-10T02:00:00.000000Z`)
/// or plain SQL datetimes (`2025-03-10 02:00:00`, assumed UTC)
pub fn parse_timestamp(text: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S")
        .ok()
        .map(|naive| Utc.from_utc_datetime(&naive))
}

/// Used to support serde on optional server timestamps
pub fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let text: Option<String> = Option::deserialize(deserializer)?;
    match text {
        None => Ok(None),
        Some(text) => match parse_timestamp(&text) {
            Some(dt) => Ok(Some(dt)),
            None => Err(serde::de::Error::custom(format!("invalid timestamp {:?}", text))),
        },
    }
}

/// Used to support serde on strings the server may send as `null`
pub fn deserialize_null_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let text: Option<String> = Option::deserialize(deserializer)?;
    Ok(text.unwrap_or_default())
}


/// A debug utility that pretty-prints a month grid
pub fn print_month(month: &CalendarMonth, weeks: &[Vec<Option<DayCell>>]) {
    println!("{:^28}", month.month_label());
    println!(" Su  Mo  Tu  We  Th  Fr  Sa");
    for week in weeks {
        let line: String = week.iter()
            .map(|cell| match cell {
                None => "    ".to_string(),
                Some(cell) => {
                    let marker = if cell.is_today { '>' } else { ' ' };
                    let busy = if cell.appointments > 0 { '*' } else { ' ' };
                    format!("{}{:>2}{}", marker, cell.day, busy)
                },
            })
            .collect();
        println!("{}", line.trim_end());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn day_prefix() {
        assert!(matches_day("2025-03-10T09:00:00Z", "2025-03-10"));
        assert!(matches_day("2025-03-10", "2025-03-10"));
        assert!(!matches_day("2025-03-1", "2025-03-10"));
        assert_eq!(day_key("2025-03-10 09:00:00"), "2025-03-10");
        assert_eq!(day_key("2025"), "2025");
    }

    #[test]
    fn timestamps() {
        let rfc = parse_timestamp("2025-03-10T02:00:00.000000Z").unwrap();
        let sql = parse_timestamp("2025-03-10 02:00:00").unwrap();
        assert_eq!(rfc, sql);
        assert!(parse_timestamp("yesterday").is_none());
    }

    #[test]
    fn cookie_values() {
        assert_eq!(percent_decode("eyJpdiI6IjEyMyJ9%3D%3D"), "eyJpdiI6IjEyMyJ9==");
        assert_eq!(percent_decode("a+b"), "a+b");
    }
}
