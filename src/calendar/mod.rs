//! Month arithmetic used to lay out calendars
//!
//! Everything here is pure. Inputs are not validated: a month index of 12 simply rolls over into the next year,
//! the same way a calendar date constructor would.

pub mod grid;
pub use grid::{Dated, DayCell};

use chrono::{Datelike, FixedOffset, NaiveDate, Offset, Utc};

const MONTH_NAMES: [&str; 12] = [
    "January", "February", "March", "April", "May", "June",
    "July", "August", "September", "October", "November", "December",
];


/// What a calendar view needs to know about the month that contains a reference date
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MonthInfo {
    /// The last day number of the month
    pub days_in_month: u32,
    /// Weekday of the 1st, Sunday = 0
    pub start_weekday: u32,
    /// e.g. `March 2025`
    pub month_label: String,
}

/// Returns the month layout for the month that contains `reference`
pub fn month_info(reference: NaiveDate) -> MonthInfo {
    let month = CalendarMonth::from_date(reference);
    MonthInfo {
        days_in_month: month.days_in_month(),
        start_weekday: month.start_weekday(),
        month_label: month.month_label(),
    }
}

/// Formats a date as `YYYY-MM-DD`. `month_zero_based` is 0 for January.
pub fn format_ymd(year: i32, month_zero_based: u32, day: u32) -> String {
    format!("{:04}-{:02}-{:02}", year, month_zero_based + 1, day)
}

pub fn is_leap_year(year: i32) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}

/// Number of days of a month (`month` is 1-based)
pub fn days_in_month(year: i32, month: u32) -> u32 {
    match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        2 if is_leap_year(year) => 29,
        _ => 28,
    }
}

/// The current date at a fixed UTC offset (in seconds)
pub fn today(offset_seconds: i32) -> NaiveDate {
    let offset = FixedOffset::east_opt(offset_seconds)
        .unwrap_or_else(|| {
            log::warn!("Invalid UTC offset {}s, using UTC", offset_seconds);
            Utc.fix()
        });
    Utc::now().with_timezone(&offset).naive_local().date()
}

/// Half-hour `HH:MM` choices from `start_hour:00` up to `end_hour:00` (inclusive)
pub fn time_choices(start_hour: u32, end_hour: u32) -> Vec<String> {
    if start_hour > end_hour {
        return Vec::new();
    }
    let mut choices = Vec::new();
    for hour in start_hour..end_hour {
        choices.push(format!("{:02}:00", hour));
        choices.push(format!("{:02}:30", hour));
    }
    choices.push(format!("{:02}:00", end_hour));
    choices
}


/// A month as displayed in a calendar view.
///
/// It is never mutated: navigating to another month builds a new value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct CalendarMonth {
    year: i32,
    /// January is 0
    month_index: u32,
    days_in_month: u32,
    start_weekday: u32,
}

impl CalendarMonth {
    /// Create a month. `month_index` is zero-based and may overflow in either direction
    pub fn new(year: i32, month_index: i32) -> Self {
        let year = year + month_index.div_euclid(12);
        let month_index = month_index.rem_euclid(12) as u32;
        let days_in_month = days_in_month(year, month_index + 1);
        let start_weekday = NaiveDate::from_ymd_opt(year, month_index + 1, 1)
            .map(|first| first.weekday().num_days_from_sunday())
            .unwrap_or_else(|| sakamoto_weekday(year, month_index + 1, 1));

        Self { year, month_index, days_in_month, start_weekday }
    }

    /// The month that contains `date`
    pub fn from_date(date: NaiveDate) -> Self {
        Self::new(date.year(), date.month0() as i32)
    }

    /// The month that contains today, at the given UTC offset
    pub fn current(offset_seconds: i32) -> Self {
        Self::from_date(today(offset_seconds))
    }

    pub fn year(&self) -> i32           { self.year }
    pub fn month_index(&self) -> u32    { self.month_index }
    pub fn days_in_month(&self) -> u32  { self.days_in_month }
    pub fn start_weekday(&self) -> u32  { self.start_weekday }

    pub fn month_label(&self) -> String {
        format!("{} {}", MONTH_NAMES[self.month_index as usize], self.year)
    }

    /// `YYYY-MM`, used to tell months apart
    pub fn key(&self) -> String {
        format!("{:04}-{:02}", self.year, self.month_index + 1)
    }

    pub fn next(&self) -> Self {
        Self::new(self.year, self.month_index as i32 + 1)
    }

    pub fn previous(&self) -> Self {
        Self::new(self.year, self.month_index as i32 - 1)
    }

    /// `YYYY-MM-DD` of a day of this month. `day` is not checked against the month length
    pub fn date_key(&self, day: u32) -> String {
        format_ymd(self.year, self.month_index, day)
    }

    pub fn first_day(&self) -> String {
        self.date_key(1)
    }

    pub fn last_day(&self) -> String {
        self.date_key(self.days_in_month)
    }

    /// The `(from, to)` range to fetch appointments for this month
    pub fn range(&self) -> (String, String) {
        (self.first_day(), self.last_day())
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date.year() == self.year && date.month0() == self.month_index
    }
}

/// Weekday (Sunday = 0) for years chrono cannot represent
fn sakamoto_weekday(year: i32, month: u32, day: u32) -> u32 {
    const OFFSETS: [i64; 12] = [0, 3, 2, 5, 0, 3, 5, 1, 4, 6, 2, 4];
    let y = if month < 3 { year as i64 - 1 } else { year as i64 };
    let w = y + y.div_euclid(4) - y.div_euclid(100) + y.div_euclid(400) + OFFSETS[(month - 1) as usize] + day as i64;
    w.rem_euclid(7) as u32
}


#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn ymd_is_zero_padded() {
        assert_eq!(format_ymd(2025, 0, 5), "2025-01-05");
        assert_eq!(format_ymd(2025, 11, 31), "2025-12-31");
        // Not validated
        assert_eq!(format_ymd(2025, 12, 40), "2025-13-40");
    }

    #[test]
    fn month_layout() {
        let info = month_info(date(2025, 3, 17));
        assert_eq!(info.days_in_month, 31);
        // March 1st 2025 is a Saturday
        assert_eq!(info.start_weekday, 6);
        assert_eq!(info.month_label, "March 2025");

        let info = month_info(date(2024, 2, 29));
        assert_eq!(info.days_in_month, 29);
        assert_eq!(info.start_weekday, 4);

        assert_eq!(month_info(date(2025, 2, 1)).days_in_month, 28);
        assert_eq!(month_info(date(1900, 2, 1)).days_in_month, 28);
        assert_eq!(month_info(date(2000, 2, 1)).days_in_month, 29);
        assert_eq!(month_info(date(2025, 6, 30)).days_in_month, 30);
    }

    #[test]
    fn start_weekday_matches_first_of_month() {
        let mut day = date(1999, 1, 1);
        while day < date(2031, 1, 1) {
            let info = month_info(day);
            let first = date(day.year(), day.month(), 1);
            assert_eq!(info.start_weekday, first.weekday().num_days_from_sunday());
            assert_eq!(info.start_weekday, sakamoto_weekday(day.year(), day.month(), 1));

            let last = date(day.year(), day.month(), info.days_in_month);
            assert_eq!(last.succ_opt().unwrap().day(), 1);

            day = day + chrono::Duration::days(13);
        }
    }

    #[test]
    fn navigation_wraps_years() {
        let december = CalendarMonth::new(2024, 11);
        assert_eq!(december.next(), CalendarMonth::new(2025, 0));
        assert_eq!(december.next().previous(), december);
        assert_eq!(CalendarMonth::new(2025, 12), CalendarMonth::new(2026, 0));
        assert_eq!(CalendarMonth::new(2025, -1), december);
        assert_eq!(december.key(), "2024-12");
        assert_eq!(december.range(), ("2024-12-01".to_string(), "2024-12-31".to_string()));
        assert!(december.contains(date(2024, 12, 25)));
        assert!(!december.contains(date(2025, 12, 25)));
    }

    #[test]
    fn months_are_always_normalised() {
        for index in -40..40 {
            let month = CalendarMonth::new(2025, index);
            assert!(month.month_index() < 12);
            assert_eq!(month.days_in_month(), days_in_month(month.year(), month.month_index() + 1));
            assert!(month.start_weekday() < 7);
            assert!(month.month_label().ends_with(&month.year().to_string()));
        }
        assert_eq!(CalendarMonth::new(2025, 12).month_label(), "January 2026");
        assert_eq!(CalendarMonth::new(2025, -13).month_label(), "December 2023");
    }

    #[test]
    fn half_hour_choices() {
        let choices = time_choices(8, 10);
        assert_eq!(choices, vec!["08:00", "08:30", "09:00", "09:30", "10:00"]);
        assert!(time_choices(10, 8).is_empty());
        assert_eq!(time_choices(9, 9), vec!["09:00"]);
    }

    #[test]
    fn today_uses_fixed_offset() {
        let utc = today(0);
        let ahead = today(14 * 3600);
        let behind = today(-12 * 3600);
        assert!(ahead >= utc);
        assert!(behind <= utc);
    }
}
