//! Projection of fetched appointments onto a month grid

use chrono::{Datelike, NaiveDate};

use crate::calendar::CalendarMonth;
use crate::utils::matches_day;

/// Anything that is displayed on a given day of a calendar
pub trait Dated {
    /// An ISO date or datetime. Only its `YYYY-MM-DD` prefix matters
    fn date(&self) -> Option<&str>;

    fn is_on(&self, ymd: &str) -> bool {
        self.date().map(|date| matches_day(date, ymd)).unwrap_or(false)
    }
}

/// A non-blank cell of a month grid
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DayCell {
    pub day: u32,
    /// `YYYY-MM-DD`
    pub date_key: String,
    pub is_today: bool,
    /// How many of the records this grid was built from fall on this day
    pub appointments: usize,
}

impl DayCell {
    pub fn has_appointment(&self) -> bool {
        self.appointments > 0
    }
}

impl CalendarMonth {
    /// Lays this month out as weeks of seven cells, Sunday first.
    ///
    /// Cells before the 1st and after the last day are `None`.
    pub fn grid<T: Dated>(&self, records: &[T], today: NaiveDate) -> Vec<Vec<Option<DayCell>>> {
        let today_key = crate::calendar::format_ymd(today.year(), today.month0(), today.day());

        let mut cells: Vec<Option<DayCell>> = Vec::new();
        for _ in 0..self.start_weekday() {
            cells.push(None);
        }
        for day in 1..=self.days_in_month() {
            let date_key = self.date_key(day);
            let appointments = records.iter().filter(|r| r.is_on(&date_key)).count();
            cells.push(Some(DayCell {
                day,
                is_today: date_key == today_key,
                date_key,
                appointments,
            }));
        }
        while cells.len() % 7 != 0 {
            cells.push(None);
        }

        cells.chunks(7).map(|week| week.to_vec()).collect()
    }
}
