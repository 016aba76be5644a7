//! ISO-8601 week arithmetic.
//!
//! Weeks start on Monday. Week 1 of a year is the week containing that
//! year's first Thursday, so the last days of December can belong to week 1
//! of the following year and the first days of January to week 52/53 of the
//! previous one.

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

/// Inclusive span of one ISO week: Monday 00:00:00.000 to Sunday 23:59:59.999.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeekRange {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl WeekRange {
    pub fn monday(&self) -> NaiveDate {
        self.start.date()
    }

    pub fn sunday(&self) -> NaiveDate {
        self.end.date()
    }

    /// The seven dates of the week, Monday first.
    pub fn days(&self) -> impl Iterator<Item = NaiveDate> {
        self.monday().iter_days().take(7)
    }

    pub fn contains(&self, at: NaiveDateTime) -> bool {
        self.start <= at && at <= self.end
    }

    /// Date inside this week for a weekday index (0 = Sunday .. 6 = Saturday).
    /// Sunday is the last day of an ISO week.
    pub fn date_for_weekday(&self, index: u8) -> Option<NaiveDate> {
        if index > 6 {
            return None;
        }
        let offset = (i64::from(index) + 6) % 7;
        self.monday().checked_add_signed(Duration::days(offset))
    }
}

/// ISO-8601 week number (1..=53) of `date`.
pub fn iso_week_number(date: NaiveDate) -> u32 {
    let thursday = thursday_of_week(date);
    (thursday.ordinal0() + 7) / 7
}

/// ISO week-numbering year of `date`, i.e. the year its week number refers to.
pub fn iso_week_year(date: NaiveDate) -> i32 {
    thursday_of_week(date).year()
}

/// Monday-to-Sunday range of the ISO week containing `date`.
pub fn iso_week_range(date: NaiveDate) -> WeekRange {
    let day = iso_day(date);
    let monday = shift_days(date, 1 - day);
    let start = monday.and_time(NaiveTime::MIN);
    let end = start
        .checked_add_signed(Duration::days(7) - Duration::milliseconds(1))
        .unwrap_or(NaiveDateTime::MAX);
    WeekRange { start, end }
}

/// Weekday index with 0 = Sunday .. 6 = Saturday.
pub fn weekday_index(date: NaiveDate) -> u8 {
    date.weekday().num_days_from_sunday() as u8
}

/// Local calendar key used for completion history and occurrence ids.
pub fn date_key(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

pub fn parse_date_key(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    let head = trimmed.get(..10).unwrap_or(trimmed);
    NaiveDate::parse_from_str(head, "%Y-%m-%d").ok()
}

/// Day of the ISO week, Monday = 1 .. Sunday = 7.
fn iso_day(date: NaiveDate) -> i64 {
    i64::from(date.weekday().number_from_monday())
}

fn thursday_of_week(date: NaiveDate) -> NaiveDate {
    shift_days(date, 4 - iso_day(date))
}

fn shift_days(date: NaiveDate, days: i64) -> NaiveDate {
    date.checked_add_signed(Duration::days(days)).unwrap_or(date)
}
