use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

/// Closed query window `[start, end]` in naive local time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryWindow {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl QueryWindow {
    pub fn new(start: NaiveDateTime, end: NaiveDateTime) -> Self {
        Self { start, end }
    }

    /// Whole days from `first` 00:00 through `last` 23:59:59.999.
    pub fn days(first: NaiveDate, last: NaiveDate) -> Self {
        let start = first.and_time(NaiveTime::MIN);
        let end = last
            .and_time(NaiveTime::MIN)
            .checked_add_signed(Duration::days(1) - Duration::milliseconds(1))
            .unwrap_or(NaiveDateTime::MAX);
        Self { start, end }
    }

    /// Widens both ends by `days`, the way the presentation layer pads its queries.
    pub fn padded(&self, days: i64) -> Self {
        let Some(pad) = Duration::try_days(days.max(0)) else {
            return Self::new(NaiveDateTime::MIN, NaiveDateTime::MAX);
        };
        Self {
            start: self.start.checked_sub_signed(pad).unwrap_or(NaiveDateTime::MIN),
            end: self.end.checked_add_signed(pad).unwrap_or(NaiveDateTime::MAX),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.start > self.end
    }

    pub fn contains(&self, at: NaiveDateTime) -> bool {
        self.start <= at && at <= self.end
    }

    pub fn overlaps(&self, start: NaiveDateTime, end: NaiveDateTime) -> bool {
        start <= self.end && end >= self.start
    }

    pub fn first_day(&self) -> NaiveDate {
        self.start.date()
    }

    pub fn last_day(&self) -> NaiveDate {
        self.end.date()
    }
}
