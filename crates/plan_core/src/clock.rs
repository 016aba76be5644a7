use chrono::{Local, NaiveDate, NaiveDateTime};

/// Source of the current wall-clock time. Everything that depends on "now"
/// goes through this trait so callers can pin time in tests.
pub trait Clock: Send + Sync {
    fn now(&self) -> NaiveDateTime;

    fn today(&self) -> NaiveDate {
        self.now().date()
    }
}

/// Reads the local system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// Always reports the same instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedClock(pub NaiveDateTime);

impl FixedClock {
    pub fn at_midnight(date: NaiveDate) -> Self {
        Self(date.and_time(chrono::NaiveTime::MIN))
    }
}

impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        self.0
    }
}
