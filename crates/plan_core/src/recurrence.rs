//! Recurrence expansion for tasks.
//!
//! Dates are found by walking the window one day at a time and testing each
//! day against the task's rule. There is no closed-form stepping, so month
//! ends and leap days need no special cases: a monthly task anchored on the
//! 31st simply never matches a 30-day month.

use chrono::{Datelike, NaiveDate};

use crate::calendar::weekday_index;
use crate::model::{Recurrence, Task};
use crate::occurrence::{task_occurrence, Occurrence};
use crate::window::QueryWindow;

/// Whether `day` matches the task's rule, ignoring start/end bounds.
pub fn recurs_on(task: &Task, day: NaiveDate) -> bool {
    let anchor = task.start_date;
    match task.recurrence {
        Recurrence::Daily => true,
        Recurrence::Weekly => day.weekday() == anchor.weekday(),
        Recurrence::Monthly => day.day() == anchor.day(),
        Recurrence::Yearly => day.day() == anchor.day() && day.month() == anchor.month(),
        Recurrence::Custom => task.custom_days.contains(&weekday_index(day)),
        Recurrence::Once => day == anchor,
    }
}

/// Every date in `window` on which the task occurs, ascending.
///
/// Archived tasks produce nothing. The scan starts at the later of the
/// window start and the task's start date and stops at the earlier of the
/// window end and the task's end date; the end date is inclusive.
pub fn occurrence_dates(task: &Task, window: &QueryWindow) -> Vec<NaiveDate> {
    if task.is_archived() || window.is_empty() {
        return Vec::new();
    }
    if task.recurrence == Recurrence::Custom && task.custom_days.is_empty() {
        return Vec::new();
    }

    let first = window.first_day().max(task.start_date);
    let last = match task.end_date {
        Some(end_date) => window.last_day().min(end_date),
        None => window.last_day(),
    };
    if first > last {
        return Vec::new();
    }

    first
        .iter_days()
        .take_while(|day| *day <= last)
        .filter(|day| recurs_on(task, *day))
        .collect()
}

/// Materialized task occurrences for `window`, grouped by task in input order.
pub fn expand_task_occurrences(tasks: &[Task], window: &QueryWindow) -> Vec<Occurrence> {
    let mut occurrences = Vec::new();
    for task in tasks {
        let dates = occurrence_dates(task, window);
        tracing::trace!(task_id = %task.id, count = dates.len(), "expanded task");
        occurrences.extend(dates.into_iter().map(|date| task_occurrence(task, date)));
    }
    occurrences
}
