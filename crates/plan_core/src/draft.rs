//! Task creation intents.
//!
//! Quick, routine and plan tasks are all plain [`Task`]s; the intents only
//! differ in which inputs they require and which defaults they fill in.

use std::collections::BTreeSet;

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::model::{Priority, Recurrence, Task, TaskStatus};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TaskIntent {
    Quick,
    Routine,
    Plan,
}

#[derive(Debug, Clone)]
pub struct TaskDraft {
    intent: TaskIntent,
    title: String,
    priority: Priority,
    recurrence: Recurrence,
    custom_days: BTreeSet<u8>,
    time: Option<NaiveTime>,
    duration_minutes: Option<u32>,
    start_date: NaiveDate,
    end_date: Option<NaiveDate>,
    tags: Vec<String>,
    color: Option<String>,
}

impl TaskDraft {
    /// One-off task on `date`.
    pub fn quick(title: impl Into<String>, date: NaiveDate) -> Self {
        Self::base(TaskIntent::Quick, title.into(), date)
    }

    /// Repeating habit-like task at a fixed time.
    pub fn routine(
        title: impl Into<String>,
        recurrence: Recurrence,
        start_date: NaiveDate,
        time: NaiveTime,
    ) -> Self {
        let mut draft = Self::base(TaskIntent::Routine, title.into(), start_date);
        draft.recurrence = recurrence;
        draft.time = Some(time);
        draft
    }

    /// Bounded multi-day plan. Runs on `days` (0 = Sunday) when given,
    /// otherwise every day.
    pub fn plan(
        title: impl Into<String>,
        start_date: NaiveDate,
        end_date: NaiveDate,
        days: impl IntoIterator<Item = u8>,
    ) -> Self {
        let mut draft = Self::base(TaskIntent::Plan, title.into(), start_date);
        draft.custom_days = days.into_iter().filter(|day| *day <= 6).collect();
        draft.recurrence = if draft.custom_days.is_empty() {
            Recurrence::Daily
        } else {
            Recurrence::Custom
        };
        draft.end_date = Some(end_date.max(start_date));
        draft.priority = Priority::High;
        draft
    }

    fn base(intent: TaskIntent, title: String, start_date: NaiveDate) -> Self {
        Self {
            intent,
            title,
            priority: Priority::Medium,
            recurrence: Recurrence::Once,
            custom_days: BTreeSet::new(),
            time: None,
            duration_minutes: None,
            start_date,
            end_date: None,
            tags: Vec::new(),
            color: None,
        }
    }

    pub fn intent(&self) -> TaskIntent {
        self.intent
    }

    pub fn priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    pub fn time(mut self, time: NaiveTime) -> Self {
        self.time = Some(time);
        self
    }

    pub fn duration_minutes(mut self, minutes: u32) -> Self {
        self.duration_minutes = Some(minutes);
        self
    }

    pub fn color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }

    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    pub fn build(self, id: impl Into<String>) -> Task {
        Task {
            id: id.into(),
            title: self.title,
            priority: self.priority,
            status: TaskStatus::Active,
            recurrence: self.recurrence,
            custom_days: self.custom_days,
            time: self.time,
            duration_minutes: self.duration_minutes,
            start_date: self.start_date,
            end_date: self.end_date,
            completion_history: BTreeSet::new(),
            tags: self.tags,
            color: self.color,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn quick_task_is_a_single_occurrence() {
        let task = TaskDraft::quick("Call landlord", date(2024, 3, 10)).build("q1");
        assert_eq!(task.recurrence, Recurrence::Once);
        assert_eq!(task.priority, Priority::Medium);
        assert!(task.time.is_none());
        assert_eq!(task.start_date, date(2024, 3, 10));
    }

    #[test]
    fn routine_keeps_time_and_rule() {
        let seven = NaiveTime::from_hms_opt(7, 0, 0).unwrap();
        let task = TaskDraft::routine("Journal", Recurrence::Daily, date(2024, 3, 1), seven)
            .duration_minutes(15)
            .tag("habit")
            .build("r1");
        assert_eq!(task.recurrence, Recurrence::Daily);
        assert_eq!(task.time, Some(seven));
        assert_eq!(task.duration_minutes, Some(15));
        assert_eq!(task.tags, vec!["habit".to_string()]);
    }

    #[test]
    fn plan_picks_custom_only_with_days() {
        let with_days = TaskDraft::plan("Thesis", date(2024, 3, 1), date(2024, 4, 1), [1, 3, 9]).build("p1");
        assert_eq!(with_days.recurrence, Recurrence::Custom);
        assert_eq!(with_days.custom_days, BTreeSet::from([1, 3]));
        assert_eq!(with_days.priority, Priority::High);
        assert_eq!(with_days.end_date, Some(date(2024, 4, 1)));

        let every_day = TaskDraft::plan("Sprint", date(2024, 3, 1), date(2024, 2, 1), std::iter::empty::<u8>()).build("p2");
        assert_eq!(every_day.recurrence, Recurrence::Daily);
        assert_eq!(every_day.end_date, Some(date(2024, 3, 1)));
    }
}
