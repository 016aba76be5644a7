use std::collections::BTreeSet;
use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::calendar::parse_date_key;

pub const DEFAULT_DURATION_MINUTES: u32 = 30;

/// Execution time for tasks without an explicit clock time.
pub fn default_task_time() -> NaiveTime {
    NaiveTime::from_hms_opt(9, 0, 0).unwrap_or(NaiveTime::MIN)
}

/// Whole persisted state as the host stores it.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct PlannerState {
    pub tasks: Vec<Task>,
    pub assignments: Vec<Assignment>,
    pub courses: Vec<Course>,
    pub wellbeing_logs: Vec<WellbeingLog>,
    pub time_blocks: Vec<TimeBlock>,
}

impl PlannerState {
    pub fn task(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|task| task.id == id)
    }

    pub fn task_mut(&mut self, id: &str) -> Option<&mut Task> {
        self.tasks.iter_mut().find(|task| task.id == id)
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    #[default]
    Active,
    Archived,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Recurrence {
    #[default]
    Once,
    Daily,
    Weekly,
    Monthly,
    Yearly,
    Custom,
}

impl FromStr for Priority {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            other => Err(format!("unknown priority `{other}`")),
        }
    }
}

impl FromStr for Recurrence {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "once" => Ok(Self::Once),
            "daily" => Ok(Self::Daily),
            "weekly" => Ok(Self::Weekly),
            "monthly" => Ok(Self::Monthly),
            "yearly" => Ok(Self::Yearly),
            "custom" => Ok(Self::Custom),
            other => Err(format!("unknown recurrence `{other}`")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub status: TaskStatus,
    #[serde(default)]
    pub recurrence: Recurrence,
    /// Weekday indices, 0 = Sunday .. 6 = Saturday. Only read for `Custom`.
    #[serde(default)]
    pub custom_days: BTreeSet<u8>,
    #[serde(default, with = "clock_time", skip_serializing_if = "Option::is_none")]
    pub time: Option<NaiveTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_minutes: Option<u32>,
    #[serde(with = "calendar_date")]
    pub start_date: NaiveDate,
    #[serde(default, with = "optional_calendar_date", skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub completion_history: BTreeSet<NaiveDate>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

impl Task {
    pub fn execution_time(&self) -> NaiveTime {
        self.time.unwrap_or_else(default_task_time)
    }

    pub fn effective_duration_minutes(&self) -> u32 {
        match self.duration_minutes {
            Some(minutes) if minutes > 0 => minutes,
            _ => DEFAULT_DURATION_MINUTES,
        }
    }

    pub fn is_archived(&self) -> bool {
        self.status == TaskStatus::Archived
    }

    pub fn is_completed_on(&self, date: NaiveDate) -> bool {
        self.completion_history.contains(&date)
    }

    /// Flips completion for `date` and returns the new state.
    pub fn toggle_completion(&mut self, date: NaiveDate) -> bool {
        if self.completion_history.remove(&date) {
            false
        } else {
            self.completion_history.insert(date);
            true
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum AssignmentStatus {
    #[default]
    #[serde(alias = "Pending", alias = "todo")]
    Pending,
    #[serde(alias = "In Progress", alias = "in_progress")]
    InProgress,
    #[serde(alias = "Completed", alias = "done")]
    Completed,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum AssignmentKind {
    #[default]
    Homework,
    Exam,
    Quiz,
    Project,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Assignment {
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub course_id: Option<String>,
    #[serde(with = "timestamp")]
    pub due_date: NaiveDateTime,
    #[serde(default)]
    pub status: AssignmentStatus,
    #[serde(rename = "type", default)]
    pub kind: AssignmentKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,
}

impl Assignment {
    pub fn is_completed(&self) -> bool {
        self.status == AssignmentStatus::Completed
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Course {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(default)]
    pub color: String,
    /// Free text such as "Mon/Wed 10:00 AM", or "TBA".
    #[serde(default)]
    pub schedule: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WellbeingLog {
    pub id: String,
    #[serde(with = "calendar_date")]
    pub date: NaiveDate,
    #[serde(default)]
    pub activities: Vec<Activity>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, with = "clock_time", skip_serializing_if = "Option::is_none")]
    pub time: Option<NaiveTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_minutes: Option<u32>,
}

/// A planned focus block on the calendar.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TimeBlock {
    pub id: String,
    pub title: String,
    #[serde(with = "timestamp")]
    pub start: NaiveDateTime,
    #[serde(with = "timestamp")]
    pub end: NaiveDateTime,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

/// Parses "HH:MM" (seconds optional). Anything else is treated as absent.
pub fn parse_clock_time(raw: &str) -> Option<NaiveTime> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    let parsed = NaiveTime::parse_from_str(trimmed, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(trimmed, "%H:%M:%S"))
        .ok();
    if parsed.is_none() {
        tracing::warn!(value = trimmed, "ignoring unparseable clock time");
    }
    parsed
}

/// Accepts naive ISO timestamps, RFC 3339 timestamps (wall-clock part kept)
/// and bare dates, which are read as due at 23:59.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let trimmed = raw.trim();
    if let Ok(value) = trimmed.parse::<NaiveDateTime>() {
        return Some(value);
    }
    if let Ok(value) = chrono::DateTime::parse_from_rfc3339(trimmed) {
        return Some(value.naive_local());
    }
    for format in ["%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(value) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Some(value);
        }
    }
    let date = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d").ok()?;
    date.and_hms_opt(23, 59, 0)
}

mod clock_time {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Option<NaiveTime>, serializer: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(time) => serializer.serialize_str(&time.format("%H:%M").to_string()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<NaiveTime>, D::Error> {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        Ok(raw.as_deref().and_then(super::parse_clock_time))
    }
}

mod calendar_date {
    use chrono::NaiveDate;
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &NaiveDate, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&crate::calendar::date_key(*value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDate, D::Error> {
        let raw = String::deserialize(deserializer)?;
        super::parse_date_key(&raw).ok_or_else(|| D::Error::custom(format!("invalid date `{raw}`")))
    }
}

mod optional_calendar_date {
    use chrono::NaiveDate;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Option<NaiveDate>, serializer: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(date) => serializer.serialize_str(&crate::calendar::date_key(*date)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<NaiveDate>, D::Error> {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        Ok(raw.as_deref().and_then(super::parse_date_key))
    }
}

mod timestamp {
    use chrono::NaiveDateTime;
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.format("%Y-%m-%dT%H:%M:%S").to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDateTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        super::parse_timestamp(&raw).ok_or_else(|| D::Error::custom(format!("invalid timestamp `{raw}`")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn task_defaults_fill_missing_fields() {
        let task: Task = serde_json::from_str(
            r#"{"id":"t1","title":"Stretch","startDate":"2024-03-10"}"#,
        )
        .unwrap();
        assert_eq!(task.recurrence, Recurrence::Once);
        assert_eq!(task.priority, Priority::Medium);
        assert_eq!(task.execution_time(), NaiveTime::from_hms_opt(9, 0, 0).unwrap());
        assert_eq!(task.effective_duration_minutes(), 30);
        assert!(task.custom_days.is_empty());
        assert!(task.end_date.is_none());
    }

    #[test]
    fn malformed_time_is_treated_as_absent() {
        let task: Task = serde_json::from_str(
            r#"{"id":"t1","title":"x","startDate":"2024-03-10","time":"soon","durationMinutes":0}"#,
        )
        .unwrap();
        assert!(task.time.is_none());
        assert_eq!(task.effective_duration_minutes(), 30);
    }

    #[test]
    fn task_serializes_in_host_shape() {
        let task: Task = serde_json::from_str(
            r#"{"id":"t1","title":"Gym","recurrence":"custom","customDays":[5,1,3],
                "time":"18:30","startDate":"2024-03-04T00:00:00.000Z",
                "completionHistory":["2024-03-04"]}"#,
        )
        .unwrap();
        let value = serde_json::to_value(&task).unwrap();
        assert_eq!(value["time"], "18:30");
        assert_eq!(value["startDate"], "2024-03-04");
        assert_eq!(value["customDays"], serde_json::json!([1, 3, 5]));
        assert_eq!(value["completionHistory"], serde_json::json!(["2024-03-04"]));
        assert_eq!(value["recurrence"], "custom");
    }

    #[test]
    fn toggle_is_membership_not_count() {
        let mut task: Task =
            serde_json::from_str(r#"{"id":"t","title":"x","startDate":"2024-03-10"}"#).unwrap();
        let day = NaiveDate::from_ymd_opt(2024, 3, 12).unwrap();
        let original = task.completion_history.clone();

        assert!(task.toggle_completion(day));
        assert!(task.is_completed_on(day));
        assert!(!task.toggle_completion(day));
        assert!(!task.is_completed_on(day));
        assert_eq!(task.completion_history, original);
    }

    #[test]
    fn assignment_accepts_host_values() {
        let assignment: Assignment = serde_json::from_str(
            r#"{"id":"a1","title":"Midterm","type":"Exam","status":"completed",
                "dueDate":"2024-03-15T14:00:00.000Z","weight":25}"#,
        )
        .unwrap();
        assert_eq!(assignment.kind, AssignmentKind::Exam);
        assert!(assignment.is_completed());
        assert_eq!(
            assignment.due_date,
            NaiveDate::from_ymd_opt(2024, 3, 15).unwrap().and_hms_opt(14, 0, 0).unwrap()
        );

        let other: Assignment = serde_json::from_str(
            r#"{"id":"a2","title":"Lab","type":"Lab","dueDate":"2024-03-15"}"#,
        )
        .unwrap();
        assert_eq!(other.kind, AssignmentKind::Other);
        assert_eq!(other.status, AssignmentStatus::Pending);
        assert_eq!(other.due_date.time(), NaiveTime::from_hms_opt(23, 59, 0).unwrap());
    }

    #[test]
    fn rules_parse_case_insensitively() {
        assert_eq!("Weekly".parse::<Recurrence>(), Ok(Recurrence::Weekly));
        assert_eq!(" high ".parse::<Priority>(), Ok(Priority::High));
        assert!("fortnightly".parse::<Recurrence>().is_err());
    }

    #[test]
    fn empty_state_document_loads() {
        let state: PlannerState = serde_json::from_str("{}").unwrap();
        assert_eq!(state, PlannerState::default());
    }
}
