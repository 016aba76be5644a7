//! Normalized calendar occurrences and the per-source materializers.

use chrono::{Duration, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use crate::calendar::date_key;
use crate::model::{Assignment, AssignmentKind, Course, Task, TimeBlock, WellbeingLog, DEFAULT_DURATION_MINUTES};
use crate::window::QueryWindow;

pub const EXAM_COLOR: &str = "#ef4444";
pub const ASSIGNMENT_FALLBACK_COLOR: &str = "#f59e0b";
pub const TASK_COLOR: &str = "#3b82f6";
pub const WELLBEING_COLOR: &str = "#10b981";
pub const BLOCK_COLOR: &str = "#8b5cf6";

const ASSIGNMENT_LEAD_IN_MINUTES: i64 = 60;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum OccurrenceKind {
    Course,
    Assignment,
    Block,
    Wellbeing,
    Task,
}

/// Back-reference to the record an occurrence came from. Never followed by
/// the engine itself.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "source", rename_all = "camelCase")]
pub enum OccurrenceMeta {
    #[serde(rename_all = "camelCase")]
    Task { task_id: String, date_key: String },
    #[serde(rename_all = "camelCase")]
    Course { course_id: String },
    #[serde(rename_all = "camelCase")]
    Assignment {
        assignment_id: String,
        weight: Option<f64>,
    },
    Wellbeing {
        #[serde(rename = "type")]
        activity_type: String,
    },
    #[serde(rename_all = "camelCase")]
    Block { block_id: String },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Occurrence {
    pub id: String,
    pub title: String,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    #[serde(rename = "type")]
    pub kind: OccurrenceKind,
    pub color: String,
    pub is_completed: bool,
    pub meta: OccurrenceMeta,
}

impl Occurrence {
    pub fn date(&self) -> NaiveDate {
        self.start.date()
    }

    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    /// Chronological order only; equal starts compare equal.
    pub fn cmp_start(&self, other: &Self) -> Ordering {
        self.start.cmp(&other.start)
    }
}

pub fn task_occurrence(task: &Task, date: NaiveDate) -> Occurrence {
    let key = date_key(date);
    let start = date.and_time(task.execution_time());
    let end = add_minutes(start, task.effective_duration_minutes().into());
    Occurrence {
        id: format!("task_{}_{}", task.id, key),
        title: task.title.clone(),
        start,
        end,
        kind: OccurrenceKind::Task,
        color: task.color.clone().unwrap_or_else(|| TASK_COLOR.to_string()),
        is_completed: task.is_completed_on(date),
        meta: OccurrenceMeta::Task {
            task_id: task.id.clone(),
            date_key: key,
        },
    }
}

/// "Due" marker ending at the due time, or `None` when the assignment is
/// completed or due outside the window.
pub fn assignment_occurrence(
    assignment: &Assignment,
    courses: &[Course],
    window: &QueryWindow,
) -> Option<Occurrence> {
    if assignment.is_completed() || !window.contains(assignment.due_date) {
        return None;
    }
    let color = if assignment.kind == AssignmentKind::Exam {
        EXAM_COLOR.to_string()
    } else {
        assignment
            .course_id
            .as_deref()
            .and_then(|id| courses.iter().find(|course| course.id == id))
            .map(|course| course.color.clone())
            .filter(|color| !color.is_empty())
            .unwrap_or_else(|| ASSIGNMENT_FALLBACK_COLOR.to_string())
    };
    Some(Occurrence {
        id: format!("assignment_{}", assignment.id),
        title: format!("Due: {}", assignment.title),
        start: add_minutes(assignment.due_date, -ASSIGNMENT_LEAD_IN_MINUTES),
        end: assignment.due_date,
        kind: OccurrenceKind::Assignment,
        color,
        is_completed: false,
        meta: OccurrenceMeta::Assignment {
            assignment_id: assignment.id.clone(),
            weight: assignment.weight,
        },
    })
}

/// One occurrence per timed activity of the log, in activity order.
pub fn wellbeing_occurrences(log: &WellbeingLog, window: &QueryWindow) -> Vec<Occurrence> {
    log.activities
        .iter()
        .enumerate()
        .filter_map(|(index, activity)| {
            let time = activity.time?;
            let start = log.date.and_time(time);
            if !window.contains(start) {
                return None;
            }
            let minutes = match activity.duration_minutes {
                Some(minutes) if minutes > 0 => minutes,
                _ => DEFAULT_DURATION_MINUTES,
            };
            let suffix = activity
                .id
                .clone()
                .unwrap_or_else(|| index.to_string());
            Some(Occurrence {
                id: format!("wellbeing_{}_{}", log.id, suffix),
                title: activity.name.clone().unwrap_or_else(|| activity.kind.clone()),
                start,
                end: add_minutes(start, minutes.into()),
                kind: OccurrenceKind::Wellbeing,
                color: WELLBEING_COLOR.to_string(),
                is_completed: false,
                meta: OccurrenceMeta::Wellbeing {
                    activity_type: activity.kind.clone(),
                },
            })
        })
        .collect()
}

pub fn block_occurrence(block: &TimeBlock, window: &QueryWindow) -> Option<Occurrence> {
    if block.end < block.start || !window.overlaps(block.start, block.end) {
        return None;
    }
    Some(Occurrence {
        id: format!("block_{}", block.id),
        title: block.title.clone(),
        start: block.start,
        end: block.end,
        kind: OccurrenceKind::Block,
        color: block.color.clone().unwrap_or_else(|| BLOCK_COLOR.to_string()),
        is_completed: false,
        meta: OccurrenceMeta::Block {
            block_id: block.id.clone(),
        },
    })
}

pub(crate) fn add_minutes(at: NaiveDateTime, minutes: i64) -> NaiveDateTime {
    at.checked_add_signed(Duration::minutes(minutes)).unwrap_or(at)
}
