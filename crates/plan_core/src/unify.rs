use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::calendar::{iso_week_range, WeekRange};
use crate::clock::{Clock, SystemClock};
use crate::model::PlannerState;
use crate::occurrence::{assignment_occurrence, block_occurrence, wellbeing_occurrences, Occurrence};
use crate::recurrence::expand_task_occurrences;
use crate::schedule::{course_blocks_in_window, is_unscheduled, parse_course_schedule};
use crate::window::QueryWindow;

/// Which weeks course blocks are placed in.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum CourseProjection {
    /// Every ISO week overlapping the query window; blocks outside the
    /// window are dropped.
    #[default]
    QueryWindow,
    /// Only the week containing the clock's current date, regardless of the
    /// query window.
    CurrentWeek,
}

impl FromStr for CourseProjection {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "query-window" | "window" => Ok(Self::QueryWindow),
            "current-week" | "current" => Ok(Self::CurrentWeek),
            other => Err(format!("unknown course projection `{other}`")),
        }
    }
}

/// Unification entry point bundling the clock and projection policy.
#[derive(Clone)]
pub struct Calendar {
    clock: Arc<dyn Clock>,
    course_projection: CourseProjection,
}

impl Default for Calendar {
    fn default() -> Self {
        Self::new(Arc::new(SystemClock))
    }
}

impl std::fmt::Debug for Calendar {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Calendar")
            .field("now", &self.clock.now())
            .field("course_projection", &self.course_projection)
            .finish()
    }
}

impl Calendar {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            course_projection: CourseProjection::default(),
        }
    }

    pub fn with_course_projection(mut self, projection: CourseProjection) -> Self {
        self.course_projection = projection;
        self
    }

    pub fn course_projection(&self) -> CourseProjection {
        self.course_projection
    }

    pub fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    /// ISO week containing the clock's current date.
    pub fn current_week(&self) -> WeekRange {
        iso_week_range(self.clock.today())
    }

    /// All occurrences for `window`, ascending by start. Sources are gathered
    /// as assignments, courses, wellbeing, tasks, time blocks; the sort is
    /// stable so equal starts keep that order.
    pub fn unify(&self, state: &PlannerState, window: &QueryWindow) -> Vec<Occurrence> {
        let mut occurrences: Vec<Occurrence> = Vec::new();

        occurrences.extend(
            state
                .assignments
                .iter()
                .filter_map(|assignment| assignment_occurrence(assignment, &state.courses, window)),
        );

        for course in state.courses.iter().filter(|c| !is_unscheduled(&c.schedule)) {
            match self.course_projection {
                CourseProjection::QueryWindow => {
                    occurrences.extend(course_blocks_in_window(course, window));
                }
                CourseProjection::CurrentWeek => occurrences.extend(parse_course_schedule(
                    &course.schedule,
                    &course.name,
                    &course.color,
                    &course.id,
                    self.clock.as_ref(),
                )),
            }
        }

        for log in &state.wellbeing_logs {
            occurrences.extend(wellbeing_occurrences(log, window));
        }

        occurrences.extend(expand_task_occurrences(&state.tasks, window));

        occurrences.extend(
            state
                .time_blocks
                .iter()
                .filter_map(|block| block_occurrence(block, window)),
        );

        occurrences.sort_by(|a, b| a.cmp_start(b));
        tracing::debug!(
            start = %window.start,
            end = %window.end,
            count = occurrences.len(),
            "unified calendar"
        );
        occurrences
    }

    /// Unified occurrences for the ISO week containing the current date.
    pub fn this_week(&self, state: &PlannerState) -> Vec<Occurrence> {
        let week = self.current_week();
        self.unify(state, &QueryWindow::new(week.start, week.end))
    }
}

/// Unifies with the system clock and the default course projection.
pub fn unify(state: &PlannerState, window: &QueryWindow) -> Vec<Occurrence> {
    Calendar::default().unify(state, window)
}
