pub mod calendar;
pub mod clock;
pub mod draft;
pub mod model;
pub mod occurrence;
pub mod recurrence;
pub mod schedule;
pub mod unify;
pub mod window;

pub use crate::calendar::{iso_week_number, iso_week_range, WeekRange};
pub use crate::clock::{Clock, FixedClock, SystemClock};
pub use crate::model::PlannerState;
pub use crate::occurrence::{Occurrence, OccurrenceKind, OccurrenceMeta};
pub use crate::recurrence::expand_task_occurrences;
pub use crate::schedule::parse_course_schedule;
pub use crate::unify::{unify, Calendar, CourseProjection};
pub use crate::window::QueryWindow;
