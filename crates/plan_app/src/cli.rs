use std::path::PathBuf;

use chrono::{NaiveDate, NaiveTime};
use clap::{Args, Parser, Subcommand};
use plan_core::model::{parse_clock_time, Priority, Recurrence};
use plan_core::unify::CourseProjection;

#[derive(Parser, Debug)]
#[command(name = "planner", version, about = "Unified calendar for tasks, courses, assignments and wellbeing")]
pub struct Cli {
    /// Planner state file (overrides PLANNER_STATE).
    #[arg(long, global = true)]
    pub state: Option<PathBuf>,

    /// Course block placement: `query-window` or `current-week`.
    #[arg(long, global = true)]
    pub course_projection: Option<CourseProjection>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Day-by-day agenda.
    Agenda {
        /// First day shown (defaults to today plus the configured offset).
        #[arg(long)]
        from: Option<NaiveDate>,
        /// Number of days shown.
        #[arg(long)]
        days: Option<usize>,
        /// Keep running and print the agenda again whenever the state file changes.
        #[arg(long)]
        follow: bool,
    },
    /// ISO week view.
    Week {
        /// Any date inside the week (defaults to today).
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Toggle completion of a task on a date.
    Toggle { task_id: String, date: NaiveDate },
    /// Create a task.
    #[command(subcommand)]
    AddTask(AddTask),
    /// Unified occurrences as JSON.
    Json {
        #[arg(long)]
        from: Option<NaiveDate>,
        #[arg(long)]
        days: Option<usize>,
    },
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum AddTask {
    /// One-off task.
    Quick {
        title: String,
        /// Defaults to today.
        #[arg(long)]
        date: Option<NaiveDate>,
        #[command(flatten)]
        extra: TaskExtras,
    },
    /// Repeating task at a fixed time.
    Routine {
        title: String,
        #[arg(long)]
        recurrence: Recurrence,
        #[arg(long, value_parser = parse_time_arg)]
        time: NaiveTime,
        #[arg(long)]
        start: Option<NaiveDate>,
        #[command(flatten)]
        extra: TaskExtras,
    },
    /// Bounded plan, optionally on selected weekdays (0 = Sunday).
    Plan {
        title: String,
        #[arg(long)]
        start: NaiveDate,
        #[arg(long)]
        end: NaiveDate,
        #[arg(long, value_delimiter = ',')]
        days: Vec<u8>,
        #[command(flatten)]
        extra: TaskExtras,
    },
}

#[derive(Args, Debug, Clone, Default, PartialEq)]
pub struct TaskExtras {
    #[arg(long)]
    pub priority: Option<Priority>,
    #[arg(long)]
    pub duration: Option<u32>,
    #[arg(long)]
    pub color: Option<String>,
    #[arg(long = "tag")]
    pub tags: Vec<String>,
}

fn parse_time_arg(value: &str) -> Result<NaiveTime, String> {
    parse_clock_time(value).ok_or_else(|| format!("expected HH:MM, got `{value}`"))
}
