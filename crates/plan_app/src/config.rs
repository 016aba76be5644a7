use std::path::PathBuf;

use anyhow::Result;
use plan_core::unify::CourseProjection;
use tracing::{info, warn};

use crate::cli::Cli;

#[derive(Clone, Debug, PartialEq)]
pub struct AppConfig {
    pub(crate) state_path: PathBuf,
    pub(crate) agenda_span_days: usize,
    pub(crate) agenda_start_offset_days: i64,
    pub(crate) window_padding_days: i64,
    pub(crate) course_projection: CourseProjection,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();
        if let Some(path) = lookup("PLANNER_STATE") {
            if !path.trim().is_empty() {
                config.state_path = PathBuf::from(path.trim());
            }
        }
        if let Some(span) = lookup("PLANNER_AGENDA_SPAN_DAYS") {
            if let Ok(value) = span.trim().parse::<usize>() {
                if value > 0 {
                    config.agenda_span_days = value;
                }
            }
        }
        if let Some(offset) = lookup("PLANNER_AGENDA_START_OFFSET_DAYS") {
            if let Ok(value) = offset.trim().parse::<i64>() {
                config.agenda_start_offset_days = value;
            }
        }
        if let Some(padding) = lookup("PLANNER_WINDOW_PADDING_DAYS") {
            if let Ok(value) = padding.trim().parse::<i64>() {
                config.window_padding_days = value.max(0);
            }
        }
        if let Some(projection) = lookup("PLANNER_COURSE_PROJECTION") {
            match projection.parse::<CourseProjection>() {
                Ok(value) => config.course_projection = value,
                Err(err) => warn!(%err, "keeping default course projection"),
            }
        }
        info!(path = %config.state_path.display(), "using planner state");
        Ok(config)
    }

    /// Flags given on the command line win over the environment.
    pub fn with_cli(mut self, cli: &Cli) -> Self {
        if let Some(path) = &cli.state {
            self.state_path = path.clone();
        }
        if let Some(projection) = cli.course_projection {
            self.course_projection = projection;
        }
        self
    }

    pub fn state_path(&self) -> &PathBuf {
        &self.state_path
    }

    pub fn course_projection(&self) -> CourseProjection {
        self.course_projection
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            state_path: default_state_path(),
            agenda_span_days: 7,
            agenda_start_offset_days: 0,
            window_padding_days: 7,
            course_projection: CourseProjection::default(),
        }
    }
}

fn default_state_path() -> PathBuf {
    let mut path = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
    path.push("planner");
    path.push("state.json");
    path
}
