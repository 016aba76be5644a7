use std::io::Write;
use std::sync::Arc;

use anyhow::{anyhow, bail, Context, Result};
use chrono::{Days, Duration, NaiveDate};
use plan_core::clock::{Clock, SystemClock};
use plan_core::draft::TaskDraft;
use plan_core::occurrence::Occurrence;
use plan_core::window::QueryWindow;
use plan_store::StateStore;
use tracing::{debug, info};

use crate::cli::{AddTask, Command, TaskExtras};
use crate::config::AppConfig;
use crate::render::{render_agenda, render_week};

pub fn run(config: &AppConfig, command: Option<Command>, out: &mut dyn Write) -> Result<()> {
    run_with_clock(config, command, Arc::new(SystemClock), out)
}

pub fn run_with_clock(
    config: &AppConfig,
    command: Option<Command>,
    clock: Arc<dyn Clock>,
    out: &mut dyn Write,
) -> Result<()> {
    let mut store = StateStore::builder(config.state_path())
        .with_clock(Arc::clone(&clock))
        .with_course_projection(config.course_projection())
        .build()
        .with_context(|| format!("failed to open {}", config.state_path().display()))?;
    let today = clock.today();

    match command.unwrap_or(Command::Agenda {
        from: None,
        days: None,
        follow: false,
    }) {
        Command::Agenda { from, days, follow } => {
            let (first, days) = agenda_span(config, today, from, days)?;
            write_agenda(&store, config, today, first, days, out)?;
            if follow {
                let changes = store.watch().context("could not watch the state file")?;
                info!(path = %config.state_path().display(), "following state changes");
                write_agenda_on_change(&store, config, today, first, days, changes, out)?;
            }
        }
        Command::Week { date } => {
            let (week, occurrences) = store.week(date.unwrap_or(today));
            write!(out, "{}", render_week(&week, &occurrences, today))?;
        }
        Command::Toggle { task_id, date } => {
            let completed = store
                .toggle_task_completion(&task_id, date)
                .with_context(|| format!("could not toggle `{task_id}` on {date}"))?;
            let state = if completed { "done" } else { "open" };
            writeln!(out, "{task_id} on {date}: {state}")?;
        }
        Command::AddTask(request) => {
            let draft = draft_from(request, today);
            let task = store.create_task(draft).context("could not save task")?;
            info!(task_id = %task.id, "created task");
            writeln!(out, "created {} ({})", task.id, task.title)?;
        }
        Command::Json { from, days } => {
            let (first, days) = agenda_span(config, today, from, days)?;
            let occurrences = visible_occurrences(&store, config, first, days)?;
            serde_json::to_writer_pretty(&mut *out, &occurrences)
                .context("could not encode occurrences")?;
            writeln!(out)?;
        }
    }
    Ok(())
}

/// Longest span a single agenda or JSON query may cover.
const MAX_SPAN_DAYS: usize = 3660;

fn agenda_span(
    config: &AppConfig,
    today: NaiveDate,
    from: Option<NaiveDate>,
    days: Option<usize>,
) -> Result<(NaiveDate, usize)> {
    let first = match from {
        Some(first) => first,
        None => Duration::try_days(config.agenda_start_offset_days)
            .and_then(|offset| today.checked_add_signed(offset))
            .ok_or_else(|| {
                anyhow!(
                    "start offset of {} days is out of range",
                    config.agenda_start_offset_days
                )
            })?,
    };
    let days = days.filter(|d| *d > 0).unwrap_or(config.agenda_span_days);
    if days > MAX_SPAN_DAYS {
        bail!("cannot show {days} days at once (at most {MAX_SPAN_DAYS})");
    }
    Ok((first, days))
}

fn last_day(first: NaiveDate, days: usize) -> Result<NaiveDate> {
    first
        .checked_add_days(Days::new(days.saturating_sub(1) as u64))
        .ok_or_else(|| anyhow!("{days} days from {first} is past the end of the calendar"))
}

fn write_agenda(
    store: &StateStore,
    config: &AppConfig,
    today: NaiveDate,
    first: NaiveDate,
    days: usize,
    out: &mut dyn Write,
) -> Result<()> {
    let occurrences = visible_occurrences(store, config, first, days)?;
    write!(out, "{}", render_agenda(&occurrences, first, days, today))?;
    out.flush()?;
    Ok(())
}

/// Prints the agenda again for every change notification until the
/// notifications stop.
fn write_agenda_on_change(
    store: &StateStore,
    config: &AppConfig,
    today: NaiveDate,
    first: NaiveDate,
    days: usize,
    changes: impl IntoIterator<Item = ()>,
    out: &mut dyn Write,
) -> Result<()> {
    for () in changes {
        writeln!(out)?;
        write_agenda(store, config, today, first, days, out)?;
    }
    Ok(())
}

/// Queries a padded window so records that start before the visible span
/// but reach into it are still materialized, then keeps what overlaps.
fn visible_occurrences(
    store: &StateStore,
    config: &AppConfig,
    first: NaiveDate,
    days: usize,
) -> Result<Vec<Occurrence>> {
    let last = last_day(first, days)?;
    let visible = QueryWindow::days(first, last);
    let padded = visible.padded(config.window_padding_days);
    let occurrences: Vec<Occurrence> = store
        .calendar(&padded)
        .into_iter()
        .filter(|o| visible.overlaps(o.start, o.end))
        .collect();
    debug!(count = occurrences.len(), %first, %last, "visible occurrences");
    Ok(occurrences)
}

fn draft_from(request: AddTask, today: NaiveDate) -> TaskDraft {
    let (draft, extra) = match request {
        AddTask::Quick { title, date, extra } => {
            (TaskDraft::quick(title, date.unwrap_or(today)), extra)
        }
        AddTask::Routine {
            title,
            recurrence,
            time,
            start,
            extra,
        } => (
            TaskDraft::routine(title, recurrence, start.unwrap_or(today), time),
            extra,
        ),
        AddTask::Plan {
            title,
            start,
            end,
            days,
            extra,
        } => (TaskDraft::plan(title, start, end, days), extra),
    };
    apply_extras(draft, extra)
}

fn apply_extras(mut draft: TaskDraft, extra: TaskExtras) -> TaskDraft {
    if let Some(priority) = extra.priority {
        draft = draft.priority(priority);
    }
    if let Some(minutes) = extra.duration {
        draft = draft.duration_minutes(minutes);
    }
    if let Some(color) = extra.color {
        draft = draft.color(color);
    }
    for tag in extra.tags {
        draft = draft.tag(tag);
    }
    draft
}
