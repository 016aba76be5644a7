use std::fmt::Write as _;

use chrono::NaiveDate;
use plan_core::calendar::{iso_week_number, iso_week_year, WeekRange};
use plan_core::occurrence::{Occurrence, OccurrenceKind};

/// `Wed 13 Mar 2024 (today)`, with the distance to `today` in parentheses.
pub fn day_heading(day: NaiveDate, today: NaiveDate) -> String {
    let relative = match day.signed_duration_since(today).num_days() {
        0 => "today".to_string(),
        1 => "tomorrow".to_string(),
        -1 => "yesterday".to_string(),
        ahead if ahead > 1 => format!("in {ahead} days"),
        behind => format!("{} days ago", -behind),
    };
    format!("{} ({relative})", day.format("%a %d %b %Y"))
}

fn kind_label(kind: OccurrenceKind) -> &'static str {
    match kind {
        OccurrenceKind::Course => "course",
        OccurrenceKind::Assignment => "due",
        OccurrenceKind::Block => "block",
        OccurrenceKind::Wellbeing => "wellbeing",
        OccurrenceKind::Task => "task",
    }
}

fn render_line(out: &mut String, occurrence: &Occurrence) {
    let check = match (occurrence.kind, occurrence.is_completed) {
        (OccurrenceKind::Task, true) => "[x]",
        (OccurrenceKind::Task, false) => "[ ]",
        _ => "   ",
    };
    let _ = writeln!(
        out,
        "  {} {}-{} {:<9} {}",
        check,
        occurrence.start.format("%H:%M"),
        occurrence.end.format("%H:%M"),
        kind_label(occurrence.kind),
        occurrence.title
    );
}

fn render_days(
    out: &mut String,
    occurrences: &[Occurrence],
    days: impl Iterator<Item = NaiveDate>,
    today: NaiveDate,
) {
    for day in days {
        let _ = writeln!(out, "{}", day_heading(day, today));
        let mut any = false;
        for occurrence in occurrences.iter().filter(|o| o.date() == day) {
            render_line(out, occurrence);
            any = true;
        }
        if !any {
            out.push_str("  (nothing scheduled)\n");
        }
    }
}

/// Agenda text for `days` consecutive days from `first_day`. Occurrences are
/// expected in start order.
pub fn render_agenda(
    occurrences: &[Occurrence],
    first_day: NaiveDate,
    days: usize,
    today: NaiveDate,
) -> String {
    let mut out = String::new();
    render_days(&mut out, occurrences, first_day.iter_days().take(days), today);
    out
}

pub fn render_week(week: &WeekRange, occurrences: &[Occurrence], today: NaiveDate) -> String {
    let monday = week.monday();
    let mut out = format!(
        "Week {} of {} ({} to {})\n",
        iso_week_number(monday),
        iso_week_year(monday),
        monday.format("%b %d"),
        week.sunday().format("%b %d")
    );
    render_days(&mut out, occurrences, week.days(), today);
    out
}
