//! Free-text weekly course schedules ("Mon/Wed 10:00 AM", "TTh 1:30pm").
//!
//! Parsing is best effort: text without a recognizable time or weekday
//! yields no blocks instead of an error.

use std::collections::BTreeSet;

use chrono::{Duration, NaiveDate, NaiveTime};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::calendar::{iso_week_range, WeekRange};
use crate::clock::Clock;
use crate::model::Course;
use crate::occurrence::{add_minutes, Occurrence, OccurrenceKind, OccurrenceMeta};
use crate::window::QueryWindow;

pub const COURSE_BLOCK_MINUTES: i64 = 90;
pub const UNSCHEDULED: &str = "TBA";

const DAY_ABBREVIATIONS: [&str; 7] = ["sun", "mon", "tue", "wed", "thu", "fri", "sat"];

static TIME_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(\d{1,2})(?::(\d{2}))?\s*(am|pm)?").expect("time pattern compiles")
});

/// Weekdays (0 = Sunday .. 6 = Saturday) and start time pulled out of a
/// schedule string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeeklyPattern {
    pub days: BTreeSet<u8>,
    pub time: NaiveTime,
}

pub fn is_unscheduled(text: &str) -> bool {
    let trimmed = text.trim();
    trimmed.is_empty() || trimmed.eq_ignore_ascii_case(UNSCHEDULED)
}

pub fn parse_weekly_pattern(text: &str) -> Option<WeeklyPattern> {
    if is_unscheduled(text) {
        return None;
    }
    let lower = text.to_lowercase();
    let time = parse_time(&lower)?;
    let days = parse_days(&lower);
    if days.is_empty() {
        tracing::debug!(schedule = text, "schedule names no weekdays");
        return None;
    }
    Some(WeeklyPattern { days, time })
}

/// Course blocks for the week containing the clock's current date.
pub fn parse_course_schedule(
    schedule: &str,
    course_name: &str,
    course_color: &str,
    course_id: &str,
    clock: &dyn Clock,
) -> Vec<Occurrence> {
    let Some(pattern) = parse_weekly_pattern(schedule) else {
        return Vec::new();
    };
    let week = iso_week_range(clock.today());
    blocks_for_week(&pattern, course_name, course_color, course_id, &week)
}

/// Course blocks for the ISO week containing `anchor`.
pub fn course_blocks_for_week(course: &Course, anchor: NaiveDate) -> Vec<Occurrence> {
    let Some(pattern) = parse_weekly_pattern(&course.schedule) else {
        return Vec::new();
    };
    let week = iso_week_range(anchor);
    blocks_for_week(&pattern, &course.name, &course.color, &course.id, &week)
}

/// Course blocks for every ISO week touching `window`, keeping only blocks
/// that start inside it.
pub fn course_blocks_in_window(course: &Course, window: &QueryWindow) -> Vec<Occurrence> {
    if window.is_empty() {
        return Vec::new();
    }
    let Some(pattern) = parse_weekly_pattern(&course.schedule) else {
        return Vec::new();
    };
    let mut blocks = Vec::new();
    let mut monday = iso_week_range(window.first_day()).monday();
    while monday <= window.last_day() {
        let week = iso_week_range(monday);
        blocks.extend(
            blocks_for_week(&pattern, &course.name, &course.color, &course.id, &week)
                .into_iter()
                .filter(|block| window.contains(block.start)),
        );
        let Some(next) = monday.checked_add_signed(Duration::days(7)) else {
            break;
        };
        monday = next;
    }
    blocks
}

fn blocks_for_week(
    pattern: &WeeklyPattern,
    course_name: &str,
    course_color: &str,
    course_id: &str,
    week: &WeekRange,
) -> Vec<Occurrence> {
    pattern
        .days
        .iter()
        .filter_map(|&weekday| {
            let date = week.date_for_weekday(weekday)?;
            let start = date.and_time(pattern.time);
            Some(Occurrence {
                id: format!("course_{}_{}_{}", course_id, weekday, date.format("%Y-%m-%d")),
                title: course_name.to_string(),
                start,
                end: add_minutes(start, COURSE_BLOCK_MINUTES),
                kind: OccurrenceKind::Course,
                color: course_color.to_string(),
                is_completed: false,
                meta: OccurrenceMeta::Course {
                    course_id: course_id.to_string(),
                },
            })
        })
        .collect()
}

fn parse_time(lower: &str) -> Option<NaiveTime> {
    let captures = TIME_PATTERN.captures(lower)?;
    let mut hours: u32 = captures.get(1)?.as_str().parse().ok()?;
    let minutes: u32 = match captures.get(2) {
        Some(value) => value.as_str().parse().ok()?,
        None => 0,
    };
    match captures.get(3).map(|m| m.as_str()) {
        Some("pm") if hours < 12 => hours += 12,
        Some("am") if hours == 12 => hours = 0,
        _ => {}
    }
    NaiveTime::from_hms_opt(hours, minutes, 0)
}

fn parse_days(lower: &str) -> BTreeSet<u8> {
    let days: BTreeSet<u8> = DAY_ABBREVIATIONS
        .iter()
        .zip(0u8..)
        .filter(|(abbreviation, _)| lower.contains(**abbreviation))
        .map(|(_, index)| index)
        .collect();
    if !days.is_empty() {
        return days;
    }

    // "t" alone is Tuesday; Thursday needs "th".
    lower
        .split(|c: char| !c.is_ascii_alphabetic())
        .filter(|token| !token.is_empty())
        .filter_map(letter_token_days)
        .flatten()
        .collect()
}

/// Decodes tokens such as "m", "mwf" or "tth". Tokens containing anything
/// else are not day tokens at all.
fn letter_token_days(token: &str) -> Option<Vec<u8>> {
    let bytes = token.as_bytes();
    let mut days = Vec::new();
    let mut pos = 0;
    while pos < bytes.len() {
        if bytes[pos..].starts_with(b"th") {
            days.push(4);
            pos += 2;
            continue;
        }
        let day = match bytes[pos] {
            b'm' => 1,
            b't' => 2,
            b'w' => 3,
            b'f' => 5,
            _ => return None,
        };
        days.push(day);
        pos += 1;
    }
    Some(days)
}
