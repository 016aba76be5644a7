use std::collections::HashSet;
use std::sync::Arc;

use chrono::{Datelike, NaiveDate, NaiveTime, Weekday};
use plan_core::{
    iso_week_range, parse_course_schedule, Calendar, FixedClock, OccurrenceKind, PlannerState,
    QueryWindow,
};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
}

fn generated_state() -> PlannerState {
    serde_json::from_str(
        r##"{
            "tasks": [
                {"id":"daily","title":"Stretch","recurrence":"daily","time":"07:00","startDate":"2024-02-20"},
                {"id":"weekly","title":"Laundry","recurrence":"weekly","startDate":"2024-03-05","endDate":"2024-04-02"},
                {"id":"monthly","title":"Rent","recurrence":"monthly","startDate":"2024-01-31"},
                {"id":"gym","title":"Gym","recurrence":"custom","customDays":[1,3,5],"time":"18:00","durationMinutes":60,"startDate":"2024-03-01"},
                {"id":"once","title":"Dentist","recurrence":"once","time":"14:30","startDate":"2024-03-10"},
                {"id":"old","title":"Old habit","recurrence":"daily","status":"archived","startDate":"2024-01-01"}
            ],
            "assignments": [
                {"id":"a1","title":"Essay","courseId":"hist","dueDate":"2024-03-14T23:59:00","status":"pending","weight":15},
                {"id":"a2","title":"Final","type":"Exam","dueDate":"2024-03-20T09:00:00","status":"in-progress"},
                {"id":"a3","title":"Old lab","dueDate":"2024-03-12T12:00:00","status":"completed"}
            ],
            "courses": [
                {"id":"hist","name":"History","color":"#b45309","schedule":"Mon/Wed 10:00 AM"},
                {"id":"bio","name":"Biology","color":"#15803d","schedule":"TTh 1:30 PM"},
                {"id":"tba","name":"Reading group","color":"#000000","schedule":"TBA"}
            ],
            "wellbeingLogs": [
                {"id":"w1","date":"2024-03-12","activities":[
                    {"type":"meditation","time":"07:00","durationMinutes":10},
                    {"type":"journal"}
                ]}
            ],
            "timeBlocks": [
                {"id":"b1","title":"Deep work","start":"2024-03-13T08:00:00","end":"2024-03-13T10:00:00"}
            ]
        }"##,
    )
    .expect("fixture parses")
}

fn calendar() -> Calendar {
    Calendar::new(Arc::new(FixedClock::at_midnight(date(2024, 3, 13))))
}

#[test]
fn unify_is_idempotent() {
    let state = generated_state();
    let window = QueryWindow::days(date(2024, 3, 1), date(2024, 3, 31));
    let first = calendar().unify(&state, &window);
    let second = calendar().unify(&state, &window);
    assert!(!first.is_empty());
    assert_eq!(first, second);
}

#[test]
fn results_are_sorted_by_start() {
    let state = generated_state();
    let window = QueryWindow::days(date(2024, 2, 1), date(2024, 5, 31)).padded(7);
    let occurrences = calendar().unify(&state, &window);
    assert!(occurrences.windows(2).all(|pair| pair[0].start <= pair[1].start));
}

#[test]
fn widening_the_window_never_loses_occurrences() {
    let state = generated_state();
    let narrow = QueryWindow::days(date(2024, 3, 11), date(2024, 3, 17));
    let wide = QueryWindow::days(date(2024, 3, 1), date(2024, 3, 31));
    let narrow_ids: HashSet<String> = calendar().unify(&state, &narrow).into_iter().map(|o| o.id).collect();
    let wide_ids: HashSet<String> = calendar().unify(&state, &wide).into_iter().map(|o| o.id).collect();
    assert!(narrow_ids.is_subset(&wide_ids));
    assert!(wide_ids.len() > narrow_ids.len());
}

#[test]
fn ids_are_unique_within_a_result() {
    let state = generated_state();
    let window = QueryWindow::days(date(2024, 1, 1), date(2024, 12, 31));
    let occurrences = calendar().unify(&state, &window);
    let ids: HashSet<&str> = occurrences.iter().map(|o| o.id.as_str()).collect();
    assert_eq!(ids.len(), occurrences.len());
}

#[test]
fn toggling_completion_is_reflected_and_reversible() {
    let mut state = generated_state();
    let window = QueryWindow::days(date(2024, 3, 11), date(2024, 3, 11));
    let day = date(2024, 3, 11);
    let original = state.task("daily").expect("task").completion_history.clone();

    let is_done = |state: &PlannerState| {
        calendar()
            .unify(state, &window)
            .into_iter()
            .find(|o| o.id == "task_daily_2024-03-11")
            .map(|o| o.is_completed)
    };

    assert_eq!(is_done(&state), Some(false));
    assert!(state.task_mut("daily").expect("task").toggle_completion(day));
    assert_eq!(is_done(&state), Some(true));
    assert!(!state.task_mut("daily").expect("task").toggle_completion(day));
    assert_eq!(is_done(&state), Some(false));
    assert_eq!(state.task("daily").expect("task").completion_history, original);
}

#[test]
fn archived_and_completed_records_stay_out() {
    let state = generated_state();
    let window = QueryWindow::days(date(2024, 1, 1), date(2024, 12, 31));
    let occurrences = calendar().unify(&state, &window);
    assert!(occurrences.iter().all(|o| !o.id.starts_with("task_old_")));
    assert!(occurrences.iter().all(|o| o.id != "assignment_a3"));
    assert!(occurrences.iter().all(|o| !o.id.starts_with("course_tba_")));
}

#[test]
fn weekly_task_respects_its_end_date() {
    let state = generated_state();
    let window = QueryWindow::days(date(2024, 3, 1), date(2024, 4, 30));
    let laundry: Vec<NaiveDate> = calendar()
        .unify(&state, &window)
        .into_iter()
        .filter(|o| o.id.starts_with("task_weekly_"))
        .map(|o| o.start.date())
        .collect();
    assert_eq!(laundry.len(), 5);
    assert!(laundry.iter().all(|d| d.weekday() == Weekday::Tue));
    assert_eq!(laundry.last(), Some(&date(2024, 4, 2)));
}

#[test]
fn one_week_view_mixes_every_source() {
    let state = generated_state();
    let week = iso_week_range(date(2024, 3, 13));
    let occurrences = calendar().unify(&state, &QueryWindow::new(week.start, week.end));
    let kinds: HashSet<OccurrenceKind> = occurrences.iter().map(|o| o.kind).collect();
    assert_eq!(kinds.len(), 5);

    let courses = occurrences.iter().filter(|o| o.kind == OccurrenceKind::Course).count();
    assert_eq!(courses, 4);
    let gym = occurrences.iter().filter(|o| o.id.starts_with("task_gym_")).count();
    assert_eq!(gym, 3);
}

#[test]
fn course_fixture_for_the_current_week() {
    let clock = FixedClock::at_midnight(date(2024, 3, 13));
    let blocks = parse_course_schedule("Mon/Wed 10:00 AM", "History", "#b45309", "hist", &clock);
    assert_eq!(blocks.len(), 2);
    for block in &blocks {
        assert_eq!(block.start.time(), NaiveTime::from_hms_opt(10, 0, 0).expect("time"));
        assert_eq!(block.end.time(), NaiveTime::from_hms_opt(11, 30, 0).expect("time"));
        assert!(iso_week_range(date(2024, 3, 13)).contains(block.start));
    }
}
