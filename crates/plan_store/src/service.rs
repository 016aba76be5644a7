use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver};
use std::sync::Arc;

use chrono::NaiveDate;
use notify::{EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use parking_lot::RwLock;
use tracing::instrument;

use plan_core::{
    calendar::{iso_week_range, WeekRange},
    clock::{Clock, SystemClock},
    draft::TaskDraft,
    model::{PlannerState, Task},
    occurrence::Occurrence,
    unify::{Calendar, CourseProjection},
    window::QueryWindow,
};

use crate::error::{StoreError, StoreResult};

/// JSON-file backed planner state. Reads share a lock; every mutation takes
/// the write lock and is persisted before returning.
pub struct StateStore {
    path: PathBuf,
    state: Arc<RwLock<PlannerState>>,
    clock: Arc<dyn Clock>,
    calendar: Calendar,
    watcher: Option<RecommendedWatcher>,
}

pub struct StateStoreBuilder {
    path: PathBuf,
    clock: Arc<dyn Clock>,
    course_projection: CourseProjection,
}

impl StateStoreBuilder {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            clock: Arc::new(SystemClock),
            course_projection: CourseProjection::default(),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_course_projection(mut self, projection: CourseProjection) -> Self {
        self.course_projection = projection;
        self
    }

    pub fn build(self) -> StoreResult<StateStore> {
        let calendar =
            Calendar::new(Arc::clone(&self.clock)).with_course_projection(self.course_projection);
        let store = StateStore {
            path: self.path,
            state: Arc::new(RwLock::new(PlannerState::default())),
            clock: self.clock,
            calendar,
            watcher: None,
        };
        store.reload()?;
        Ok(store)
    }
}

impl StateStore {
    pub fn builder(path: impl AsRef<Path>) -> StateStoreBuilder {
        StateStoreBuilder::new(path)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Replaces the in-memory state with the file contents. A missing file
    /// is an empty planner.
    pub fn reload(&self) -> StoreResult<()> {
        let loaded = read_state(&self.path)?;
        tracing::info!(
            path = %self.path.display(),
            tasks = loaded.tasks.len(),
            courses = loaded.courses.len(),
            "loaded planner state"
        );
        *self.state.write() = loaded;
        Ok(())
    }

    pub fn save(&self) -> StoreResult<()> {
        let state = self.state.read();
        write_state(&self.path, &state)
    }

    pub fn snapshot(&self) -> PlannerState {
        self.state.read().clone()
    }

    pub fn tasks(&self) -> Vec<Task> {
        self.state.read().tasks.clone()
    }

    pub fn task(&self, id: &str) -> StoreResult<Task> {
        self.state
            .read()
            .task(id)
            .cloned()
            .ok_or_else(|| StoreError::TaskNotFound(id.to_string()))
    }

    /// Unified occurrences for `window`.
    pub fn calendar(&self, window: &QueryWindow) -> Vec<Occurrence> {
        let state = self.state.read();
        self.calendar.unify(&state, window)
    }

    /// ISO week containing `date` together with its occurrences.
    pub fn week(&self, date: NaiveDate) -> (WeekRange, Vec<Occurrence>) {
        let week = iso_week_range(date);
        let occurrences = self.calendar(&QueryWindow::new(week.start, week.end));
        (week, occurrences)
    }

    /// Flips completion of `task_id` on `date`, persists, and returns whether
    /// the date is now marked done.
    #[instrument(skip(self))]
    pub fn toggle_task_completion(&self, task_id: &str, date: NaiveDate) -> StoreResult<bool> {
        let completed = self.commit(|state| {
            let task = state
                .task_mut(task_id)
                .ok_or_else(|| StoreError::TaskNotFound(task_id.to_string()))?;
            Ok(task.toggle_completion(date))
        })?;
        tracing::debug!(completed, "toggled task completion");
        Ok(completed)
    }

    #[instrument(skip(self, task), fields(task_id = %task.id))]
    pub fn add_task(&self, task: Task) -> StoreResult<()> {
        self.commit(|state| {
            if state.task(&task.id).is_some() {
                return Err(StoreError::DuplicateTask(task.id));
            }
            state.tasks.push(task);
            Ok(())
        })
    }

    /// Builds a task from `draft` under a fresh id and stores it.
    pub fn create_task(&self, draft: TaskDraft) -> StoreResult<Task> {
        let id = self.next_task_id();
        let task = draft.build(id);
        self.add_task(task.clone())?;
        Ok(task)
    }

    #[instrument(skip(self, task), fields(task_id = %task.id))]
    pub fn update_task(&self, task: Task) -> StoreResult<()> {
        self.commit(|state| {
            let slot = state
                .task_mut(&task.id)
                .ok_or_else(|| StoreError::TaskNotFound(task.id.clone()))?;
            *slot = task;
            Ok(())
        })
    }

    #[instrument(skip(self))]
    pub fn remove_task(&self, task_id: &str) -> StoreResult<Task> {
        self.commit(|state| {
            let index = state
                .tasks
                .iter()
                .position(|task| task.id == task_id)
                .ok_or_else(|| StoreError::TaskNotFound(task_id.to_string()))?;
            Ok(state.tasks.remove(index))
        })
    }

    /// Reloads the state whenever the file changes on disk. The returned
    /// receiver gets one message per reload that changed the state; calling
    /// this again replaces the previous watcher.
    pub fn watch(&mut self) -> StoreResult<Receiver<()>> {
        let (changed_tx, changed_rx) = mpsc::channel();
        let path = self.path.clone();
        let state = Arc::clone(&self.state);
        let mut watcher = notify::recommended_watcher(move |res: notify::Result<notify::Event>| {
            let event = match res {
                Ok(event) => event,
                Err(err) => {
                    tracing::warn!(%err, "state watcher error");
                    return;
                }
            };
            if !matches!(event.kind, EventKind::Create(_) | EventKind::Modify(_)) {
                return;
            }
            if !event.paths.iter().any(|changed| changed.ends_with(file_name(&path))) {
                return;
            }
            tracing::debug!(?event, "state file change detected");
            let loaded = match read_state(&path) {
                Ok(loaded) => loaded,
                Err(err) => {
                    tracing::warn!(%err, "keeping previous state");
                    return;
                }
            };
            {
                let mut current = state.write();
                if *current == loaded {
                    return;
                }
                *current = loaded;
            }
            let _ = changed_tx.send(());
        })?;
        watcher.watch(watch_root(&self.path), RecursiveMode::NonRecursive)?;
        self.watcher = Some(watcher);
        Ok(changed_rx)
    }

    pub fn is_watching(&self) -> bool {
        self.watcher.is_some()
    }
}

impl StateStore {
    /// Applies `change` to a copy of the state, writes the copy, and only
    /// then swaps it in. A failed change or write leaves memory untouched.
    fn commit<T>(
        &self,
        change: impl FnOnce(&mut PlannerState) -> StoreResult<T>,
    ) -> StoreResult<T> {
        let mut state = self.state.write();
        let mut next = state.clone();
        let value = change(&mut next)?;
        write_state(&self.path, &next)?;
        *state = next;
        Ok(value)
    }

    fn next_task_id(&self) -> String {
        let millis = self.clock.now().and_utc().timestamp_millis();
        let state = self.state.read();
        let mut candidate = format!("task-{millis}");
        let mut suffix = 1;
        while state.task(&candidate).is_some() {
            candidate = format!("task-{millis}-{suffix}");
            suffix += 1;
        }
        candidate
    }
}

fn read_state(path: &Path) -> StoreResult<PlannerState> {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(err) if err.kind() == ErrorKind::NotFound => return Ok(PlannerState::default()),
        Err(source) => {
            return Err(StoreError::Io {
                path: path.to_path_buf(),
                source,
            })
        }
    };
    if raw.trim().is_empty() {
        return Ok(PlannerState::default());
    }
    serde_json::from_str(&raw).map_err(|source| StoreError::Json {
        path: path.to_path_buf(),
        source,
    })
}

fn write_state(path: &Path, state: &PlannerState) -> StoreResult<()> {
    let io_error = |source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(io_error)?;
        }
    }
    let payload = serde_json::to_string_pretty(state).map_err(|source| StoreError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    fs::write(path, payload).map_err(io_error)
}

fn watch_root(path: &Path) -> &Path {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    }
}

fn file_name(path: &Path) -> &Path {
    path.file_name().map(Path::new).unwrap_or(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use plan_core::clock::FixedClock;
    use plan_core::model::Recurrence;
    use std::time::{Duration, Instant};
    use tempfile::tempdir;

    fn seven() -> chrono::NaiveTime {
        chrono::NaiveTime::from_hms_opt(7, 0, 0).unwrap()
    }

    fn fixed_clock() -> Arc<dyn Clock> {
        Arc::new(FixedClock::at_midnight(
            NaiveDate::from_ymd_opt(2024, 3, 13).unwrap(),
        ))
    }

    #[test]
    fn missing_file_starts_empty() {
        let dir = tempdir().unwrap();
        let store = StateStore::builder(dir.path().join("planner.json"))
            .build()
            .unwrap();
        assert_eq!(store.snapshot(), PlannerState::default());
    }

    #[test]
    fn invalid_json_is_reported_with_path() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("planner.json");
        fs::write(&path, "{ not json").unwrap();
        let err = StateStore::builder(&path).build().err().unwrap();
        assert!(matches!(err, StoreError::Json { .. }));
        assert!(err.to_string().contains("planner.json"));
    }

    #[test]
    fn generated_ids_do_not_collide() {
        let dir = tempdir().unwrap();
        let store = StateStore::builder(dir.path().join("planner.json"))
            .with_clock(fixed_clock())
            .build()
            .unwrap();
        let day = NaiveDate::from_ymd_opt(2024, 3, 13).unwrap();
        let first = store.create_task(TaskDraft::quick("One", day)).unwrap();
        let second = store.create_task(TaskDraft::quick("Two", day)).unwrap();
        assert_ne!(first.id, second.id);
        assert_eq!(store.tasks().len(), 2);
    }

    #[test]
    fn duplicate_and_unknown_tasks_are_rejected() {
        let dir = tempdir().unwrap();
        let store = StateStore::builder(dir.path().join("planner.json"))
            .build()
            .unwrap();
        let day = NaiveDate::from_ymd_opt(2024, 3, 13).unwrap();
        let task = TaskDraft::quick("Once", day).build("t1");
        store.add_task(task.clone()).unwrap();
        assert!(matches!(store.add_task(task), Err(StoreError::DuplicateTask(_))));
        assert!(matches!(
            store.toggle_task_completion("nope", day),
            Err(StoreError::TaskNotFound(_))
        ));
        assert!(matches!(store.remove_task("nope"), Err(StoreError::TaskNotFound(_))));
    }

    #[test]
    fn failed_write_leaves_memory_unchanged() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("planner.json");
        let store = StateStore::builder(&path).build().unwrap();
        let day = NaiveDate::from_ymd_opt(2024, 3, 5).unwrap();
        store
            .add_task(TaskDraft::routine("Stretch", Recurrence::Daily, day, seven()).build("t1"))
            .unwrap();

        fs::remove_file(&path).unwrap();
        fs::create_dir(&path).unwrap();

        assert!(matches!(
            store.toggle_task_completion("t1", day),
            Err(StoreError::Io { .. })
        ));
        assert!(!store.task("t1").unwrap().is_completed_on(day));

        let extra = TaskDraft::quick("Extra", day).build("t2");
        assert!(store.add_task(extra).is_err());
        assert!(store.remove_task("t1").is_err());
        assert_eq!(store.tasks().len(), 1);
    }

    #[test]
    fn update_task_replaces_and_persists() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("planner.json");
        let store = StateStore::builder(&path).build().unwrap();
        let day = NaiveDate::from_ymd_opt(2024, 3, 13).unwrap();
        store.add_task(TaskDraft::quick("Draft", day).build("t1")).unwrap();

        let mut task = store.task("t1").unwrap();
        task.title = "Final".into();
        task.recurrence = Recurrence::Weekly;
        store.update_task(task).unwrap();

        let reopened = StateStore::builder(&path).build().unwrap();
        let saved = reopened.task("t1").unwrap();
        assert_eq!(saved.title, "Final");
        assert_eq!(saved.recurrence, Recurrence::Weekly);

        let ghost = TaskDraft::quick("Ghost", day).build("missing");
        assert!(matches!(store.update_task(ghost), Err(StoreError::TaskNotFound(_))));
    }

    #[test]
    fn save_writes_empty_state_for_missing_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("planner.json");
        let store = StateStore::builder(&path).build().unwrap();
        store.save().unwrap();
        let raw = fs::read_to_string(&path).unwrap();
        let parsed: PlannerState = serde_json::from_str(&raw).unwrap();
        assert_eq!(parsed, PlannerState::default());
    }

    #[test]
    fn watcher_picks_up_external_edits() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("planner.json");
        fs::write(&path, r#"{"tasks":[]}"#).unwrap();
        let mut store = StateStore::builder(&path).build().unwrap();
        let changes = store.watch().unwrap();
        assert!(store.is_watching());

        fs::write(
            &path,
            r#"{"tasks":[{"id":"ext","title":"From elsewhere","startDate":"2024-03-13"}]}"#,
        )
        .unwrap();

        let deadline = Instant::now() + Duration::from_secs(10);
        while store.task("ext").is_err() {
            let remaining = deadline.saturating_duration_since(Instant::now());
            assert!(!remaining.is_zero(), "state file edit was not picked up");
            let _ = changes.recv_timeout(remaining.min(Duration::from_millis(200)));
        }
        assert_eq!(store.task("ext").unwrap().title, "From elsewhere");
    }
}
