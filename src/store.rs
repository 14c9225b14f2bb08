use crate::clock::Clock;
use crate::errors::StorageError;
use crate::models::{ActiveDay, DeleteOutcome, Project, StoredProject, day_key, normalize_name, parse_day};
use crate::stats::default_start_date;
use crate::storage::{
    ALL_KEYS, KeyValueStore, LEGACY_COUNT_KEY, LEGACY_PROJECTS_KEY, PROJECTS_KEY,
    RECENT_NAMES_KEY, STATS_START_KEY,
};
use chrono::NaiveDate;
use std::cmp::Reverse;
use std::collections::VecDeque;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

pub const DEFAULT_PROJECT_NAME: &str = "Counter";
pub const RECENT_NAMES_LIMIT: usize = 10;
pub const UNDO_LIMIT: usize = 20;

#[derive(Debug, Clone)]
struct Snapshot {
    projects: Vec<Project>,
    active_id: Option<String>,
}

/// Owns every project and its daily logs. Each applied mutation is written
/// back to the key-value store; write failures are logged and the in-memory
/// state stays authoritative.
pub struct ProjectStore {
    storage: Box<dyn KeyValueStore>,
    clock: Box<dyn Clock>,
    projects: Vec<Project>,
    active_id: Option<String>,
    recent_names: Vec<String>,
    stats_start: Option<NaiveDate>,
    undo: VecDeque<Snapshot>,
    redo: Vec<Snapshot>,
}

impl ProjectStore {
    /// Reads persisted state (falling back through the legacy keys), repairs
    /// missing active days and carries the previous day's projects over to
    /// today when nothing is active yet.
    pub fn load(storage: impl KeyValueStore + 'static, clock: impl Clock + 'static) -> Self {
        let storage: Box<dyn KeyValueStore> = Box::new(storage);
        let clock: Box<dyn Clock> = Box::new(clock);
        let today = clock.today();

        let mut projects = match read_projects(storage.as_ref(), clock.as_ref()) {
            Ok(projects) => projects,
            Err(err) => {
                error!("failed to load projects, starting fresh: {err}");
                Vec::new()
            }
        };

        let carried = carry_over(&mut projects, today);
        if carried > 0 {
            info!(carried, today = %day_key(today), "carried projects over to today");
        }

        if projects.iter().all(|project| project.last_active_date.is_archived()) {
            projects.push(default_project(clock.as_ref()));
        }

        let active_id = projects
            .iter()
            .find(|project| project.last_active_date.is_on(today))
            .or_else(|| projects.iter().find(|project| !project.last_active_date.is_archived()))
            .map(|project| project.id.clone());

        let recent_names = read_key(storage.as_ref(), RECENT_NAMES_KEY)
            .and_then(|raw| serde_json::from_str::<Vec<String>>(&raw).ok())
            .unwrap_or_default();
        let stats_start = read_key(storage.as_ref(), STATS_START_KEY).and_then(|raw| parse_day(&raw));

        let mut store = Self {
            storage,
            clock,
            projects,
            active_id,
            recent_names,
            stats_start,
            undo: VecDeque::new(),
            redo: Vec::new(),
        };
        store.persist();
        info!(projects = store.projects.len(), "project store loaded");
        store
    }

    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    pub fn projects(&self) -> &[Project] {
        &self.projects
    }

    pub fn project(&self, id: &str) -> Option<&Project> {
        self.projects.iter().find(|project| project.id == id)
    }

    pub fn active_id(&self) -> Option<&str> {
        self.active_id.as_deref()
    }

    pub fn recent_names(&self) -> &[String] {
        &self.recent_names
    }

    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    /// Every project, archived ones included, newest first.
    pub fn all_by_recency(&self) -> Vec<&Project> {
        let mut projects: Vec<&Project> = self.projects.iter().collect();
        projects.sort_by_key(|project| Reverse(project.created_at));
        projects
    }

    /// Projects shown on today's list: everything active today plus the
    /// selected project. The selected one comes first, the rest by name.
    pub fn visible_today(&self) -> Vec<&Project> {
        let today = self.today();
        let is_selected = |project: &Project| self.active_id.as_deref() == Some(project.id.as_str());

        let mut visible: Vec<&Project> = self
            .projects
            .iter()
            .filter(|project| !project.last_active_date.is_archived())
            .filter(|project| project.last_active_date.is_on(today) || is_selected(*project))
            .collect();

        visible.sort_by(|a, b| {
            is_selected(*b)
                .cmp(&is_selected(*a))
                .then_with(|| a.name.to_lowercase().cmp(&b.name.to_lowercase()))
                .then_with(|| a.name.cmp(&b.name))
        });
        visible
    }

    /// Creates a project, or restores a same-named one that is archived or
    /// left on an earlier day. Returns the id of the selected project, or
    /// `None` when the trimmed name is empty.
    pub fn create(&mut self, name: &str) -> Option<String> {
        let name = name.trim();
        if name.is_empty() {
            return None;
        }

        let today = self.today();
        let normalized = normalize_name(name);
        self.checkpoint();

        let restored = self
            .projects
            .iter_mut()
            .find(|project| !project.last_active_date.is_on(today) && project.normalized_name() == normalized);

        let id = match restored {
            Some(project) => {
                project.last_active_date = ActiveDay::Active(today);
                project.count = 0;
                debug!(id = %project.id, name = %project.name, "restored project");
                project.id.clone()
            }
            None => {
                let project = Project::new(
                    new_id(),
                    name.to_string(),
                    today,
                    self.clock.now_millis(),
                );
                debug!(id = %project.id, name = %project.name, "created project");
                let id = project.id.clone();
                self.projects.push(project);
                id
            }
        };

        self.active_id = Some(id.clone());
        self.remember_name(name);
        self.persist();
        Some(id)
    }

    pub fn select(&mut self, id: &str) -> bool {
        let selectable = self
            .project(id)
            .is_some_and(|project| !project.last_active_date.is_archived());
        if selectable {
            self.active_id = Some(id.to_string());
        }
        selectable
    }

    pub fn increment(&mut self, id: &str) -> bool {
        let today = self.today();
        self.mutate(id, |project| {
            project.count = project.count.saturating_add(1);
            let logged = project.logs.entry(today).or_default();
            *logged = logged.saturating_add(1);
            project.last_active_date = ActiveDay::Active(today);
        })
    }

    /// Zeroes the session counter only; today's log keeps what was recorded.
    pub fn reset(&mut self, id: &str) -> bool {
        let today = self.today();
        self.mutate(id, |project| {
            project.count = 0;
            project.last_active_date = ActiveDay::Active(today);
        })
    }

    pub fn rename(&mut self, id: &str, name: &str) -> bool {
        let name = name.trim();
        if name.is_empty() {
            return false;
        }
        let today = self.today();
        self.mutate(id, |project| {
            project.name = name.to_string();
            project.last_active_date = ActiveDay::Active(today);
        })
    }

    /// Projects with positive history before today are archived; the rest are
    /// removed for good. A deleted selection falls back to another project.
    pub fn delete(&mut self, id: &str) -> Option<DeleteOutcome> {
        let index = self.position(id)?;
        let today = self.today();
        self.checkpoint();

        let outcome = if self.projects[index].has_history(today) {
            let project = &mut self.projects[index];
            project.logs.remove(&today);
            project.count = 0;
            project.last_active_date = ActiveDay::Archived;
            DeleteOutcome::Archived
        } else {
            self.projects.remove(index);
            DeleteOutcome::Deleted
        };
        debug!(id, ?outcome, "deleted project");

        if self.active_id.as_deref() == Some(id) {
            self.reselect(id);
        }
        self.persist();
        Some(outcome)
    }

    /// Removes one day from the log. The live counter is left alone even when
    /// the day is today.
    pub fn delete_log_entry(&mut self, id: &str, date: NaiveDate) -> bool {
        let has_entry = self
            .project(id)
            .is_some_and(|project| project.logs.contains_key(&date));
        if !has_entry {
            return false;
        }
        self.mutate(id, |project| {
            project.logs.remove(&date);
        })
    }

    /// Sets one day's log value; zero removes the entry. Editing today also
    /// moves the live counter.
    pub fn upsert_log(&mut self, id: &str, date: NaiveDate, value: u64) -> bool {
        let today = self.today();
        self.mutate(id, |project| {
            if value == 0 {
                project.logs.remove(&date);
            } else {
                project.logs.insert(date, value);
            }
            if date == today {
                project.count = value;
                project.last_active_date = ActiveDay::Active(today);
            }
        })
    }

    pub fn stats_start(&self) -> NaiveDate {
        self.stats_start
            .unwrap_or_else(|| default_start_date(self.today()))
    }

    pub fn set_stats_start(&mut self, start: NaiveDate) {
        self.stats_start = Some(start);
        self.write(STATS_START_KEY, &day_key(start));
    }

    pub fn undo(&mut self) -> bool {
        let Some(snapshot) = self.undo.pop_back() else {
            return false;
        };
        let current = self.snapshot();
        self.redo.push(current);
        self.restore(snapshot);
        true
    }

    pub fn redo(&mut self) -> bool {
        let Some(snapshot) = self.redo.pop() else {
            return false;
        };
        let current = self.snapshot();
        self.undo.push_back(current);
        self.restore(snapshot);
        true
    }

    /// Wipes every persisted key and starts over with one default project.
    pub fn factory_reset(&mut self) {
        for key in ALL_KEYS {
            if let Err(err) = self.storage.remove(key) {
                warn!(key, "failed to clear key: {err}");
            }
        }

        let project = default_project(self.clock.as_ref());
        self.active_id = Some(project.id.clone());
        self.projects = vec![project];
        self.recent_names.clear();
        self.stats_start = None;
        self.undo.clear();
        self.redo.clear();
        self.persist();
        info!("factory reset complete");
    }

    fn position(&self, id: &str) -> Option<usize> {
        self.projects.iter().position(|project| project.id == id)
    }

    fn mutate(&mut self, id: &str, apply: impl FnOnce(&mut Project)) -> bool {
        let Some(index) = self.position(id) else {
            return false;
        };
        self.checkpoint();
        apply(&mut self.projects[index]);
        debug!(id, "updated project");
        self.persist();
        true
    }

    fn snapshot(&self) -> Snapshot {
        Snapshot {
            projects: self.projects.clone(),
            active_id: self.active_id.clone(),
        }
    }

    fn checkpoint(&mut self) {
        if self.undo.len() == UNDO_LIMIT {
            self.undo.pop_front();
        }
        let current = self.snapshot();
        self.undo.push_back(current);
        self.redo.clear();
    }

    fn restore(&mut self, snapshot: Snapshot) {
        self.projects = snapshot.projects;
        self.active_id = snapshot.active_id;
        let selection_valid = self
            .active_id
            .as_deref()
            .and_then(|id| self.project(id))
            .is_some_and(|project| !project.last_active_date.is_archived());
        if !selection_valid {
            let stale = self.active_id.clone().unwrap_or_default();
            self.reselect(&stale);
        }
        self.persist();
    }

    /// Picks another project active today, else any unarchived project, else
    /// creates a fresh default.
    fn reselect(&mut self, excluding: &str) {
        let today = self.today();
        let candidates: Vec<&Project> = self
            .projects
            .iter()
            .filter(|project| project.id != excluding && !project.last_active_date.is_archived())
            .collect();
        let next = candidates
            .iter()
            .find(|project| project.last_active_date.is_on(today))
            .or_else(|| candidates.first())
            .map(|project| project.id.clone());

        match next {
            Some(id) => self.active_id = Some(id),
            None => {
                let project = default_project(self.clock.as_ref());
                self.active_id = Some(project.id.clone());
                self.projects.push(project);
            }
        }
    }

    fn remember_name(&mut self, name: &str) {
        let normalized = normalize_name(name);
        self.recent_names
            .retain(|existing| normalize_name(existing) != normalized);
        self.recent_names.insert(0, name.to_string());
        self.recent_names.truncate(RECENT_NAMES_LIMIT);

        match serde_json::to_string(&self.recent_names) {
            Ok(payload) => self.write(RECENT_NAMES_KEY, &payload),
            Err(err) => warn!("failed to encode recent names: {err}"),
        }
    }

    fn persist(&mut self) {
        match serde_json::to_string(&self.projects) {
            Ok(payload) => self.write(PROJECTS_KEY, &payload),
            Err(err) => warn!("failed to encode projects: {err}"),
        }
    }

    fn write(&mut self, key: &str, value: &str) {
        if let Err(err) = self.storage.set(key, value) {
            warn!(key, "failed to persist: {err}");
        }
    }
}

fn new_id() -> String {
    Uuid::new_v4().to_string()
}

fn default_project(clock: &dyn Clock) -> Project {
    Project::new(
        new_id(),
        DEFAULT_PROJECT_NAME.to_string(),
        clock.today(),
        clock.now_millis(),
    )
}

fn read_key(storage: &dyn KeyValueStore, key: &str) -> Option<String> {
    match storage.get(key) {
        Ok(value) => value,
        Err(err) => {
            warn!(key, "failed to read key: {err}");
            None
        }
    }
}

/// Current collection first, then the legacy collection, then the single
/// counter from the oldest format.
fn read_projects(storage: &dyn KeyValueStore, clock: &dyn Clock) -> Result<Vec<Project>, StorageError> {
    let today = clock.today();
    let now = clock.now_millis();

    for key in [PROJECTS_KEY, LEGACY_PROJECTS_KEY] {
        if let Some(raw) = read_key(storage, key) {
            let stored: Vec<StoredProject> = serde_json::from_str(&raw)?;
            if key == LEGACY_PROJECTS_KEY {
                info!(projects = stored.len(), "migrating legacy projects");
            }
            return Ok(stored
                .into_iter()
                .map(|project| project.into_project(today, new_id, now))
                .collect());
        }
    }

    if let Some(raw) = read_key(storage, LEGACY_COUNT_KEY) {
        let count: u64 = raw
            .trim()
            .parse()
            .map_err(|err| StorageError::Corrupt(format!("legacy counter {raw:?}: {err}")))?;
        info!(count, "migrating legacy single counter");
        let mut project = default_project(clock);
        project.count = count;
        if count > 0 {
            project.logs.insert(today, count);
        }
        return Ok(vec![project]);
    }

    Ok(Vec::new())
}

/// When nothing is active today, brings forward every unarchived project tied
/// to the most recent earlier day, either by its active day or by a positive
/// log on that day. Returns how many projects moved.
fn carry_over(projects: &mut [Project], today: NaiveDate) -> usize {
    if projects.iter().any(|project| project.last_active_date.is_on(today)) {
        return 0;
    }

    let previous = projects
        .iter()
        .filter(|project| !project.last_active_date.is_archived())
        .flat_map(|project| {
            project
                .logs
                .keys()
                .copied()
                .chain(project.last_active_date.date())
        })
        .filter(|date| *date < today)
        .max();
    let Some(previous) = previous else {
        return 0;
    };

    let mut carried = 0;
    for project in projects
        .iter_mut()
        .filter(|project| !project.last_active_date.is_archived())
    {
        if project.last_active_date.is_on(previous) || project.log_on(previous) > 0 {
            project.last_active_date = ActiveDay::Active(today);
            project.count = 0;
            carried += 1;
        }
    }
    carried
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::storage::MemoryStore;
    use std::sync::{Arc, Mutex};

    fn day(raw: &str) -> NaiveDate {
        parse_day(raw).unwrap()
    }

    fn fresh(today: &str) -> (ProjectStore, FixedClock) {
        let clock = FixedClock::new(day(today));
        (ProjectStore::load(MemoryStore::new(), clock.clone()), clock)
    }

    fn water_store(today: &str) -> ProjectStore {
        let projects = r#"[{"id": "water-1", "name": "Water", "count": 10,
            "logs": {"2024-01-01": 10}, "createdAt": 1,
            "lastActiveDate": "2024-01-01"}]"#;
        let storage = MemoryStore::with_entries([(PROJECTS_KEY, projects)]);
        ProjectStore::load(storage, FixedClock::new(day(today)))
    }

    /// Shares its entries so tests can inspect what was written.
    #[derive(Clone, Default)]
    struct SharedStore(Arc<Mutex<MemoryStore>>);

    impl KeyValueStore for SharedStore {
        fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
            self.0.lock().unwrap().get(key)
        }

        fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
            self.0.lock().unwrap().set(key, value)
        }

        fn remove(&mut self, key: &str) -> Result<(), StorageError> {
            self.0.lock().unwrap().remove(key)
        }
    }

    struct BrokenStore;

    impl KeyValueStore for BrokenStore {
        fn get(&self, _key: &str) -> Result<Option<String>, StorageError> {
            Err(StorageError::Io(std::io::Error::other("offline")))
        }

        fn set(&mut self, _key: &str, _value: &str) -> Result<(), StorageError> {
            Err(StorageError::Io(std::io::Error::other("offline")))
        }

        fn remove(&mut self, _key: &str) -> Result<(), StorageError> {
            Err(StorageError::Io(std::io::Error::other("offline")))
        }
    }

    #[test]
    fn first_run_creates_default_project() {
        let (store, _) = fresh("2024-03-10");
        assert_eq!(store.projects().len(), 1);
        let project = &store.projects()[0];
        assert_eq!(project.name, DEFAULT_PROJECT_NAME);
        assert!(project.last_active_date.is_on(day("2024-03-10")));
        assert_eq!(store.active_id(), Some(project.id.as_str()));
    }

    #[test]
    fn push_ups_scenario() {
        let (mut store, _) = fresh("2024-03-10");
        let id = store.create("  Push-ups ").unwrap();
        let today = store.today();
        assert_eq!(store.project(&id).unwrap().count, 0);

        for _ in 0..5 {
            assert!(store.increment(&id));
        }
        let project = store.project(&id).unwrap();
        assert_eq!(project.name, "Push-ups");
        assert_eq!((project.count, project.log_on(today)), (5, 5));

        assert!(store.reset(&id));
        let project = store.project(&id).unwrap();
        assert_eq!((project.count, project.log_on(today)), (0, 5));

        store.increment(&id);
        store.increment(&id);
        let project = store.project(&id).unwrap();
        assert_eq!((project.count, project.log_on(today)), (2, 7));
    }

    #[test]
    fn increment_only_touches_target() {
        let (mut store, _) = fresh("2024-03-10");
        let a = store.create("A").unwrap();
        let b = store.create("B").unwrap();
        store.increment(&a);
        assert_eq!(store.project(&b).unwrap().count, 0);
        assert!(store.project(&b).unwrap().logs.is_empty());
        assert!(!store.increment("missing"));
    }

    #[test]
    fn carryover_brings_previous_day_forward() {
        let store = water_store("2024-01-05");
        let water = store.project("water-1").unwrap();
        assert!(water.last_active_date.is_on(day("2024-01-05")));
        assert_eq!(water.count, 0);
        assert_eq!(water.log_on(day("2024-01-01")), 10);
        assert_eq!(water.logs.len(), 1);
    }

    #[test]
    fn carryover_only_takes_most_recent_day() {
        let projects = r#"[
            {"id": "old", "name": "Old", "logs": {"2024-01-01": 3}, "lastActiveDate": "2024-01-01"},
            {"id": "recent", "name": "Recent", "logs": {"2024-01-03": 1}, "lastActiveDate": "2024-01-02"},
            {"id": "gone", "name": "Gone", "logs": {"2024-01-04": 8}, "lastActiveDate": "ARCHIVED"}
        ]"#;
        let storage = MemoryStore::with_entries([(PROJECTS_KEY, projects)]);
        let store = ProjectStore::load(storage, FixedClock::new(day("2024-01-05")));

        let today = day("2024-01-05");
        assert!(store.project("recent").unwrap().last_active_date.is_on(today));
        assert!(!store.project("old").unwrap().last_active_date.is_on(today));
        assert!(store.project("gone").unwrap().last_active_date.is_archived());
    }

    #[test]
    fn carryover_skipped_when_something_is_active_today() {
        let projects = r#"[
            {"id": "a", "name": "A", "logs": {"2024-01-04": 3}, "lastActiveDate": "2024-01-04"},
            {"id": "b", "name": "B", "logs": {}, "lastActiveDate": "2024-01-05"}
        ]"#;
        let storage = MemoryStore::with_entries([(PROJECTS_KEY, projects)]);
        let store = ProjectStore::load(storage, FixedClock::new(day("2024-01-05")));
        assert!(store.project("a").unwrap().last_active_date.is_on(day("2024-01-04")));
        let visible: Vec<&str> = store.visible_today().iter().map(|p| p.id.as_str()).collect();
        assert_eq!(visible, vec!["b"]);
    }

    #[test]
    fn legacy_collection_is_migrated() {
        let legacy = r#"[{"id": 7, "name": "Steps", "count": 2, "logs": {"2024-01-04": 2}}]"#;
        let shared = SharedStore::default();
        shared.0.lock().unwrap().set(LEGACY_PROJECTS_KEY, legacy).unwrap();

        let store = ProjectStore::load(shared.clone(), FixedClock::new(day("2024-01-05")));
        let steps = store.project("7").unwrap();
        assert!(steps.last_active_date.is_on(day("2024-01-05")));
        assert_eq!(steps.count, 0);

        let written = shared.0.lock().unwrap().get(PROJECTS_KEY).unwrap().unwrap();
        assert!(written.contains("\"Steps\""));
    }

    #[test]
    fn legacy_single_counter_becomes_default_project() {
        let storage = MemoryStore::with_entries([(LEGACY_COUNT_KEY, "12")]);
        let store = ProjectStore::load(storage, FixedClock::new(day("2024-01-05")));
        assert_eq!(store.projects().len(), 1);
        let project = &store.projects()[0];
        assert_eq!(project.count, 12);
        assert_eq!(project.log_on(day("2024-01-05")), 12);
    }

    #[test]
    fn corrupt_state_falls_back_to_default() {
        let storage = MemoryStore::with_entries([(PROJECTS_KEY, "{oops")]);
        let store = ProjectStore::load(storage, FixedClock::new(day("2024-01-05")));
        assert_eq!(store.projects().len(), 1);
        assert_eq!(store.projects()[0].name, DEFAULT_PROJECT_NAME);
    }

    #[test]
    fn broken_storage_keeps_in_memory_state() {
        let mut store = ProjectStore::load(BrokenStore, FixedClock::new(day("2024-01-05")));
        let id = store.create("Water").unwrap();
        assert!(store.increment(&id));
        assert_eq!(store.project(&id).unwrap().count, 1);
    }

    #[test]
    fn delete_with_history_archives_and_create_restores() {
        let mut store = water_store("2024-01-05");
        let today = store.today();
        store.increment("water-1");

        assert_eq!(store.delete("water-1"), Some(DeleteOutcome::Archived));
        let water = store.project("water-1").unwrap();
        assert!(water.last_active_date.is_archived());
        assert_eq!(water.count, 0);
        assert!(!water.logs.contains_key(&today));
        assert_eq!(water.log_on(day("2024-01-01")), 10);
        assert!(store.visible_today().iter().all(|p| p.id != "water-1"));

        let before = store.projects().len();
        let id = store.create(" water ").unwrap();
        assert_eq!(id, "water-1");
        assert_eq!(store.projects().len(), before);
        let water = store.project("water-1").unwrap();
        assert!(water.last_active_date.is_on(today));
        assert_eq!(water.name, "Water");
    }

    #[test]
    fn create_restores_same_name_left_on_earlier_day() {
        let (mut store, clock) = fresh("2024-03-10");
        let id = store.create("Water").unwrap();
        store.increment(&id);
        let before = store.projects().len();

        clock.set(day("2024-03-11"));
        let restored = store.create("water").unwrap();
        assert_eq!(restored, id);
        assert_eq!(store.projects().len(), before);
        let water = store.project(&id).unwrap();
        assert_eq!(water.count, 0);
        assert!(water.last_active_date.is_on(day("2024-03-11")));
        assert_eq!(water.log_on(day("2024-03-10")), 1);
    }

    #[test]
    fn create_same_name_active_today_makes_a_new_project() {
        let (mut store, _) = fresh("2024-03-10");
        let first = store.create("Water").unwrap();
        let second = store.create("water").unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn delete_without_history_is_permanent() {
        let (mut store, _) = fresh("2024-03-10");
        let id = store.create("Squats").unwrap();
        store.increment(&id);
        let before = store.projects().len();

        assert_eq!(store.delete(&id), Some(DeleteOutcome::Deleted));
        assert_eq!(store.projects().len(), before - 1);
        assert!(store.project(&id).is_none());
    }

    #[test]
    fn deleting_last_project_creates_default() {
        let (mut store, _) = fresh("2024-03-10");
        let only = store.projects()[0].id.clone();
        store.delete(&only);
        assert_eq!(store.projects().len(), 1);
        let replacement = &store.projects()[0];
        assert_ne!(replacement.id, only);
        assert_eq!(store.active_id(), Some(replacement.id.as_str()));
    }

    #[test]
    fn deleting_selection_prefers_project_active_today() {
        let (mut store, clock) = fresh("2024-03-10");
        let stale = store.create("Stale").unwrap();
        clock.set(day("2024-03-11"));
        let fresh_today = store.create("Today").unwrap();
        let doomed = store.create("Doomed").unwrap();
        assert_eq!(store.active_id(), Some(doomed.as_str()));

        store.delete(&doomed);
        assert_eq!(store.active_id(), Some(fresh_today.as_str()));
        assert!(store.project(&stale).is_some());
    }

    #[test]
    fn visible_today_orders_selection_then_names() {
        let (mut store, clock) = fresh("2024-03-10");
        let default_id = store.projects()[0].id.clone();
        let stale = store.create("zebra").unwrap();
        clock.set(day("2024-03-11"));
        store.increment(&default_id);
        store.create("banana").unwrap();
        store.create("Apple").unwrap();
        assert!(store.select(&stale));

        let names: Vec<&str> = store.visible_today().iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["zebra", "Apple", "banana", DEFAULT_PROJECT_NAME]);
    }

    #[test]
    fn delete_log_entry_leaves_counter() {
        let (mut store, _) = fresh("2024-03-10");
        let id = store.create("Reading").unwrap();
        let today = store.today();
        store.increment(&id);
        store.increment(&id);

        assert!(store.delete_log_entry(&id, today));
        let project = store.project(&id).unwrap();
        assert_eq!(project.count, 2);
        assert!(!project.logs.contains_key(&today));
        assert!(!store.delete_log_entry(&id, today));
    }

    #[test]
    fn upsert_zero_removes_key_and_today_edit_is_live() {
        let (mut store, _) = fresh("2024-03-10");
        let id = store.create("Reading").unwrap();
        let past = day("2024-02-01");

        store.upsert_log(&id, past, 4);
        assert_eq!(store.project(&id).unwrap().log_on(past), 4);
        store.upsert_log(&id, past, 0);
        assert!(!store.project(&id).unwrap().logs.contains_key(&past));

        let today = store.today();
        store.upsert_log(&id, today, 9);
        let project = store.project(&id).unwrap();
        assert_eq!((project.count, project.log_on(today)), (9, 9));
    }

    #[test]
    fn rename_rejects_blank_names() {
        let (mut store, _) = fresh("2024-03-10");
        let id = store.create("Reading").unwrap();
        assert!(!store.rename(&id, "   "));
        assert!(store.rename(&id, " Books "));
        assert_eq!(store.project(&id).unwrap().name, "Books");
        assert_eq!(store.create("  "), None);
    }

    #[test]
    fn recent_names_are_bounded_and_deduplicated() {
        let (mut store, _) = fresh("2024-03-10");
        for index in 0..12 {
            store.create(&format!("Name {index}"));
        }
        store.create("name 5");
        let recent = store.recent_names();
        assert_eq!(recent.len(), RECENT_NAMES_LIMIT);
        assert_eq!(recent[0], "name 5");
        assert_eq!(recent.iter().filter(|name| normalize_name(name) == "name 5").count(), 1);
    }

    #[test]
    fn undo_and_redo_walk_snapshots() {
        let (mut store, _) = fresh("2024-03-10");
        let id = store.create("Water").unwrap();
        store.increment(&id);
        store.increment(&id);

        assert!(store.undo());
        assert_eq!(store.project(&id).unwrap().count, 1);
        assert!(store.redo());
        assert_eq!(store.project(&id).unwrap().count, 2);

        store.undo();
        store.reset(&id);
        assert!(!store.can_redo());
    }

    #[test]
    fn undo_history_is_capped() {
        let (mut store, _) = fresh("2024-03-10");
        let id = store.create("Water").unwrap();
        for _ in 0..30 {
            store.increment(&id);
        }
        let mut steps = 0;
        while store.undo() {
            steps += 1;
        }
        assert_eq!(steps, UNDO_LIMIT);
        assert_eq!(store.project(&id).unwrap().count, 10);
    }

    #[test]
    fn stats_start_defaults_to_six_months_and_persists() {
        let shared = SharedStore::default();
        let mut store = ProjectStore::load(shared.clone(), FixedClock::new(day("2024-08-31")));
        assert_eq!(store.stats_start(), day("2024-02-29"));

        store.set_stats_start(day("2024-05-01"));
        let reloaded = ProjectStore::load(shared, FixedClock::new(day("2024-08-31")));
        assert_eq!(reloaded.stats_start(), day("2024-05-01"));
    }

    #[test]
    fn factory_reset_clears_everything() {
        let shared = SharedStore::default();
        shared.0.lock().unwrap().set(LEGACY_COUNT_KEY, "3").unwrap();
        let mut store = ProjectStore::load(shared.clone(), FixedClock::new(day("2024-03-10")));
        store.create("Water");
        store.set_stats_start(day("2024-01-01"));

        store.factory_reset();
        assert_eq!(store.projects().len(), 1);
        assert!(store.recent_names().is_empty());
        assert!(!store.can_undo());

        let entries = shared.0.lock().unwrap();
        assert_eq!(entries.get(LEGACY_COUNT_KEY).unwrap(), None);
        assert_eq!(entries.get(RECENT_NAMES_KEY).unwrap(), None);
        assert_eq!(entries.get(STATS_START_KEY).unwrap(), None);
    }
}
