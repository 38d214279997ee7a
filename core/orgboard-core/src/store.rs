//! The application state store: single source of truth for all
//! organizational data in the running process.
//!
//! The store owns the canonical [`ApplicationState`], loads and merges it
//! from durable storage at startup, and persists it back on a debounced
//! schedule, on an interval safety net, and on explicit flush. A corrupt or
//! partially missing snapshot never crashes startup: the raw payload is
//! backed up best-effort and the store falls back to the default snapshot.
//!
//! Persistence failures are logged and swallowed; the in-memory state stays
//! authoritative and the store degrades to memory-only operation. Only
//! rejected mutations (`NotFound` / `InvalidTarget`) surface to callers.
//!
//! Not thread-safe: callers provide their own synchronization, matching the
//! single-threaded event-loop model the dashboard runs under.

use std::time::Instant;

use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::analytics::{self, AnalyticsReport, AnalyticsSnapshot, REPORT_CAP};
use crate::autosave::AutosaveSchedule;
use crate::defaults::default_state;
use crate::error::{Result, StoreError};
use crate::merge::deep_merge;
use crate::search::{self, SearchBreakdown, SearchHit};
use crate::storage::{keys, StorageBackend};
use crate::types::{
    ActivityKind, ApplicationState, Notification, NotificationKind, Person, Priority, Stream,
    Task, TaskStatus, Team,
};

/// Activity log cap; oldest entries are evicted past this.
pub const ACTIVITY_LOG_CAP: usize = 50;

/// Notification list cap, same eviction policy as the activity log.
pub const NOTIFICATION_CAP: usize = 50;

/// Every Nth successful save also writes a timestamped full backup.
pub const BACKUP_EVERY_N_SAVES: u64 = 10;

/// Fields for a new team.
#[derive(Debug, Clone, Default)]
pub struct TeamDraft {
    pub name: String,
    pub stream: Stream,
    pub description: String,
    pub responsibilities: String,
    pub performance: u8,
}

/// Fields for a new person.
#[derive(Debug, Clone, Default)]
pub struct PersonDraft {
    pub name: String,
    pub role: String,
    pub client: String,
}

/// Fields for a new task.
#[derive(Debug, Clone)]
pub struct TaskDraft {
    pub title: String,
    pub description: String,
    pub due_date: DateTime<Utc>,
    pub priority: Priority,
    pub assigned_to: String,
}

pub struct ApplicationStateStore<S: StorageBackend> {
    storage: S,
    state: ApplicationState,
    schedule: AutosaveSchedule,
    save_counter: u64,
    /// Guards the flush body against reentry when the debounced and
    /// interval triggers land on the same tick.
    flush_in_progress: bool,
}

impl<S: StorageBackend> ApplicationStateStore<S> {
    // ─────────────────────────────────────────────────────────────────────
    // Lifecycle
    // ─────────────────────────────────────────────────────────────────────

    /// Loads the store from `storage`. Never fails: unreadable storage,
    /// an absent key, and a corrupt payload all degrade to the default
    /// snapshot (with a best-effort backup of corrupt data).
    pub fn load(storage: S) -> Self {
        Self::load_at(storage, Instant::now())
    }

    pub fn load_at(mut storage: S, now: Instant) -> Self {
        let (state, loaded) = match storage.get(keys::STATE) {
            Ok(Some(raw)) => match parse_snapshot(&raw) {
                Ok(state) => (state, true),
                Err(err) => {
                    warn!(error = %err, "Persisted state unreadable; falling back to defaults");
                    if let Err(backup_err) = storage.set(keys::CORRUPT_BACKUP, &raw) {
                        warn!(error = %backup_err, "Failed to back up corrupt payload");
                    }
                    (default_state(), false)
                }
            },
            Ok(None) => {
                info!("No persisted state found; initializing default snapshot");
                (default_state(), false)
            }
            Err(err) => {
                warn!(error = %err, "Durable storage unavailable; operating on defaults");
                (default_state(), false)
            }
        };

        let save_counter = load_save_counter(&storage);
        let mut store = ApplicationStateStore {
            storage,
            state,
            schedule: AutosaveSchedule::new(now),
            save_counter,
            flush_in_progress: false,
        };

        // The store does not implement real authentication; a loaded
        // session is always considered logged in.
        store.state.session.is_logged_in = true;

        if !loaded {
            store.flush_at(now, false);
        }
        store
    }

    /// Builds a store around an existing state without touching storage.
    pub fn with_state(storage: S, state: ApplicationState, now: Instant) -> Self {
        let save_counter = load_save_counter(&storage);
        ApplicationStateStore {
            storage,
            state,
            schedule: AutosaveSchedule::new(now),
            save_counter,
            flush_in_progress: false,
        }
    }

    pub fn state(&self) -> &ApplicationState {
        &self.state
    }

    pub fn save_counter(&self) -> u64 {
        self.save_counter
    }

    // ─────────────────────────────────────────────────────────────────────
    // Saving
    // ─────────────────────────────────────────────────────────────────────

    /// Drives the autosave schedule; call from the owner's event loop.
    /// Returns whether a flush ran.
    pub fn tick(&mut self, now: Instant) -> bool {
        if self.schedule.is_due(now) {
            self.flush_at(now, false);
            true
        } else {
            false
        }
    }

    /// Immediate best-effort flush, bypassing the debounce. Used on
    /// shutdown and explicit user saves; errors are logged, never raised.
    pub fn flush_now(&mut self) {
        self.flush_at(Instant::now(), true);
    }

    fn flush_at(&mut self, now: Instant, explicit: bool) {
        if self.flush_in_progress {
            debug!("Flush already in progress; skipping reentrant call");
            return;
        }
        self.flush_in_progress = true;

        if explicit {
            // Safe to log from within the save path: recording an activity
            // never schedules another save.
            self.record_activity(ActivityKind::Save, "State flushed to storage", None, None);
        }

        if let Some(payload) = self.write_state() {
            self.after_successful_write(&payload);
        }

        // Failures are dropped, not retried on a tight loop; the interval
        // safety net picks the state up again later.
        self.schedule.mark_flushed(now);
        self.flush_in_progress = false;
    }

    /// Writes the serialized state under the primary key. On quota
    /// exhaustion, evicts the non-critical auxiliary keys and retries
    /// exactly once. Returns the payload on success.
    fn write_state(&mut self) -> Option<String> {
        let payload = match serde_json::to_string(&self.state) {
            Ok(payload) => payload,
            Err(err) => {
                warn!(error = %err, "Failed to serialize state; skipping write");
                return None;
            }
        };

        match self.storage.set(keys::STATE, &payload) {
            Ok(()) => Some(payload),
            Err(StoreError::QuotaExceeded { .. }) => {
                warn!("Storage quota exceeded; evicting auxiliary keys and retrying");
                for key in keys::EVICTABLE {
                    if let Err(err) = self.storage.remove(key) {
                        debug!(key, error = %err, "Auxiliary key eviction failed");
                    }
                }
                match self.storage.set(keys::STATE, &payload) {
                    Ok(()) => Some(payload),
                    Err(err) => {
                        warn!(error = %err, "State write failed after eviction retry");
                        None
                    }
                }
            }
            Err(err) => {
                warn!(error = %err, "State write failed; in-memory state remains authoritative");
                None
            }
        }
    }

    fn after_successful_write(&mut self, payload: &str) {
        self.save_counter += 1;
        if let Err(err) = self
            .storage
            .set(keys::SAVE_COUNTER, &self.save_counter.to_string())
        {
            debug!(error = %err, "Failed to persist save counter");
        }

        if self.save_counter % BACKUP_EVERY_N_SAVES == 0 {
            let stamp = Utc::now().format("%Y%m%dT%H%M%S%.3fZ").to_string();
            // Fire-and-forget: a failed backup never affects the save.
            if let Err(err) = self.storage.set(&keys::backup(&stamp), payload) {
                debug!(error = %err, "Periodic backup write failed");
            }
        }
    }

    fn mark_dirty(&mut self) {
        self.schedule.note_mutation(Instant::now());
    }

    // ─────────────────────────────────────────────────────────────────────
    // Activity Log
    // ─────────────────────────────────────────────────────────────────────

    /// Front-inserts an activity and trims the log to its cap. Does not
    /// schedule a save; the mutation that caused the activity does.
    pub fn record_activity(
        &mut self,
        kind: ActivityKind,
        description: impl Into<String>,
        team: Option<String>,
        details: Option<Value>,
    ) {
        let now = Utc::now();
        let max_id = self.state.activities.iter().map(|a| a.id).max();
        self.state.activities.insert(
            0,
            crate::types::Activity {
                id: log_entry_id(max_id, now),
                timestamp: now,
                kind,
                description: description.into(),
                team,
                details,
            },
        );
        self.state.activities.truncate(ACTIVITY_LOG_CAP);
    }

    // ─────────────────────────────────────────────────────────────────────
    // Teams & Personnel
    // ─────────────────────────────────────────────────────────────────────

    pub fn add_team(&mut self, draft: TeamDraft) -> u64 {
        let id = next_id(self.state.teams.iter().map(|t| t.id));
        let name = draft.name.clone();
        self.state.teams.push(Team {
            id,
            name: draft.name,
            stream: draft.stream,
            description: draft.description,
            responsibilities: draft.responsibilities,
            performance: draft.performance.min(100),
            personnel: Vec::new(),
        });
        self.record_activity(
            ActivityKind::Create,
            format!("Created team {name}"),
            Some(name),
            None,
        );
        self.mark_dirty();
        id
    }

    /// Applies `mutate` to the team with `id`. The closure must leave the
    /// team's id untouched.
    pub fn update_team(&mut self, id: u64, mutate: impl FnOnce(&mut Team)) -> Result<()> {
        let name = {
            let team = self
                .state
                .teams
                .iter_mut()
                .find(|t| t.id == id)
                .ok_or(StoreError::NotFound { entity: "team", id })?;
            mutate(team);
            team.performance = team.performance.min(100);
            team.name.clone()
        };
        self.record_activity(
            ActivityKind::Update,
            format!("Updated team {name}"),
            Some(name),
            None,
        );
        self.mark_dirty();
        Ok(())
    }

    /// Removes a team and its roster. Tasks referencing its members by
    /// name are left untouched; dangling name references are tolerated.
    pub fn remove_team(&mut self, id: u64) -> Result<()> {
        let pos = self
            .state
            .teams
            .iter()
            .position(|t| t.id == id)
            .ok_or(StoreError::NotFound { entity: "team", id })?;
        let team = self.state.teams.remove(pos);
        self.record_activity(
            ActivityKind::Delete,
            format!("Removed team {}", team.name),
            Some(team.name.clone()),
            None,
        );
        self.mark_dirty();
        Ok(())
    }

    /// Adds a person to a team. Person ids are unique across the whole
    /// store, not just within the team.
    pub fn add_person(&mut self, team_id: u64, draft: PersonDraft) -> Result<u64> {
        let id = next_id(self.state.personnel().map(|p| p.id));
        let (person_name, team_name) = {
            let team = self
                .state
                .teams
                .iter_mut()
                .find(|t| t.id == team_id)
                .ok_or_else(|| StoreError::InvalidTarget {
                    target: format!("team {team_id}"),
                })?;
            team.personnel.push(Person {
                id,
                name: draft.name.clone(),
                role: draft.role,
                client: draft.client,
            });
            (draft.name, team.name.clone())
        };
        self.record_activity(
            ActivityKind::Create,
            format!("Added {person_name} to {team_name}"),
            Some(team_name),
            None,
        );
        self.mark_dirty();
        Ok(id)
    }

    pub fn update_person(&mut self, id: u64, mutate: impl FnOnce(&mut Person)) -> Result<()> {
        let name = {
            let person = self
                .state
                .teams
                .iter_mut()
                .flat_map(|t| t.personnel.iter_mut())
                .find(|p| p.id == id)
                .ok_or(StoreError::NotFound {
                    entity: "person",
                    id,
                })?;
            mutate(person);
            person.name.clone()
        };
        self.record_activity(ActivityKind::Update, format!("Updated {name}"), None, None);
        self.mark_dirty();
        Ok(())
    }

    pub fn remove_person(&mut self, id: u64) -> Result<()> {
        let mut removed: Option<(Person, String)> = None;
        for team in &mut self.state.teams {
            if let Some(pos) = team.personnel.iter().position(|p| p.id == id) {
                removed = Some((team.personnel.remove(pos), team.name.clone()));
                break;
            }
        }
        let (person, team_name) = removed.ok_or(StoreError::NotFound {
            entity: "person",
            id,
        })?;
        self.record_activity(
            ActivityKind::Delete,
            format!("Removed {} from {team_name}", person.name),
            Some(team_name),
            None,
        );
        self.mark_dirty();
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────
    // Tasks
    // ─────────────────────────────────────────────────────────────────────

    pub fn add_task(&mut self, draft: TaskDraft) -> u64 {
        let id = next_id(self.state.tasks.iter().map(|t| t.id));
        let title = draft.title.clone();
        self.state.tasks.push(Task {
            id,
            title: draft.title,
            description: draft.description,
            due_date: draft.due_date,
            priority: draft.priority,
            assigned_to: draft.assigned_to,
            progress: 0,
            status: TaskStatus::NotStarted,
        });
        self.record_activity(
            ActivityKind::Create,
            format!("Created task {title}"),
            None,
            None,
        );
        self.mark_dirty();
        id
    }

    pub fn update_task(&mut self, id: u64, mutate: impl FnOnce(&mut Task)) -> Result<()> {
        let title = {
            let task = self
                .state
                .tasks
                .iter_mut()
                .find(|t| t.id == id)
                .ok_or(StoreError::NotFound { entity: "task", id })?;
            mutate(task);
            task.progress = task.progress.min(100);
            task.title.clone()
        };
        self.record_activity(
            ActivityKind::Update,
            format!("Updated task {title}"),
            None,
            None,
        );
        self.mark_dirty();
        Ok(())
    }

    /// Sets task progress (clamped to 100) and keeps the status in step:
    /// 100 completes the task, anything above zero marks it in progress.
    pub fn set_task_progress(&mut self, id: u64, progress: u8) -> Result<()> {
        self.update_task(id, |task| {
            task.progress = progress.min(100);
            task.status = match task.progress {
                100 => TaskStatus::Completed,
                0 => TaskStatus::NotStarted,
                _ => TaskStatus::InProgress,
            };
        })
    }

    pub fn remove_task(&mut self, id: u64) -> Result<()> {
        let pos = self
            .state
            .tasks
            .iter()
            .position(|t| t.id == id)
            .ok_or(StoreError::NotFound { entity: "task", id })?;
        let task = self.state.tasks.remove(pos);
        self.record_activity(
            ActivityKind::Delete,
            format!("Removed task {}", task.title),
            None,
            None,
        );
        self.mark_dirty();
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────
    // Notifications
    // ─────────────────────────────────────────────────────────────────────

    pub fn push_notification(
        &mut self,
        kind: NotificationKind,
        title: impl Into<String>,
        message: impl Into<String>,
    ) -> u64 {
        self.push_notification_with_action(kind, title, message, None, None)
    }

    pub fn push_notification_with_action(
        &mut self,
        kind: NotificationKind,
        title: impl Into<String>,
        message: impl Into<String>,
        action_type: Option<String>,
        action_target: Option<String>,
    ) -> u64 {
        let now = Utc::now();
        let max_id = self.state.notifications.iter().map(|n| n.id).max();
        let id = log_entry_id(max_id, now);
        self.state.notifications.insert(
            0,
            Notification {
                id,
                kind,
                title: title.into(),
                message: message.into(),
                timestamp: now,
                read: false,
                action_type,
                action_target,
            },
        );
        self.state.notifications.truncate(NOTIFICATION_CAP);
        self.mark_dirty();
        id
    }

    pub fn mark_notification_read(&mut self, id: u64) -> Result<()> {
        let notification = self
            .state
            .notifications
            .iter_mut()
            .find(|n| n.id == id)
            .ok_or(StoreError::NotFound {
                entity: "notification",
                id,
            })?;
        notification.read = true;
        self.mark_dirty();
        Ok(())
    }

    pub fn mark_all_notifications_read(&mut self) {
        for notification in &mut self.state.notifications {
            notification.read = true;
        }
        self.mark_dirty();
    }

    pub fn remove_notification(&mut self, id: u64) -> Result<()> {
        let pos = self
            .state
            .notifications
            .iter()
            .position(|n| n.id == id)
            .ok_or(StoreError::NotFound {
                entity: "notification",
                id,
            })?;
        self.state.notifications.remove(pos);
        self.mark_dirty();
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────
    // Session
    // ─────────────────────────────────────────────────────────────────────

    pub fn set_current_tab(&mut self, tab: impl Into<String>) {
        self.state.session.current_tab = tab.into();
        self.mark_dirty();
    }

    pub fn set_user(&mut self, name: impl Into<String>, role: impl Into<String>) {
        self.state.session.user_name = name.into();
        self.state.session.user_role = role.into();
        self.mark_dirty();
    }

    // ─────────────────────────────────────────────────────────────────────
    // Reads: Search & Analytics
    // ─────────────────────────────────────────────────────────────────────

    pub fn search(&self, query: &str) -> Vec<SearchHit> {
        search::search(&self.state, query)
    }

    pub fn search_by_category(&self, query: &str) -> SearchBreakdown {
        search::search_by_category(&self.state, query)
    }

    pub fn compute_analytics(&self) -> AnalyticsSnapshot {
        analytics::compute(&self.state, Utc::now())
    }

    /// Stores today's analytics snapshot as a report. A same-day snapshot
    /// replaces the existing report; otherwise the new report is
    /// front-inserted and the list trimmed to its cap.
    pub fn snapshot_daily_report(&mut self, now: DateTime<Utc>) {
        let snapshot = analytics::compute(&self.state, now);
        let date = now.date_naive();

        if let Some(existing) = self.state.reports.iter_mut().find(|r| r.date == date) {
            existing.snapshot = snapshot;
        } else {
            let max_id = self.state.reports.iter().map(|r| r.id).max();
            self.state.reports.insert(
                0,
                AnalyticsReport {
                    id: log_entry_id(max_id, now),
                    date,
                    snapshot,
                },
            );
            self.state.reports.truncate(REPORT_CAP);
        }
        self.mark_dirty();
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Helpers
// ─────────────────────────────────────────────────────────────────────────────

fn next_id<I: Iterator<Item = u64>>(ids: I) -> u64 {
    ids.max().map_or(1, |max| max + 1)
}

/// Timestamp-derived id for log-shaped collections (activities,
/// notifications, reports). Bumping past the current max keeps ids unique
/// even for several inserts within one millisecond.
fn log_entry_id(current_max: Option<u64>, now: DateTime<Utc>) -> u64 {
    let millis = now.timestamp_millis().max(0) as u64;
    millis.max(current_max.map_or(0, |max| max + 1))
}

fn parse_snapshot(raw: &str) -> Result<ApplicationState> {
    let incoming: Value =
        serde_json::from_str(raw).map_err(|err| StoreError::Deserialization {
            details: err.to_string(),
        })?;

    let mut document =
        serde_json::to_value(default_state()).map_err(|err| StoreError::Json {
            context: "encoding default snapshot".to_string(),
            source: err,
        })?;
    deep_merge(&mut document, incoming);

    serde_json::from_value(document).map_err(|err| StoreError::Deserialization {
        details: format!("merged snapshot is not a valid state: {err}"),
    })
}

fn load_save_counter<S: StorageBackend>(storage: &S) -> u64 {
    storage
        .get(keys::SAVE_COUNTER)
        .ok()
        .flatten()
        .and_then(|raw| raw.trim().parse().ok())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;
    use std::cell::Cell;
    use std::rc::Rc;
    use std::time::Duration;

    /// MemoryStorage wrapper that counts state writes and key removals and
    /// can fail a configurable number of state writes with a quota error.
    struct InstrumentedStorage {
        inner: MemoryStorage,
        state_writes: Rc<Cell<usize>>,
        removals: Rc<Cell<usize>>,
        quota_failures_left: Rc<Cell<u32>>,
    }

    impl InstrumentedStorage {
        fn new() -> (Self, Rc<Cell<usize>>, Rc<Cell<usize>>, Rc<Cell<u32>>) {
            let state_writes = Rc::new(Cell::new(0));
            let removals = Rc::new(Cell::new(0));
            let quota_failures_left = Rc::new(Cell::new(0));
            let storage = InstrumentedStorage {
                inner: MemoryStorage::new(),
                state_writes: Rc::clone(&state_writes),
                removals: Rc::clone(&removals),
                quota_failures_left: Rc::clone(&quota_failures_left),
            };
            (storage, state_writes, removals, quota_failures_left)
        }
    }

    impl StorageBackend for InstrumentedStorage {
        fn get(&self, key: &str) -> Result<Option<String>> {
            self.inner.get(key)
        }

        fn set(&mut self, key: &str, value: &str) -> Result<()> {
            if key == keys::STATE {
                if self.quota_failures_left.get() > 0 {
                    self.quota_failures_left
                        .set(self.quota_failures_left.get() - 1);
                    return Err(StoreError::QuotaExceeded {
                        key: key.to_string(),
                    });
                }
                self.state_writes.set(self.state_writes.get() + 1);
            }
            self.inner.set(key, value)
        }

        fn remove(&mut self, key: &str) -> Result<()> {
            self.removals.set(self.removals.get() + 1);
            self.inner.remove(key)
        }
    }

    fn team_draft(name: &str) -> TeamDraft {
        TeamDraft {
            name: name.to_string(),
            stream: Stream::Functional,
            ..TeamDraft::default()
        }
    }

    fn task_draft(title: &str) -> TaskDraft {
        TaskDraft {
            title: title.to_string(),
            description: String::new(),
            due_date: Utc::now(),
            priority: Priority::Medium,
            assigned_to: String::new(),
        }
    }

    // ─────────────────────────────────────────────────────────────────────
    // Loading & Recovery
    // ─────────────────────────────────────────────────────────────────────

    #[test]
    fn load_absent_key_initializes_and_persists_defaults() {
        let store = ApplicationStateStore::load(MemoryStorage::new());
        assert_eq!(store.state().teams, default_state().teams);
        assert!(store.state().session.is_logged_in);
        // The seed write happened.
        assert!(store
            .storage
            .get(keys::STATE)
            .unwrap()
            .expect("state persisted")
            .contains("Core Quality"));
    }

    #[test]
    fn merge_preserves_new_default_fields() {
        let mut storage = MemoryStorage::new();
        // An old snapshot: knows nothing about `reports` or `current_tab`,
        // carries its own user and teams.
        storage
            .set(
                keys::STATE,
                r#"{
                    "teams": [{"id": 9, "name": "Legacy", "personnel": []}],
                    "session": {"user_name": "dana", "is_logged_in": true}
                }"#,
            )
            .unwrap();

        let store = ApplicationStateStore::load(storage);
        let state = store.state();
        assert_eq!(state.teams.len(), 1);
        assert_eq!(state.teams[0].name, "Legacy");
        assert_eq!(state.session.user_name, "dana");
        // Fields the old snapshot never had keep their defaults.
        assert_eq!(state.session.current_tab, "overview");
        assert!(state.reports.is_empty());
    }

    #[test]
    fn corrupt_payload_falls_back_and_backs_up() {
        let mut storage = MemoryStorage::new();
        storage.set(keys::STATE, "{definitely not json").unwrap();

        let store = ApplicationStateStore::load(storage);
        assert_eq!(store.state().teams, default_state().teams);
        assert_eq!(
            store.storage.get(keys::CORRUPT_BACKUP).unwrap().as_deref(),
            Some("{definitely not json")
        );
    }

    #[test]
    fn wrongly_typed_snapshot_counts_as_corrupt() {
        let mut storage = MemoryStorage::new();
        storage.set(keys::STATE, r#"{"teams": 42}"#).unwrap();

        let store = ApplicationStateStore::load(storage);
        assert_eq!(store.state().teams, default_state().teams);
        assert!(store.storage.get(keys::CORRUPT_BACKUP).unwrap().is_some());
    }

    #[test]
    fn load_coerces_session_to_logged_in() {
        let mut storage = MemoryStorage::new();
        storage
            .set(keys::STATE, r#"{"session": {"is_logged_in": false}}"#)
            .unwrap();

        let store = ApplicationStateStore::load(storage);
        assert!(store.state().session.is_logged_in);
    }

    #[test]
    fn unavailable_storage_degrades_to_memory_and_later_saves_still_try() {
        struct BrokenReads {
            inner: MemoryStorage,
        }
        impl StorageBackend for BrokenReads {
            fn get(&self, _key: &str) -> Result<Option<String>> {
                Err(StoreError::StorageUnavailable {
                    details: "disabled".to_string(),
                })
            }
            fn set(&mut self, key: &str, value: &str) -> Result<()> {
                self.inner.set(key, value)
            }
            fn remove(&mut self, key: &str) -> Result<()> {
                self.inner.remove(key)
            }
        }

        let mut store = ApplicationStateStore::load(BrokenReads {
            inner: MemoryStorage::new(),
        });
        assert_eq!(store.state().teams, default_state().teams);

        store.add_team(team_draft("Recovered"));
        store.flush_now();
        assert!(store
            .storage
            .inner
            .get(keys::STATE)
            .unwrap()
            .expect("write attempted")
            .contains("Recovered"));
    }

    // ─────────────────────────────────────────────────────────────────────
    // Id Generation
    // ─────────────────────────────────────────────────────────────────────

    #[test]
    fn inserted_ids_are_sequential_and_distinct() {
        let mut store = ApplicationStateStore::with_state(
            MemoryStorage::new(),
            default_state(),
            Instant::now(),
        );
        let base_team = store.state().teams.iter().map(|t| t.id).max().unwrap();
        let base_task = store.state().tasks.iter().map(|t| t.id).max().unwrap();

        let team_ids: Vec<u64> = (0..5).map(|i| store.add_team(team_draft(&format!("t{i}")))).collect();
        let task_ids: Vec<u64> = (0..5).map(|i| store.add_task(task_draft(&format!("w{i}")))).collect();

        assert_eq!(team_ids, (base_team + 1..=base_team + 5).collect::<Vec<_>>());
        assert_eq!(task_ids, (base_task + 1..=base_task + 5).collect::<Vec<_>>());
    }

    #[test]
    fn person_ids_are_unique_across_teams() {
        let mut store = ApplicationStateStore::with_state(
            MemoryStorage::new(),
            default_state(),
            Instant::now(),
        );
        let team_a = store.add_team(team_draft("a"));
        let team_b = store.add_team(team_draft("b"));

        let first = store.add_person(team_a, PersonDraft::default()).unwrap();
        let second = store.add_person(team_b, PersonDraft::default()).unwrap();
        assert_eq!(second, first + 1);

        let mut all_ids: Vec<u64> = store.state().personnel().map(|p| p.id).collect();
        all_ids.sort_unstable();
        all_ids.dedup();
        assert_eq!(all_ids.len(), store.state().personnel().count());
    }

    // ─────────────────────────────────────────────────────────────────────
    // Activity Log & Notifications
    // ─────────────────────────────────────────────────────────────────────

    #[test]
    fn activity_log_keeps_fifty_newest_entries() {
        let mut store = ApplicationStateStore::with_state(
            MemoryStorage::new(),
            ApplicationState::default(),
            Instant::now(),
        );
        for i in 1..=60 {
            store.record_activity(ActivityKind::Update, format!("change {i}"), None, None);
        }
        let activities = &store.state().activities;
        assert_eq!(activities.len(), ACTIVITY_LOG_CAP);
        assert_eq!(activities[0].description, "change 60");
        assert_eq!(activities[ACTIVITY_LOG_CAP - 1].description, "change 11");
    }

    #[test]
    fn activity_ids_stay_distinct_within_one_millisecond() {
        let mut store = ApplicationStateStore::with_state(
            MemoryStorage::new(),
            ApplicationState::default(),
            Instant::now(),
        );
        for _ in 0..10 {
            store.record_activity(ActivityKind::Update, "burst", None, None);
        }
        let mut ids: Vec<u64> = store.state().activities.iter().map(|a| a.id).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), 10);
    }

    #[test]
    fn notifications_cap_and_mark_read() {
        let mut store = ApplicationStateStore::with_state(
            MemoryStorage::new(),
            ApplicationState::default(),
            Instant::now(),
        );
        for i in 1..=55 {
            store.push_notification(NotificationKind::Info, format!("n{i}"), "msg");
        }
        assert_eq!(store.state().notifications.len(), NOTIFICATION_CAP);
        assert_eq!(store.state().notifications[0].title, "n55");

        let id = store.state().notifications[0].id;
        store.mark_notification_read(id).unwrap();
        assert!(store.state().notifications[0].read);

        assert!(store
            .mark_notification_read(9_999_999_999_999)
            .unwrap_err()
            .is_rejection());
    }

    // ─────────────────────────────────────────────────────────────────────
    // Rejected Mutations
    // ─────────────────────────────────────────────────────────────────────

    #[test]
    fn update_of_missing_entity_is_rejected() {
        let mut store = ApplicationStateStore::with_state(
            MemoryStorage::new(),
            ApplicationState::default(),
            Instant::now(),
        );
        let err = store.update_team(404, |t| t.performance = 10).unwrap_err();
        assert!(matches!(err, StoreError::NotFound { entity: "team", .. }));

        let err = store.add_person(404, PersonDraft::default()).unwrap_err();
        assert!(matches!(err, StoreError::InvalidTarget { .. }));

        // Rejections leave the state untouched and schedule nothing.
        assert!(store.state().activities.is_empty());
        assert!(!store.schedule.has_pending());
    }

    #[test]
    fn remove_person_from_any_team() {
        let mut store = ApplicationStateStore::with_state(
            MemoryStorage::new(),
            default_state(),
            Instant::now(),
        );
        let id = store
            .state()
            .teams
            .iter()
            .flat_map(|t| &t.personnel)
            .next()
            .unwrap()
            .id;
        store.remove_person(id).unwrap();
        assert!(store.state().personnel().all(|p| p.id != id));
        assert!(matches!(
            store.remove_person(id).unwrap_err(),
            StoreError::NotFound { .. }
        ));
    }

    #[test]
    fn task_progress_keeps_status_in_step() {
        let mut store = ApplicationStateStore::with_state(
            MemoryStorage::new(),
            ApplicationState::default(),
            Instant::now(),
        );
        let id = store.add_task(task_draft("sync"));

        store.set_task_progress(id, 40).unwrap();
        assert_eq!(store.state().task(id).unwrap().status, TaskStatus::InProgress);

        store.set_task_progress(id, 200).unwrap();
        let task = store.state().task(id).unwrap();
        assert_eq!(task.progress, 100);
        assert_eq!(task.status, TaskStatus::Completed);
    }

    // ─────────────────────────────────────────────────────────────────────
    // Autosave, Quota & Backups
    // ─────────────────────────────────────────────────────────────────────

    #[test]
    fn mutation_burst_coalesces_into_one_write() {
        let (storage, state_writes, _, _) = InstrumentedStorage::new();
        let start = Instant::now();
        let mut store =
            ApplicationStateStore::with_state(storage, ApplicationState::default(), start);

        for i in 0..10 {
            store.add_team(team_draft(&format!("burst {i}")));
        }
        assert_eq!(state_writes.get(), 0);

        // Quiet period elapsed: exactly one write.
        assert!(store.tick(start + Duration::from_millis(2600)));
        assert_eq!(state_writes.get(), 1);

        // Nothing pending, interval not yet due: no further writes.
        assert!(!store.tick(start + Duration::from_millis(2700)));
        assert_eq!(state_writes.get(), 1);
    }

    #[test]
    fn interval_flush_fires_without_mutations() {
        let (storage, state_writes, _, _) = InstrumentedStorage::new();
        let start = Instant::now();
        let mut store =
            ApplicationStateStore::with_state(storage, ApplicationState::default(), start);

        assert!(!store.tick(start + Duration::from_secs(59)));
        assert!(store.tick(start + Duration::from_secs(61)));
        assert_eq!(state_writes.get(), 1);
    }

    #[test]
    fn quota_failure_evicts_once_and_retries_once() {
        let (storage, state_writes, removals, quota_failures) = InstrumentedStorage::new();
        quota_failures.set(1);
        let mut store = ApplicationStateStore::with_state(
            storage,
            ApplicationState::default(),
            Instant::now(),
        );

        store.flush_now();
        // The retry landed and the eviction pass ran exactly once.
        assert_eq!(state_writes.get(), 1);
        assert_eq!(removals.get(), keys::EVICTABLE.len());
        assert_eq!(store.save_counter(), 1);
    }

    #[test]
    fn persistent_quota_failure_is_swallowed() {
        let (storage, state_writes, _, quota_failures) = InstrumentedStorage::new();
        quota_failures.set(2);
        let mut store = ApplicationStateStore::with_state(
            storage,
            ApplicationState::default(),
            Instant::now(),
        );

        store.flush_now();
        assert_eq!(state_writes.get(), 0);
        assert_eq!(store.save_counter(), 0);
        // The store stays usable.
        store.add_team(team_draft("still here"));
        assert_eq!(store.state().teams.len(), 1);
    }

    #[test]
    fn every_tenth_save_writes_a_timestamped_backup() {
        let mut store = ApplicationStateStore::with_state(
            MemoryStorage::new(),
            ApplicationState::default(),
            Instant::now(),
        );
        for _ in 0..10 {
            store.flush_now();
        }
        assert_eq!(store.save_counter(), 10);
        assert_eq!(
            store.storage.get(keys::SAVE_COUNTER).unwrap().as_deref(),
            Some("10")
        );
        assert!(store
            .storage
            .keys()
            .any(|k| k.starts_with(keys::BACKUP_PREFIX)));
    }

    #[test]
    fn save_counter_survives_reload() {
        let mut storage = MemoryStorage::new();
        storage.set(keys::SAVE_COUNTER, "41").unwrap();
        let mut store = ApplicationStateStore::load(storage);
        // The seed write for the absent state key already bumped it.
        assert_eq!(store.save_counter(), 42);
        store.flush_now();
        assert_eq!(store.save_counter(), 43);
    }

    // ─────────────────────────────────────────────────────────────────────
    // Reports
    // ─────────────────────────────────────────────────────────────────────

    #[test]
    fn daily_report_deduplicates_by_calendar_day() {
        let mut store = ApplicationStateStore::with_state(
            MemoryStorage::new(),
            default_state(),
            Instant::now(),
        );
        let morning = chrono::TimeZone::with_ymd_and_hms(&Utc, 2026, 3, 10, 9, 0, 0).unwrap();
        store.snapshot_daily_report(morning);
        store.add_team(team_draft("afternoon team"));
        store.snapshot_daily_report(morning + chrono::Duration::hours(2));

        assert_eq!(store.state().reports.len(), 1);
        // Same-day snapshot was replaced, not skipped.
        let report = &store.state().reports[0];
        assert_eq!(report.snapshot.total_teams, store.state().teams.len());
    }

    #[test]
    fn reports_cap_at_thirty_newest_first() {
        let mut store = ApplicationStateStore::with_state(
            MemoryStorage::new(),
            ApplicationState::default(),
            Instant::now(),
        );
        let start = Utc::now();
        for day in 0..35 {
            store.snapshot_daily_report(start + chrono::Duration::days(day));
        }
        assert_eq!(store.state().reports.len(), REPORT_CAP);
        let newest = store.state().reports[0].date;
        let oldest = store.state().reports[REPORT_CAP - 1].date;
        assert!(newest > oldest);
        assert_eq!(newest, (start + chrono::Duration::days(34)).date_naive());
    }

    // ─────────────────────────────────────────────────────────────────────
    // Round Trip
    // ─────────────────────────────────────────────────────────────────────

    #[test]
    fn file_backed_store_survives_process_restart() {
        let temp = tempfile::tempdir().unwrap();
        let root = temp.path().to_path_buf();

        {
            let storage = crate::storage::FileStorage::new(root.clone());
            let mut store = ApplicationStateStore::load(storage);
            store.add_team(team_draft("Persisted"));
            store.flush_now();
        }

        let reloaded = ApplicationStateStore::load(crate::storage::FileStorage::new(root));
        assert!(reloaded.state().teams.iter().any(|t| t.name == "Persisted"));
        assert!(reloaded.save_counter() >= 2);
    }

    #[test]
    fn flush_then_reload_round_trips_mutations() {
        let mut storage = MemoryStorage::new();
        {
            let mut store = ApplicationStateStore::with_state(
                storage.clone(),
                default_state(),
                Instant::now(),
            );
            store.add_team(team_draft("Round Trip"));
            store.set_current_tab("teams");
            store.flush_now();
            storage = store.storage;
        }

        let reloaded = ApplicationStateStore::load(storage);
        assert!(reloaded.state().teams.iter().any(|t| t.name == "Round Trip"));
        assert_eq!(reloaded.state().session.current_tab, "teams");
        // The explicit flush left a save activity behind.
        assert!(reloaded
            .state()
            .activities
            .iter()
            .any(|a| a.kind == ActivityKind::Save));
    }
}
