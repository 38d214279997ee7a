//! Core types shared by every orgboard client.
//!
//! These types are the "lingua franca" of the dashboard: the store, the CLI,
//! and any future view layer all read and write these exact shapes. The
//! persisted snapshot is the serde form of [`ApplicationState`].
//!
//! Missing fields in persisted data degrade to defaults instead of failing
//! the whole load, so every struct field carries `#[serde(default)]` where a
//! sensible default exists.

use chrono::{DateTime, Utc};
use serde::de::Deserializer;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

// ═══════════════════════════════════════════════════════════════════════════════
// Organizational Categories
// ═══════════════════════════════════════════════════════════════════════════════

/// Organizational category a team belongs to.
///
/// Purely a classification tag. Persisted values that don't match any known
/// label fall back to [`Stream::default()`] rather than failing the load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Stream {
    #[default]
    Functional,
    Automation,
    Performance,
    Security,
    Operations,
}

impl Stream {
    pub const ALL: [Stream; 5] = [
        Stream::Functional,
        Stream::Automation,
        Stream::Performance,
        Stream::Security,
        Stream::Operations,
    ];

    pub fn as_label(&self) -> &'static str {
        match self {
            Stream::Functional => "functional",
            Stream::Automation => "automation",
            Stream::Performance => "performance",
            Stream::Security => "security",
            Stream::Operations => "operations",
        }
    }

    /// Parses a label, returning `None` for unknown values.
    pub fn from_label(label: &str) -> Option<Stream> {
        Stream::ALL
            .into_iter()
            .find(|s| s.as_label().eq_ignore_ascii_case(label))
    }
}

impl fmt::Display for Stream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_label())
    }
}

impl<'de> Deserialize<'de> for Stream {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let label = String::deserialize(deserializer)?;
        // Unknown categories from older or newer snapshots fall back to the
        // default stream instead of poisoning the whole load.
        Ok(Stream::from_label(&label).unwrap_or_default())
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Teams & Personnel
// ═══════════════════════════════════════════════════════════════════════════════

/// A team in the organization, with its roster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Team {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub stream: Stream,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub responsibilities: String,
    /// Performance score, 0-100.
    #[serde(default)]
    pub performance: u8,
    /// Never null: an absent roster deserializes to an empty list.
    #[serde(default)]
    pub personnel: Vec<Person>,
}

/// A person on a team. Ids are unique across the whole store, not just
/// within one team.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Person {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub client: String,
}

// ═══════════════════════════════════════════════════════════════════════════════
// Tasks
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TaskStatus {
    #[default]
    NotStarted,
    InProgress,
    Completed,
}

impl TaskStatus {
    pub fn is_done(&self) -> bool {
        matches!(self, TaskStatus::Completed)
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            TaskStatus::NotStarted => "not-started",
            TaskStatus::InProgress => "in-progress",
            TaskStatus::Completed => "completed",
        };
        f.write_str(label)
    }
}

/// A tracked piece of work.
///
/// `assigned_to` is a free-text name reference, not a foreign key: views
/// tolerate names that match no current person, and the store does not
/// validate it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: u64,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "Utc::now")]
    pub due_date: DateTime<Utc>,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub assigned_to: String,
    /// Completion percentage, 0-100.
    #[serde(default)]
    pub progress: u8,
    #[serde(default)]
    pub status: TaskStatus,
}

// ═══════════════════════════════════════════════════════════════════════════════
// Activity Log
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ActivityKind {
    Create,
    #[default]
    Update,
    Delete,
    Save,
    System,
}

impl fmt::Display for ActivityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ActivityKind::Create => "create",
            ActivityKind::Update => "update",
            ActivityKind::Delete => "delete",
            ActivityKind::Save => "save",
            ActivityKind::System => "system",
        };
        f.write_str(label)
    }
}

/// One entry in the bounded activity log (newest first).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Activity {
    pub id: u64,
    pub timestamp: DateTime<Utc>,
    pub kind: ActivityKind,
    pub description: String,
    /// Team name this activity relates to, if any. Free text, unvalidated.
    #[serde(default)]
    pub team: Option<String>,
    /// Arbitrary structured payload attached by the producer.
    #[serde(default)]
    pub details: Option<Value>,
}

// ═══════════════════════════════════════════════════════════════════════════════
// Notifications
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NotificationKind {
    #[default]
    Info,
    Warning,
    Success,
    Error,
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            NotificationKind::Info => "info",
            NotificationKind::Warning => "warning",
            NotificationKind::Success => "success",
            NotificationKind::Error => "error",
        };
        f.write_str(label)
    }
}

/// An in-app notification, optionally carrying a navigation action for
/// click-through.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub id: u64,
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub read: bool,
    #[serde(default)]
    pub action_type: Option<String>,
    #[serde(default)]
    pub action_target: Option<String>,
}

// ═══════════════════════════════════════════════════════════════════════════════
// Session
// ═══════════════════════════════════════════════════════════════════════════════

/// Current-user display state.
///
/// `is_logged_in` is coerced to `true` on every load regardless of the
/// persisted value; the store does not implement real authentication.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    #[serde(default)]
    pub is_logged_in: bool,
    #[serde(default)]
    pub user_name: String,
    #[serde(default)]
    pub user_role: String,
    /// Identifier of the last active tab, used only to restore UI position.
    #[serde(default)]
    pub current_tab: String,
}

impl Default for Session {
    fn default() -> Self {
        Session {
            is_logged_in: true,
            user_name: String::new(),
            user_role: String::new(),
            current_tab: "overview".to_string(),
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Root Aggregate
// ═══════════════════════════════════════════════════════════════════════════════

/// The root aggregate: everything the dashboard persists, one instance per
/// process.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApplicationState {
    #[serde(default)]
    pub teams: Vec<Team>,
    #[serde(default)]
    pub tasks: Vec<Task>,
    /// Bounded log, newest first.
    #[serde(default)]
    pub activities: Vec<Activity>,
    #[serde(default)]
    pub notifications: Vec<Notification>,
    /// Daily analytics snapshots, newest first.
    #[serde(default)]
    pub reports: Vec<crate::analytics::AnalyticsReport>,
    #[serde(default)]
    pub session: Session,
}

impl ApplicationState {
    /// All personnel across all teams, in display order.
    pub fn personnel(&self) -> impl Iterator<Item = &Person> {
        self.teams.iter().flat_map(|t| t.personnel.iter())
    }

    pub fn team(&self, id: u64) -> Option<&Team> {
        self.teams.iter().find(|t| t.id == id)
    }

    pub fn task(&self, id: u64) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }
}
