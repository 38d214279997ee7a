//! Derived analytics over the canonical state.
//!
//! Everything here is read-only: a snapshot is computed from the current
//! teams and tasks, never the other way around. Callers may recompute on any
//! schedule. One snapshot per calendar day is retained as a stored report,
//! capped at [`REPORT_CAP`].

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{ApplicationState, TaskStatus};

/// Maximum number of stored daily reports; the oldest are evicted first.
pub const REPORT_CAP: usize = 30;

/// Share of personnel on one client above which concentration is flagged.
const CLIENT_CONCENTRATION_THRESHOLD: f64 = 0.70;

/// Average roster size below which teams are flagged as under-staffed.
const MIN_HEALTHY_TEAM_SIZE: f64 = 3.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum InsightSeverity {
    Info,
    Warning,
}

/// A rule-based textual observation about the organization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Insight {
    pub severity: InsightSeverity,
    pub message: String,
}

/// A point-in-time metrics snapshot derived from teams and tasks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsSnapshot {
    #[serde(default = "Utc::now")]
    pub generated_at: DateTime<Utc>,
    #[serde(default)]
    pub total_teams: usize,
    #[serde(default)]
    pub total_personnel: usize,
    #[serde(default)]
    pub total_tasks: usize,
    /// Team count per stream label.
    #[serde(default)]
    pub teams_by_stream: BTreeMap<String, usize>,
    /// Personnel count per client; people without a client are skipped.
    #[serde(default)]
    pub personnel_by_client: BTreeMap<String, usize>,
    #[serde(default)]
    pub personnel_by_role: BTreeMap<String, usize>,
    #[serde(default)]
    pub avg_team_size: f64,
    #[serde(default)]
    pub avg_performance: f64,
    #[serde(default)]
    pub task_completion_pct: f64,
    #[serde(default)]
    pub insights: Vec<Insight>,
}

/// A stored daily snapshot. At most one report exists per calendar day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsReport {
    pub id: u64,
    pub date: NaiveDate,
    pub snapshot: AnalyticsSnapshot,
}

/// Computes the full metrics snapshot for `state` as of `now`.
pub fn compute(state: &ApplicationState, now: DateTime<Utc>) -> AnalyticsSnapshot {
    let total_teams = state.teams.len();
    let total_personnel = state.personnel().count();
    let total_tasks = state.tasks.len();

    let mut teams_by_stream: BTreeMap<String, usize> = BTreeMap::new();
    for team in &state.teams {
        *teams_by_stream
            .entry(team.stream.as_label().to_string())
            .or_default() += 1;
    }

    let mut personnel_by_client: BTreeMap<String, usize> = BTreeMap::new();
    let mut personnel_by_role: BTreeMap<String, usize> = BTreeMap::new();
    for person in state.personnel() {
        if !person.client.is_empty() {
            *personnel_by_client.entry(person.client.clone()).or_default() += 1;
        }
        if !person.role.is_empty() {
            *personnel_by_role.entry(person.role.clone()).or_default() += 1;
        }
    }

    let avg_team_size = if total_teams == 0 {
        0.0
    } else {
        total_personnel as f64 / total_teams as f64
    };

    let avg_performance = if total_teams == 0 {
        0.0
    } else {
        state
            .teams
            .iter()
            .map(|t| f64::from(t.performance))
            .sum::<f64>()
            / total_teams as f64
    };

    let completed = state
        .tasks
        .iter()
        .filter(|t| t.status == TaskStatus::Completed)
        .count();
    let task_completion_pct = if total_tasks == 0 {
        0.0
    } else {
        completed as f64 / total_tasks as f64 * 100.0
    };

    let insights = derive_insights(
        total_teams,
        total_personnel,
        total_tasks,
        avg_team_size,
        &teams_by_stream,
        &personnel_by_client,
    );

    AnalyticsSnapshot {
        generated_at: now,
        total_teams,
        total_personnel,
        total_tasks,
        teams_by_stream,
        personnel_by_client,
        personnel_by_role,
        avg_team_size,
        avg_performance,
        task_completion_pct,
        insights,
    }
}

fn derive_insights(
    total_teams: usize,
    total_personnel: usize,
    total_tasks: usize,
    avg_team_size: f64,
    teams_by_stream: &BTreeMap<String, usize>,
    personnel_by_client: &BTreeMap<String, usize>,
) -> Vec<Insight> {
    let mut insights = Vec::new();

    if total_teams > 0 && avg_team_size < MIN_HEALTHY_TEAM_SIZE {
        insights.push(Insight {
            severity: InsightSeverity::Warning,
            message: format!(
                "Average team size is {:.1}; teams may be under-staffed",
                avg_team_size
            ),
        });
    }

    if total_teams > 0 && teams_by_stream.len() == 1 {
        // teams_by_stream has exactly one entry here.
        if let Some(stream) = teams_by_stream.keys().next() {
            insights.push(Insight {
                severity: InsightSeverity::Warning,
                message: format!("All teams are concentrated in the {stream} stream"),
            });
        }
    }

    if total_personnel > 0 {
        if let Some((client, count)) = personnel_by_client.iter().max_by_key(|(_, c)| **c) {
            let share = *count as f64 / total_personnel as f64;
            if share > CLIENT_CONCENTRATION_THRESHOLD {
                insights.push(Insight {
                    severity: InsightSeverity::Warning,
                    message: format!(
                        "Client {client} accounts for {:.0}% of personnel",
                        share * 100.0
                    ),
                });
            }
        }
    }

    if total_tasks == 0 {
        insights.push(Insight {
            severity: InsightSeverity::Info,
            message: "No tasks are being tracked yet".to_string(),
        });
    }

    insights
}
