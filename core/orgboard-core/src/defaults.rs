//! The built-in default snapshot.
//!
//! First launch (or any unrecoverable load) starts from this state. It seeds
//! a small but realistic organization so every dashboard view has something
//! to render, and it is the base the deep merge lays persisted data over.

use chrono::{Duration, Utc};
use once_cell::sync::Lazy;

use crate::types::{
    ApplicationState, Notification, NotificationKind, Person, Priority, Session, Stream, Task,
    TaskStatus, Team,
};

static DEFAULT_STATE: Lazy<ApplicationState> = Lazy::new(build_default_state);

/// A fresh clone of the default snapshot.
pub fn default_state() -> ApplicationState {
    DEFAULT_STATE.clone()
}

fn build_default_state() -> ApplicationState {
    let now = Utc::now();

    let teams = vec![
        Team {
            id: 1,
            name: "Core Quality".to_string(),
            stream: Stream::Functional,
            description: "Functional verification of the flagship product".to_string(),
            responsibilities: "Regression suites, release sign-off, defect triage".to_string(),
            performance: 82,
            personnel: vec![
                Person {
                    id: 1,
                    name: "Maya Lindqvist".to_string(),
                    role: "QA Lead".to_string(),
                    client: "Acme Retail".to_string(),
                },
                Person {
                    id: 2,
                    name: "Jonas Petrov".to_string(),
                    role: "Test Engineer".to_string(),
                    client: "Acme Retail".to_string(),
                },
            ],
        },
        Team {
            id: 2,
            name: "Automation Guild".to_string(),
            stream: Stream::Automation,
            description: "End-to-end and API automation".to_string(),
            responsibilities: "Pipeline health, framework maintenance".to_string(),
            performance: 75,
            personnel: vec![Person {
                id: 3,
                name: "Priya Nair".to_string(),
                role: "SDET".to_string(),
                client: "Borealis Bank".to_string(),
            }],
        },
        Team {
            id: 3,
            name: "Performance Lab".to_string(),
            stream: Stream::Performance,
            description: "Load and soak testing".to_string(),
            responsibilities: "Capacity baselines, latency budgets".to_string(),
            performance: 68,
            personnel: Vec::new(),
        },
    ];

    let tasks = vec![
        Task {
            id: 1,
            title: "Quarterly regression pass".to_string(),
            description: "Full regression ahead of the 4.2 release".to_string(),
            due_date: now + Duration::days(7),
            priority: Priority::High,
            assigned_to: "Maya Lindqvist".to_string(),
            progress: 40,
            status: TaskStatus::InProgress,
        },
        Task {
            id: 2,
            title: "Stabilize nightly pipeline".to_string(),
            description: "Flaky checkout suite keeps failing the nightly run".to_string(),
            due_date: now + Duration::days(14),
            priority: Priority::Medium,
            assigned_to: "Priya Nair".to_string(),
            progress: 0,
            status: TaskStatus::NotStarted,
        },
    ];

    let notifications = vec![Notification {
        id: 1,
        kind: NotificationKind::Info,
        title: "Welcome to orgboard".to_string(),
        message: "Your workspace was initialized with starter data.".to_string(),
        timestamp: now,
        read: false,
        action_type: Some("navigate".to_string()),
        action_target: Some("overview".to_string()),
    }];

    ApplicationState {
        teams,
        tasks,
        activities: Vec::new(),
        notifications,
        reports: Vec::new(),
        session: Session {
            is_logged_in: true,
            user_name: "Quality Manager".to_string(),
            user_role: "manager".to_string(),
            current_tab: "overview".to_string(),
        },
    }
}
