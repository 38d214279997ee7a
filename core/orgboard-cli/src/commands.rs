//! Command implementations: each handler drives the store and prints a
//! plain-text result. Returns whether the command mutated state, so main
//! knows to flush.

use chrono::{Duration, NaiveDate, TimeZone, Utc};

use orgboard_core::{
    ApplicationStateStore, PersonDraft, StorageBackend, TaskDraft, TeamDraft,
};

use crate::export;
use crate::{
    parse_stream, Commands, ExportFormat, NotificationCommand, PersonCommand, TaskCommand,
    TeamCommand,
};

pub fn run<S: StorageBackend>(
    store: &mut ApplicationStateStore<S>,
    command: Commands,
) -> Result<bool, String> {
    match command {
        Commands::Summary => {
            summary(store);
            Ok(false)
        }
        Commands::Team(cmd) => team(store, cmd),
        Commands::Person(cmd) => person(store, cmd),
        Commands::Task(cmd) => task(store, cmd),
        Commands::Search { query, grouped } => {
            search(store, &query, grouped);
            Ok(false)
        }
        Commands::Analytics { snapshot } => {
            analytics(store, snapshot);
            Ok(snapshot)
        }
        Commands::Notification(cmd) => notification(store, cmd),
        Commands::Export {
            format,
            entity,
            out,
        } => {
            let content = match format {
                ExportFormat::Json => export::to_json(store.state())?,
                ExportFormat::Csv => export::to_csv(store.state(), entity),
            };
            match out {
                Some(path) => {
                    fs_err::write(&path, content).map_err(|e| e.to_string())?;
                    println!("Exported to {}", path.display());
                }
                None => print!("{content}"),
            }
            Ok(false)
        }
        Commands::Flush => {
            store.flush_now();
            println!("State flushed (save #{})", store.save_counter());
            Ok(false)
        }
    }
}

fn summary<S: StorageBackend>(store: &ApplicationStateStore<S>) {
    let state = store.state();
    println!(
        "{}: {} teams, {} people, {} tasks",
        if state.session.user_name.is_empty() {
            "orgboard"
        } else {
            state.session.user_name.as_str()
        },
        state.teams.len(),
        state.personnel().count(),
        state.tasks.len(),
    );

    let unread = state.notifications.iter().filter(|n| !n.read).count();
    if unread > 0 {
        println!("{unread} unread notification(s)");
    }

    for activity in state.activities.iter().take(5) {
        println!(
            "  [{}] {} {}",
            activity.timestamp.format("%Y-%m-%d %H:%M"),
            activity.kind,
            activity.description
        );
    }
}

fn team<S: StorageBackend>(
    store: &mut ApplicationStateStore<S>,
    cmd: TeamCommand,
) -> Result<bool, String> {
    match cmd {
        TeamCommand::List => {
            for team in &store.state().teams {
                println!(
                    "{:>4}  {:<24} {:<12} perf {:>3}  {} people",
                    team.id,
                    team.name,
                    team.stream,
                    team.performance,
                    team.personnel.len()
                );
            }
            Ok(false)
        }
        TeamCommand::Add {
            name,
            stream,
            description,
            responsibilities,
            performance,
        } => {
            let stream = parse_stream(&stream)?;
            let id = store.add_team(TeamDraft {
                name,
                stream,
                description,
                responsibilities,
                performance,
            });
            println!("Created team {id}");
            Ok(true)
        }
        TeamCommand::Remove { id } => {
            store.remove_team(id).map_err(|e| e.to_string())?;
            println!("Removed team {id}");
            Ok(true)
        }
    }
}

fn person<S: StorageBackend>(
    store: &mut ApplicationStateStore<S>,
    cmd: PersonCommand,
) -> Result<bool, String> {
    match cmd {
        PersonCommand::Add {
            name,
            team,
            role,
            client,
        } => {
            let id = store
                .add_person(team, PersonDraft { name, role, client })
                .map_err(|e| e.to_string())?;
            println!("Added person {id}");
            Ok(true)
        }
        PersonCommand::Remove { id } => {
            store.remove_person(id).map_err(|e| e.to_string())?;
            println!("Removed person {id}");
            Ok(true)
        }
    }
}

fn task<S: StorageBackend>(
    store: &mut ApplicationStateStore<S>,
    cmd: TaskCommand,
) -> Result<bool, String> {
    match cmd {
        TaskCommand::List => {
            for task in &store.state().tasks {
                println!(
                    "{:>4}  {:<32} {:<12} {:<10} {:>3}%  due {}",
                    task.id,
                    task.title,
                    task.status,
                    task.priority,
                    task.progress,
                    task.due_date.format("%Y-%m-%d")
                );
            }
            Ok(false)
        }
        TaskCommand::Add {
            title,
            description,
            due,
            priority,
            assigned_to,
        } => {
            let due_date = match due {
                Some(raw) => {
                    let date = NaiveDate::parse_from_str(&raw, "%Y-%m-%d")
                        .map_err(|_| format!("invalid date '{raw}' (expected YYYY-MM-DD)"))?;
                    let midday = date.and_hms_opt(12, 0, 0).expect("valid time of day");
                    Utc.from_utc_datetime(&midday)
                }
                None => Utc::now() + Duration::days(7),
            };
            let id = store.add_task(TaskDraft {
                title,
                description,
                due_date,
                priority: priority.into(),
                assigned_to,
            });
            println!("Created task {id}");
            Ok(true)
        }
        TaskCommand::Progress { id, percent } => {
            store
                .set_task_progress(id, percent)
                .map_err(|e| e.to_string())?;
            let task = store.state().task(id).expect("task just updated");
            println!("Task {id}: {}% ({})", task.progress, task.status);
            Ok(true)
        }
        TaskCommand::Remove { id } => {
            store.remove_task(id).map_err(|e| e.to_string())?;
            println!("Removed task {id}");
            Ok(true)
        }
    }
}

fn search<S: StorageBackend>(store: &ApplicationStateStore<S>, query: &str, grouped: bool) {
    if grouped {
        let breakdown = store.search_by_category(query);
        if breakdown.is_empty() {
            println!("No matches");
            return;
        }
        for (label, hits) in [
            ("Teams", &breakdown.teams),
            ("Personnel", &breakdown.personnel),
            ("Tasks", &breakdown.tasks),
        ] {
            if hits.is_empty() {
                continue;
            }
            println!("{label} ({}):", hits.len());
            for hit in hits {
                println!("  #{} {} (matched {})", hit.id, hit.title, hit.matched_field);
            }
        }
    } else {
        let hits = store.search(query);
        if hits.is_empty() {
            println!("No matches");
            return;
        }
        for hit in hits {
            println!(
                "{:<10} #{} {} (matched {})",
                hit.category.to_string(),
                hit.id,
                hit.title,
                hit.matched_field
            );
        }
    }
}

fn analytics<S: StorageBackend>(store: &mut ApplicationStateStore<S>, snapshot: bool) {
    let metrics = store.compute_analytics();
    println!(
        "{} teams / {} people / {} tasks",
        metrics.total_teams, metrics.total_personnel, metrics.total_tasks
    );
    println!(
        "avg team size {:.1}, avg performance {:.1}, completion {:.0}%",
        metrics.avg_team_size, metrics.avg_performance, metrics.task_completion_pct
    );
    for (stream, count) in &metrics.teams_by_stream {
        println!("  stream {stream}: {count}");
    }
    for insight in &metrics.insights {
        println!("  [{:?}] {}", insight.severity, insight.message);
    }

    if snapshot {
        store.snapshot_daily_report(Utc::now());
        println!("Stored today's report ({} kept)", store.state().reports.len());
    }
}

fn notification<S: StorageBackend>(
    store: &mut ApplicationStateStore<S>,
    cmd: NotificationCommand,
) -> Result<bool, String> {
    match cmd {
        NotificationCommand::List => {
            for n in &store.state().notifications {
                println!(
                    "{:>15}  {} [{}] {}: {}",
                    n.id,
                    if n.read { " " } else { "*" },
                    n.kind,
                    n.title,
                    n.message
                );
            }
            Ok(false)
        }
        NotificationCommand::Read { id } => {
            store.mark_notification_read(id).map_err(|e| e.to_string())?;
            Ok(true)
        }
        NotificationCommand::ReadAll => {
            store.mark_all_notifications_read();
            Ok(true)
        }
    }
}
