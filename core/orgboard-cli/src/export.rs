//! Export collaborators: JSON of the whole state, or a per-entity CSV.
//!
//! Lives in the CLI rather than the core store; exporters only need read
//! access to the state.

use orgboard_core::ApplicationState;

use crate::ExportEntity;

pub fn to_json(state: &ApplicationState) -> Result<String, String> {
    serde_json::to_string_pretty(state)
        .map(|mut s| {
            s.push('\n');
            s
        })
        .map_err(|e| format!("failed to serialize state: {e}"))
}

pub fn to_csv(state: &ApplicationState, entity: ExportEntity) -> String {
    match entity {
        ExportEntity::Teams => teams_csv(state),
        ExportEntity::Personnel => personnel_csv(state),
        ExportEntity::Tasks => tasks_csv(state),
    }
}

fn teams_csv(state: &ApplicationState) -> String {
    let mut out = String::from("id,name,stream,performance,personnel,description\n");
    for team in &state.teams {
        out.push_str(&row(&[
            &team.id.to_string(),
            &team.name,
            team.stream.as_label(),
            &team.performance.to_string(),
            &team.personnel.len().to_string(),
            &team.description,
        ]));
    }
    out
}

fn personnel_csv(state: &ApplicationState) -> String {
    let mut out = String::from("id,name,role,client,team\n");
    for team in &state.teams {
        for person in &team.personnel {
            out.push_str(&row(&[
                &person.id.to_string(),
                &person.name,
                &person.role,
                &person.client,
                &team.name,
            ]));
        }
    }
    out
}

fn tasks_csv(state: &ApplicationState) -> String {
    let mut out = String::from("id,title,status,priority,progress,due_date,assigned_to\n");
    for task in &state.tasks {
        out.push_str(&row(&[
            &task.id.to_string(),
            &task.title,
            &task.status.to_string(),
            &task.priority.to_string(),
            &task.progress.to_string(),
            &task.due_date.format("%Y-%m-%d").to_string(),
            &task.assigned_to,
        ]));
    }
    out
}

fn row(fields: &[&str]) -> String {
    let mut line = fields
        .iter()
        .map(|f| escape(f))
        .collect::<Vec<_>>()
        .join(",");
    line.push('\n');
    line
}

/// Quotes a field when it contains a comma, quote, or newline.
fn escape(field: &str) -> String {
    if field.contains([',', '"', '\n']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}
