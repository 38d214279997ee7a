//! Read-side search across teams, personnel, and tasks.
//!
//! Case-insensitive substring matching, no side effects. Callers are
//! expected to debounce keystrokes at the UI layer, not here.

use crate::types::ApplicationState;
use std::fmt;

/// Queries shorter than this return no results, so per-keystroke calls
/// don't scan everything on the first character.
pub const MIN_QUERY_LEN: usize = 2;

/// Result cap for the cross-entity search.
pub const CROSS_ENTITY_CAP: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchCategory {
    Team,
    Personnel,
    Task,
}

impl fmt::Display for SearchCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            SearchCategory::Team => "team",
            SearchCategory::Personnel => "personnel",
            SearchCategory::Task => "task",
        };
        f.write_str(label)
    }
}

/// One search result, tagged with the entity type it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit {
    pub category: SearchCategory,
    pub id: u64,
    pub title: String,
    /// Which field matched, for display context ("name", "client", ...).
    pub matched_field: &'static str,
}

/// Per-category results for the type-scoped search variant. Uncapped.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchBreakdown {
    pub teams: Vec<SearchHit>,
    pub personnel: Vec<SearchHit>,
    pub tasks: Vec<SearchHit>,
}

impl SearchBreakdown {
    pub fn is_empty(&self) -> bool {
        self.teams.is_empty() && self.personnel.is_empty() && self.tasks.is_empty()
    }

    pub fn total(&self) -> usize {
        self.teams.len() + self.personnel.len() + self.tasks.len()
    }
}

fn matched_field<'a, I>(query: &str, fields: I) -> Option<&'static str>
where
    I: IntoIterator<Item = (&'static str, &'a str)>,
{
    fields
        .into_iter()
        .find(|(_, value)| value.to_lowercase().contains(query))
        .map(|(name, _)| name)
}

fn scan(state: &ApplicationState, query: &str) -> SearchBreakdown {
    let query = query.to_lowercase();
    let mut breakdown = SearchBreakdown::default();

    for team in &state.teams {
        let fields = [
            ("name", team.name.as_str()),
            ("description", team.description.as_str()),
            ("responsibilities", team.responsibilities.as_str()),
        ];
        if let Some(field) = matched_field(&query, fields) {
            breakdown.teams.push(SearchHit {
                category: SearchCategory::Team,
                id: team.id,
                title: team.name.clone(),
                matched_field: field,
            });
        }
    }

    for person in state.personnel() {
        let fields = [
            ("name", person.name.as_str()),
            ("role", person.role.as_str()),
            ("client", person.client.as_str()),
        ];
        if let Some(field) = matched_field(&query, fields) {
            breakdown.personnel.push(SearchHit {
                category: SearchCategory::Personnel,
                id: person.id,
                title: person.name.clone(),
                matched_field: field,
            });
        }
    }

    for task in &state.tasks {
        let fields = [
            ("title", task.title.as_str()),
            ("description", task.description.as_str()),
            ("assigned_to", task.assigned_to.as_str()),
        ];
        if let Some(field) = matched_field(&query, fields) {
            breakdown.tasks.push(SearchHit {
                category: SearchCategory::Task,
                id: task.id,
                title: task.title.clone(),
                matched_field: field,
            });
        }
    }

    breakdown
}

/// Cross-entity search: teams, then personnel, then tasks, capped at
/// [`CROSS_ENTITY_CAP`] hits total.
pub fn search(state: &ApplicationState, query: &str) -> Vec<SearchHit> {
    if query.trim().len() < MIN_QUERY_LEN {
        return Vec::new();
    }
    let breakdown = scan(state, query.trim());
    let mut hits = breakdown.teams;
    hits.extend(breakdown.personnel);
    hits.extend(breakdown.tasks);
    hits.truncate(CROSS_ENTITY_CAP);
    hits
}

/// Type-scoped search: the full per-category breakdown, uncapped.
pub fn search_by_category(state: &ApplicationState, query: &str) -> SearchBreakdown {
    if query.trim().len() < MIN_QUERY_LEN {
        return SearchBreakdown::default();
    }
    scan(state, query.trim())
}
