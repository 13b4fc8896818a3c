use std::collections::BTreeSet;

use crate::diff::diff_fields;
use crate::structure::{PageStructure, task_template_fields};
use crate::user::{ResolvedUser, UserDirectory};

/// Task template field naming the responsible users.
pub const ASSIGNEES_FIELD: &str = "assignees";

/// Splits a comma-separated assignee value into trimmed, deduplicated names,
/// preserving the order in which they appear.
pub fn parse_assignees(raw: &str) -> Vec<String> {
    let mut seen = BTreeSet::new();
    let mut names = Vec::new();
    for part in raw.split(',') {
        let name = part.trim();
        if name.is_empty() {
            continue;
        }
        if seen.insert(name.to_string()) {
            names.push(name.to_string());
        }
    }
    names
}

/// Finds the users newly named in the task's assignee list between two page
/// revisions. Best effort: malformed input, unresolvable names, anonymous or
/// locked accounts, and the editor naming themself all degrade to fewer
/// results, never to an error.
pub fn detect_new_assignees(
    previous: Option<&PageStructure>,
    current: &PageStructure,
    editor: &ResolvedUser,
    directory: &dyn UserDirectory,
) -> Vec<ResolvedUser> {
    let previous_fields = task_template_fields(previous);
    let current_fields = task_template_fields(Some(current));
    let diff = diff_fields(&previous_fields, &current_fields);

    let Some(raw) = diff.get(ASSIGNEES_FIELD) else {
        return Vec::new();
    };

    let previous_names: BTreeSet<String> = previous_fields
        .get(ASSIGNEES_FIELD)
        .map(|value| parse_assignees(value).into_iter().collect())
        .unwrap_or_default();

    let mut resolved: Vec<ResolvedUser> = Vec::new();
    for name in parse_assignees(raw) {
        if previous_names.contains(&name) {
            continue;
        }
        let Some(user) = directory.user_by_name(&name) else {
            tracing::debug!(name = %name, "assignee does not resolve to a known user");
            continue;
        };
        if !user.is_notifiable() {
            tracing::debug!(name = %user.name, "assignee is anonymous or locked");
            continue;
        }
        if user.id == editor.id {
            continue; // self-assignment is not notified
        }
        if resolved.iter().any(|existing| existing.id == user.id) {
            continue;
        }
        resolved.push(user);
    }
    resolved
}
