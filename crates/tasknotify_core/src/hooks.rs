use anyhow::Result;

use crate::detect::detect_new_assignees;
use crate::notify::{ASSIGNEE_ADDED, NotificationEvent, NotificationSink};
use crate::structure::PageStructure;
use crate::user::{ResolvedUser, UserDirectory};

/// Categories marking a page as a task, lower-cased.
pub const TASK_CATEGORY_ALIASES: [&str; 2] = ["tasks", "tâches"];

/// Single-fire guard for one edit-processing request. The host may invoke
/// the save hook several times per request; the first invocation wins.
/// Owned by the caller so unrelated requests never share it.
#[derive(Debug, Default)]
pub struct HookState {
    fired: bool,
}

impl HookState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fired(&self) -> bool {
        self.fired
    }
}

/// One page save as seen by the edit hook.
#[derive(Debug, Clone)]
pub struct SavedPageEdit {
    pub title: String,
    pub categories: Vec<String>,
    /// None when the page did not exist before this edit.
    pub previous_text: Option<String>,
    pub new_text: String,
    pub revision_id: String,
    pub editor: ResolvedUser,
}

pub fn is_task_page(categories: &[String]) -> bool {
    categories.iter().any(|category| {
        let normalized = category.trim().replace('_', " ").to_lowercase();
        TASK_CATEGORY_ALIASES.contains(&normalized.as_str())
    })
}

/// Edit-save integration point. Detects assignee additions on task pages and
/// hands at most one event per request to the sink. Returns the event when
/// one fired.
pub fn on_page_content_save(
    state: &mut HookState,
    edit: &SavedPageEdit,
    directory: &dyn UserDirectory,
    sink: &mut dyn NotificationSink,
) -> Result<Option<NotificationEvent>> {
    if state.fired {
        tracing::debug!(page = %edit.title, "save hook already ran for this request");
        return Ok(None);
    }
    state.fired = true;

    if !is_task_page(&edit.categories) {
        return Ok(None);
    }

    let previous = edit.previous_text.as_deref().map(PageStructure::parse);
    let current = PageStructure::parse(&edit.new_text);

    let new_assignees = detect_new_assignees(previous.as_ref(), &current, &edit.editor, directory);
    if new_assignees.is_empty() {
        return Ok(None);
    }

    let event = NotificationEvent {
        kind: ASSIGNEE_ADDED.to_string(),
        page: edit.title.clone(),
        new_assignees: new_assignees.iter().map(|user| user.id).collect(),
        revision_id: edit.revision_id.clone(),
        agent: Some(edit.editor.id),
    };
    sink.deliver(&event)?;
    tracing::debug!(
        page = %edit.title,
        assignees = event.new_assignees.len(),
        "assignee notification raised"
    );
    Ok(Some(event))
}
