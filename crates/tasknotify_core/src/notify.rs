use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Event kind raised when an edit adds assignees to a task page.
pub const ASSIGNEE_ADDED: &str = "task-assignee-added";

/// Immutable record handed to the host notification subsystem, one per
/// qualifying edit. The revision id pins the page state the event was
/// computed from so render-time staleness checks can compare against it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationEvent {
    pub kind: String,
    pub page: String,
    pub new_assignees: Vec<u64>,
    pub revision_id: String,
    pub agent: Option<u64>,
}

/// Host collaborator accepting events for delivery. Delivery scheduling
/// (immediate or queued) is the host's concern.
pub trait NotificationSink {
    fn deliver(&mut self, event: &NotificationEvent) -> Result<()>;
}
