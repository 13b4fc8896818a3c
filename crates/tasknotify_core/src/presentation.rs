use serde::Serialize;

use crate::notify::{ASSIGNEE_ADDED, NotificationEvent};
use crate::user::{ResolvedUser, UserDirectory};

/// Current state of a page as seen by the render-time checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageSnapshot {
    pub title: String,
    pub revision_id: String,
    pub text: String,
    /// Companion discussion page, when one exists.
    pub talk_title: Option<String>,
}

/// Host collaborator exposing page existence, current revision and text.
pub trait PageStore {
    /// None when the page does not exist.
    fn page(&self, title: &str) -> Option<PageSnapshot>;

    /// URL for a title, whether or not the page exists.
    fn page_url(&self, title: &str) -> String;
}

/// Host collaborator recording watchlist entries.
pub trait WatchlistStore {
    fn add_watch(&mut self, user_id: u64, title: &str);
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Link {
    pub url: String,
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
}

/// Message key plus parameters, resolved to localized text by the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HeaderMessage {
    pub key: String,
    pub params: Vec<String>,
}

/// Render-time contract of one notification kind: decide renderability for a
/// viewer and produce the header and links. One implementation per kind; the
/// host dispatcher selects by the stored event's kind.
pub trait EventPresentation {
    fn kind(&self) -> &'static str;

    fn icon(&self) -> &'static str;

    fn can_render(
        &self,
        event: &NotificationEvent,
        viewer: &ResolvedUser,
        pages: &dyn PageStore,
        watchlist: &mut dyn WatchlistStore,
    ) -> bool;

    fn header(&self, event: &NotificationEvent) -> HeaderMessage;

    fn primary_link(&self, event: &NotificationEvent, pages: &dyn PageStore) -> Link;

    fn secondary_links(
        &self,
        event: &NotificationEvent,
        directory: &dyn UserDirectory,
        pages: &dyn PageStore,
    ) -> Vec<Link>;
}

fn registered_presentations() -> Vec<Box<dyn EventPresentation>> {
    vec![Box::new(AssigneeAddedPresentation)]
}

pub fn presentation_for(kind: &str) -> Option<Box<dyn EventPresentation>> {
    registered_presentations()
        .into_iter()
        .find(|presentation| presentation.kind() == kind)
}

/// Resolves the users a stored event should be delivered to.
pub fn locate_new_assignees(
    event: &NotificationEvent,
    directory: &dyn UserDirectory,
) -> Vec<ResolvedUser> {
    event
        .new_assignees
        .iter()
        .filter_map(|id| directory.user_by_id(*id))
        .collect()
}

#[derive(Debug, Clone, Serialize)]
pub struct RenderedNotification {
    pub header: HeaderMessage,
    pub primary_link: Link,
    pub secondary_links: Vec<Link>,
    pub icon: String,
}

/// Render-time entry point: dispatches on the event kind, runs the staleness
/// checks, and produces the presentation when the event is still valid.
pub fn render_notification(
    event: &NotificationEvent,
    viewer: &ResolvedUser,
    pages: &dyn PageStore,
    directory: &dyn UserDirectory,
    watchlist: &mut dyn WatchlistStore,
) -> Option<RenderedNotification> {
    let presentation = presentation_for(&event.kind)?;
    if !presentation.can_render(event, viewer, pages, watchlist) {
        tracing::debug!(kind = %event.kind, page = %event.page, "notification suppressed at render time");
        return None;
    }
    Some(RenderedNotification {
        header: presentation.header(event),
        primary_link: presentation.primary_link(event, pages),
        secondary_links: presentation.secondary_links(event, directory, pages),
        icon: presentation.icon().to_string(),
    })
}

pub struct AssigneeAddedPresentation;

impl AssigneeAddedPresentation {
    fn watch_task(page: &PageSnapshot, viewer: &ResolvedUser, watchlist: &mut dyn WatchlistStore) {
        watchlist.add_watch(viewer.id, &page.title);
        if let Some(talk) = &page.talk_title {
            watchlist.add_watch(viewer.id, talk);
        }
    }
}

impl EventPresentation for AssigneeAddedPresentation {
    fn kind(&self) -> &'static str {
        ASSIGNEE_ADDED
    }

    fn icon(&self) -> &'static str {
        "list"
    }

    fn can_render(
        &self,
        event: &NotificationEvent,
        viewer: &ResolvedUser,
        pages: &dyn PageStore,
        watchlist: &mut dyn WatchlistStore,
    ) -> bool {
        let Some(page) = pages.page(&event.page) else {
            tracing::debug!(page = %event.page, "notification target page no longer exists");
            return false;
        };
        if event.agent.is_none() {
            return false;
        }
        if page.revision_id != event.revision_id {
            // The page changed since the event fired. A name appearing
            // anywhere in the text counts as "still assigned": this stays a
            // plain substring check, not a template re-parse.
            if !page.text.contains(&viewer.name) {
                return false;
            }
        }
        Self::watch_task(&page, viewer, watchlist);
        true
    }

    fn header(&self, event: &NotificationEvent) -> HeaderMessage {
        HeaderMessage {
            key: format!("notification-header-{ASSIGNEE_ADDED}"),
            params: vec![event.page.clone()],
        }
    }

    fn primary_link(&self, event: &NotificationEvent, pages: &dyn PageStore) -> Link {
        Link {
            url: pages.page_url(&event.page),
            label: event.page.clone(),
            icon: None,
        }
    }

    fn secondary_links(
        &self,
        event: &NotificationEvent,
        directory: &dyn UserDirectory,
        pages: &dyn PageStore,
    ) -> Vec<Link> {
        let Some(agent) = event.agent.and_then(|id| directory.user_by_id(id)) else {
            return Vec::new();
        };
        vec![Link {
            url: pages.page_url(&format!("User:{}", agent.name)),
            label: agent.name,
            icon: Some("userAvatar".to_string()),
        }]
    }
}
