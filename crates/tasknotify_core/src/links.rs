use serde::Serialize;

use crate::user::{ResolvedUser, UserDirectory, canonical_name};

/// Key under which the tasks entry is stored in the personal links mapping.
pub const TASKS_LINK_KEY: &str = "tasks";

/// One personal-navigation entry, in the shape the host skin consumes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NavLink {
    pub id: String,
    pub text: String,
    pub title: String,
    pub href: String,
    pub exists: bool,
}

pub fn tasks_nav_link(viewer_name: &str, my_tasks_url: &str) -> NavLink {
    NavLink {
        id: "pt-tasks".to_string(),
        text: "Tâches".to_string(),
        title: "Mes tâches".to_string(),
        href: format!("{my_tasks_url}?user={}", viewer_name.replace(' ', "_")),
        exists: true,
    }
}

/// Inserts the tasks link before the preferences entry, or at the end when
/// no preferences entry is present. Anonymous viewers keep their links
/// untouched.
pub fn insert_tasks_link(
    links: Vec<(String, NavLink)>,
    viewer: &ResolvedUser,
    my_tasks_url: &str,
) -> Vec<(String, NavLink)> {
    if viewer.anonymous {
        return links;
    }

    let link = tasks_nav_link(&viewer.name, my_tasks_url);
    let mut output = Vec::with_capacity(links.len() + 1);
    let mut inserted = false;
    for (key, value) in links {
        if key == "preferences" && !inserted {
            output.push((TASKS_LINK_KEY.to_string(), link.clone()));
            inserted = true;
        }
        output.push((key, value));
    }
    if !inserted {
        output.push((TASKS_LINK_KEY.to_string(), link));
    }
    output
}

/// Body of the "my tasks" page: the task-listing transclusion for the
/// requested user, or error markup when the user is unknown. Without an
/// explicit request the viewer's own tasks are listed.
pub fn my_tasks_page_body(
    requested: Option<&str>,
    viewer: &ResolvedUser,
    directory: &dyn UserDirectory,
) -> String {
    let name = requested
        .map(canonical_name)
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| viewer.name.clone());

    match directory.user_by_name(&name) {
        Some(user) if !user.anonymous => format!(
            "{{{{Toutes_les_tâches_d'un utilisateur|utilisateur={}}}}}",
            user.name
        ),
        _ => "<div class=\"error\">L'utilisateur n'existe pas.</div>".to_string(),
    }
}
