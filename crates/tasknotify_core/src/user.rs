use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// A user identity resolved through the host's user directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedUser {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub anonymous: bool,
    #[serde(default)]
    pub locked: bool,
}

impl ResolvedUser {
    /// Anonymous and locked accounts never receive assignment notifications.
    pub fn is_notifiable(&self) -> bool {
        !self.anonymous && !self.locked
    }
}

/// Host collaborator resolving names and ids to user identities.
pub trait UserDirectory {
    fn user_by_name(&self, name: &str) -> Option<ResolvedUser>;
    fn user_by_id(&self, id: u64) -> Option<ResolvedUser>;
}

/// Wiki-style canonical form of a user name: trimmed, underscores read as
/// spaces, first letter upper-cased.
pub fn canonical_name(name: &str) -> String {
    let cleaned = name.trim().replace('_', " ");
    let mut chars = cleaned.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Fixed user directory loaded from a TOML file, used by tests and the CLI
/// in place of a live wiki's user table.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StaticUserDirectory {
    #[serde(default)]
    pub users: Vec<ResolvedUser>,
}

impl StaticUserDirectory {
    pub fn new(users: Vec<ResolvedUser>) -> Self {
        Self { users }
    }

    /// Returns an empty directory when the file does not exist.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        toml::from_str(&content).with_context(|| format!("failed to parse {}", path.display()))
    }
}

impl UserDirectory for StaticUserDirectory {
    fn user_by_name(&self, name: &str) -> Option<ResolvedUser> {
        let canonical = canonical_name(name);
        if canonical.is_empty() {
            return None;
        }
        self.users
            .iter()
            .find(|user| canonical_name(&user.name) == canonical)
            .cloned()
    }

    fn user_by_id(&self, id: u64) -> Option<ResolvedUser> {
        self.users.iter().find(|user| user.id == id).cloned()
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::tempdir;

    use super::{ResolvedUser, StaticUserDirectory, UserDirectory, canonical_name};

    fn user(id: u64, name: &str) -> ResolvedUser {
        ResolvedUser {
            id,
            name: name.to_string(),
            anonymous: false,
            locked: false,
        }
    }

    #[test]
    fn canonical_name_normalizes_wiki_style() {
        assert_eq!(canonical_name("alice"), "Alice");
        assert_eq!(canonical_name("  alice_smith "), "Alice smith");
        assert_eq!(canonical_name("Alice"), "Alice");
        assert_eq!(canonical_name("  "), "");
    }

    #[test]
    fn directory_resolves_names_loosely() {
        let directory = StaticUserDirectory::new(vec![user(7, "Alice Smith")]);
        assert_eq!(directory.user_by_name("alice_smith").map(|u| u.id), Some(7));
        assert_eq!(directory.user_by_name("Alice Smith").map(|u| u.id), Some(7));
        assert!(directory.user_by_name("Bob").is_none());
        assert!(directory.user_by_name("").is_none());
    }

    #[test]
    fn directory_resolves_ids() {
        let directory = StaticUserDirectory::new(vec![user(7, "Alice"), user(8, "Bob")]);
        assert_eq!(
            directory.user_by_id(8).map(|u| u.name),
            Some("Bob".to_string())
        );
        assert!(directory.user_by_id(99).is_none());
    }

    #[test]
    fn load_parses_users_toml() {
        let temp = tempdir().expect("tempdir");
        let path = temp.path().join("users.toml");
        fs::write(
            &path,
            r#"
[[users]]
id = 7
name = "Alice"

[[users]]
id = 8
name = "Mallory"
locked = true
"#,
        )
        .expect("write users");

        let directory = StaticUserDirectory::load(&path).expect("load users");
        assert_eq!(directory.users.len(), 2);
        assert!(directory.user_by_name("Alice").expect("alice").is_notifiable());
        assert!(!directory.user_by_name("Mallory").expect("mallory").is_notifiable());
    }

    #[test]
    fn load_returns_empty_directory_for_missing_file() {
        let directory =
            StaticUserDirectory::load(std::path::Path::new("/nonexistent/users.toml"))
                .expect("load users");
        assert!(directory.users.is_empty());
    }
}
