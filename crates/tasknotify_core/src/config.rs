use std::env;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::notify::ASSIGNEE_ADDED;

pub const DEFAULT_PRIORITY: u8 = 2;

/// Settings for the assignee-added notification kind. Everything is
/// optional; defaults are high priority, web and email on, web
/// notifications not dismissable, queued delivery.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq, Eq)]
pub struct NotifyConfig {
    #[serde(default)]
    pub notification: NotificationSection,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq, Eq)]
pub struct NotificationSection {
    pub priority: Option<u8>,
    pub web: Option<bool>,
    pub email: Option<bool>,
    pub dismissable_web: Option<bool>,
    pub immediate: Option<bool>,
}

impl NotifyConfig {
    pub fn priority(&self) -> u8 {
        self.notification.priority.unwrap_or(DEFAULT_PRIORITY)
    }

    pub fn web_enabled(&self) -> bool {
        self.notification.web.unwrap_or(true)
    }

    pub fn email_enabled(&self) -> bool {
        self.notification.email.unwrap_or(true)
    }

    pub fn dismissable_web(&self) -> bool {
        self.notification.dismissable_web.unwrap_or(false)
    }

    /// Immediate delivery: env TASKNOTIFY_ENV=development > config > queued.
    pub fn immediate(&self) -> bool {
        if let Ok(value) = env::var("TASKNOTIFY_ENV")
            && value.trim() == "development"
        {
            return true;
        }
        self.notification.immediate.unwrap_or(false)
    }
}

/// Load a NotifyConfig from a TOML file. Returns defaults if the file
/// doesn't exist.
pub fn load_config(config_path: &Path) -> Result<NotifyConfig> {
    if !config_path.exists() {
        return Ok(NotifyConfig::default());
    }
    let content = fs::read_to_string(config_path)
        .with_context(|| format!("failed to read {}", config_path.display()))?;
    let parsed: NotifyConfig = toml::from_str(&content)
        .with_context(|| format!("failed to parse {}", config_path.display()))?;
    Ok(parsed)
}

/// What the host needs to register the notification kind with its event
/// system.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KindRegistration {
    pub kind: String,
    pub category: String,
    pub section: String,
    pub group: String,
    pub priority: u8,
    pub web: bool,
    pub email: bool,
    pub no_dismiss: Vec<String>,
    pub immediate: bool,
    pub icon: String,
}

pub fn kind_registration(config: &NotifyConfig) -> KindRegistration {
    KindRegistration {
        kind: ASSIGNEE_ADDED.to_string(),
        category: ASSIGNEE_ADDED.to_string(),
        section: "alert".to_string(),
        group: "interactive".to_string(),
        priority: config.priority(),
        web: config.web_enabled(),
        email: config.email_enabled(),
        no_dismiss: if config.dismissable_web() {
            Vec::new()
        } else {
            vec!["web".to_string()]
        },
        immediate: config.immediate(),
        icon: "list".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::Path;

    use tempfile::tempdir;

    use super::{NotifyConfig, kind_registration, load_config};
    use crate::notify::ASSIGNEE_ADDED;

    #[test]
    fn default_settings_are_high_priority_both_channels() {
        let config = NotifyConfig::default();
        assert_eq!(config.priority(), 2);
        assert!(config.web_enabled());
        assert!(config.email_enabled());
        assert!(!config.dismissable_web());
    }

    #[test]
    fn load_config_returns_default_for_missing_file() {
        let config = load_config(Path::new("/nonexistent/tasknotify.toml")).expect("load config");
        assert_eq!(config, NotifyConfig::default());
    }

    #[test]
    fn load_config_parses_notification_section() {
        let temp = tempdir().expect("tempdir");
        let config_path = temp.path().join("tasknotify.toml");
        fs::write(
            &config_path,
            r#"
[notification]
priority = 1
email = false
dismissable_web = true
"#,
        )
        .expect("write config");

        let config = load_config(&config_path).expect("load config");
        assert_eq!(config.priority(), 1);
        assert!(config.web_enabled());
        assert!(!config.email_enabled());
        assert!(config.dismissable_web());
    }

    #[test]
    fn load_config_returns_error_for_invalid_toml() {
        let temp = tempdir().expect("tempdir");
        let config_path = temp.path().join("tasknotify.toml");
        fs::write(&config_path, "[notification\npriority = 1").expect("write config");
        let error = load_config(&config_path).expect_err("must fail");
        assert!(error.to_string().contains("failed to parse"));
    }

    #[test]
    fn registration_carries_kind_and_channels() {
        let registration = kind_registration(&NotifyConfig::default());
        assert_eq!(registration.kind, ASSIGNEE_ADDED);
        assert_eq!(registration.category, ASSIGNEE_ADDED);
        assert_eq!(registration.section, "alert");
        assert_eq!(registration.no_dismiss, vec!["web".to_string()]);
        assert_eq!(registration.icon, "list");
    }

    #[test]
    fn dismissable_web_clears_no_dismiss() {
        let config = NotifyConfig {
            notification: super::NotificationSection {
                dismissable_web: Some(true),
                ..Default::default()
            },
        };
        assert!(kind_registration(&config).no_dismiss.is_empty());
    }
}
