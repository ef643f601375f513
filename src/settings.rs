//! App settings and preferences
//!
//! Created once, the first time a durable store is opened, and persisted under
//! the `appSettings` key alongside the other records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// UI color theme
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
    /// Follow the OS preference
    System,
}

impl Theme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
            Theme::System => "system",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "light" => Some(Theme::Light),
            "dark" => Some(Theme::Dark),
            "system" | "auto" => Some(Theme::System),
            _ => None,
        }
    }
}

/// Default UI language
pub const DEFAULT_LANGUAGE: &str = "en";

/// App settings/preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppSettings {
    /// Color theme
    #[serde(default)]
    pub theme: Theme,
    /// UI language code
    #[serde(default = "default_language")]
    pub language: String,
    /// Deadline reminders for timeline events
    #[serde(default = "default_true")]
    pub notifications: bool,
    /// Save quiz progress as answers change
    #[serde(default = "default_true")]
    pub auto_save: bool,
    /// When the settings record was first created
    pub created_at: DateTime<Utc>,
}

fn default_language() -> String {
    DEFAULT_LANGUAGE.to_string()
}

fn default_true() -> bool {
    true
}

impl AppSettings {
    /// Default settings stamped with a creation time
    pub fn new(created_at: DateTime<Utc>) -> Self {
        Self {
            theme: Theme::default(),
            language: default_language(),
            notifications: true,
            auto_save: true,
            created_at,
        }
    }

    /// Whether deadline reminders should fire for `upcoming_events` events
    pub fn reminders_enabled(&self, upcoming_events: usize) -> bool {
        self.notifications && upcoming_events > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_theme_from_str() {
        assert_eq!(Theme::from_str("Dark"), Some(Theme::Dark));
        assert_eq!(Theme::from_str("auto"), Some(Theme::System));
        assert_eq!(Theme::from_str("neon"), None);
        assert_eq!(Theme::Light.as_str(), "light");
    }

    #[test]
    fn test_settings_wire_format() {
        let created = DateTime::from_timestamp_millis(1_700_000_000_000).unwrap();
        let json = serde_json::to_value(AppSettings::new(created)).unwrap();
        assert_eq!(json["theme"], "light");
        assert_eq!(json["language"], "en");
        assert_eq!(json["notifications"], true);
        assert_eq!(json["autoSave"], true);
        assert!(json["createdAt"].as_str().unwrap().starts_with("2023-11-14T"));
    }

    #[test]
    fn test_settings_missing_fields_use_defaults() {
        let settings: AppSettings =
            serde_json::from_str(r#"{"theme":"dark","createdAt":"2024-01-01T00:00:00Z"}"#).unwrap();
        assert_eq!(settings.theme, Theme::Dark);
        assert_eq!(settings.language, "en");
        assert!(settings.notifications);
        assert!(settings.auto_save);
        assert!(!settings.reminders_enabled(0));
        assert!(settings.reminders_enabled(2));
    }
}
