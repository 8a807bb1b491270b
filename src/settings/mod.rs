//! Console preferences and the JSON backup format.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use crate::prompts::{PromptError, PromptSet, PromptStore};
use crate::result::now_iso;
use crate::store::{SharedStore, StoreError};

pub const WEBHOOK_URL_KEY: &str = "rca_webhook_url";
pub const THEME_KEY: &str = "rca_theme";
pub const AUTO_SAVE_KEY: &str = "rca_auto_save";
pub const NOTIFICATIONS_KEY: &str = "rca_notifications";

#[derive(Debug, Error)]
pub enum BackupError {
    #[error("backup file is not valid JSON: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("backup file must hold a JSON object")]
    NotAnObject,
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Prompts(#[from] PromptError),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Dark,
    Light,
    System,
}

impl Theme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Dark => "dark",
            Theme::Light => "light",
            Theme::System => "system",
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Theme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "dark" => Ok(Theme::Dark),
            "light" => Ok(Theme::Light),
            "system" => Ok(Theme::System),
            other => Err(format!("unknown theme '{other}' (expected dark, light or system)")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub webhook_url: String,
    pub theme: Theme,
    pub auto_save: bool,
    pub notifications: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Backup {
    pub prompts: PromptSet,
    pub webhook_url: String,
    pub theme: Theme,
    pub auto_save: bool,
    pub notifications: bool,
    pub export_date: String,
}

/// Which backup fields an import applied.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ImportReport {
    pub applied: Vec<&'static str>,
    pub skipped: Vec<&'static str>,
}

#[derive(Clone)]
pub struct SettingsStore {
    store: SharedStore,
    default_webhook_url: String,
}

impl SettingsStore {
    pub fn new(store: SharedStore, default_webhook_url: impl Into<String>) -> Self {
        Self { store, default_webhook_url: default_webhook_url.into() }
    }

    fn raw(&self, key: &str) -> Option<String> {
        match self.store.get(key) {
            Ok(value) => value.filter(|v| !v.is_empty()),
            Err(err) => {
                warn!(key, error = %err, "settings store unreadable");
                None
            }
        }
    }

    // flags default to on; only an explicit "false" turns them off
    fn flag(&self, key: &str) -> bool {
        self.raw(key).as_deref() != Some("false")
    }

    pub fn webhook_url(&self) -> String {
        self.raw(WEBHOOK_URL_KEY).unwrap_or_else(|| self.default_webhook_url.clone())
    }

    pub fn has_custom_webhook_url(&self) -> bool {
        self.raw(WEBHOOK_URL_KEY).is_some()
    }

    pub fn load(&self) -> Settings {
        Settings {
            webhook_url: self.webhook_url(),
            theme: self.raw(THEME_KEY).and_then(|t| t.parse().ok()).unwrap_or_default(),
            auto_save: self.flag(AUTO_SAVE_KEY),
            notifications: self.flag(NOTIFICATIONS_KEY),
        }
    }

    pub fn save_webhook_url(&self, url: &str) -> Result<(), StoreError> {
        self.store.set(WEBHOOK_URL_KEY, url.trim())
    }

    pub fn save_preferences(&self, theme: Theme, auto_save: bool, notifications: bool) -> Result<(), StoreError> {
        self.store.set(THEME_KEY, theme.as_str())?;
        self.store.set(AUTO_SAVE_KEY, &auto_save.to_string())?;
        self.store.set(NOTIFICATIONS_KEY, &notifications.to_string())
    }

    /// Forgets the saved prompts and destination URL. Preferences, the cached
    /// result and the session are kept.
    pub fn reset_all(&self, prompts: &PromptStore) -> Result<(), StoreError> {
        prompts.forget()?;
        self.store.remove(WEBHOOK_URL_KEY)?;
        debug!("prompts and webhook url reset");
        Ok(())
    }

    pub fn export_backup(&self, prompts: &PromptStore) -> Backup {
        let settings = self.load();
        Backup {
            prompts: prompts.load(),
            webhook_url: settings.webhook_url,
            theme: settings.theme,
            auto_save: settings.auto_save,
            notifications: settings.notifications,
            export_date: now_iso(),
        }
    }

    /// Parses the whole document first, then applies each well-typed field on its own.
    pub fn import_backup(&self, prompts: &PromptStore, text: &str) -> Result<ImportReport, BackupError> {
        let value: Value = serde_json::from_str(text)?;
        let doc = value.as_object().ok_or(BackupError::NotAnObject)?;
        let mut report = ImportReport::default();

        let mut mark = |field: &'static str, applied: bool, present: bool| {
            if applied {
                report.applied.push(field);
            } else if present {
                report.skipped.push(field);
            }
        };

        let imported_prompts = doc.get("prompts").and_then(PromptSet::from_value);
        if let Some(set) = &imported_prompts {
            prompts.save(set)?;
        }
        mark("prompts", imported_prompts.is_some(), doc.contains_key("prompts"));

        let url = doc
            .get("webhookUrl")
            .and_then(Value::as_str)
            .filter(|s| !s.trim().is_empty());
        if let Some(url) = url {
            self.save_webhook_url(url)?;
        }
        mark("webhookUrl", url.is_some(), doc.contains_key("webhookUrl"));

        let theme = doc
            .get("theme")
            .and_then(Value::as_str)
            .and_then(|s| s.parse::<Theme>().ok());
        if let Some(theme) = theme {
            self.store.set(THEME_KEY, theme.as_str())?;
        }
        mark("theme", theme.is_some(), doc.contains_key("theme"));

        for (field, key) in [("autoSave", AUTO_SAVE_KEY), ("notifications", NOTIFICATIONS_KEY)] {
            let flag = doc.get(field).and_then(Value::as_bool);
            if let Some(flag) = flag {
                self.store.set(key, &flag.to_string())?;
            }
            mark(field, flag.is_some(), doc.contains_key(field));
        }

        debug!(applied = ?report.applied, skipped = ?report.skipped, "backup imported");
        Ok(report)
    }
}
