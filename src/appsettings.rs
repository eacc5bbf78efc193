use std::path::PathBuf;

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

use crate::reminder::ReminderAppearance;

const APP_DIR: &str = "SimpleReminders";
const REMINDERS_FILE: &str = "reminders.json";

#[derive(Deserialize, Debug, Default)]
#[serde(default)]
pub struct StorageSettings {
    pub path: Option<PathBuf>,
}

impl StorageSettings {
    /// Configured path, or `reminders.json` under the platform data directory.
    pub fn reminders_path(&self) -> PathBuf {
        self.path.clone().unwrap_or_else(|| {
            dirs::data_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(APP_DIR)
                .join(REMINDERS_FILE)
        })
    }
}

/// Values applied to reminders created through [`crate::reminder::Reminder::new`].
#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct ReminderDefaults {
    pub background_color: String,
    pub font_color: String,
    pub font_size: f32,
    pub width: u32,
    pub height: u32,
    pub sound_path: String,
    pub lead_time_minutes: i64,
}

impl Default for ReminderDefaults {
    fn default() -> Self {
        Self {
            background_color: "#005FB8".to_owned(),
            font_color: "#FFFFFF".to_owned(),
            font_size: 14.0,
            width: 250,
            height: 80,
            sound_path: String::new(),
            lead_time_minutes: 5,
        }
    }
}

impl ReminderDefaults {
    pub fn appearance(&self) -> ReminderAppearance {
        ReminderAppearance {
            background_color: self.background_color.clone(),
            font_color: self.font_color.clone(),
            font_size: self.font_size,
            width: self.width,
            height: self.height,
            sound_path: self.sound_path.clone(),
        }
    }
}

#[derive(Deserialize, Debug, Default)]
#[serde(default)]
pub struct AppSettings {
    pub storage: StorageSettings,
    pub reminder_defaults: ReminderDefaults,
}

impl AppSettings {
    pub fn new() -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::with_name("appsettings").required(false))
            .add_source(File::with_name("appsettings.local").required(false))
            .add_source(Environment::with_prefix("APP").separator("__"))
            .build()?;

        settings.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_sources_yield_defaults() {
        let settings: AppSettings = Config::builder()
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert!(settings.storage.path.is_none());
        assert_eq!(settings.reminder_defaults.lead_time_minutes, 5);
        assert_eq!(settings.reminder_defaults.width, 250);
    }

    #[test]
    fn explicit_storage_path_wins() {
        let settings: AppSettings = Config::builder()
            .set_override("storage.path", "/tmp/reminders-test.json")
            .unwrap()
            .set_override("reminder_defaults.font_color", "#000000")
            .unwrap()
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(
            settings.storage.reminders_path(),
            PathBuf::from("/tmp/reminders-test.json")
        );
        assert_eq!(settings.reminder_defaults.font_color, "#000000");
        assert_eq!(settings.reminder_defaults.font_size, 14.0);
    }

    #[test]
    fn default_storage_path_ends_with_reminders_file() {
        let path = StorageSettings::default().reminders_path();

        assert!(path.ends_with("SimpleReminders/reminders.json"));
    }
}
