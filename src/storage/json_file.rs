use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;

use crate::reminder::Reminder;

use super::{ReminderStorage, StorageError};

/// Reminders as a pretty-printed JSON array in a single file.
pub struct JsonFileReminderStorage {
    path: PathBuf,
}

impl JsonFileReminderStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read(&self) -> Result<Vec<Reminder>, StorageError> {
        let content = fs::read_to_string(&self.path).await?;
        Ok(serde_json::from_str(&content)?)
    }
}

#[async_trait]
impl ReminderStorage for JsonFileReminderStorage {
    async fn load(&self) -> Vec<Reminder> {
        if !fs::try_exists(&self.path).await.unwrap_or(false) {
            log::info!("No reminders file at {}, starting empty", self.path.display());
            return Vec::new();
        }

        match self.read().await {
            Ok(reminders) => {
                log::info!("Loaded {} reminders from {}", reminders.len(), self.path.display());
                reminders
            }
            Err(error) => {
                log::warn!(
                    "Could not read reminders, starting empty. error = {}, path = {}",
                    error,
                    self.path.display()
                );
                Vec::new()
            }
        }
    }

    async fn save(&self, reminders: &[Reminder]) -> Result<(), StorageError> {
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir).await?;
        }

        let content = serde_json::to_string_pretty(reminders)?;
        fs::write(&self.path, content).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Weekday};
    use uuid::Uuid;

    use super::*;
    use crate::reminder::{EnabledDays, RecurrenceInterval};

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir()
            .join(format!("simple-reminders-{}", Uuid::new_v4()))
            .join(name)
    }

    async fn cleanup(storage: &JsonFileReminderStorage) {
        if let Some(dir) = storage.path().parent() {
            let _ = fs::remove_dir_all(dir).await;
        }
    }

    #[tokio::test]
    async fn missing_file_loads_empty() {
        let storage = JsonFileReminderStorage::new(temp_path("reminders.json"));

        assert!(storage.load().await.is_empty());
    }

    #[tokio::test]
    async fn corrupt_file_loads_empty() {
        let storage = JsonFileReminderStorage::new(temp_path("reminders.json"));
        storage.save(&[]).await.unwrap();
        fs::write(storage.path(), "{ not json").await.unwrap();

        assert!(storage.load().await.is_empty());

        cleanup(&storage).await;
    }

    #[tokio::test]
    async fn saved_reminders_load_back_in_order() {
        let storage = JsonFileReminderStorage::new(temp_path("nested/reminders.json"));
        let due = NaiveDateTime::new(
            NaiveDate::from_ymd_opt(2025, 6, 2).unwrap(),
            NaiveTime::from_hms_opt(9, 30, 0).unwrap(),
        );
        let reminders = vec![
            Reminder {
                title: "Standup".to_owned(),
                is_recurring: true,
                recurrence_interval: RecurrenceInterval::from_parts(1, 0, 0),
                enabled_days: EnabledDays::new([Weekday::Mon, Weekday::Thu]),
                due_date: due,
                ..Reminder::default()
            },
            Reminder {
                title: "Dentist".to_owned(),
                due_date: due,
                is_passed: true,
                ..Reminder::default()
            },
        ];

        storage.save(&reminders).await.unwrap();
        let loaded = storage.load().await;

        assert_eq!(loaded, reminders);

        cleanup(&storage).await;
    }

    #[tokio::test]
    async fn partial_records_load_with_defaults() {
        let storage = JsonFileReminderStorage::new(temp_path("reminders.json"));
        storage.save(&[]).await.unwrap();
        fs::write(
            storage.path(),
            r#"[{ "title": "Old format", "is_recurring": true, "recurrence_interval": 600 }]"#,
        )
        .await
        .unwrap();

        let loaded = storage.load().await;

        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].title, "Old format");
        assert_eq!(loaded[0].recurrence_interval, RecurrenceInterval::from_parts(0, 0, 10));
        assert!(loaded[0].enabled_days.is_unrestricted());
        assert!(!loaded[0].is_passed);

        cleanup(&storage).await;
    }
}
