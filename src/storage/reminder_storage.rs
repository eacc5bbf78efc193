use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::reminder::Reminder;

use super::StorageError;

/// Persists the whole reminder collection in display order.
#[async_trait]
pub trait ReminderStorage: Send + Sync {
    /// Never fails: missing or unreadable data yields an empty collection.
    async fn load(&self) -> Vec<Reminder>;
    async fn save(&self, reminders: &[Reminder]) -> Result<(), StorageError>;
}

#[derive(Default)]
pub struct InMemoryReminderStorage {
    store: RwLock<Vec<Reminder>>,
}

impl InMemoryReminderStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_reminders(reminders: Vec<Reminder>) -> Self {
        InMemoryReminderStorage {
            store: RwLock::new(reminders),
        }
    }

    pub async fn snapshot(&self) -> Vec<Reminder> {
        self.store.read().await.clone()
    }
}

#[async_trait]
impl ReminderStorage for InMemoryReminderStorage {
    async fn load(&self) -> Vec<Reminder> {
        self.snapshot().await
    }

    async fn save(&self, reminders: &[Reminder]) -> Result<(), StorageError> {
        let mut store = self.store.write().await;
        *store = reminders.to_vec();
        log::debug!("Stored {} reminders in memory", store.len());
        Ok(())
    }
}
