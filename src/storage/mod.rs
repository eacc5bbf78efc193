mod json_file;
mod reminder_storage;

pub use json_file::JsonFileReminderStorage;
pub use reminder_storage::{InMemoryReminderStorage, ReminderStorage};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
}
