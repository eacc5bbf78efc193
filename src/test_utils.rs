use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime, TimeDelta};
use tokio::time::Instant;

use crate::{
    clock::Clock,
    delivery::{ReminderDeliveryChannel, ReminderMessageType},
    reminder::{Reminder, ReminderId},
    storage::{ReminderStorage, StorageError},
};

/// Wall clock that starts at a fixed instant and moves with tokio's (possibly paused) clock.
/// [`TokioClock::jump`] moves wall time without moving tokio time, like a suspended machine.
pub struct TokioClock {
    origin: NaiveDateTime,
    started: Instant,
    jumped: Mutex<TimeDelta>,
}

impl TokioClock {
    pub fn starting_at(origin: NaiveDateTime) -> Arc<Self> {
        Arc::new(Self {
            origin,
            started: Instant::now(),
            jumped: Mutex::new(TimeDelta::zero()),
        })
    }

    pub fn jump(&self, delta: TimeDelta) {
        *self.jumped.lock().unwrap() += delta;
    }
}

impl Clock for TokioClock {
    fn now(&self) -> NaiveDateTime {
        let elapsed = TimeDelta::from_std(self.started.elapsed()).unwrap_or_default();
        self.origin + elapsed + *self.jumped.lock().unwrap()
    }
}

/// Monday 2025-06-02 at the given time.
pub fn monday_at(hour: u32, minute: u32) -> NaiveDateTime {
    NaiveDateTime::new(
        NaiveDate::from_ymd_opt(2025, 6, 2).unwrap(),
        NaiveTime::from_hms_opt(hour, minute, 0).unwrap(),
    )
}

pub type ReceivedMessages = Arc<Mutex<Vec<(ReminderId, ReminderMessageType)>>>;

#[derive(Clone, Default)]
pub struct TestDeliveryChannel {
    pub received_messages: ReceivedMessages,
}

impl TestDeliveryChannel {
    pub fn messages(&self) -> Vec<(ReminderId, ReminderMessageType)> {
        self.received_messages.lock().unwrap().clone()
    }
}

#[async_trait]
impl ReminderDeliveryChannel for TestDeliveryChannel {
    async fn send_reminder_notification(
        &self,
        reminder: &Reminder,
        message: ReminderMessageType,
    ) -> anyhow::Result<()> {
        self.received_messages
            .lock()
            .unwrap()
            .push((reminder.id, message));
        Ok(())
    }
}

/// Storage whose disk is always full.
pub struct FailingStorage {
    pub reminders: Vec<Reminder>,
}

#[async_trait]
impl ReminderStorage for FailingStorage {
    async fn load(&self) -> Vec<Reminder> {
        self.reminders.clone()
    }

    async fn save(&self, _reminders: &[Reminder]) -> Result<(), StorageError> {
        Err(StorageError::Io(std::io::Error::other("disk full")))
    }
}
