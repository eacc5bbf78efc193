use std::{sync::Arc, time::Duration};

use chrono::{Datelike, NaiveDateTime};
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

use crate::{
    clock::Clock,
    delivery::{DeliveryQueue, ReminderDeliveryChannel, ReminderMessageType},
    reminder::{Reminder, ReminderId},
    storage::ReminderStorage,
};

use super::{
    catch_up::{ensure_valid_next_occurrence, reconcile},
    occurrence::advance_past,
    timer::WakeupTimer,
};

struct ManagerState {
    reminders: Vec<Reminder>,
    timer: WakeupTimer,
    /// Instant of the last wake-up (start-up initially). Stalled reminders only fire when
    /// their due date lies after it.
    last_wakeup: NaiveDateTime,
}

struct ManagerInner {
    state: Mutex<ManagerState>,
    storage: Arc<dyn ReminderStorage>,
    delivery: DeliveryQueue,
    clock: Arc<dyn Clock>,
}

/// Owns the reminder collection and the one wake-up timer that serves all of it.
///
/// Every operation, including the timer handler, runs under a single lock on the collection.
/// Due reminders are queued for delivery and never awaited.
pub struct ReminderManager {
    inner: Arc<ManagerInner>,
}

impl ReminderManager {
    /// Loads the collection, catches up on whatever was missed while not running and arms
    /// the timer for the next due reminder.
    pub async fn start(
        storage: Arc<dyn ReminderStorage>,
        delivery_channel: Arc<dyn ReminderDeliveryChannel>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let mut reminders = storage.load().await;
        let loaded = reminders.clone();
        let now = clock.now();
        let missed = reconcile(&mut reminders, now);

        log::info!(
            "Starting reminder manager with {} reminders, {} missed",
            reminders.len(),
            missed.len()
        );

        let inner = Arc::new(ManagerInner {
            state: Mutex::new(ManagerState {
                reminders,
                timer: WakeupTimer::new(),
                last_wakeup: now,
            }),
            storage,
            delivery: DeliveryQueue::spawn(delivery_channel),
            clock,
        });

        {
            let mut state = inner.state.lock().await;
            for reminder in missed {
                log::info!("[MISSED] Delivering reminder {}", reminder.id);
                inner.delivery.enqueue(reminder, ReminderMessageType::Missed);
            }

            if state.reminders != loaded {
                inner.persist(&state.reminders).await;
            }
            inner.schedule_next(&mut state);
        }

        Self { inner }
    }

    /// Snapshot in display order.
    pub async fn get_all(&self) -> Vec<Reminder> {
        self.inner.state.lock().await.reminders.clone()
    }

    pub async fn get(&self, id: ReminderId) -> Option<Reminder> {
        let state = self.inner.state.lock().await;
        state.reminders.iter().find(|r| r.id == id).cloned()
    }

    /// Due date of the armed wake-up, `None` when idle.
    pub async fn next_wakeup(&self) -> Option<NaiveDateTime> {
        self.inner.state.lock().await.timer.target()
    }

    pub async fn add(&self, reminder: Reminder) -> ReminderId {
        let mut state = self.inner.state.lock().await;
        let id = self.inner.insert(&mut state, reminder);
        self.inner.commit(&mut state).await;
        id
    }

    /// Adds a copy of the reminder under a new id at the end of the collection.
    pub async fn duplicate(&self, id: ReminderId) -> Option<ReminderId> {
        let mut state = self.inner.state.lock().await;
        let copy = state.reminders.iter().find(|r| r.id == id)?.duplicate();
        let copy_id = self.inner.insert(&mut state, copy);
        self.inner.commit(&mut state).await;
        Some(copy_id)
    }

    /// Replaces the reminder with the same id, keeping its position.
    pub async fn update(&self, mut reminder: Reminder) -> bool {
        let mut state = self.inner.state.lock().await;
        let Some(index) = state.reminders.iter().position(|r| r.id == reminder.id) else {
            log::debug!("Update for unknown reminder ignored. [reminder_id = {}]", reminder.id);
            return false;
        };

        ensure_valid_next_occurrence(&mut reminder, self.inner.clock.now());
        state.reminders[index] = reminder;
        self.inner.commit(&mut state).await;
        true
    }

    pub async fn remove(&self, id: ReminderId) -> bool {
        let mut state = self.inner.state.lock().await;
        let Some(index) = state.reminders.iter().position(|r| r.id == id) else {
            log::debug!("Remove for unknown reminder ignored. [reminder_id = {id}]");
            return false;
        };

        state.reminders.remove(index);
        self.inner.commit(&mut state).await;
        true
    }

    /// Moves the reminder at `old_index` to `new_index`. Out of range indices are ignored.
    pub async fn move_reminder(&self, old_index: usize, new_index: usize) -> bool {
        let mut state = self.inner.state.lock().await;
        let len = state.reminders.len();
        if old_index >= len || new_index >= len {
            return false;
        }

        let reminder = state.reminders.remove(old_index);
        state.reminders.insert(new_index, reminder);
        self.inner.commit(&mut state).await;
        true
    }

    /// Delivers the reminder right away without touching its schedule.
    pub async fn trigger_now(&self, id: ReminderId) -> bool {
        let state = self.inner.state.lock().await;
        match state.reminders.iter().find(|r| r.id == id) {
            Some(reminder) => {
                log::info!("[TRIGGER] Delivering reminder {id}");
                self.inner
                    .delivery
                    .enqueue(reminder.clone(), ReminderMessageType::Triggered);
                true
            }
            None => false,
        }
    }

    /// Disarms the timer and waits for queued notifications to be delivered.
    pub async fn shutdown(&self) {
        log::info!("Reminder manager shutting down");
        self.inner.state.lock().await.timer.disarm();
        self.inner.delivery.close().await;
    }
}

impl ManagerInner {
    fn insert(&self, state: &mut ManagerState, mut reminder: Reminder) -> ReminderId {
        ensure_valid_next_occurrence(&mut reminder, self.clock.now());
        let id = reminder.id;
        state.reminders.push(reminder);
        id
    }

    async fn commit(self: &Arc<Self>, state: &mut ManagerState) {
        self.persist(&state.reminders).await;
        self.schedule_next(state);
    }

    async fn persist(&self, reminders: &[Reminder]) {
        if let Err(error) = self.storage.save(reminders).await {
            log::error!("Error saving reminders, keeping them in memory. error = {error}");
        }
    }

    fn schedule_next(self: &Arc<Self>, state: &mut ManagerState) {
        state.timer.disarm();

        let watermark = state.last_wakeup;
        let next_due = state
            .reminders
            .iter()
            .filter(|r| is_schedulable(r, watermark))
            .map(|r| r.due_date)
            .min();

        let Some(target) = next_due else {
            log::debug!("No upcoming reminders, timer idle");
            return;
        };

        let delay = (target - self.clock.now())
            .to_std()
            .unwrap_or(Duration::ZERO);

        let manager = Arc::downgrade(self);
        state.timer.arm(target, delay, move |token| async move {
            if let Some(manager) = manager.upgrade() {
                manager.handle_wakeup(token).await;
            }
        });
    }

    async fn handle_wakeup(self: Arc<Self>, token: CancellationToken) {
        let mut state = self.state.lock().await;
        if token.is_cancelled() {
            log::debug!("Wake-up was superseded while waiting for the lock");
            return;
        }

        let now = self.clock.now();
        let watermark = state.last_wakeup;
        let mut changed = false;

        for reminder in state
            .reminders
            .iter_mut()
            .filter(|r| is_due(r, now, watermark))
        {
            if reminder.enabled_days.allows(now.weekday()) {
                log::info!("[FIRE] Delivering reminder {}", reminder.id);
                self.delivery
                    .enqueue(reminder.clone(), ReminderMessageType::Fired);
            } else {
                log::info!(
                    "[SKIP] {} is not an enabled day. ReminderId {}",
                    now.weekday(),
                    reminder.id
                );
            }

            if reminder.is_recurring {
                advance_past(reminder, now);
                reminder.is_passed = false;
            } else {
                reminder.is_passed = true;
            }
            changed = true;
        }

        state.last_wakeup = state.last_wakeup.max(now);

        if changed {
            self.persist(&state.reminders).await;
        }
        self.schedule_next(&mut state);
    }
}

/// Whether the reminder still has an occurrence the timer should wait for.
fn is_schedulable(reminder: &Reminder, watermark: NaiveDateTime) -> bool {
    if reminder.is_stalled() {
        reminder.due_date > watermark
    } else {
        reminder.is_recurring || !reminder.is_passed
    }
}

fn is_due(reminder: &Reminder, now: NaiveDateTime, watermark: NaiveDateTime) -> bool {
    reminder.due_date <= now && is_schedulable(reminder, watermark)
}
