use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use tokio::{
    sync::mpsc,
    task::{self, JoinHandle},
};

use crate::reminder::Reminder;

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum ReminderMessageType {
    /// The wake-up timer reached the due date.
    Fired,
    /// The occurrence was missed while the process was not running.
    Missed,
    /// Fired by hand, schedule untouched.
    Triggered,
}

#[async_trait]
pub trait ReminderDeliveryChannel: Send + Sync + 'static {
    async fn send_reminder_notification(
        &self,
        reminder: &Reminder,
        message: ReminderMessageType,
    ) -> anyhow::Result<()>;
}

/// Writes due reminders to the log.
pub struct LogDeliveryChannel;

#[async_trait]
impl ReminderDeliveryChannel for LogDeliveryChannel {
    async fn send_reminder_notification(
        &self,
        reminder: &Reminder,
        message: ReminderMessageType,
    ) -> anyhow::Result<()> {
        log::info!(
            "[{message:?}] {}: {} [reminder_id = {}]",
            reminder,
            reminder.message,
            reminder.id
        );
        Ok(())
    }
}

struct Delivery {
    reminder: Reminder,
    message: ReminderMessageType,
}

/// Hands due reminders to a channel from a background task, in the order they were queued.
/// Queueing never waits on the channel.
pub struct DeliveryQueue {
    tx: Mutex<Option<mpsc::UnboundedSender<Delivery>>>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl DeliveryQueue {
    pub fn spawn(channel: Arc<dyn ReminderDeliveryChannel>) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let task = task::spawn(run_delivery(channel, rx));

        Self {
            tx: Mutex::new(Some(tx)),
            task: Mutex::new(Some(task)),
        }
    }

    pub fn enqueue(&self, reminder: Reminder, message: ReminderMessageType) {
        let reminder_id = reminder.id;
        let sender = self.tx.lock().unwrap_or_else(PoisonError::into_inner);
        let sent = sender
            .as_ref()
            .is_some_and(|tx| tx.send(Delivery { reminder, message }).is_ok());
        if !sent {
            log::warn!("Delivery queue is closed, dropping notification. [reminder_id = {reminder_id}]");
        }
    }

    /// Stops accepting notifications and waits until everything already queued is delivered.
    pub async fn close(&self) {
        self.tx.lock().unwrap_or_else(PoisonError::into_inner).take();

        let task = self.task.lock().unwrap_or_else(PoisonError::into_inner).take();
        if let Some(task) = task {
            if let Err(error) = task.await {
                log::error!("Delivery task ended abnormally. error = {error}");
            }
        }
    }
}

impl Drop for DeliveryQueue {
    fn drop(&mut self) {
        let task = self.task.get_mut().unwrap_or_else(PoisonError::into_inner);
        if let Some(task) = task.take() {
            task.abort();
        }
    }
}

async fn run_delivery(
    channel: Arc<dyn ReminderDeliveryChannel>,
    mut rx: mpsc::UnboundedReceiver<Delivery>,
) {
    while let Some(Delivery { reminder, message }) = rx.recv().await {
        if let Err(error) = channel.send_reminder_notification(&reminder, message).await {
            log::error!(
                "Error delivering reminder. error = {}, reminder_id = {}",
                error,
                reminder.id
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    type ReceivedMessages = Arc<Mutex<Vec<(String, ReminderMessageType)>>>;

    struct TestDeliveryChannel {
        received_messages: ReceivedMessages,
        failing_title: &'static str,
        delay: Duration,
    }

    #[async_trait]
    impl ReminderDeliveryChannel for TestDeliveryChannel {
        async fn send_reminder_notification(
            &self,
            reminder: &Reminder,
            message: ReminderMessageType,
        ) -> anyhow::Result<()> {
            tokio::time::sleep(self.delay).await;
            if reminder.title == self.failing_title {
                anyhow::bail!("rendering failed");
            }
            self.received_messages
                .lock()
                .unwrap()
                .push((reminder.title.clone(), message));
            Ok(())
        }
    }

    fn titled(title: &str) -> Reminder {
        Reminder {
            title: title.to_owned(),
            ..Reminder::default()
        }
    }

    #[tokio::test(start_paused = true)]
    async fn delivers_in_queue_order_and_survives_failures() {
        let received_messages = ReceivedMessages::default();
        let queue = DeliveryQueue::spawn(Arc::new(TestDeliveryChannel {
            received_messages: Arc::clone(&received_messages),
            failing_title: "broken",
            delay: Duration::ZERO,
        }));

        queue.enqueue(titled("first"), ReminderMessageType::Missed);
        queue.enqueue(titled("broken"), ReminderMessageType::Fired);
        queue.enqueue(titled("second"), ReminderMessageType::Triggered);

        tokio::time::sleep(Duration::from_millis(10)).await;

        let msgs = received_messages.lock().unwrap();
        assert_eq!(
            &msgs[..],
            &[
                ("first".to_owned(), ReminderMessageType::Missed),
                ("second".to_owned(), ReminderMessageType::Triggered),
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn close_delivers_everything_queued_then_rejects_new_work() {
        let received_messages = ReceivedMessages::default();
        let queue = DeliveryQueue::spawn(Arc::new(TestDeliveryChannel {
            received_messages: Arc::clone(&received_messages),
            failing_title: "broken",
            delay: Duration::from_secs(5),
        }));

        queue.enqueue(titled("first"), ReminderMessageType::Missed);
        queue.enqueue(titled("second"), ReminderMessageType::Fired);
        queue.close().await;
        queue.enqueue(titled("late"), ReminderMessageType::Fired);
        tokio::time::sleep(Duration::from_secs(10)).await;

        let msgs = received_messages.lock().unwrap();
        assert_eq!(
            &msgs[..],
            &[
                ("first".to_owned(), ReminderMessageType::Missed),
                ("second".to_owned(), ReminderMessageType::Fired),
            ]
        );
    }
}
