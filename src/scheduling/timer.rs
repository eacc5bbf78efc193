use std::time::Duration;

use chrono::NaiveDateTime;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

struct ArmedWakeup {
    target: NaiveDateTime,
    task_handle: JoinHandle<()>,
    cancellation_token: CancellationToken,
}

/// The single pending wake-up. Arming always replaces whatever was armed before.
#[derive(Default)]
pub struct WakeupTimer {
    armed: Option<ArmedWakeup>,
}

impl WakeupTimer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs `on_fire` after `delay`. The handler receives the token of this arming so it can
    /// tell whether it was superseded while waiting to get in.
    pub fn arm<F, Fut>(&mut self, target: NaiveDateTime, delay: Duration, on_fire: F)
    where
        F: FnOnce(CancellationToken) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.disarm();

        let cancellation_token = CancellationToken::new();
        let task_cancellation_token = cancellation_token.clone();

        let task_handle = tokio::spawn(async move {
            tokio::select! {
                _ = task_cancellation_token.cancelled() => {
                    log::debug!("Wake-up for {target} was cancelled");
                },
                _ = tokio::time::sleep(delay) => {
                    on_fire(task_cancellation_token).await;
                }
            }
        });

        log::debug!("Armed wake-up for {target} in {delay:?}");
        self.armed = Some(ArmedWakeup {
            target,
            task_handle,
            cancellation_token,
        });
    }

    /// Cancels the pending wake-up. A handler that already started keeps running; it only
    /// observes the cancellation through its token.
    pub fn disarm(&mut self) {
        if let Some(armed) = self.armed.take() {
            armed.cancellation_token.cancel();
        }
    }

    pub fn target(&self) -> Option<NaiveDateTime> {
        self.armed
            .as_ref()
            .filter(|armed| !armed.task_handle.is_finished())
            .map(|armed| armed.target)
    }

    pub fn is_armed(&self) -> bool {
        self.target().is_some()
    }
}

impl Drop for WakeupTimer {
    fn drop(&mut self) {
        self.disarm();
    }
}
