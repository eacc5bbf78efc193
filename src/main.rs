use std::sync::Arc;

use simple_reminders::{
    appsettings::AppSettings, clock::SystemClock, delivery::LogDeliveryChannel,
    scheduling::ReminderManager, storage::JsonFileReminderStorage,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    pretty_env_logger::init();

    let settings = AppSettings::new()?;
    let reminders_path = settings.storage.reminders_path();
    log::info!("Using reminders file {}", reminders_path.display());

    let manager = ReminderManager::start(
        Arc::new(JsonFileReminderStorage::new(reminders_path)),
        Arc::new(LogDeliveryChannel),
        Arc::new(SystemClock),
    )
    .await;

    for reminder in manager.get_all().await {
        log::info!("{} due {}", reminder, reminder.due_date);
    }

    match manager.next_wakeup().await {
        Some(target) => log::info!("Next reminder at {target}"),
        None => log::info!("Nothing scheduled"),
    }

    tokio::signal::ctrl_c().await?;
    manager.shutdown().await;

    Ok(())
}
