use glucolink::{
    DispatchOutcome, HttpDeviceGateway, ReminderCategory, ReminderScheduler, DEFAULT_DEVICE_URL,
};
use std::sync::Arc;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() {
    // Initialize logging
    tracing_subscriber::fmt::init();

    info!("⏰ GlucoLink Reminder Board");

    let gateway = Arc::new(HttpDeviceGateway::new(DEFAULT_DEVICE_URL));
    let scheduler = ReminderScheduler::with_starter_set(gateway);

    info!("Creating a reminder (kept locally even if the device is offline)...");
    match scheduler
        .create("Evening walk", "18:30", ReminderCategory::Measurement)
        .await
    {
        Ok((reminder, outcome)) => {
            info!("✅ Created: {} at {}", reminder.title, reminder.time_of_day);
            match outcome {
                DispatchOutcome::Delivered(ack) => {
                    info!("📟 Device acknowledged: {}", ack.raw);
                }
                DispatchOutcome::Failed(e) => {
                    warn!("Device did not get it ({}); the reminder is kept locally", e);
                }
                DispatchOutcome::Busy => {
                    warn!("Another dispatch was in flight; the reminder is kept locally");
                }
            }
        }
        Err(e) => error!("❌ Rejected: {}", e),
    }

    let reminders = scheduler.reminders().await;
    if let Some(first) = reminders.first() {
        info!("Resending `{}` to the device display...", first.title);
        match scheduler.dispatch(&first.id).await {
            Some(outcome) if outcome.is_delivered() => info!("✅ Shown on the device"),
            Some(_) => warn!("Could not show it on the device"),
            None => warn!("Reminder vanished before dispatch"),
        }

        if let Some(enabled) = scheduler.toggle_enabled(&first.id).await {
            info!(
                "Toggled `{}` {}",
                first.title,
                if enabled { "on" } else { "off" }
            );
        }
    }

    info!("📋 Reminder list:");
    for reminder in scheduler.reminders().await {
        info!(
            "  [{}] {} at {} ({})",
            reminder.category,
            reminder.title,
            reminder.time_of_day,
            if reminder.enabled { "on" } else { "off" }
        );
    }
}
