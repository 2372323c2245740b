use glucolink::{AlertFeed, AlertKind, HttpDeviceGateway, DEFAULT_DEVICE_URL};
use std::sync::Arc;
use tracing::{error, info};

#[tokio::main]
async fn main() {
    // Initialize logging
    tracing_subscriber::fmt::init();

    info!("🔔 GlucoLink Alert Drill");
    info!("Each drill asks the device to simulate an out-of-range sample.");

    let gateway = Arc::new(HttpDeviceGateway::new(DEFAULT_DEVICE_URL));
    let feed = AlertFeed::new(gateway);

    for kind in [AlertKind::High, AlertKind::Low] {
        info!("Triggering simulated {} alert...", kind);
        match feed.raise_simulated(kind).await {
            Ok(event) => info!("✅ {}: {}", event.title, event.message),
            Err(e) => error!("❌ Alert could not be raised: {}", e),
        }
    }

    info!("📋 Alert feed (newest first):");
    for event in feed.entries().await {
        info!(
            "  [{}] {}: {} ({})",
            event.severity, event.title, event.message, event.raised_at
        );
    }
}
