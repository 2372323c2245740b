use glucolink::{DeviceResult, GlucoseMonitor, HttpDeviceGateway, DEFAULT_DEVICE_URL};
use std::sync::Arc;
use tracing::{error, info};

#[tokio::main]
async fn main() -> DeviceResult<()> {
    // Initialize logging
    tracing_subscriber::fmt::init();

    info!("🩸 GlucoLink Measurement Demo");

    let gateway = Arc::new(HttpDeviceGateway::new(DEFAULT_DEVICE_URL));
    let monitor = GlucoseMonitor::new(gateway);

    info!("Requesting a reading from the device at {}...", DEFAULT_DEVICE_URL);
    match monitor.measure_device().await {
        Ok(Some(reading)) => info!("✅ Device reported {}", reading),
        Ok(None) => info!("A measurement was already in flight"),
        Err(e) => {
            error!("❌ Device measurement failed: {}", e);
            info!("Falling back to a simulated local measurement...");
            match monitor.measure_local().await {
                Some(reading) => info!("✅ Simulated reading {}", reading),
                None => info!("A measurement was already in flight"),
            }
        }
    }

    let snapshot = monitor.snapshot().await;
    info!("📊 Current Status:");
    info!("  Value: {} mg/dL", snapshot.value);
    info!("  Band: {}", snapshot.status);
    info!("  Phase: {}", snapshot.phase);

    info!("🗂 Recent history (newest first):");
    for reading in monitor.recent_history().await {
        info!("  {}  {}", reading.observed_at, reading);
    }

    Ok(())
}
