use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::{
    error::DeviceResult,
    gateway::DeviceGateway,
    protocol,
    types::{AlertEvent, AlertKind, Band},
};

/// Alert feed controller
///
/// Keeps the list of raised alerts, newest first. Events are only ever
/// prepended; nothing in the feed is mutated or deleted. A fresh feed seeds
/// two illustrative historical entries so the screen has context before the
/// first real event; those seeds are display fixtures, not device readings.
pub struct AlertFeed<G> {
    gateway: Arc<G>,
    entries: Arc<RwLock<Vec<AlertEvent>>>,
}

impl<G: DeviceGateway> AlertFeed<G> {
    /// Create a feed seeded with its illustrative history
    #[must_use]
    pub fn new(gateway: Arc<G>) -> Self {
        Self {
            gateway,
            entries: Arc::new(RwLock::new(Self::starter_entries())),
        }
    }

    /// Illustrative entries a fresh feed starts with, newest first
    fn starter_entries() -> Vec<AlertEvent> {
        vec![
            AlertEvent::new(
                AlertKind::High,
                "Hyperglycemia detected",
                "Glucose level: 185 mg/dL. Consider taking action.",
                "15 minutes ago",
            ),
            AlertEvent::new(
                AlertKind::Low,
                "Mild hypoglycemia",
                "Glucose level: 65 mg/dL. A snack is recommended.",
                "Yesterday, 9:30 PM",
            ),
        ]
    }

    /// Fire a simulated alert on the device and prepend the resulting event
    ///
    /// The device answers with the sample that raised the alert; the event's
    /// message embeds that value. The device's own status word is only
    /// checked against the local classification for logging; it never
    /// decides anything.
    ///
    /// # Errors
    ///
    /// Returns the gateway's [`DeviceError`](crate::DeviceError) if the call
    /// fails; the feed is left unchanged.
    pub async fn raise_simulated(&self, kind: AlertKind) -> DeviceResult<AlertEvent> {
        let sample = self.gateway.trigger_alert(kind).await?;

        let band = Band::classify(sample.value);
        if let Some(raw) = sample.raw_status.as_deref() {
            match protocol::raw_status_band(raw) {
                Some(claimed) if claimed != band => warn!(
                    "device status word `{}` disagrees with local band {} for {} mg/dL",
                    raw, band, sample.value
                ),
                None => warn!("device sent unknown status word `{}`", raw),
                _ => {}
            }
        }

        let event = match kind {
            AlertKind::High => AlertEvent::new(
                kind,
                "Hyperglycemia detected",
                format!(
                    "Glucose level: {} mg/dL. Consider taking action.",
                    sample.value
                ),
                "just now",
            ),
            AlertKind::Low => AlertEvent::new(
                kind,
                "Mild hypoglycemia",
                format!(
                    "Glucose level: {} mg/dL. A snack is recommended.",
                    sample.value
                ),
                "just now",
            ),
        };

        self.entries.write().await.insert(0, event.clone());
        info!("alert raised: {} ({} mg/dL)", event.title, sample.value);
        Ok(event)
    }

    /// Every feed entry, newest first
    pub async fn entries(&self) -> Vec<AlertEvent> {
        self.entries.read().await.clone()
    }
}
