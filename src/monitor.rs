use rand::Rng;
use std::{sync::Arc, time::Duration};
use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::{
    error::DeviceResult,
    gateway::DeviceGateway,
    history::ReadingHistory,
    types::{
        Band, DeviceSample, MonitorConfig, MonitorSnapshot, Reading, SessionPhase, SessionStatus,
    },
};

/// Measurement session controller
///
/// Owns the current glucose value, the session phase and the reading history,
/// and drives the two measurement paths:
///
/// - **Local**: a simulated sensor read. The session enters
///   [`SessionPhase::Measuring`], waits out the configured settling time,
///   applies a random delta to the current value, classifies it and records
///   the reading.
/// - **Device**: a network round-trip. The session enters
///   [`SessionPhase::Connecting`], fetches a sample from the device (retrying
///   an unreachable fetch within the configured budget) and records it. The
///   device's value is authoritative, but its band is always derived by
///   [`Band::classify`], never taken from the device.
///
/// Either path returns the session to [`SessionPhase::Idle`]. A failure also
/// returns to `Idle` with the status label set to [`SessionStatus::Error`]
/// and the history untouched; there is no terminal error state.
///
/// A measurement requested while one is in flight is rejected as a no-op.
/// Completions carry a generation token, so a settling timer or late reply
/// that outlives its session can never apply its result.
///
/// # Examples
///
/// ```no_run
/// use glucolink::{GlucoseMonitor, HttpDeviceGateway, DEFAULT_DEVICE_URL};
/// use std::sync::Arc;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let gateway = Arc::new(HttpDeviceGateway::new(DEFAULT_DEVICE_URL));
///     let monitor = GlucoseMonitor::new(gateway);
///
///     if let Some(reading) = monitor.measure_device().await? {
///         println!("device reported {reading}");
///     }
///
///     let snapshot = monitor.snapshot().await;
///     println!("current: {} mg/dL ({})", snapshot.value, snapshot.status);
///     Ok(())
/// }
/// ```
pub struct GlucoseMonitor<G> {
    gateway: Arc<G>,
    config: MonitorConfig,
    inner: Arc<RwLock<MonitorInner>>,
}

struct MonitorInner {
    phase: SessionPhase,
    value: i32,
    status: SessionStatus,
    generation: u64,
    history: ReadingHistory,
}

impl MonitorInner {
    /// Apply a settled measurement: update the current value, relabel the
    /// status, record the reading and idle the session.
    fn settle(&mut self, value: i32) -> Reading {
        let reading = Reading::observed_now(value);
        self.value = value;
        self.status = SessionStatus::Settled(reading.band);
        self.phase = SessionPhase::Idle;
        self.history.record(reading.clone());
        reading
    }
}

impl<G: DeviceGateway> GlucoseMonitor<G> {
    /// Create a monitor with default tuning
    ///
    /// The session starts at the configured baseline value with a short
    /// illustrative history so a fresh screen has something to render.
    #[must_use]
    pub fn new(gateway: Arc<G>) -> Self {
        Self::with_config(gateway, MonitorConfig::default())
    }

    /// Create a monitor with custom tuning
    #[must_use]
    pub fn with_config(gateway: Arc<G>, config: MonitorConfig) -> Self {
        let baseline = config.baseline_mg_dl;
        Self {
            gateway,
            config,
            inner: Arc::new(RwLock::new(MonitorInner {
                phase: SessionPhase::Idle,
                value: baseline,
                status: SessionStatus::Settled(Band::classify(baseline)),
                generation: 0,
                history: Self::starter_history(),
            })),
        }
    }

    /// Illustrative readings a fresh session starts with, newest first
    fn starter_history() -> ReadingHistory {
        ReadingHistory::seeded([
            Reading::new(98, "14 Nov · 20:15"),
            Reading::new(145, "14 Nov · 14:30"),
            Reading::new(110, "14 Nov · 08:00"),
        ])
    }

    /// Monitor tuning in effect
    #[must_use]
    pub const fn config(&self) -> &MonitorConfig {
        &self.config
    }

    /// Take a simulated local measurement
    ///
    /// Waits out the settling delay, then applies a uniform random delta of
    /// at most [`MonitorConfig::sample_jitter_mg_dl`] to the current value
    /// and records the classified reading.
    ///
    /// Returns `None` without doing anything when a measurement is already
    /// in flight, or when the session moved on while the timer was settling.
    pub async fn measure_local(&self) -> Option<Reading> {
        let generation = {
            let mut inner = self.inner.write().await;
            if !inner.phase.is_idle() {
                info!("measurement already in flight, ignoring local request");
                return None;
            }
            inner.generation += 1;
            inner.phase = SessionPhase::Measuring;
            inner.generation
        };

        tokio::time::sleep(Duration::from_millis(self.config.settle_delay_ms)).await;

        let jitter = self.config.sample_jitter_mg_dl;
        let delta = rand::thread_rng().gen_range(-jitter..=jitter);

        let mut inner = self.inner.write().await;
        if inner.generation != generation || inner.phase != SessionPhase::Measuring {
            // Stale settle timer; the session has moved on.
            return None;
        }

        let value = inner.value + delta;
        let reading = inner.settle(value);
        info!("local measurement settled at {}", reading);
        Some(reading)
    }

    /// Take a measurement from the device
    ///
    /// Fetches the current sample over the gateway, classifies it locally and
    /// records it. An unreachable fetch is retried within
    /// [`MonitorConfig::retry_attempts`]; any other failure surfaces at once.
    ///
    /// Returns `Ok(None)` without touching anything when a measurement is
    /// already in flight.
    ///
    /// # Errors
    ///
    /// Returns the final [`DeviceError`](crate::DeviceError) once the retry
    /// budget is spent. The history is untouched, the session returns to
    /// [`SessionPhase::Idle`] and the status label reads
    /// [`SessionStatus::Error`]; the caller is expected to surface the error
    /// to the user.
    pub async fn measure_device(&self) -> DeviceResult<Option<Reading>> {
        let generation = {
            let mut inner = self.inner.write().await;
            if !inner.phase.is_idle() {
                info!("measurement already in flight, ignoring device request");
                return Ok(None);
            }
            inner.generation += 1;
            inner.phase = SessionPhase::Connecting;
            inner.generation
        };

        match self.fetch_with_retry().await {
            Ok(sample) => {
                let mut inner = self.inner.write().await;
                if inner.generation != generation || inner.phase != SessionPhase::Connecting {
                    return Ok(None);
                }

                let reading = inner.settle(sample.value);
                info!("device measurement settled at {}", reading);
                Ok(Some(reading))
            }
            Err(e) => {
                warn!("device measurement failed: {}", e);

                let mut inner = self.inner.write().await;
                if inner.generation == generation && inner.phase == SessionPhase::Connecting {
                    inner.phase = SessionPhase::Idle;
                    inner.status = SessionStatus::Error;
                }
                Err(e)
            }
        }
    }

    /// Fetch a glucose sample, retrying unreachable attempts
    ///
    /// Only `Unreachable` failures are retried: the fetch is an idempotent
    /// read, and any answer from the device (good or bad) is final.
    async fn fetch_with_retry(&self) -> DeviceResult<DeviceSample> {
        let mut attempt = 0;
        loop {
            match self.gateway.fetch_glucose().await {
                Ok(sample) => return Ok(sample),
                Err(e) => {
                    if !e.is_unreachable() || attempt >= self.config.retry_attempts {
                        return Err(e);
                    }
                    attempt += 1;
                    warn!(
                        "glucose fetch unreachable (attempt {} of {}), retrying in {}ms: {}",
                        attempt,
                        self.config.retry_attempts + 1,
                        self.config.retry_delay_ms,
                        e
                    );
                    tokio::time::sleep(Duration::from_millis(self.config.retry_delay_ms)).await;
                }
            }
        }
    }

    /// Current value, status label and phase for rendering
    pub async fn snapshot(&self) -> MonitorSnapshot {
        let inner = self.inner.read().await;
        MonitorSnapshot {
            value: inner.value,
            status: inner.status,
            phase: inner.phase,
        }
    }

    /// Every recorded reading, newest first
    pub async fn history(&self) -> Vec<Reading> {
        self.inner.read().await.history.all().cloned().collect()
    }

    /// The newest readings, capped for display
    pub async fn recent_history(&self) -> Vec<Reading> {
        self.inner.read().await.history.recent().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DeviceError;
    use crate::gateway::testing::FakeGateway;

    fn fast_config() -> MonitorConfig {
        MonitorConfig {
            settle_delay_ms: 20,
            retry_delay_ms: 1,
            ..MonitorConfig::default()
        }
    }

    fn monitor_with(gateway: FakeGateway) -> GlucoseMonitor<FakeGateway> {
        GlucoseMonitor::with_config(Arc::new(gateway), fast_config())
    }

    #[tokio::test]
    async fn test_starts_idle_with_seeded_history() {
        let monitor = monitor_with(FakeGateway::new());
        let snapshot = monitor.snapshot().await;

        assert_eq!(snapshot.phase, SessionPhase::Idle);
        assert_eq!(snapshot.value, 110);
        assert_eq!(snapshot.status, SessionStatus::Settled(Band::Normal));
        assert_eq!(monitor.history().await.len(), 3);
    }

    #[tokio::test]
    async fn test_local_measurement_records_classified_reading() {
        let monitor = monitor_with(FakeGateway::new());
        let before = monitor.history().await.len();

        let reading = monitor.measure_local().await.expect("should settle");
        assert_eq!(reading.band, Band::classify(reading.value));
        // Delta is bounded by the configured jitter.
        assert!((reading.value - 110).abs() <= 20);

        let snapshot = monitor.snapshot().await;
        assert_eq!(snapshot.phase, SessionPhase::Idle);
        assert_eq!(snapshot.value, reading.value);
        assert_eq!(monitor.history().await.len(), before + 1);
        assert_eq!(monitor.history().await[0], reading);
    }

    #[tokio::test]
    async fn test_concurrent_local_measurements_apply_once() {
        let monitor = monitor_with(FakeGateway::new());
        let before = monitor.history().await.len();

        let (first, second) = tokio::join!(monitor.measure_local(), monitor.measure_local());

        // Exactly one invocation settles; the other is rejected while busy.
        assert!(first.is_some() ^ second.is_some());
        assert_eq!(monitor.history().await.len(), before + 1);
        assert_eq!(monitor.snapshot().await.phase, SessionPhase::Idle);
    }

    #[tokio::test]
    async fn test_device_measurement_reclassifies_locally() {
        let gateway = FakeGateway::new();
        gateway.script_glucose(Ok(DeviceSample {
            value: 185,
            raw_status: None,
        }));
        let monitor = monitor_with(gateway);

        let reading = monitor
            .measure_device()
            .await
            .unwrap()
            .expect("should settle");
        assert_eq!(reading.value, 185);
        assert_eq!(reading.band, Band::High);
        assert_eq!(monitor.snapshot().await.value, 185);
        assert_eq!(
            monitor.snapshot().await.status,
            SessionStatus::Settled(Band::High)
        );
    }

    #[tokio::test]
    async fn test_device_failure_leaves_history_intact() {
        let gateway = FakeGateway::new();
        gateway.script_glucose(Err(DeviceError::BadStatus { status: 500 }));
        let monitor = monitor_with(gateway);
        let before = monitor.history().await;

        let err = monitor.measure_device().await.unwrap_err();
        assert!(matches!(err, DeviceError::BadStatus { status: 500 }));

        let snapshot = monitor.snapshot().await;
        assert_eq!(snapshot.phase, SessionPhase::Idle);
        assert_eq!(snapshot.status, SessionStatus::Error);
        assert_eq!(snapshot.value, 110);
        assert_eq!(monitor.history().await, before);
    }

    #[tokio::test]
    async fn test_unreachable_fetch_is_retried_within_budget() {
        let gateway = FakeGateway::new();
        gateway.script_glucose(Err(DeviceError::Unreachable("refused".to_string())));
        gateway.script_glucose(Ok(DeviceSample {
            value: 131,
            raw_status: None,
        }));
        let monitor = monitor_with(gateway);

        let reading = monitor
            .measure_device()
            .await
            .unwrap()
            .expect("retry should recover");
        assert_eq!(reading.value, 131);
        assert_eq!(reading.band, Band::Normal);
    }

    #[tokio::test]
    async fn test_retry_budget_exhaustion_surfaces_unreachable() {
        let gateway = FakeGateway::new();
        for _ in 0..3 {
            gateway.script_glucose(Err(DeviceError::Unreachable("refused".to_string())));
        }
        let monitor = monitor_with(gateway);

        let err = monitor.measure_device().await.unwrap_err();
        assert!(err.is_unreachable());
        assert_eq!(monitor.snapshot().await.status, SessionStatus::Error);
    }

    #[tokio::test]
    async fn test_device_fault_is_not_retried() {
        let gateway = FakeGateway::new();
        gateway.script_glucose(Err(DeviceError::BadStatus { status: 503 }));
        // A second scripted success must never be consumed.
        gateway.script_glucose(Ok(DeviceSample {
            value: 99,
            raw_status: None,
        }));
        let monitor = monitor_with(gateway);

        let err = monitor.measure_device().await.unwrap_err();
        assert!(matches!(err, DeviceError::BadStatus { status: 503 }));

        // The scripted success is still queued: a later measurement takes it.
        let reading = monitor.measure_device().await.unwrap().unwrap();
        assert_eq!(reading.value, 99);
    }

    #[tokio::test]
    async fn test_device_measurement_rejected_while_measuring() {
        let monitor = monitor_with(FakeGateway::new());

        let (local, device) = tokio::join!(monitor.measure_local(), monitor.measure_device());
        assert!(local.is_some());
        assert!(matches!(device, Ok(None)));
    }
}
