use chrono::Local;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::error::DeviceError;

/// Glucose value below which a reading is classified as hypoglycemic (mg/dL)
pub const HYPO_THRESHOLD_MG_DL: i32 = 70;

/// Glucose value above which a reading is classified as hyperglycemic (mg/dL)
pub const HYPER_THRESHOLD_MG_DL: i32 = 140;

/// Clinical band of a glucose value
///
/// Derived solely from the numeric value through [`Band::classify`]; a band is
/// never stored apart from the reading that produced it. The thresholds are
/// fixed: below 70 mg/dL is [`Band::Low`], above 140 mg/dL is [`Band::High`],
/// and both boundary values are [`Band::Normal`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Band {
    /// Hypoglycemic range (`< 70 mg/dL`)
    Low,
    /// Target range (`70..=140 mg/dL`)
    Normal,
    /// Hyperglycemic range (`> 140 mg/dL`)
    High,
}

impl Band {
    /// Classify a glucose value into its clinical band
    ///
    /// Total function over all integers; boundary values 70 and 140 are
    /// `Normal`. Applied identically wherever a raw value becomes a reading,
    /// whether it was measured locally or reported by the device.
    #[must_use]
    pub const fn classify(value: i32) -> Self {
        if value < HYPO_THRESHOLD_MG_DL {
            Self::Low
        } else if value > HYPER_THRESHOLD_MG_DL {
            Self::High
        } else {
            Self::Normal
        }
    }
}

impl fmt::Display for Band {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Low => write!(f, "Low"),
            Self::Normal => write!(f, "Normal"),
            Self::High => write!(f, "High"),
        }
    }
}

/// A single glucose reading
///
/// Immutable once created. Produced by the measurement session and owned by
/// the history ledger from then on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reading {
    /// Measured glucose in mg/dL
    pub value: i32,
    /// Clinical band derived from `value`
    pub band: Band,
    /// Human-readable observation stamp, e.g. `14 Nov · 20:15`
    pub observed_at: String,
}

impl Reading {
    /// Create a reading with an explicit observation stamp
    ///
    /// The band is always derived from `value`; callers cannot supply one.
    #[must_use]
    pub fn new(value: i32, observed_at: impl Into<String>) -> Self {
        Self {
            value,
            band: Band::classify(value),
            observed_at: observed_at.into(),
        }
    }

    /// Create a reading stamped with the current local time
    #[must_use]
    pub fn observed_now(value: i32) -> Self {
        Self::new(value, observation_stamp())
    }
}

impl fmt::Display for Reading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} mg/dL ({})", self.value, self.band)
    }
}

/// Format the current local time the way reading history displays it
fn observation_stamp() -> String {
    Local::now().format("%-d %b · %H:%M").to_string()
}

/// Severity of an alert, also selecting which device alert endpoint fires
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AlertKind {
    /// Hyperglycemia alert
    High,
    /// Hypoglycemia alert
    Low,
}

impl fmt::Display for AlertKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::High => write!(f, "High"),
            Self::Low => write!(f, "Low"),
        }
    }
}

/// An entry in the alert feed
///
/// Created on simulated or device-triggered events, never mutated afterwards;
/// the feed only grows at the front.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertEvent {
    /// Unique event id
    pub id: String,
    /// Alert severity
    pub severity: AlertKind,
    /// Short headline
    pub title: String,
    /// Detail line, includes the glucose value that raised the alert
    pub message: String,
    /// Human-readable relative time of the event
    pub raised_at: String,
}

impl AlertEvent {
    /// Create an alert event with a freshly generated id
    #[must_use]
    pub fn new(
        severity: AlertKind,
        title: impl Into<String>,
        message: impl Into<String>,
        raised_at: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            severity,
            title: title.into(),
            message: message.into(),
            raised_at: raised_at.into(),
        }
    }
}

/// What a reminder is for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReminderCategory {
    /// Take a medication
    Medication,
    /// Take a glucose measurement
    Measurement,
}

impl fmt::Display for ReminderCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Medication => write!(f, "Medication"),
            Self::Measurement => write!(f, "Measurement"),
        }
    }
}

/// A user-created reminder
///
/// Lives in the scheduler's local list. Dispatching a reminder to the device
/// is a fire-and-forget side effect and never changes these fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reminder {
    /// Unique reminder id
    pub id: String,
    /// Reminder category
    pub category: ReminderCategory,
    /// What the reminder says
    pub title: String,
    /// 24-hour `HH:MM` time of day
    pub time_of_day: String,
    /// Whether the reminder is active
    pub enabled: bool,
}

impl Reminder {
    pub(crate) fn new(
        category: ReminderCategory,
        title: impl Into<String>,
        time_of_day: impl Into<String>,
        enabled: bool,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            category,
            title: title.into(),
            time_of_day: time_of_day.into(),
            enabled,
        }
    }
}

/// Lifecycle phase of the measurement session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionPhase {
    /// No measurement in flight
    Idle,
    /// A simulated local measurement is settling
    Measuring,
    /// A device measurement round-trip is in flight
    Connecting,
}

impl SessionPhase {
    /// Check whether a new measurement may start
    #[must_use]
    pub const fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }
}

impl fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "Idle"),
            Self::Measuring => write!(f, "Measuring"),
            Self::Connecting => write!(f, "Connecting"),
        }
    }
}

/// Status label shown beside the current glucose value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionStatus {
    /// Last measurement completed in this band
    Settled(Band),
    /// Last measurement failed; the previous value is still displayed
    Error,
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Settled(band) => write!(f, "{band}"),
            Self::Error => write!(f, "Error"),
        }
    }
}

/// Point-in-time view of the measurement session for rendering
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonitorSnapshot {
    /// Current glucose value in mg/dL
    pub value: i32,
    /// Status label for the current value
    pub status: SessionStatus,
    /// Session lifecycle phase
    pub phase: SessionPhase,
}

/// Lifecycle phase of a reminder dispatch to the device
///
/// A dispatch requested while another is `Sending` is refused, and each
/// completion is matched against a generation counter, so a stale completion
/// never overwrites the phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DispatchPhase {
    /// No dispatch has been attempted yet
    Idle,
    /// A dispatch is in flight
    Sending,
    /// The most recent dispatch finished, successfully or not
    Settled,
}

impl fmt::Display for DispatchPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "Idle"),
            Self::Sending => write!(f, "Sending"),
            Self::Settled => write!(f, "Settled"),
        }
    }
}

/// Raw acknowledgment from the device after a reminder push
///
/// The body is carried back for logging but its shape is not interpreted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchAck {
    /// Verbatim response body
    pub raw: String,
}

/// Outcome of one best-effort reminder dispatch
#[derive(Debug)]
pub enum DispatchOutcome {
    /// The device acknowledged the reminder
    Delivered(DispatchAck),
    /// The dispatch failed; the local reminder is unaffected
    Failed(DeviceError),
    /// Another dispatch was already in flight, so this one was skipped
    Busy,
}

impl DispatchOutcome {
    /// Check whether the device acknowledged the dispatch
    #[must_use]
    pub const fn is_delivered(&self) -> bool {
        matches!(self, Self::Delivered(_))
    }
}

/// One sample as handed back by the device gateway
///
/// `/glucosa` replies carry only a value; the alert endpoints also echo the
/// device's own status word, which is kept for logging but never trusted for
/// classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceSample {
    /// Reported glucose in mg/dL
    pub value: i32,
    /// Device-side status word (`alta`/`baja`/`normal`), when present
    pub raw_status: Option<String>,
}

/// Tuning knobs for the measurement session
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    /// Glucose value the session starts from, in mg/dL
    pub baseline_mg_dl: i32,
    /// Sensor settling time simulated by the local measurement path, in ms
    pub settle_delay_ms: u64,
    /// Largest delta a simulated measurement may apply, in mg/dL
    pub sample_jitter_mg_dl: i32,
    /// How many times an unreachable glucose fetch is retried
    pub retry_attempts: u32,
    /// Delay between retry attempts in milliseconds
    pub retry_delay_ms: u64,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            baseline_mg_dl: 110,
            settle_delay_ms: 1_500,
            sample_jitter_mg_dl: 20,
            retry_attempts: 2,
            retry_delay_ms: 500,
        }
    }
}
