use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::{
    error::ValidationError,
    gateway::DeviceGateway,
    types::{DispatchOutcome, DispatchPhase, Reminder, ReminderCategory},
};

/// Reminder scheduler and dispatcher
///
/// Owns the local reminder list and pushes reminders to the companion
/// display. All CRUD is local and takes effect immediately; showing a
/// reminder on the device is a best-effort side effect that never rolls back
/// or blocks a local change. Input is validated before any mutation, so a
/// rejected call leaves the list untouched.
///
/// One dispatch may be in flight at a time. The dispatch lifecycle is the
/// tri-state [`DispatchPhase`] guarded by a generation counter: a dispatch
/// requested while another is `Sending` is refused with
/// [`DispatchOutcome::Busy`], and a completion that lost the generation race
/// does not overwrite the phase.
pub struct ReminderScheduler<G> {
    gateway: Arc<G>,
    inner: Arc<RwLock<SchedulerInner>>,
}

struct SchedulerInner {
    reminders: Vec<Reminder>,
    dispatch_phase: DispatchPhase,
    dispatch_generation: u64,
}

impl<G: DeviceGateway> ReminderScheduler<G> {
    /// Create a scheduler with an empty reminder list
    #[must_use]
    pub fn new(gateway: Arc<G>) -> Self {
        Self {
            gateway,
            inner: Arc::new(RwLock::new(SchedulerInner {
                reminders: Vec::new(),
                dispatch_phase: DispatchPhase::Idle,
                dispatch_generation: 0,
            })),
        }
    }

    /// Create a scheduler seeded with an illustrative starter set
    #[must_use]
    pub fn with_starter_set(gateway: Arc<G>) -> Self {
        Self {
            gateway,
            inner: Arc::new(RwLock::new(SchedulerInner {
                reminders: vec![
                    Reminder::new(ReminderCategory::Medication, "Take Metformin", "08:00", true),
                    Reminder::new(
                        ReminderCategory::Measurement,
                        "Measure glucose (before lunch)",
                        "13:30",
                        true,
                    ),
                    Reminder::new(ReminderCategory::Medication, "Take Metformin", "20:00", false),
                ],
                dispatch_phase: DispatchPhase::Idle,
                dispatch_generation: 0,
            })),
        }
    }

    /// Create a reminder, then push it to the device
    ///
    /// The reminder is appended locally before the dispatch starts and stays
    /// regardless of the dispatch outcome, which is reported alongside it.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] naming the offending field when the
    /// title or time is empty after trimming or the time is not a strict
    /// 24-hour `HH:MM`; nothing is mutated and nothing is sent.
    pub async fn create(
        &self,
        title: &str,
        time_of_day: &str,
        category: ReminderCategory,
    ) -> Result<(Reminder, DispatchOutcome), ValidationError> {
        let (title, time_of_day) = validate_input(title, time_of_day)?;
        let reminder = Reminder::new(category, title, time_of_day, true);

        {
            let mut inner = self.inner.write().await;
            inner.reminders.push(reminder.clone());
        }
        info!(
            "reminder created: {} at {}",
            reminder.title, reminder.time_of_day
        );

        let outcome = self
            .push_to_device(&reminder.title, &reminder.time_of_day)
            .await;
        Ok((reminder, outcome))
    }

    /// Edit an existing reminder
    ///
    /// Does not dispatch; only [`create`](Self::create) and
    /// [`dispatch`](Self::dispatch) talk to the device. Returns `None` when
    /// no reminder has the given id.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] under the same rules as `create`,
    /// leaving the reminder unchanged.
    pub async fn update(
        &self,
        id: &str,
        title: &str,
        time_of_day: &str,
        category: ReminderCategory,
    ) -> Result<Option<Reminder>, ValidationError> {
        let (title, time_of_day) = validate_input(title, time_of_day)?;

        let mut inner = self.inner.write().await;
        let Some(reminder) = inner.reminders.iter_mut().find(|r| r.id == id) else {
            return Ok(None);
        };

        reminder.title = title;
        reminder.time_of_day = time_of_day;
        reminder.category = category;
        info!("reminder updated: {} at {}", reminder.title, reminder.time_of_day);
        Ok(Some(reminder.clone()))
    }

    /// Remove a reminder
    ///
    /// Removal is unconditional once invoked; any confirmation step belongs
    /// to the presentation layer. Returns the removed reminder, or `None`
    /// when no reminder has the given id.
    pub async fn remove(&self, id: &str) -> Option<Reminder> {
        let mut inner = self.inner.write().await;
        let position = inner.reminders.iter().position(|r| r.id == id)?;
        let removed = inner.reminders.remove(position);
        info!("reminder removed: {}", removed.title);
        Some(removed)
    }

    /// Flip a reminder's enabled flag, returning the new value
    ///
    /// Independent of dispatch: disabling a reminder does not recall anything
    /// already shown on the device.
    pub async fn toggle_enabled(&self, id: &str) -> Option<bool> {
        let mut inner = self.inner.write().await;
        let reminder = inner.reminders.iter_mut().find(|r| r.id == id)?;
        reminder.enabled = !reminder.enabled;
        Some(reminder.enabled)
    }

    /// Resend an existing reminder to the device
    ///
    /// Same best-effort semantics as the dispatch on create. Returns `None`
    /// when no reminder has the given id.
    pub async fn dispatch(&self, id: &str) -> Option<DispatchOutcome> {
        let (title, time_of_day) = {
            let inner = self.inner.read().await;
            let reminder = inner.reminders.iter().find(|r| r.id == id)?;
            (reminder.title.clone(), reminder.time_of_day.clone())
        };
        Some(self.push_to_device(&title, &time_of_day).await)
    }

    /// Current reminder list, in creation order
    pub async fn reminders(&self) -> Vec<Reminder> {
        self.inner.read().await.reminders.clone()
    }

    /// Lifecycle phase of the most recent dispatch
    pub async fn dispatch_phase(&self) -> DispatchPhase {
        self.inner.read().await.dispatch_phase
    }

    /// Run one guarded dispatch through the gateway
    async fn push_to_device(&self, title: &str, time_of_day: &str) -> DispatchOutcome {
        let generation = {
            let mut inner = self.inner.write().await;
            if inner.dispatch_phase == DispatchPhase::Sending {
                info!("reminder dispatch already in flight, skipping");
                return DispatchOutcome::Busy;
            }
            inner.dispatch_generation += 1;
            inner.dispatch_phase = DispatchPhase::Sending;
            inner.dispatch_generation
        };

        let result = self.gateway.send_reminder(title, time_of_day).await;

        {
            let mut inner = self.inner.write().await;
            // A completion that lost the generation race leaves the phase to
            // the dispatch that superseded it.
            if inner.dispatch_generation == generation {
                inner.dispatch_phase = DispatchPhase::Settled;
            }
        }

        match result {
            Ok(ack) => {
                info!("reminder shown on device: {} - {}", title, time_of_day);
                DispatchOutcome::Delivered(ack)
            }
            Err(e) => {
                warn!("reminder dispatch failed: {}", e);
                DispatchOutcome::Failed(e)
            }
        }
    }
}

/// Trim and validate reminder input
fn validate_input(title: &str, time_of_day: &str) -> Result<(String, String), ValidationError> {
    let title = title.trim();
    if title.is_empty() {
        return Err(ValidationError::EmptyTitle);
    }

    let time_of_day = time_of_day.trim();
    if time_of_day.is_empty() {
        return Err(ValidationError::EmptyTime);
    }
    if !is_24h_time(time_of_day) {
        return Err(ValidationError::BadTimeFormat {
            value: time_of_day.to_string(),
        });
    }

    Ok((title.to_string(), time_of_day.to_string()))
}

/// Strict 24-hour `HH:MM` check: five chars, zero-padded, 00-23 / 00-59
fn is_24h_time(s: &str) -> bool {
    let bytes = s.as_bytes();
    if bytes.len() != 5 || bytes[2] != b':' {
        return false;
    }
    if ![bytes[0], bytes[1], bytes[3], bytes[4]]
        .iter()
        .all(u8::is_ascii_digit)
    {
        return false;
    }

    let hour = (bytes[0] - b'0') * 10 + (bytes[1] - b'0');
    let minute = (bytes[3] - b'0') * 10 + (bytes[4] - b'0');
    hour <= 23 && minute <= 59
}
