use async_trait::async_trait;
use reqwest::header::ACCEPT;
use std::time::Duration;
use tracing::debug;

use crate::{
    error::{DeviceError, DeviceResult},
    protocol::{self, alert_path, GLUCOSE_PATH, REMINDER_PATH},
    types::{AlertKind, DeviceSample, DispatchAck},
};

/// Per-request timeout applied to every device call
const REQUEST_TIMEOUT_SECS: u64 = 10;

/// Transport seam between the controllers and the embedded device
///
/// Controllers are constructed over an injected gateway so tests can swap in
/// an in-process fake. Implementations are stateless per call and never retry
/// on their own: retry policy belongs to the caller, and [`send_reminder`]
/// in particular must not be repeated silently because every delivery puts a
/// message on the device's display.
///
/// [`send_reminder`]: DeviceGateway::send_reminder
#[async_trait]
pub trait DeviceGateway: Send + Sync {
    /// Fetch the current glucose sample from the device
    ///
    /// Idempotent; safe for callers to retry on [`DeviceError::Unreachable`].
    async fn fetch_glucose(&self) -> DeviceResult<DeviceSample>;

    /// Fire a simulated alert on the device and collect its sample
    async fn trigger_alert(&self, kind: AlertKind) -> DeviceResult<DeviceSample>;

    /// Show a reminder on the companion display
    ///
    /// Visible device side effect; never retried silently.
    async fn send_reminder(&self, title: &str, time_of_day: &str) -> DeviceResult<DispatchAck>;
}

/// HTTP gateway to the embedded device
///
/// Issues one GET per operation against a fixed base address on the local
/// network and decodes the JSON reply. Transport failures map to
/// [`DeviceError::Unreachable`], non-2xx replies to [`DeviceError::BadStatus`]
/// and undecodable bodies to [`DeviceError::MalformedResponse`].
#[derive(Debug, Clone)]
pub struct HttpDeviceGateway {
    client: reqwest::Client,
    base_url: String,
}

impl HttpDeviceGateway {
    /// Create a gateway for a device at `base_url`
    ///
    /// A trailing slash on the base address is tolerated. The underlying HTTP
    /// client is built once and reused for every call.
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client cannot be constructed, which only happens
    /// when the TLS backend fails to initialize.
    #[must_use]
    pub fn new(base_url: &str) -> Self {
        Self::with_timeout(base_url, Duration::from_secs(REQUEST_TIMEOUT_SECS))
    }

    /// Create a gateway with a custom per-request timeout
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client cannot be constructed, which only happens
    /// when the TLS backend fails to initialize.
    #[must_use]
    pub fn with_timeout(base_url: &str, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .expect("failed to build HTTP client");

        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Base address this gateway talks to
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Issue one GET and hand back the body of a successful reply
    async fn get_body(&self, path_and_query: &str) -> DeviceResult<String> {
        let url = format!("{}{}", self.base_url, path_and_query);
        debug!("GET {}", url);

        let response = self
            .client
            .get(&url)
            .header(ACCEPT, "application/json")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(DeviceError::BadStatus {
                status: status.as_u16(),
            });
        }

        let body = response.text().await?;
        debug!("device reply ({}): {}", status, body);
        Ok(body)
    }
}

#[async_trait]
impl DeviceGateway for HttpDeviceGateway {
    async fn fetch_glucose(&self) -> DeviceResult<DeviceSample> {
        let body = self.get_body(GLUCOSE_PATH).await?;
        protocol::parse_glucose_body(&body)
    }

    async fn trigger_alert(&self, kind: AlertKind) -> DeviceResult<DeviceSample> {
        let body = self.get_body(alert_path(kind)).await?;
        protocol::parse_alert_body(&body)
    }

    async fn send_reminder(&self, title: &str, time_of_day: &str) -> DeviceResult<DispatchAck> {
        let query = protocol::reminder_query(title, time_of_day);
        let body = self.get_body(&format!("{REMINDER_PATH}?{query}")).await?;
        Ok(DispatchAck { raw: body })
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! Scripted in-process gateway for controller tests.

    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Fake gateway that replays scripted replies and records reminder sends
    pub(crate) struct FakeGateway {
        glucose_replies: Mutex<VecDeque<DeviceResult<DeviceSample>>>,
        alert_replies: Mutex<VecDeque<DeviceResult<DeviceSample>>>,
        reminder_replies: Mutex<VecDeque<DeviceResult<DispatchAck>>>,
        reminder_delay: Mutex<Option<Duration>>,
        sent_reminders: Mutex<Vec<(String, String)>>,
    }

    impl FakeGateway {
        pub(crate) fn new() -> Self {
            Self {
                glucose_replies: Mutex::new(VecDeque::new()),
                alert_replies: Mutex::new(VecDeque::new()),
                reminder_replies: Mutex::new(VecDeque::new()),
                reminder_delay: Mutex::new(None),
                sent_reminders: Mutex::new(Vec::new()),
            }
        }

        pub(crate) fn script_glucose(&self, reply: DeviceResult<DeviceSample>) {
            self.glucose_replies.lock().unwrap().push_back(reply);
        }

        pub(crate) fn script_alert(&self, reply: DeviceResult<DeviceSample>) {
            self.alert_replies.lock().unwrap().push_back(reply);
        }

        pub(crate) fn script_reminder(&self, reply: DeviceResult<DispatchAck>) {
            self.reminder_replies.lock().unwrap().push_back(reply);
        }

        pub(crate) fn script_reminder_ok(&self) {
            self.script_reminder(Ok(DispatchAck {
                raw: "ok".to_string(),
            }));
        }

        /// Make `send_reminder` pause before answering, to hold the
        /// dispatch machinery in its `Sending` window during tests
        pub(crate) fn set_reminder_delay(&self, delay: Duration) {
            *self.reminder_delay.lock().unwrap() = Some(delay);
        }

        pub(crate) fn sent_reminders(&self) -> Vec<(String, String)> {
            self.sent_reminders.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl DeviceGateway for FakeGateway {
        async fn fetch_glucose(&self) -> DeviceResult<DeviceSample> {
            self.glucose_replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(DeviceError::Unreachable("no scripted reply".to_string())))
        }

        async fn trigger_alert(&self, _kind: AlertKind) -> DeviceResult<DeviceSample> {
            self.alert_replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(DeviceError::Unreachable("no scripted reply".to_string())))
        }

        async fn send_reminder(
            &self,
            title: &str,
            time_of_day: &str,
        ) -> DeviceResult<DispatchAck> {
            let delay = *self.reminder_delay.lock().unwrap();
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }
            self.sent_reminders
                .lock()
                .unwrap()
                .push((title.to_string(), time_of_day.to_string()));
            self.reminder_replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(DeviceError::Unreachable("no scripted reply".to_string())))
        }
    }
}
