#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(rust_2018_idioms)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

//! # GlucoLink 🩸
//!
//! A Rust client library for home glucose monitors with an ESP32 companion
//! display on the local network.
//!
//! The crate is the device-synchronization and state-reconciliation core of a
//! glucose-monitoring app: it talks to the appliance's HTTP interface,
//! classifies readings into clinical bands, keeps an ordered reading history,
//! maintains the alert feed, and schedules reminders onto the companion
//! display. Screens and navigation are left to the embedding application,
//! which drives the controllers here and renders what they return.
//!
//! ## Architecture
//!
//! - [`HttpDeviceGateway`]: one HTTP GET per device operation, JSON decode,
//!   typed failures. The [`DeviceGateway`] trait is the seam for injecting a
//!   fake in tests.
//! - [`GlucoseMonitor`]: the measurement session, covering simulated local
//!   readings, device round-trips, classification and the reading history.
//! - [`AlertFeed`]: hyperglycemia/hypoglycemia events, newest first.
//! - [`ReminderScheduler`]: local reminder CRUD plus best-effort pushes to
//!   the companion display.
//!
//! Every failure is recoverable: device errors surface as [`DeviceError`]
//! values for the UI to display, and local state is never left half-mutated.
//!
//! ## Quick Start
//!
//! ```no_run
//! use glucolink::{GlucoseMonitor, HttpDeviceGateway, DEFAULT_DEVICE_URL};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let gateway = Arc::new(HttpDeviceGateway::new(DEFAULT_DEVICE_URL));
//!     let monitor = GlucoseMonitor::new(gateway);
//!
//!     // Ask the device for a reading; it is classified locally.
//!     if let Some(reading) = monitor.measure_device().await? {
//!         println!("{reading}");
//!     }
//!
//!     for reading in monitor.recent_history().await {
//!         println!("{}  {}", reading.observed_at, reading);
//!     }
//!
//!     Ok(())
//! }
//! ```

/// Alert feed controller
pub mod alerts;
/// Error types and handling
pub mod error;
/// Device gateway trait and HTTP implementation
pub mod gateway;
/// Ordered reading history ledger
pub mod history;
/// Measurement session controller
pub mod monitor;
/// Wire-level device protocol: endpoints, reply bodies, query encoding
pub mod protocol;
/// Reminder scheduler and dispatcher
pub mod reminders;
/// Type definitions and data structures
pub mod types;

// Re-export the main types for convenient usage
pub use alerts::AlertFeed;
pub use error::{DeviceError, DeviceResult, ValidationError};
pub use gateway::{DeviceGateway, HttpDeviceGateway};
pub use history::ReadingHistory;
pub use monitor::GlucoseMonitor;
pub use reminders::ReminderScheduler;
pub use types::{
    AlertEvent, AlertKind, Band, DeviceSample, DispatchAck, DispatchOutcome, DispatchPhase,
    MonitorConfig, MonitorSnapshot, Reading, Reminder, ReminderCategory, SessionPhase,
    SessionStatus,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default base address of the appliance on the local network
///
/// The ESP32 companion runs its own access point and answers on this fixed
/// address. Pass a different base to [`HttpDeviceGateway`] for devices that
/// have joined an existing network.
pub const DEFAULT_DEVICE_URL: &str = "http://192.168.1.1";
