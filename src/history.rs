use std::collections::VecDeque;

use crate::types::Reading;

/// How many readings [`ReadingHistory::recent`] hands to the display
pub const DISPLAY_LIMIT: usize = 20;

/// Ordered ledger of glucose readings, newest first
///
/// Storage is unbounded for the lifetime of the session: every recorded
/// reading is retained, duplicates included. Only the [`recent`] view caps
/// what it returns. Insertion order is the ordering guarantee: a reading
/// recorded later sits closer to the front regardless of when its measurement
/// was started.
///
/// [`recent`]: ReadingHistory::recent
#[derive(Debug, Clone, Default)]
pub struct ReadingHistory {
    readings: VecDeque<Reading>,
}

impl ReadingHistory {
    /// Create an empty ledger
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a ledger pre-populated with readings, newest first
    #[must_use]
    pub fn seeded(readings: impl IntoIterator<Item = Reading>) -> Self {
        Self {
            readings: readings.into_iter().collect(),
        }
    }

    /// Prepend a reading
    pub fn record(&mut self, reading: Reading) {
        self.readings.push_front(reading);
    }

    /// All recorded readings, newest first
    pub fn all(&self) -> impl Iterator<Item = &Reading> {
        self.readings.iter()
    }

    /// The newest readings, capped at [`DISPLAY_LIMIT`]
    pub fn recent(&self) -> impl Iterator<Item = &Reading> {
        self.readings.iter().take(DISPLAY_LIMIT)
    }

    /// Most recently recorded reading, if any
    #[must_use]
    pub fn latest(&self) -> Option<&Reading> {
        self.readings.front()
    }

    /// Number of recorded readings
    #[must_use]
    pub fn len(&self) -> usize {
        self.readings.len()
    }

    /// Check whether the ledger is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.readings.is_empty()
    }
}
