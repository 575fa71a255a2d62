//! Reconnect backoff schedule.

use std::time::Duration;

/// Backoff policy, milliseconds per attempt. Ends up with 30s attempts.
const DEFAULT_TABLE_MS: [u64; 10] = [0, 0, 10, 30, 100, 300, 1_000, 3_000, 10_000, 30_000];

/// Ordered, non-decreasing wait durations indexed by attempt count.
/// Attempts at or beyond the table length reuse the final entry, so the
/// retry loop never gives up and never waits longer than the ceiling.
#[derive(Debug, Clone)]
pub struct BackoffSchedule {
    table: Vec<Duration>,
}

impl BackoffSchedule {
    /// Build a schedule from an explicit table.
    ///
    /// # Panics
    ///
    /// Panics if the table is empty or decreasing.
    pub fn new(table: Vec<Duration>) -> Self {
        assert!(!table.is_empty(), "backoff table must not be empty");
        assert!(
            table.windows(2).all(|w| w[0] <= w[1]),
            "backoff table must be non-decreasing"
        );
        Self { table }
    }

    /// Wait duration before the given (zero-based) attempt.
    pub fn delay(&self, attempt: usize) -> Duration {
        self.table[attempt.min(self.table.len() - 1)]
    }
}

impl Default for BackoffSchedule {
    fn default() -> Self {
        Self::new(
            DEFAULT_TABLE_MS
                .iter()
                .map(|&ms| Duration::from_millis(ms))
                .collect(),
        )
    }
}
