use datasize::DataSize;
use serde::{Deserialize, Serialize};

use evidence_types::TimeDiff;

const DEFAULT_BROADCAST_INTERVAL: TimeDiff = TimeDiff::from_seconds(10);
const DEFAULT_RETRY_INTERVAL: TimeDiff = TimeDiff::from_millis(100);
const DEFAULT_MAX_RETRY_INTERVAL: TimeDiff = TimeDiff::from_seconds(10);

/// Configuration options for broadcasting evidence.
#[derive(Copy, Clone, DataSize, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// How long to wait for new evidence before broadcasting all pending evidence to a peer
    /// again.
    broadcast_interval: TimeDiff,
    /// Delay before retrying a failed send. Doubles with every further failure of the same item.
    retry_interval: TimeDiff,
    /// Upper bound for the retry delay.
    max_retry_interval: TimeDiff,
}

impl Config {
    pub(crate) fn broadcast_interval(&self) -> TimeDiff {
        self.broadcast_interval
    }

    pub(crate) fn retry_interval(&self) -> TimeDiff {
        self.retry_interval
    }

    /// Returns the delay following `previous`, doubled but capped at `max_retry_interval`.
    pub(crate) fn next_retry_interval(&self, previous: TimeDiff) -> TimeDiff {
        previous.saturating_mul(2).min(self.max_retry_interval)
    }

    #[cfg(test)]
    pub(crate) fn new_for_tests(
        broadcast_interval: TimeDiff,
        retry_interval: TimeDiff,
        max_retry_interval: TimeDiff,
    ) -> Self {
        Config {
            broadcast_interval,
            retry_interval,
            max_retry_interval,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            broadcast_interval: DEFAULT_BROADCAST_INTERVAL,
            retry_interval: DEFAULT_RETRY_INTERVAL,
            max_retry_interval: DEFAULT_MAX_RETRY_INTERVAL,
        }
    }
}
