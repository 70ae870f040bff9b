//! Settle delay before expensive translation and dispatch work.

use crate::config::DebounceConfig;
use crate::error::Result;
use crate::worker::state::Checkpoint;

use std::time::Duration;

/// Waits a fixed total in fixed slices, checking for cancellation before each
/// slice.
#[derive(Debug, Clone, Copy)]
pub struct DebounceGate {
    total: Duration,
    slice: Duration,
}

impl DebounceGate {
    pub fn new(total: Duration, slice: Duration) -> Self {
        Self {
            total,
            slice: slice.max(Duration::from_millis(1)),
        }
    }

    /// Returns `Err(Cancelled)` as soon as the run stops being `Running`.
    pub async fn settle(&self, checkpoint: &Checkpoint) -> Result<()> {
        let mut remaining = self.total;
        while !remaining.is_zero() {
            let step = self.slice.min(remaining);
            checkpoint.pause(step).await?;
            remaining -= step;
        }
        checkpoint.ensure_running()
    }
}

impl From<&DebounceConfig> for DebounceGate {
    fn from(config: &DebounceConfig) -> Self {
        Self::new(config.total(), config.slice())
    }
}

impl Default for DebounceGate {
    fn default() -> Self {
        Self::from(&DebounceConfig::default())
    }
}
