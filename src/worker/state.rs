//! Worker lifecycle: `Ready -> Running -> Terminated`.

use crate::error::{Error, Result};

use serde::Serialize;
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Lifecycle status of one orchestration run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum WorkerStatus {
    Ready = 0,
    Running = 1,
    Terminated = 2,
}

impl WorkerStatus {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => WorkerStatus::Ready,
            1 => WorkerStatus::Running,
            _ => WorkerStatus::Terminated,
        }
    }
}

/// Atomically shared lifecycle state.
///
/// Read by every pipeline stage and backend push, written by the run itself
/// (`try_start`) and by any thread calling `terminate`. Never guarded by the
/// result buffer's lock.
#[derive(Debug)]
pub struct WorkerState {
    status: AtomicU8,
    cancel: CancellationToken,
}

impl Default for WorkerState {
    fn default() -> Self {
        Self::new()
    }
}

impl WorkerState {
    pub fn new() -> Self {
        Self {
            status: AtomicU8::new(WorkerStatus::Ready as u8),
            cancel: CancellationToken::new(),
        }
    }

    pub fn status(&self) -> WorkerStatus {
        WorkerStatus::from_u8(self.status.load(Ordering::Acquire))
    }

    pub fn is_running(&self) -> bool {
        self.status() == WorkerStatus::Running
    }

    pub fn is_terminated(&self) -> bool {
        self.status() == WorkerStatus::Terminated
    }

    /// `Ready -> Running`. Fails if the state was anything but `Ready`.
    pub fn try_start(&self) -> bool {
        self.status
            .compare_exchange(
                WorkerStatus::Ready as u8,
                WorkerStatus::Running as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_ok()
    }

    /// Force `Terminated` from any state. Idempotent, never blocks.
    pub fn terminate(&self) {
        self.status
            .store(WorkerStatus::Terminated as u8, Ordering::Release);
        self.cancel.cancel();
    }
}

/// Cancellation token threaded through every pipeline stage.
#[derive(Debug, Clone)]
pub struct Checkpoint {
    state: Arc<WorkerState>,
}

impl Checkpoint {
    pub fn new(state: Arc<WorkerState>) -> Self {
        Self { state }
    }

    /// Abort with [`Error::Cancelled`] unless the run is still `Running`.
    pub fn ensure_running(&self) -> Result<()> {
        match self.state.status() {
            WorkerStatus::Running => Ok(()),
            status => Err(Error::Cancelled(status)),
        }
    }

    /// Check, then wait up to `duration`, waking early on termination.
    pub async fn pause(&self, duration: Duration) -> Result<()> {
        self.ensure_running()?;
        tokio::select! {
            _ = tokio::time::sleep(duration) => {}
            _ = self.state.cancel.cancelled() => {}
        }
        Ok(())
    }
}
