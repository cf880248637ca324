//! Engine state and accounting types.
//!
//! Defines the state machine for the copy engine lifecycle and the atomic
//! run counters the workers update.
//!
//! # State Transitions
//!
//! ```text
//!                  run()
//! Created ───────────────────→ Running
//!                                  │
//!                                  │ (input exhausted
//!                                  │  or cancel())
//!                                  ↓
//!                           ShuttingDown
//!                              │       │
//!            (drain complete)  │       │ (run-fatal error)
//!                              ↓       ↓
//!                           Stopped  Failed
//! ```
//!
//! # State Descriptions
//!
//! - **Created**: Initial state after `CopyEngine::new()`. Nothing opened.
//! - **Running**: `run()` is feeding tasks and copying objects.
//! - **ShuttingDown**: Input is closed; workers are draining the queue and
//!   the sink is finishing the outcome logs.
//! - **Stopped**: Run complete (including cancelled runs). Safe to drop.
//! - **Failed**: Run-fatal error (bad input, log I/O). Check the returned
//!   error for details.

use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// State of the copy engine.
///
/// See module docs for the state transition diagram.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    /// Engine created but not run.
    ///
    /// Call [`run()`](super::CopyEngine::run) to process the difference
    /// list. An engine runs exactly once.
    Created,

    /// Running and copying.
    ///
    /// The feeder is reading the difference list and workers are copying
    /// objects.
    Running,

    /// Shutting down.
    ///
    /// The task queue is closed; workers are draining what remains and the
    /// sink is flushing the outcome logs.
    ShuttingDown,

    /// Stopped.
    ///
    /// The run finished and both outcome logs are flushed. A cancelled run
    /// also ends here, with partial accounting.
    Stopped,

    /// Run-fatal error.
    ///
    /// The difference list was unreadable or an outcome log failed. Check
    /// the error returned by `run()`.
    Failed,
}

impl std::fmt::Display for EngineState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EngineState::Created => write!(f, "Created"),
            EngineState::Running => write!(f, "Running"),
            EngineState::ShuttingDown => write!(f, "ShuttingDown"),
            EngineState::Stopped => write!(f, "Stopped"),
            EngineState::Failed => write!(f, "Failed"),
        }
    }
}

/// Atomic per-run accounting, updated by workers as outcomes land.
///
/// The engine reads the totals only after the worker pool and sink have
/// fully drained, so the values in a [`RunSummary`] are final.
#[derive(Debug, Default)]
pub struct RunCounters {
    copied: AtomicU64,
    failed: AtomicU64,
}

impl RunCounters {
    /// Create zeroed counters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one successful outcome.
    pub fn record_copied(&self) {
        self.copied.fetch_add(1, Ordering::Relaxed);
    }

    /// Record one failed outcome.
    pub fn record_failed(&self) {
        self.failed.fetch_add(1, Ordering::Relaxed);
    }

    /// Successful outcomes so far.
    pub fn copied(&self) -> u64 {
        self.copied.load(Ordering::Relaxed)
    }

    /// Failed outcomes so far.
    pub fn failed(&self) -> u64 {
        self.failed.load(Ordering::Relaxed)
    }
}

/// Final accounting for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    /// Records that ended in the success log.
    pub copied: u64,
    /// Records that ended in the failure log.
    pub failed: u64,
    /// Wall time from `run()` entry to full drain.
    pub elapsed: Duration,
    /// Path of this run's success log.
    pub success_log: PathBuf,
    /// Path of this run's failure log.
    pub failure_log: PathBuf,
}

impl RunSummary {
    /// Check if every processed record succeeded.
    pub fn is_clean(&self) -> bool {
        self.failed == 0
    }
}

impl std::fmt::Display for RunSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Copied {} objects, {} failures", self.copied, self.failed)
    }
}
