//! Configuration for the copy engine.
//!
//! This module defines the run options passed to
//! [`CopyEngine::new()`](crate::CopyEngine::new) and the fixed file names a
//! run resolves inside its working directory. Configuration can be
//! constructed programmatically or deserialized from JSON.
//!
//! # Quick Start
//!
//! ```rust
//! use replicopy::config::CopyConfig;
//!
//! let config = CopyConfig {
//!     working_dir: "/var/lib/app/replication".into(),
//!     skip: 1500,
//!     ..Default::default()
//! };
//! ```
//!
//! # File Layout
//!
//! ```text
//! <working_dir>/
//! ├── srcdiff.json                      # input difference list (read)
//! ├── copy_fails.txt.<run stamp>        # failure outcomes (written)
//! └── copy_success.txt.<run stamp>      # success outcomes (written)
//! ```
//!
//! # JSON Example
//!
//! ```json
//! {
//!   "working_dir": "/var/lib/app/replication",
//!   "skip": 0,
//!   "dry_run": false,
//!   "concurrency": 100,
//!   "close_grace": "100ms"
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

// ═══════════════════════════════════════════════════════════════════════════════
// Fixed file names: the run resolves all three inside the working directory
// ═══════════════════════════════════════════════════════════════════════════════

/// Difference list consumed by a run.
pub const DIFF_LIST_FILE: &str = "srcdiff.json";

/// Failure log base name; the run stamp is appended after a dot.
pub const FAILURE_LOG_FILE: &str = "copy_fails.txt";

/// Success log base name; the run stamp is appended after a dot.
pub const SUCCESS_LOG_FILE: &str = "copy_success.txt";

/// Format a run-start time as the suffix shared by both outcome logs.
///
/// The stamp is month-day-year-hour-minute-second in local time, so logs
/// from repeated runs sort and group by name.
pub fn run_stamp(started: chrono::DateTime<chrono::Local>) -> String {
    started.format("%m-%d-%Y-%H-%M-%S").to_string()
}

// ═══════════════════════════════════════════════════════════════════════════════
// CopyConfig: passed from the caller to CopyEngine::new()
// ═══════════════════════════════════════════════════════════════════════════════

/// The options object passed to `CopyEngine::new()`.
///
/// # Fields
///
/// - `working_dir`: Directory holding the difference list and receiving the
///   outcome logs.
/// - `skip`: Leading input records to ignore (resume support).
/// - `dry_run`: Preview mode; probe and fetch only, never mutate the
///   destination.
/// - `concurrency`: Baseline worker count; see [`worker_count()`](Self::worker_count).
/// - `close_grace`: Delay between input exhaustion and task-queue close.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CopyConfig {
    /// Directory holding the difference list and receiving the outcome logs.
    #[serde(default = "default_working_dir")]
    pub working_dir: PathBuf,

    /// Count of leading difference-list records to ignore. Skipped lines are
    /// not parsed, so a resume can jump over records that earlier runs
    /// already handled (or that are known to be malformed).
    #[serde(default)]
    pub skip: u64,

    /// Preview mode. The decision still probes the destination and fetches
    /// from the source, but never uploads or deletes.
    #[serde(default = "default_false")]
    pub dry_run: bool,

    /// Baseline worker count. The effective pool size never drops below the
    /// host's available parallelism; see [`worker_count()`](Self::worker_count).
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Grace delay between input exhaustion and closing the task queue, as a
    /// duration string (e.g., "100ms"). Parsed to Duration internally.
    #[serde(default = "default_close_grace")]
    pub close_grace: String,
}

fn default_working_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_false() -> bool {
    false
}

fn default_concurrency() -> usize {
    100
}

fn default_close_grace() -> String {
    "100ms".to_string()
}

impl Default for CopyConfig {
    fn default() -> Self {
        Self {
            working_dir: PathBuf::from("."),
            skip: 0,
            dry_run: false,
            concurrency: 100,
            close_grace: "100ms".to_string(),
        }
    }
}

impl CopyConfig {
    /// Create a config for testing (short grace delay, caller-owned dir).
    pub fn for_testing(working_dir: impl Into<PathBuf>) -> Self {
        Self {
            working_dir: working_dir.into(),
            skip: 0,
            dry_run: false,
            concurrency: 4,
            close_grace: "1ms".to_string(),
        }
    }

    /// Effective worker pool size.
    ///
    /// The configured baseline or the host's available parallelism,
    /// whichever is larger. Queue capacities equal this value.
    pub fn worker_count(&self) -> usize {
        let available = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        self.concurrency.max(available)
    }

    /// Parse the close_grace string to a Duration.
    pub fn close_grace_duration(&self) -> Duration {
        humantime::parse_duration(&self.close_grace).unwrap_or(Duration::from_millis(100))
    }

    /// Path of the difference list this run will read.
    pub fn diff_list_path(&self) -> PathBuf {
        self.working_dir.join(DIFF_LIST_FILE)
    }

    /// Path of the failure log for a run stamped `stamp`.
    pub fn failure_log_path(&self, stamp: &str) -> PathBuf {
        self.working_dir.join(format!("{}.{}", FAILURE_LOG_FILE, stamp))
    }

    /// Path of the success log for a run stamped `stamp`.
    pub fn success_log_path(&self, stamp: &str) -> PathBuf {
        self.working_dir.join(format!("{}.{}", SUCCESS_LOG_FILE, stamp))
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════════════════════════
