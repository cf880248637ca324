//! # Replicopy
//!
//! A concurrent object-copy engine that drives a pre-computed difference
//! list between two object stores to convergence.
//!
//! ## Architecture
//!
//! One run streams every record of the difference list through a bounded
//! three-stage pipeline:
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────────┐
//! │                             replicopy                                │
//! │                                                                      │
//! │  srcdiff.json                                      copy_success.txt  │
//! │       │                                            copy_fails.txt    │
//! │       ▼                                                  ▲           │
//! │  ┌──────────┐  task   ┌─────────────┐  outcome   ┌──────┴───────┐    │
//! │  │  Feeder  │────────►│ Worker pool │───────────►│     Sink     │    │
//! │  │ (NDJSON) │ queue   │ (N workers) │  queues    │ (NDJSON logs)│    │
//! │  └──────────┘         └──────┬──────┘            └──────────────┘    │
//! │                              │ probe / fetch / upload / delete       │
//! │                              ▼                                       │
//! │                source + destination ObjectStore handles              │
//! └──────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every queue is bounded to the worker-pool size, so a difference list of
//! any length is processed in flat memory. Each record lands verbatim in
//! exactly one outcome log, and either log can be fed back in as the next
//! run's difference list.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use replicopy::{CopyConfig, CopyEngine};
//!
//! #[tokio::main]
//! async fn main() {
//!     // NoOp stores: wiring check only. Real runs pass store handles
//!     // via CopyEngine::new(config, source, destination).
//!     let engine = CopyEngine::noop(CopyConfig::default());
//!     match engine.run().await {
//!         Ok(summary) => println!("{}", summary),
//!         Err(e) => eprintln!("run failed: {}", e),
//!     }
//! }
//! ```

pub mod config;
pub mod copy;
pub mod engine;
pub mod error;
pub mod metrics;
pub mod record;
pub mod store;

// Re-exports for convenience
pub use config::CopyConfig;
pub use copy::{replicate_object, CopyAction};
pub use engine::{CopyEngine, EngineState, RunSummary};
pub use error::{CopyError, Result};
pub use record::{DiffRecord, OutcomeKind};
pub use store::{NoOpStore, ObjectStore, StoreError};
