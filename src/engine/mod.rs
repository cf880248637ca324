// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Copy engine: coordinates the feeder, worker pool, and outcome sink.
//!
//! # Architecture
//!
//! One run moves every record of the difference list through three stages
//! joined by bounded queues:
//!
//! - **Feeder** reads `srcdiff.json` line by line and pushes parsed records
//!   into the task queue ([`feeder`]).
//! - **Workers** (a fixed-size pool) pull records, run the per-object copy
//!   decision against the two store handles, and push each record to the
//!   success or failure queue ([`worker`]).
//! - **Sink** drains both outcome queues into the timestamped success and
//!   failure logs ([`sink`]).
//!
//! Every queue is bounded to the pool size, so memory stays flat no matter
//! how large the difference list is: a slow store backs pressure up
//! through the workers into the feeder, which simply stops reading.
//!
//! # Shutdown Sequence
//!
//! Strictly ordered so no outcome is ever dropped:
//!
//! 1. The feeder finishes (input exhausted, cancellation, or input error)
//!    and drops the only task-queue sender, closing the queue.
//! 2. Workers drain what remains, then exit as the queue reports closed;
//!    the last worker out drops the last outcome-queue senders.
//! 3. The sink sees both outcome queues close, writes the tail, flushes
//!    both logs, and exits.
//! 4. Only now are the run counters read and the summary assembled.
//!
//! Queue closure is carried by ownership: each stage holds exactly the
//! endpoints it uses, so "all senders dropped" is the same event as "all
//! upstream tasks finished".

mod feeder;
mod sink;
mod types;
mod worker;

pub use types::{EngineState, RunCounters, RunSummary};

use std::sync::Arc;
use std::time::Instant;

use tokio::sync::watch;
use tracing::{error, info, warn};

use crate::config::{self, CopyConfig};
use crate::error::{CopyError, Result};
use crate::metrics;
use crate::record::DiffRecord;
use crate::store::{NoOpStore, ObjectStore};

use self::sink::OutcomeLog;

/// The copy engine.
///
/// Holds the configuration, the two pre-authenticated store handles, and
/// the lifecycle channels. An engine is built in `Created`, runs exactly
/// once, and ends in `Stopped` or `Failed`; build a fresh engine for the
/// next run.
///
/// `run()` borrows the engine shared, so holding it in an [`Arc`] lets
/// another task call [`cancel()`](Self::cancel) while a run is in flight.
pub struct CopyEngine<S: ObjectStore = NoOpStore, D: ObjectStore = NoOpStore> {
    config: CopyConfig,
    source: Arc<S>,
    destination: Arc<D>,
    state_tx: watch::Sender<EngineState>,
    state_rx: watch::Receiver<EngineState>,
    cancel_tx: watch::Sender<bool>,
    cancel_rx: watch::Receiver<bool>,
    counters: Arc<RunCounters>,
}

impl CopyEngine {
    /// Create an engine wired to [`NoOpStore`] handles.
    ///
    /// Useful for wiring tests and pipeline smoke runs: every record is
    /// reported already replicated and nothing is transferred.
    pub fn noop(config: CopyConfig) -> Self {
        Self::new(config, Arc::new(NoOpStore), Arc::new(NoOpStore))
    }
}

impl<S: ObjectStore, D: ObjectStore> CopyEngine<S, D> {
    /// Create an engine over explicit source and destination handles.
    ///
    /// The handles arrive fully authenticated; the engine itself never
    /// deals in endpoints or credentials.
    pub fn new(config: CopyConfig, source: Arc<S>, destination: Arc<D>) -> Self {
        let (state_tx, state_rx) = watch::channel(EngineState::Created);
        let (cancel_tx, cancel_rx) = watch::channel(false);

        Self {
            config,
            source,
            destination,
            state_tx,
            state_rx,
            cancel_tx,
            cancel_rx,
            counters: Arc::new(RunCounters::new()),
        }
    }

    /// Current engine state.
    pub fn state(&self) -> EngineState {
        *self.state_rx.borrow()
    }

    /// Subscribe to state transitions.
    pub fn state_receiver(&self) -> watch::Receiver<EngineState> {
        self.state_rx.clone()
    }

    /// Check if the engine is currently running.
    pub fn is_running(&self) -> bool {
        self.state() == EngineState::Running
    }

    /// Live run counters (final only after `run()` returns).
    pub fn counters(&self) -> &RunCounters {
        &self.counters
    }

    /// Size of the worker pool this engine will spawn.
    pub fn worker_count(&self) -> usize {
        self.config.worker_count()
    }

    /// Request cancellation of an in-flight run.
    ///
    /// The feeder stops reading, workers finish their current object and
    /// exit, and `run()` returns a normal summary covering the work done
    /// so far. Safe to call from any task, any number of times. Calling
    /// it before `run()` makes the run complete immediately with empty
    /// logs.
    pub fn cancel(&self) {
        info!("Cancellation requested");
        let _ = self.cancel_tx.send(true);
    }

    /// Process the whole difference list.
    ///
    /// Spawns the pipeline, waits for the strict shutdown order to play
    /// out, and returns the final accounting. Errors here are run-fatal
    /// (unreadable input, malformed records, outcome log I/O); per-object
    /// store failures land in the failure log instead.
    pub async fn run(&self) -> Result<RunSummary> {
        // Single atomic Created -> Running transition, which is also the
        // run-exactly-once gate.
        let entered = self.state_tx.send_if_modified(|state| {
            if *state == EngineState::Created {
                *state = EngineState::Running;
                true
            } else {
                false
            }
        });
        if !entered {
            return Err(CopyError::InvalidState {
                expected: "Created".to_string(),
                actual: self.state().to_string(),
            });
        }
        metrics::set_engine_state("Running");

        match self.run_pipeline().await {
            Ok(summary) => {
                let _ = self.state_tx.send(EngineState::Stopped);
                metrics::set_engine_state("Stopped");
                metrics::record_run_complete(summary.copied, summary.failed, summary.elapsed);
                info!(
                    %summary,
                    elapsed_ms = summary.elapsed.as_millis() as u64,
                    "Copy run complete"
                );
                Ok(summary)
            }
            Err(e) => {
                error!(error = %e, "Copy run failed");
                let _ = self.state_tx.send(EngineState::Failed);
                metrics::set_engine_state("Failed");
                Err(e)
            }
        }
    }

    async fn run_pipeline(&self) -> Result<RunSummary> {
        let started = Instant::now();
        let worker_count = self.config.worker_count();

        // One stamp for the pair, so the logs of a run sort together.
        let stamp = config::run_stamp(chrono::Local::now());
        let success_path = self.config.success_log_path(&stamp);
        let failure_path = self.config.failure_log_path(&stamp);

        info!(
            workers = worker_count,
            diff_list = %self.config.diff_list_path().display(),
            skip = self.config.skip,
            dry_run = self.config.dry_run,
            "Starting copy run"
        );

        // Both logs open before the first record moves: a run that cannot
        // record outcomes must not start.
        let success_log = OutcomeLog::create(success_path.clone()).await?;
        let failure_log = OutcomeLog::create(failure_path.clone()).await?;

        let (task_tx, task_rx) = async_channel::bounded::<DiffRecord>(worker_count);
        let (success_tx, success_rx) = async_channel::bounded::<DiffRecord>(worker_count);
        let (failure_tx, failure_rx) = async_channel::bounded::<DiffRecord>(worker_count);

        let sink_handle = tokio::spawn(sink::run_sink(
            success_log,
            failure_log,
            success_rx,
            failure_rx,
        ));

        let feeder_handle = tokio::spawn(feeder::feed_tasks(
            self.config.clone(),
            task_tx,
            self.cancel_rx.clone(),
        ));

        let mut worker_handles = Vec::with_capacity(worker_count);
        for worker_id in 0..worker_count {
            worker_handles.push(tokio::spawn(worker::run_worker(
                worker_id,
                Arc::clone(&self.source),
                Arc::clone(&self.destination),
                self.config.dry_run,
                task_rx.clone(),
                success_tx.clone(),
                failure_tx.clone(),
                Arc::clone(&self.counters),
                self.cancel_rx.clone(),
            )));
        }
        metrics::set_active_workers(worker_count);

        // The spawned tasks hold clones; drop the locals so each queue
        // closes exactly when its owning stage finishes.
        drop(task_rx);
        drop(success_tx);
        drop(failure_tx);

        let feed_result = match feeder_handle.await {
            Ok(result) => result,
            Err(e) => Err(CopyError::Internal(format!("feeder task panicked: {}", e))),
        };
        if feed_result.is_err() {
            // Poisoned input aborts the run; stop the workers rather than
            // letting them chew through the already-queued tail.
            let _ = self.cancel_tx.send(true);
        }

        let _ = self.state_tx.send(EngineState::ShuttingDown);
        metrics::set_engine_state("ShuttingDown");

        for (worker_id, handle) in worker_handles.into_iter().enumerate() {
            if let Err(e) = handle.await {
                warn!(worker_id, error = %e, "Worker task panicked");
            }
        }
        metrics::set_active_workers(0);

        let sink_result = match sink_handle.await {
            Ok(result) => result,
            Err(e) => Err(CopyError::Internal(format!("sink task panicked: {}", e))),
        };

        // A sink failure outranks a feed failure: lost outcome records are
        // the more serious report.
        sink_result?;
        feed_result?;

        Ok(RunSummary {
            copied: self.counters.copied(),
            failed: self.counters.failed(),
            elapsed: started.elapsed(),
            success_log: success_path,
            failure_log: failure_path,
        })
    }
}
