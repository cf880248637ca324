//! Copy worker.
//!
//! Each worker loops on the task queue, runs the per-record copy decision,
//! bumps the run counters, and routes the record to the success or failure
//! queue. Workers never retry and never abort the run: a record that fails
//! is logged and the next one is picked up.

use std::sync::Arc;
use std::time::Instant;

use async_channel::{Receiver, Sender};
use tokio::sync::watch;
use tracing::{debug, warn, Instrument};

use crate::copy::{self, CopyAction};
use crate::metrics;
use crate::record::{DiffRecord, OutcomeKind};
use crate::store::ObjectStore;

use super::types::RunCounters;

/// Drain the task queue until it closes or cancellation is observed.
///
/// Cancellation lands between records; an in-flight copy is allowed to
/// finish and has its outcome recorded. Outcome sends only fail when the
/// sink has died, which means the run is aborting anyway, so the worker
/// just exits.
#[allow(clippy::too_many_arguments)]
pub(crate) async fn run_worker<S, D>(
    worker_id: usize,
    source: Arc<S>,
    destination: Arc<D>,
    dry_run: bool,
    task_rx: Receiver<DiffRecord>,
    success_tx: Sender<DiffRecord>,
    failure_tx: Sender<DiffRecord>,
    counters: Arc<RunCounters>,
    mut cancel_rx: watch::Receiver<bool>,
) where
    S: ObjectStore,
    D: ObjectStore,
{
    let span = tracing::info_span!("worker", id = worker_id);
    async move {
        debug!("Worker started");
        let mut processed: u64 = 0;

        loop {
            let record = tokio::select! {
                biased;
                _ = cancel_rx.wait_for(|cancelled| *cancelled) => {
                    debug!(processed, "Cancellation observed, worker exiting");
                    break;
                }
                received = task_rx.recv() => match received {
                    Ok(record) => record,
                    Err(_) => {
                        debug!(processed, "Task queue drained, worker exiting");
                        break;
                    }
                },
            };

            debug!(key = %record.key, "Copying object");
            let started = Instant::now();
            let outcome = copy::replicate_object(
                source.as_ref(),
                destination.as_ref(),
                &record,
                dry_run,
            )
            .await;
            metrics::record_copy_duration(started.elapsed());
            processed += 1;

            match outcome {
                Ok(action) => {
                    if let CopyAction::Copied { bytes } = action {
                        metrics::record_bytes_copied(bytes);
                    }
                    counters.record_copied();
                    metrics::record_object_outcome(OutcomeKind::Success);
                    if success_tx.send(record).await.is_err() {
                        break;
                    }
                }
                Err(e) => {
                    warn!(key = %record.key, error = %e, "Copy failed");
                    counters.record_failed();
                    metrics::record_object_outcome(OutcomeKind::Failure);
                    if failure_tx.send(record).await.is_err() {
                        break;
                    }
                }
            }
        }
    }
    .instrument(span)
    .await
}
