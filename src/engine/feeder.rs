//! Difference list feeder.
//!
//! Reads the difference list line by line, skips the resume prefix without
//! parsing it, and pushes every remaining record into the bounded task
//! queue. A full queue blocks the feeder, which is the engine's only
//! backpressure mechanism. A line that cannot be parsed, or any read
//! failure, aborts the whole run so a half-processed list is never
//! mistaken for a complete one.

use async_channel::Sender;
use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::watch;
use tracing::{debug, info, Instrument};

use crate::config::CopyConfig;
use crate::error::{CopyError, Result};
use crate::metrics;
use crate::record::DiffRecord;

/// Feed the difference list into the task queue.
///
/// Returns when the list is exhausted, cancellation is observed, or every
/// task-queue receiver has gone away. Dropping the sender on return closes
/// the task queue, which is how workers learn there is no more input.
pub(crate) async fn feed_tasks(
    config: CopyConfig,
    task_tx: Sender<DiffRecord>,
    mut cancel_rx: watch::Receiver<bool>,
) -> Result<()> {
    let path = config.diff_list_path();
    let span = tracing::info_span!("feeder", path = %path.display());

    async move {
        let file = File::open(&path)
            .await
            .map_err(|e| CopyError::input(&path, e))?;
        let mut lines = BufReader::new(file).lines();

        info!(skip = config.skip, "Feeding difference list");

        let mut line_no: u64 = 0;
        let mut skipped: u64 = 0;
        let mut queued: u64 = 0;

        while let Some(line) = lines
            .next_line()
            .await
            .map_err(|e| CopyError::input(&path, e))?
        {
            line_no += 1;
            if skipped < config.skip {
                // Resume prefix: already handled by an earlier run, so the
                // line is not even parsed.
                skipped += 1;
                continue;
            }

            let record: DiffRecord = serde_json::from_str(&line)
                .map_err(|e| CopyError::parse(line_no, e.to_string()))?;
            if record.key.is_empty() {
                return Err(CopyError::parse(line_no, "record has an empty key"));
            }
            debug!(
                key = %record.key,
                version = record.version().unwrap_or(""),
                "Queueing copy task"
            );

            tokio::select! {
                biased;
                _ = cancel_rx.wait_for(|cancelled| *cancelled) => {
                    info!(queued, "Cancellation observed, stopping feed");
                    metrics::record_lines_skipped(skipped);
                    return Ok(());
                }
                sent = task_tx.send(record) => {
                    if sent.is_err() {
                        // Every worker is gone. The run is already being
                        // torn down, so stop feeding quietly.
                        info!(queued, "Task queue closed downstream, stopping feed");
                        metrics::record_lines_skipped(skipped);
                        return Ok(());
                    }
                    queued += 1;
                    metrics::record_task_queued();
                }
            }
        }

        info!(queued, skipped, "Difference list exhausted");
        metrics::record_lines_skipped(skipped);

        // Brief grace before closing the queue, so the close trails the
        // last enqueue rather than racing it.
        tokio::time::sleep(config.close_grace_duration()).await;
        drop(task_tx);
        Ok(())
    }
    .instrument(span)
    .await
}
