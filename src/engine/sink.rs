// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Outcome sink: durable per-run result logs.
//!
//! A single sink task owns both log files and drains both outcome queues
//! with no fixed priority until every worker is gone and both queues are
//! empty. Each record is written back verbatim as one JSON line, so either
//! log can be fed straight back in as the next run's difference list. Any
//! log I/O failure is fatal to the run: losing outcome entries silently
//! would make the accounting a lie.

use std::path::{Path, PathBuf};

use async_channel::Receiver;
use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::{debug, info, Instrument};

use crate::error::{CopyError, Result};
use crate::record::{DiffRecord, OutcomeKind};

/// One open outcome log, buffered, line-oriented.
#[derive(Debug)]
pub(crate) struct OutcomeLog {
    path: PathBuf,
    writer: BufWriter<File>,
}

impl OutcomeLog {
    /// Create (truncating) the log file at `path`.
    ///
    /// Object keys can be sensitive, so on Unix the file is created
    /// owner-readable only.
    pub(crate) async fn create(path: PathBuf) -> Result<Self> {
        let mut options = tokio::fs::OpenOptions::new();
        options.create(true).write(true).truncate(true);
        #[cfg(unix)]
        options.mode(0o600);

        let file = options
            .open(&path)
            .await
            .map_err(|e| CopyError::log_io("open", &path, e))?;
        Ok(Self {
            path,
            writer: BufWriter::new(file),
        })
    }

    pub(crate) fn path(&self) -> &Path {
        &self.path
    }

    async fn append(&mut self, record: &DiffRecord) -> Result<()> {
        let mut line = serde_json::to_vec(record)
            .map_err(|e| CopyError::Internal(format!("serialize outcome record: {}", e)))?;
        line.push(b'\n');
        self.writer
            .write_all(&line)
            .await
            .map_err(|e| CopyError::log_io("write", &self.path, e))
    }

    async fn flush(&mut self) -> Result<()> {
        self.writer
            .flush()
            .await
            .map_err(|e| CopyError::log_io("flush", &self.path, e))
    }
}

/// Drain both outcome queues into their logs until both are closed, then
/// flush.
///
/// On a write failure the sink returns immediately; its dropped receivers
/// make the workers' outcome sends fail, which unwinds the rest of the
/// pipeline without anyone blocking.
pub(crate) async fn run_sink(
    mut success_log: OutcomeLog,
    mut failure_log: OutcomeLog,
    success_rx: Receiver<DiffRecord>,
    failure_rx: Receiver<DiffRecord>,
) -> Result<()> {
    let span = tracing::info_span!("sink");
    async move {
        let mut successes: u64 = 0;
        let mut failures: u64 = 0;
        let mut success_done = false;
        let mut failure_done = false;

        while !(success_done && failure_done) {
            // Two live recv branches with no `biased;`: neither queue gets
            // starved when both have records waiting.
            tokio::select! {
                received = success_rx.recv(), if !success_done => match received {
                    Ok(record) => {
                        debug!(key = %record.key, outcome = %OutcomeKind::Success, "Logging outcome");
                        success_log.append(&record).await?;
                        successes += 1;
                    }
                    Err(_) => success_done = true,
                },
                received = failure_rx.recv(), if !failure_done => match received {
                    Ok(record) => {
                        debug!(key = %record.key, outcome = %OutcomeKind::Failure, "Logging outcome");
                        failure_log.append(&record).await?;
                        failures += 1;
                    }
                    Err(_) => failure_done = true,
                },
            }
        }

        success_log.flush().await?;
        failure_log.flush().await?;

        info!(
            successes,
            failures,
            success_log = %success_log.path().display(),
            failure_log = %failure_log.path().display(),
            "Outcome logs complete"
        );
        Ok(())
    }
    .instrument(span)
    .await
}
