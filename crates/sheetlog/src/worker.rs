//! The single background shipping loop.
//!
//! One worker task per shipper; it is the only execution context that ever
//! mutates sink state, so appends, renames, deletes, and reorders are totally
//! ordered. Each iteration drains a bounded batch from the pending queue,
//! appends it, and reacts to classified failures: transient quota errors back
//! off with the batch preserved, capacity errors evict the oldest history
//! sheet, anything else is logged and implicitly retried because rows only
//! leave the queue on confirmed success.
//!
//! The loop self-paces: if an iteration took longer than the minimum period
//! it does not sleep at all, otherwise it sleeps the minimum period, keeping
//! the request rate against the backend bounded from below. Cancellation is
//! cooperative — the token is observed once per iteration and an in-flight
//! send is never preempted.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};

use crate::config::Config;
use crate::error::{classify, FailureKind, SinkError};
use crate::queue::PendingQueue;
use crate::rotation::RotationEngine;
use crate::sink::{SheetSink, WorksheetInfo};

/// Background loop draining the pending queue into the sink.
pub struct ShippingWorker {
    sink: Arc<dyn SheetSink>,
    queue: Arc<PendingQueue>,
    rotation: RotationEngine,
    config: Arc<Config>,
    cancel: CancellationToken,
    /// Active sheet id plus the cached row count consulted for rotation.
    active: WorksheetInfo,
    /// Time spent in successful sends since the active sheet was created.
    send_time: Duration,
}

impl ShippingWorker {
    #[must_use]
    pub fn new(
        sink: Arc<dyn SheetSink>,
        queue: Arc<PendingQueue>,
        rotation: RotationEngine,
        active: WorksheetInfo,
        config: Arc<Config>,
        cancel: CancellationToken,
    ) -> Self {
        ShippingWorker {
            sink,
            queue,
            rotation,
            config,
            cancel,
            active,
            send_time: Duration::ZERO,
        }
    }

    /// Runs until the cancellation token fires.
    pub async fn run(mut self) {
        debug!("SHEETS | shipping worker started for {}", self.active.title);
        loop {
            let started = Instant::now();
            self.run_once().await;

            if self.cancel.is_cancelled() {
                break;
            }
            let pause = loop_sleep(started.elapsed(), self.config.min_loop_period());
            tokio::select! {
                () = self.cancel.cancelled() => break,
                () = tokio::time::sleep(pause) => {}
            }
        }
        debug!("SHEETS | shipping worker stopped");
    }

    async fn run_once(&mut self) {
        match self.process_pending_rows().await {
            Ok(()) => {
                if self.send_time > self.config.max_send_duration()
                    || self.active.row_count > self.config.max_rows_per_sheet
                {
                    self.rotate().await;
                }
            }
            Err(err) => match classify(&err) {
                FailureKind::ResourceExhausted => {
                    debug!("SHEETS | backend throttling, backing off: {err}");
                    self.backoff().await;
                }
                FailureKind::SpaceNeeded => {
                    warn!("SHEETS | workbook out of space: {err}");
                    if let Err(evict_err) = self.rotation.evict_oldest_history().await {
                        error!("SHEETS | eviction failed, batch stays queued: {evict_err}");
                    }
                }
                FailureKind::Other => {
                    error!("SHEETS | failed to ship batch, will retry: {err}");
                }
            },
        }
    }

    /// Sends one bounded batch; rows leave the queue only on confirmed
    /// success, and always the oldest `n` by position.
    async fn process_pending_rows(&mut self) -> Result<(), SinkError> {
        let batch = self.queue.drain_snapshot(self.config.max_rows_per_interval);
        if batch.is_empty() {
            return Ok(());
        }

        let started = Instant::now();
        self.sink.append_rows(self.active.id, &batch).await?;
        let elapsed = started.elapsed();

        self.queue.remove_front(batch.len());
        self.send_time += elapsed;
        self.active.row_count += batch.len();
        debug!(
            "SHEETS | shipped {} rows in {:?} ({} in sheet)",
            batch.len(),
            elapsed,
            self.active.row_count
        );
        Ok(())
    }

    async fn rotate(&mut self) {
        debug!(
            "SHEETS | rotating {} (send time {:?}, {} rows)",
            self.active.title, self.send_time, self.active.row_count
        );
        match self.rotation.rotate().await {
            Ok(active) => {
                self.active = active;
                // Start the new sheet's lifetime clock from zero so rotation
                // does not immediately re-trigger.
                self.send_time = Duration::ZERO;
            }
            Err(err) => {
                // Partial renames are picked up from live sink state on the
                // next attempt.
                error!("SHEETS | rotation failed, will retry: {err}");
                self.backoff().await;
            }
        }
    }

    async fn backoff(&self) {
        tokio::select! {
            () = self.cancel.cancelled() => {}
            () = tokio::time::sleep(self.config.retry_backoff()) => {}
        }
    }
}

/// Sleep for the next iteration: nothing if the last pass already exceeded
/// the minimum period, otherwise the minimum period itself.
fn loop_sleep(elapsed: Duration, min_period: Duration) -> Duration {
    if elapsed > min_period {
        Duration::ZERO
    } else {
        elapsed.max(min_period)
    }
}
