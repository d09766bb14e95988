//! Thread-safe FIFO buffer of rows awaiting delivery.
//!
//! Producers append under a short-held mutex; the shipping worker drains the
//! head in bounded chunks. The lock is only ever held for in-memory list
//! mutation, never across a sink call, so enqueueing stays cheap no matter
//! what the backend is doing.
//!
//! Rows are removed only after the worker confirms a successful send, and
//! always by position (the oldest `n`), not by identity: new rows may arrive
//! while a send is in flight and must stay queued behind the batch.
//!
//! The queue is unbounded. Under sustained backend failure it grows without
//! limit; that tradeoff is deliberate and documented rather than papered over
//! with a drop policy producers cannot observe.

use std::collections::VecDeque;
use std::sync::Mutex;

use tracing::debug;

use crate::record::LogRow;

/// FIFO buffer of [`LogRow`]s shared between producers and the worker.
#[derive(Debug, Default)]
pub struct PendingQueue {
    rows: Mutex<VecDeque<LogRow>>,
}

impl PendingQueue {
    #[must_use]
    pub fn new() -> Self {
        PendingQueue {
            rows: Mutex::new(VecDeque::new()),
        }
    }

    /// Appends rows in order. Fire-and-forget from the producer's viewpoint.
    #[allow(clippy::expect_used)]
    pub fn enqueue_rows(&self, rows: Vec<LogRow>) {
        let mut pending = self.rows.lock().expect("lock poisoned");
        for row in rows {
            pending.push_back(row);
        }
    }

    /// Copies up to `max` of the oldest rows without removing them.
    ///
    /// Removal happens only via [`remove_front`](Self::remove_front) once the
    /// batch is confirmed delivered.
    #[allow(clippy::expect_used)]
    #[must_use]
    pub fn drain_snapshot(&self, max: usize) -> Vec<LogRow> {
        let pending = self.rows.lock().expect("lock poisoned");
        pending.iter().take(max).cloned().collect()
    }

    /// Removes exactly the first `n` rows (or all of them if fewer remain).
    #[allow(clippy::expect_used)]
    pub fn remove_front(&self, n: usize) {
        let mut pending = self.rows.lock().expect("lock poisoned");
        let n = n.min(pending.len());
        pending.drain(..n);
        if !pending.is_empty() {
            // Producers are outpacing delivery; the backlog survives to the
            // next interval.
            debug!(
                "SHEETS | queue not empty after batch removal, {} rows behind",
                pending.len()
            );
        }
    }

    #[allow(clippy::expect_used)]
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.lock().expect("lock poisoned").len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
