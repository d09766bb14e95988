//! Retrying adapter over a [`SheetSink`].
//!
//! Wraps the four mutating operations — append, delete, rename, reorder —
//! with a bounded, fixed-delay retry that fires only when the classifier
//! reports a transient quota/availability failure. Everything else, and every
//! read-side operation, passes through untouched. This is an explicit
//! decorator at the sink seam, not generic interception: callers can see
//! exactly which operations carry retry semantics.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use crate::error::{classify, FailureKind, SinkError};
use crate::record::LogRow;
use crate::sink::{Permission, SheetId, SheetSink, WorksheetInfo};

/// Decorator that retries transient failures of mutating sink calls.
pub struct RetryingSink {
    inner: Arc<dyn SheetSink>,
    attempts: u32,
    backoff: Duration,
}

impl RetryingSink {
    /// Wraps `inner`, retrying classified-transient failures of mutating
    /// operations up to `attempts` times with a fixed `backoff` between
    /// tries. `attempts` is clamped to at least one.
    #[must_use]
    pub fn new(inner: Arc<dyn SheetSink>, attempts: u32, backoff: Duration) -> Self {
        RetryingSink {
            inner,
            attempts: attempts.max(1),
            backoff,
        }
    }

    async fn with_retry<T, Fut, F>(&self, operation: &str, mut call: F) -> Result<T, SinkError>
    where
        F: FnMut() -> Fut + Send,
        Fut: Future<Output = Result<T, SinkError>> + Send,
    {
        let mut attempt = 1;
        loop {
            match call().await {
                Ok(value) => return Ok(value),
                Err(err) => {
                    if classify(&err) != FailureKind::ResourceExhausted
                        || attempt >= self.attempts
                    {
                        return Err(err);
                    }
                    debug!(
                        "SHEETS | transient backend error on {operation} (attempt {attempt}): {err}"
                    );
                    attempt += 1;
                    tokio::time::sleep(self.backoff).await;
                }
            }
        }
    }
}

#[async_trait]
impl SheetSink for RetryingSink {
    async fn list_worksheets(&self) -> Result<Vec<WorksheetInfo>, SinkError> {
        self.inner.list_worksheets().await
    }

    async fn worksheet(&self, title: &str) -> Result<WorksheetInfo, SinkError> {
        self.inner.worksheet(title).await
    }

    async fn add_worksheet(
        &self,
        title: &str,
        rows: usize,
        cols: usize,
    ) -> Result<WorksheetInfo, SinkError> {
        self.inner.add_worksheet(title, rows, cols).await
    }

    async fn append_rows(&self, sheet: SheetId, rows: &[LogRow]) -> Result<(), SinkError> {
        self.with_retry("append_rows", || self.inner.append_rows(sheet, rows))
            .await
    }

    async fn delete_worksheet(&self, sheet: SheetId) -> Result<(), SinkError> {
        self.with_retry("delete_worksheet", || self.inner.delete_worksheet(sheet))
            .await
    }

    async fn update_title(&self, sheet: SheetId, title: &str) -> Result<(), SinkError> {
        self.with_retry("update_title", || self.inner.update_title(sheet, title))
            .await
    }

    async fn reorder_worksheets(&self, order: &[SheetId]) -> Result<(), SinkError> {
        self.with_retry("reorder_worksheets", || {
            self.inner.reorder_worksheets(order)
        })
        .await
    }

    async fn list_permissions(&self) -> Result<Vec<Permission>, SinkError> {
        self.inner.list_permissions().await
    }

    async fn share(&self, email: &str, kind: &str, role: &str) -> Result<(), SinkError> {
        self.inner.share(email, kind, role).await
    }
}
