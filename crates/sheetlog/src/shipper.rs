//! Producer-facing shipping handle.
//!
//! [`SheetShipper::start`] does all the fallible setup synchronously — open
//! or create the workbook, ensure the active sheet, clean up the provisioning
//! sheet, grant ownership if asked — and only then spawns the background
//! worker. Setup failures are returned to the caller and the worker never
//! starts; once running, backend trouble stays inside the worker and
//! producers only ever see `enqueue` succeed.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error};

use crate::config::Config;
use crate::error::{SetupError, SinkError};
use crate::queue::PendingQueue;
use crate::record::LogRecord;
use crate::retry::RetryingSink;
use crate::rotation::RotationEngine;
use crate::sink::{SheetSink, SinkConnector};
use crate::worker::ShippingWorker;

/// Title most backends give the initial worksheet of a new workbook; deleted
/// at startup so only rotation-set sheets remain.
const PROVISIONED_SHEET_TITLE: &str = "Sheet1";

/// Handle for enqueueing rows and controlling the shipping worker.
pub struct SheetShipper {
    queue: Arc<PendingQueue>,
    config: Arc<Config>,
    cancel: CancellationToken,
    worker: tokio::sync::Mutex<Option<JoinHandle<()>>>,
}

impl SheetShipper {
    /// Opens (or creates) the configured workbook, prepares the active sheet,
    /// and spawns the shipping worker.
    ///
    /// # Errors
    ///
    /// Any sink failure during setup is returned synchronously; no background
    /// task exists afterwards.
    pub async fn start(
        connector: &dyn SinkConnector,
        config: Config,
    ) -> Result<Self, SetupError> {
        let config = Arc::new(config);

        let workbook = match connector.open(&config.workbook).await {
            Ok(sink) => sink,
            Err(SinkError::NotFound(_)) => {
                debug!("SHEETS | workbook {} not found, creating it", config.workbook);
                connector.create(&config.workbook).await?
            }
            Err(err) => return Err(err.into()),
        };

        let sink: Arc<dyn SheetSink> = Arc::new(RetryingSink::new(
            workbook,
            config.retry_attempts,
            config.retry_backoff(),
        ));

        let rotation = RotationEngine::new(
            Arc::clone(&sink),
            config.sheet_name.clone(),
            config.max_history_sheets,
        );
        let active = rotation.ensure_active_sheet().await?;

        match sink.worksheet(PROVISIONED_SHEET_TITLE).await {
            Ok(provisioned) => sink.delete_worksheet(provisioned.id).await?,
            Err(SinkError::NotFound(_)) => {}
            Err(err) => return Err(err.into()),
        }

        if let Some(email) = config.share_email.as_deref() {
            make_owner_if_needed(sink.as_ref(), email).await?;
        }

        let queue = Arc::new(PendingQueue::new());
        let cancel = CancellationToken::new();
        let worker = ShippingWorker::new(
            Arc::clone(&sink),
            Arc::clone(&queue),
            rotation,
            active,
            Arc::clone(&config),
            cancel.clone(),
        );
        let handle = tokio::spawn(worker.run());

        Ok(SheetShipper {
            queue,
            config,
            cancel,
            worker: tokio::sync::Mutex::new(Some(handle)),
        })
    }

    /// Queues a record for delivery. Never blocks on I/O; oversized messages
    /// fragment into multiple rows before queueing.
    pub fn enqueue(&self, record: LogRecord) {
        let rows = record.into_rows(self.config.max_cell_chars);
        self.queue.enqueue_rows(rows);
    }

    /// Number of rows still awaiting delivery.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Waits until every queued row has been delivered.
    ///
    /// Polls the queue at the configured interval with no deadline of its
    /// own: if the backend cannot keep up with producers this never returns.
    /// Callers that need a bound must impose one externally.
    pub async fn flush(&self) {
        while !self.queue.is_empty() {
            tokio::time::sleep(self.config.flush_poll_interval()).await;
        }
    }

    /// Signals the worker to stop after its current iteration. Idempotent and
    /// safe from any task; an in-flight send is never interrupted.
    pub fn close(&self) {
        self.cancel.cancel();
    }

    /// Waits for the worker task to finish. Call [`close`](Self::close)
    /// first.
    pub async fn join(&self) {
        if let Some(handle) = self.worker.lock().await.take() {
            if let Err(err) = handle.await {
                error!("SHEETS | worker task failed: {err}");
            }
        }
    }
}

async fn make_owner_if_needed(sink: &dyn SheetSink, email: &str) -> Result<(), SinkError> {
    let permissions = sink.list_permissions().await?;
    let already_owner = permissions
        .iter()
        .any(|p| p.email == email && p.role == "owner" && p.kind == "user");
    if !already_owner {
        debug!("SHEETS | granting ownership to {email}");
        sink.share(email, "user", "owner").await?;
    }
    Ok(())
}
