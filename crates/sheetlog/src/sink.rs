//! The sink contract: what the shipping engine needs from a remote
//! spreadsheet-style backend.
//!
//! The engine never talks to a concrete service. It is handed an
//! already-authenticated [`SheetSink`] (one open workbook) by a
//! [`SinkConnector`], and drives it through this narrow surface. Anything
//! transport-level — HTTP, auth refresh, per-call timeouts — lives behind the
//! trait, typically wrapped in a [`RetryingSink`](crate::retry::RetryingSink).

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::SinkError;
use crate::record::LogRow;

/// Stable identifier of a worksheet within a workbook.
///
/// Titles change during rotation; the id does not.
pub type SheetId = u64;

/// A worksheet as reported by the sink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorksheetInfo {
    pub id: SheetId,
    pub title: String,
    /// Row count reported by the backend; the authoritative fullness signal.
    pub row_count: usize,
}

/// One entry from the workbook's access control list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Permission {
    pub email: String,
    pub role: String,
    /// Permission subject type, e.g. `"user"`.
    pub kind: String,
}

/// An open, authenticated workbook in the remote tabular store.
///
/// All mutating operations are only ever called from the single shipping
/// worker task, so implementations may assume they are totally ordered.
/// Failures carry the backend's raw error text in
/// [`SinkError::Backend`] so [`classify`](crate::error::classify) can map
/// them onto retry behavior.
#[async_trait]
pub trait SheetSink: Send + Sync {
    /// Lists every worksheet in sink order.
    async fn list_worksheets(&self) -> Result<Vec<WorksheetInfo>, SinkError>;

    /// Looks up a worksheet by exact title.
    async fn worksheet(&self, title: &str) -> Result<WorksheetInfo, SinkError>;

    /// Creates a worksheet with the given placeholder dimensions.
    async fn add_worksheet(
        &self,
        title: &str,
        rows: usize,
        cols: usize,
    ) -> Result<WorksheetInfo, SinkError>;

    /// Appends rows to the given worksheet.
    async fn append_rows(&self, sheet: SheetId, rows: &[LogRow]) -> Result<(), SinkError>;

    /// Deletes a worksheet outright.
    async fn delete_worksheet(&self, sheet: SheetId) -> Result<(), SinkError>;

    /// Renames a worksheet.
    async fn update_title(&self, sheet: SheetId, title: &str) -> Result<(), SinkError>;

    /// Reorders worksheets; `order` lists every sheet id, first = leftmost.
    async fn reorder_worksheets(&self, order: &[SheetId]) -> Result<(), SinkError>;

    /// Lists the workbook's access control entries.
    async fn list_permissions(&self) -> Result<Vec<Permission>, SinkError>;

    /// Grants `email` the given role on the workbook.
    async fn share(&self, email: &str, kind: &str, role: &str) -> Result<(), SinkError>;
}

/// Opens or creates workbooks in the remote store.
///
/// Implementations own authentication; by the time a connector exists it must
/// hold working credentials. Construction-time credential failures are
/// surfaced by the connector's own constructor (see
/// [`load_service_account_key`](crate::credentials::load_service_account_key)),
/// never from these methods.
#[async_trait]
pub trait SinkConnector: Send + Sync {
    /// Opens an existing workbook, or [`SinkError::NotFound`].
    async fn open(&self, workbook: &str) -> Result<Arc<dyn SheetSink>, SinkError>;

    /// Creates a new workbook.
    async fn create(&self, workbook: &str) -> Result<Arc<dyn SheetSink>, SinkError>;
}
