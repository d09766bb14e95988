//! Asynchronous shipping of structured log rows to a rate-limited,
//! row-capacity-bounded spreadsheet sink.
//!
//! Producers enqueue rows without ever blocking on I/O; a single background
//! worker drains bounded batches, appends them to the active worksheet, and
//! copes with quota exhaustion (fixed-delay backoff), workbook capacity
//! pressure (oldest-history eviction), and slow or oversized active sheets
//! (rotation into numbered history with a retention cap).
//!
//! # Architecture
//!
//! ```text
//!   Producers (any task)
//!       │ enqueue()
//!       v
//!   ┌──────────────┐
//!   │ PendingQueue │ (mutex-guarded FIFO)
//!   └──────┬───────┘
//!          │ drain_snapshot / remove_front
//!          v
//!   ┌──────────────┐      append_rows      ┌───────────┐
//!   │ShippingWorker│ ────────────────────> │ SheetSink │
//!   └──────┬───────┘                       └───────────┘
//!          │ on failure: classify
//!          v
//!   backoff | evict oldest history | log and retry
//! ```
//!
//! # Delivery semantics
//!
//! Rows leave the queue only after a confirmed successful append, so producers
//! never observe backend trouble directly. There is no circuit breaker on the
//! unclassified-error path: if the backend fails permanently the queue grows
//! without bound. That is a known, accepted limitation of this design.

pub mod config;
pub mod credentials;
pub mod error;
pub mod queue;
pub mod record;
pub mod retry;
pub mod rotation;
pub mod shipper;
pub mod sink;
pub mod worker;

pub use config::Config;
pub use credentials::{load_service_account_key, ServiceAccountKey};
pub use error::{classify, FailureKind, SetupError, SinkError};
pub use record::{LogRecord, LogRow};
pub use retry::RetryingSink;
pub use rotation::RotationEngine;
pub use shipper::SheetShipper;
pub use sink::{Permission, SheetId, SheetSink, SinkConnector, WorksheetInfo};
