//! Configuration for the shipping engine.
//!
//! Defaults match the sink limits the engine was built against (50,000-char
//! cells, 10,000-row append batches) and can be overridden field by field;
//! every field has a serde default so partial config files work. Durations
//! are carried as integer milliseconds and converted at the point of use.

use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

/// Engine configuration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Workbook to open or create in the remote store.
    pub workbook: String,

    /// Canonical (unsuffixed) name of the active worksheet. History sheets
    /// are named by appending an ordinal: `log0`, `log1`, ...
    pub sheet_name: String,

    /// If set, this address is granted ownership of the workbook at startup
    /// unless it already has it.
    pub share_email: Option<String>,

    /// Service-account key file for connectors that need one.
    pub credentials_file: PathBuf,

    /// Lower bound on the worker loop period; rate-limits requests against
    /// the backend no matter how fast sends complete.
    pub min_loop_period_ms: u64,

    /// Cumulative send time within one active-sheet lifetime beyond which the
    /// sheet is considered too slow and gets rotated.
    pub max_send_duration_ms: u64,

    /// Fixed delay before retrying after a quota/availability error.
    pub retry_backoff_ms: u64,

    /// Attempts the retrying sink adapter makes per mutating call.
    pub retry_attempts: u32,

    /// History sheets kept after a rotation; older ones are deleted.
    pub max_history_sheets: usize,

    /// Maximum characters per cell; longer messages fragment into extra rows.
    pub max_cell_chars: usize,

    /// Maximum rows drained and sent per worker iteration.
    pub max_rows_per_interval: usize,

    /// Hard ceiling on active-sheet rows before a forced rotation.
    pub max_rows_per_sheet: usize,

    /// How often `flush()` polls the queue for emptiness.
    pub flush_poll_interval_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            workbook: "sheetlog".to_string(),
            sheet_name: "log".to_string(),
            share_email: None,
            credentials_file: PathBuf::from("service_account.json"),
            min_loop_period_ms: 1_000,
            max_send_duration_ms: 5_000,
            retry_backoff_ms: 3_000,
            retry_attempts: 3,
            max_history_sheets: 10,
            max_cell_chars: 50_000,
            max_rows_per_interval: 10_000,
            max_rows_per_sheet: 1_000_000,
            flush_poll_interval_ms: 100,
        }
    }
}

impl Config {
    #[must_use]
    pub fn min_loop_period(&self) -> Duration {
        Duration::from_millis(self.min_loop_period_ms)
    }

    #[must_use]
    pub fn max_send_duration(&self) -> Duration {
        Duration::from_millis(self.max_send_duration_ms)
    }

    #[must_use]
    pub fn retry_backoff(&self) -> Duration {
        Duration::from_millis(self.retry_backoff_ms)
    }

    #[must_use]
    pub fn flush_poll_interval(&self) -> Duration {
        Duration::from_millis(self.flush_poll_interval_ms)
    }
}
