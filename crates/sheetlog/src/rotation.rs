//! Sheet rotation, retention, and capacity eviction.
//!
//! The active sheet carries the canonical, unsuffixed name; retired sheets
//! are numbered `base0`, `base1`, ... with the ordinal growing with age.
//! Rotation pushes every sheet one ordinal deeper, trims history to the
//! retention cap, recreates a fresh active sheet, and restores sink order
//! (active first, then history newest to oldest).
//!
//! Rotation is not atomic. A failure partway through leaves renamed sheets
//! behind; the error propagates to the worker, and the next attempt re-reads
//! live sink state and continues from wherever the last one stopped. Given
//! that the data is non-durable by design, best effort is the accepted
//! tradeoff.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::error::SinkError;
use crate::sink::{SheetSink, WorksheetInfo};

/// Rotates and retires worksheets under a canonical base name.
pub struct RotationEngine {
    sink: Arc<dyn SheetSink>,
    base: String,
    retention: usize,
}

/// Ordinal of a title within the rotation set of `base`.
///
/// The bare base name is the active sheet, ordinal -1; `baseN` is history
/// with ordinal `N`. Titles that merely start with the base but carry a
/// non-numeric suffix are not part of the set.
#[must_use]
pub fn ordinal(base: &str, title: &str) -> Option<i64> {
    let suffix = title.strip_prefix(base)?;
    if suffix.is_empty() {
        return Some(-1);
    }
    suffix.parse::<i64>().ok().filter(|n| *n >= 0)
}

impl RotationEngine {
    #[must_use]
    pub fn new(sink: Arc<dyn SheetSink>, base: String, retention: usize) -> Self {
        RotationEngine {
            sink,
            base,
            retention,
        }
    }

    /// Retires the active sheet into history and creates a fresh one.
    ///
    /// Every sheet in the rotation set is renamed to `base(ordinal + 1)`,
    /// renaming in descending ordinal order so no target title is ever
    /// occupied. History beyond the retention cap is deleted, oldest (highest
    /// ordinal) first. Returns the fresh active sheet.
    pub async fn rotate(&self) -> Result<WorksheetInfo, SinkError> {
        let sheets = self.sink.list_worksheets().await?;
        let mut rotating: Vec<(i64, WorksheetInfo)> = sheets
            .into_iter()
            .filter_map(|sheet| ordinal(&self.base, &sheet.title).map(|ord| (ord, sheet)))
            .collect();
        rotating.sort_by_key(|(ord, _)| *ord);

        // Oldest first: base5 -> base6 before base1 -> base2 before base -> base0.
        let mut history: Vec<(i64, WorksheetInfo)> = Vec::with_capacity(rotating.len());
        for (ord, mut sheet) in rotating.into_iter().rev() {
            let new_ord = ord + 1;
            let new_title = format!("{}{}", self.base, new_ord);
            self.sink.update_title(sheet.id, &new_title).await?;
            sheet.title = new_title;
            history.push((new_ord, sheet));
        }

        // `history` is oldest first; flip to newest first and trim the tail.
        history.reverse();
        let excess = history.split_off(self.retention.min(history.len()));
        for (_, sheet) in excess.iter().rev() {
            debug!("SHEETS | deleting history sheet past retention: {}", sheet.title);
            self.sink.delete_worksheet(sheet.id).await?;
        }

        let active = self.ensure_active_sheet().await?;

        let mut order = Vec::with_capacity(history.len() + 1);
        order.push(active.id);
        order.extend(history.iter().map(|(_, sheet)| sheet.id));
        self.sink.reorder_worksheets(&order).await?;

        debug!(
            "SHEETS | rotated {} into history, {} sheets retained",
            self.base,
            history.len()
        );
        Ok(active)
    }

    /// Deletes the oldest (highest ordinal) history sheet to free capacity.
    ///
    /// # Errors
    ///
    /// Fails with a generic backend error when only the active sheet remains;
    /// the worker absorbs that as an unclassified failure and makes no
    /// forward progress until a rotation creates room.
    pub async fn evict_oldest_history(&self) -> Result<(), SinkError> {
        let sheets = self.sink.list_worksheets().await?;
        let oldest = sheets
            .into_iter()
            .filter_map(|sheet| ordinal(&self.base, &sheet.title).map(|ord| (ord, sheet)))
            .filter(|(ord, _)| *ord >= 0)
            .max_by_key(|(ord, _)| *ord);

        match oldest {
            Some((_, sheet)) => {
                warn!("SHEETS | workbook out of space, evicting {}", sheet.title);
                self.sink.delete_worksheet(sheet.id).await
            }
            None => Err(SinkError::Backend(
                "no history sheet available to evict".to_string(),
            )),
        }
    }

    /// Looks up the active sheet, creating it with placeholder dimensions if
    /// absent, and returns its current sink-reported state.
    pub async fn ensure_active_sheet(&self) -> Result<WorksheetInfo, SinkError> {
        match self.sink.worksheet(&self.base).await {
            Ok(sheet) => Ok(sheet),
            Err(SinkError::NotFound(_)) => self.sink.add_worksheet(&self.base, 1, 1).await,
            Err(err) => Err(err),
        }
    }
}
