//! Log record and row types, including cell fragmentation.
//!
//! A [`LogRecord`] is what producers hand to the shipper; a [`LogRow`] is one
//! row as it will appear in the sink. The two differ only when a message is
//! longer than the sink's maximum cell length: the record then fragments into
//! several rows that share every field except the message slice.

use chrono::{DateTime, Utc};

/// One row bound for the sink, in column order:
/// timestamp, level, origin file, origin function, line, message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRow {
    pub timestamp: String,
    pub level: String,
    pub origin_file: String,
    pub origin_function: String,
    pub line: u32,
    pub message: String,
}

impl LogRow {
    /// Cell values in sink column order.
    #[must_use]
    pub fn cells(&self) -> [String; 6] {
        [
            self.timestamp.clone(),
            self.level.clone(),
            self.origin_file.clone(),
            self.origin_function.clone(),
            self.line.to_string(),
            self.message.clone(),
        ]
    }
}

/// A log emission as produced by the application.
#[derive(Debug, Clone)]
pub struct LogRecord {
    pub timestamp: DateTime<Utc>,
    pub level: String,
    pub origin_file: String,
    pub origin_function: String,
    pub line: u32,
    pub message: String,
}

impl LogRecord {
    /// Creates a record stamped with the current wall-clock time.
    #[must_use]
    pub fn new(
        level: impl Into<String>,
        origin_file: impl Into<String>,
        origin_function: impl Into<String>,
        line: u32,
        message: impl Into<String>,
    ) -> Self {
        LogRecord {
            timestamp: Utc::now(),
            level: level.into(),
            origin_file: origin_file.into(),
            origin_function: origin_function.into(),
            line,
            message: message.into(),
        }
    }

    /// Converts the record into one or more sink rows.
    ///
    /// A message longer than `max_cell_chars` bytes is split into
    /// `ceil(len / max_cell_chars)` fragments, left to right; every fragment
    /// row carries the same timestamp, level, origin, and line. Splits never
    /// land inside a UTF-8 code point, so a fragment may exceed the budget by
    /// at most one multi-byte character.
    #[must_use]
    pub fn into_rows(self, max_cell_chars: usize) -> Vec<LogRow> {
        let timestamp = self
            .timestamp
            .format("%Y-%m-%d %H:%M:%S%.3f")
            .to_string();
        split_message(&self.message, max_cell_chars)
            .into_iter()
            .map(|fragment| LogRow {
                timestamp: timestamp.clone(),
                level: self.level.clone(),
                origin_file: self.origin_file.clone(),
                origin_function: self.origin_function.clone(),
                line: self.line,
                message: fragment,
            })
            .collect()
    }
}

/// Splits `message` into chunks of at most `max` bytes on char boundaries.
///
/// An empty message yields a single empty chunk so the emission still produces
/// a row. A `max` of zero is treated as one.
fn split_message(message: &str, max: usize) -> Vec<String> {
    let max = max.max(1);
    if message.len() <= max {
        return vec![message.to_string()];
    }

    let mut chunks = Vec::with_capacity(message.len().div_ceil(max));
    let mut start = 0;
    while start < message.len() {
        let mut end = (start + max).min(message.len());
        while end > start && !message.is_char_boundary(end) {
            end -= 1;
        }
        if end == start {
            // A single code point wider than the budget; take it whole.
            end = (start + 1..=message.len())
                .find(|i| message.is_char_boundary(*i))
                .unwrap_or(message.len());
        }
        chunks.push(message[start..end].to_string());
        start = end;
    }
    chunks
}
