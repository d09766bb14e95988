//! Error taxonomy and backend failure classification.
//!
//! Steady-state sink failures are [`SinkError`]s; they are contained inside
//! the worker and never surface to producers. Construction-time failures are
//! [`SetupError`]s and are returned synchronously from
//! [`SheetShipper::start`](crate::shipper::SheetShipper::start) — the worker
//! never starts on a setup failure.
//!
//! [`classify`] maps raw backend error text onto the three behaviors the
//! worker knows: back off, free up space, or log and try again. The mapping is
//! backend-specific substring matching and is deliberately kept in one place
//! so a different sink type can swap it out.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised by sink operations.
#[derive(Debug, Error)]
pub enum SinkError {
    /// The named workbook or worksheet does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Raw failure text reported by the backend, classified by [`classify`].
    #[error("backend error: {0}")]
    Backend(String),
}

/// Errors raised while constructing a shipper, before the worker starts.
#[derive(Debug, Error)]
pub enum SetupError {
    #[error("credentials file not found: {}", .0.display())]
    CredentialsNotFound(PathBuf),

    #[error("invalid credentials: {0}")]
    InvalidCredentials(String),

    #[error(transparent)]
    Sink(#[from] SinkError),
}

/// How the worker should react to a failed sink call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Quota exhausted or backend unreachable: fixed-delay backoff, keep the
    /// batch, try again.
    ResourceExhausted,
    /// The workbook is out of room: evict the oldest history sheet, keep the
    /// batch, try again.
    SpaceNeeded,
    /// Anything else: log it and retry implicitly (rows were never removed).
    Other,
}

/// Classifies a sink error by case-insensitive substring match on the
/// backend's failure text.
#[must_use]
pub fn classify(error: &SinkError) -> FailureKind {
    let SinkError::Backend(text) = error else {
        return FailureKind::Other;
    };
    let text = text.to_uppercase();

    if text.contains("RESOURCE_EXHAUSTED") || text.contains("UNAVAILABLE") {
        return FailureKind::ResourceExhausted;
    }
    if text.contains("ABOVE THE LIMIT") && text.contains("INVALID_ARGUMENT") {
        return FailureKind::SpaceNeeded;
    }
    FailureKind::Other
}
