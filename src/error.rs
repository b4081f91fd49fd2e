use thiserror::Error;

use crate::models::FactKey;

/// A malformed edit, rejected before it reaches the edit buffer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub(crate) enum EditError {
    #[error("Invalid amount: '{0}'")]
    InvalidAmount(String),
    #[error("Month out of range: {0} (expected 1-12)")]
    MonthOutOfRange(u32),
    #[error("Unknown category: {0}")]
    UnknownCategory(i64),
}

#[derive(Debug, Error)]
pub(crate) enum StoreError {
    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Duplicate key in batch: {0}")]
    DuplicateKey(FactKey),
    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// A batched write that did not commit. Pending edits stay buffered.
#[derive(Debug, Error)]
pub(crate) enum FlushError {
    #[error("Save failed: {0}")]
    Store(#[from] StoreError),
    #[error("Save aborted: two edits for {0} in one batch")]
    Conflict(FactKey),
}

#[derive(Debug, Error)]
pub(crate) enum SessionError {
    #[error("{count} unsaved change(s); save or discard first")]
    UnsavedEdits { count: usize },
    #[error(transparent)]
    Edit(#[from] EditError),
    #[error(transparent)]
    Flush(#[from] FlushError),
    #[error(transparent)]
    Store(#[from] StoreError),
}
