//! Store error types.

use thiserror::Error;

/// Errors raised by the store implementations.
///
/// Files that exist but cannot be decoded are reported as
/// [`CorruptRecord`](examscore_core::CorruptRecord) instead.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The id cannot be used as a file name.
    #[error("invalid id {0:?}: ids must not contain path separators or '..'")]
    InvalidId(String),

    /// A record to update does not exist.
    #[error("submission not found: {0}")]
    MissingSubmission(String),
}
