//! Storage-specific error types for the in-memory store.
//!
//! These wrap serialization and actor failures and convert them to the
//! storage-agnostic error types defined in `eventplan_core`.

use eventplan_core::errors::{DatabaseError, Error};
use thiserror::Error;

/// Storage-specific errors.
///
/// These errors are internal to the storage layer and are converted to
/// `eventplan_core::Error` before being returned to callers.
#[derive(Error, Debug)]
pub enum StorageError {
    /// A row could not be encoded or decoded.
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// The writer actor is gone or dropped the reply.
    #[error("Writer actor unavailable: {0}")]
    WriterUnavailable(String),

    /// A write job panicked; its changes were discarded.
    #[error("Write job panicked: {0}")]
    JobPanicked(String),

    /// The writer returned a value of an unexpected type.
    #[error("Writer returned an unexpected result type")]
    ResultTypeMismatch,
}

impl From<StorageError> for Error {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::SerializationError(e) => {
                Error::Database(DatabaseError::Corrupted(e.to_string()))
            }
            StorageError::WriterUnavailable(e) => {
                Error::Database(DatabaseError::Unavailable(e))
            }
            StorageError::JobPanicked(e) => {
                Error::Database(DatabaseError::Internal(format!("write job panicked: {}", e)))
            }
            StorageError::ResultTypeMismatch => Error::Database(DatabaseError::Internal(
                "writer result type mismatch".to_string(),
            )),
        }
    }
}
