use std::sync::PoisonError;

use thiserror::Error;

use super::Handle;
use crate::{store::LockError, tree::NodeId};

/// Errors returned by any [`super::VersionDirectory`] implementation.
#[derive(Debug, Error)]
pub enum DirectoryError {
    #[error("handle {0} is not bound to any version")]
    UnknownHandle(Handle),
    /// The handle moved between the caller's read and its rebind; nothing was written.
    #[error("handle {handle} was rebound concurrently: expected root {expected}, found {actual}")]
    RebindConflict { handle: Handle, expected: NodeId, actual: NodeId },
    /// Backend I/O or database error (e.g., RocksDB).
    #[error("backend error: {0}")]
    Backend(#[from] Box<dyn core::error::Error + Send + Sync + 'static>),
    /// A stored binding record failed to decode.
    #[error("failed to decode version record")]
    Decode(#[from] winter_utils::DeserializationError),
}

impl<T> From<PoisonError<T>> for DirectoryError {
    fn from(e: PoisonError<T>) -> Self {
        DirectoryError::Backend(Box::new(LockError(format!("Lock poisoned: {e}"))))
    }
}
