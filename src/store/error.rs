use std::sync::PoisonError;

use thiserror::Error;

use crate::NodeId;

/// Errors returned by any [`super::NodeStore`] implementation.
///
/// Categories:
/// - Lookup misses, which indicate a dangling reference and are never expected in a healthy store
/// - Backend errors (DB/I/O, poisoned locks)
/// - Decode/length mismatches of stored records
#[derive(Debug, Error)]
pub enum StoreError {
    /// No record exists for the identifier. Every identifier handed out by a tree operation is
    /// committed before it is referenced, so this signals an upstream durability failure.
    #[error("node {0} not found in the store")]
    NotFound(NodeId),
    /// Backend I/O or database error (e.g., RocksDB).
    #[error("backend error: {0}")]
    Backend(#[from] Box<dyn core::error::Error + Send + Sync + 'static>),
    /// Key or counter bytes had the wrong length.
    #[error("invalid key length: expected {expected} bytes, found {found}")]
    BadKeyLen { expected: usize, found: usize },
    /// A stored node record failed to decode.
    #[error("failed to decode node record")]
    Decode(#[from] winter_utils::DeserializationError),
    /// The backend is missing part of the expected layout (e.g., a column family).
    #[error("operation not supported: {0}")]
    Unsupported(String),
}

#[derive(Debug)]
pub(crate) struct LockError(pub String);

impl core::fmt::Display for LockError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl core::error::Error for LockError {}

impl<T> From<PoisonError<T>> for StoreError {
    fn from(e: PoisonError<T>) -> Self {
        // `PoisonError<T>` cannot be boxed directly since `T` might not be `Send`
        StoreError::Backend(Box::new(LockError(format!("Lock poisoned: {e}"))))
    }
}
