use thiserror::Error;

use crate::{DirectoryError, Handle, TreeError};

/// Errors returned by [`crate::VersionedArrays`] operations.
///
/// `UnknownHandle`, `OutOfRange`, `EmptyArray` and `RebindConflict` are ordinary caller-facing
/// outcomes that leave every binding unchanged. `Tree` and `Directory` wrap failures of the
/// underlying stores; a `Tree(TreeError::Storage(StoreError::NotFound(_)))` in particular means a
/// version references a node the store never committed.
#[derive(Debug, Error)]
pub enum ArrayError {
    #[error("array {0} not found")]
    UnknownHandle(Handle),
    #[error("index {index} is out of range for an array of length {length}")]
    OutOfRange { index: usize, length: usize },
    #[error("cannot create an empty array")]
    EmptyArray,
    /// Another writer rebound the handle first. Nothing was rebound; the update may be retried.
    #[error("array {handle} was updated concurrently")]
    RebindConflict { handle: Handle },
    #[error(transparent)]
    Tree(TreeError),
    #[error(transparent)]
    Directory(DirectoryError),
}

impl ArrayError {
    /// Returns true if repeating the same operation may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ArrayError::RebindConflict { .. })
    }
}

impl From<TreeError> for ArrayError {
    fn from(err: TreeError) -> Self {
        match err {
            TreeError::EmptyInput => ArrayError::EmptyArray,
            TreeError::IndexOutOfRange { index, length } => ArrayError::OutOfRange { index, length },
            other => ArrayError::Tree(other),
        }
    }
}

impl From<DirectoryError> for ArrayError {
    fn from(err: DirectoryError) -> Self {
        match err {
            DirectoryError::UnknownHandle(handle) => ArrayError::UnknownHandle(handle),
            DirectoryError::RebindConflict { handle, .. } => ArrayError::RebindConflict { handle },
            other => ArrayError::Directory(other),
        }
    }
}
