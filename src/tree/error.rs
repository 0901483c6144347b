use thiserror::Error;

use super::NodeId;
use crate::store::StoreError;

/// Errors returned by [`super::SegmentForest`] operations.
#[derive(Debug, Error)]
pub enum TreeError {
    #[error("cannot build a tree from an empty sequence")]
    EmptyInput,
    #[error("index {index} is out of range for an array of length {length}")]
    IndexOutOfRange { index: usize, length: usize },
    #[error("sum of node values overflows")]
    SumOverflow,
    #[error("node {node} does not match the tree shape at span [{lo}, {hi}]")]
    ShapeMismatch { node: NodeId, lo: usize, hi: usize },
    #[error(transparent)]
    Storage(#[from] StoreError),
}

/// The result type for tree operations.
pub type Result<T> = core::result::Result<T, TreeError>;
