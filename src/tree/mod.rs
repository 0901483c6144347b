//! A forest of persistent segment trees over a shared [`NodeStore`].
//!
//! Each tree is a sum tree over the indices `[0, n - 1]` of one array version, shaped by
//! recursive midpoint bisection. Trees in the same store share nodes: an update creates one new
//! node per level on the path to the changed leaf and references every other subtree of the
//! previous version by identifier.

use log::debug;

use crate::{NodeStore, Value};

mod error;
mod node;
mod span;

mod build;
mod query;
mod update;

#[cfg(test)]
mod tests;

pub use error::TreeError;
use error::Result;
pub use node::{Node, NodeId, Version};
pub(crate) use span::Span;

// SEGMENT FOREST
// ================================================================================================

/// Persistent segment trees stored in a [`NodeStore`].
///
/// A `SegmentForest` holds no per-tree state: every operation takes the [`Version`] it works on
/// and operations that change an array return a new `Version`. Versions returned earlier stay
/// valid and keep answering queries with the values they had when they were created.
///
/// Example usage:
///
/// ```rust
/// use seg_forest::{MemoryNodeStore, SegmentForest};
///
/// let forest = SegmentForest::new(MemoryNodeStore::new());
/// let v1 = forest.build(&[1, 2, 3, 4]).unwrap();
/// let v2 = forest.update(v1, 1, 10).unwrap();
///
/// assert_eq!(forest.query(v1, 0, 3).unwrap(), 10);
/// assert_eq!(forest.query(v2, 0, 3).unwrap(), 18);
/// assert_eq!(forest.query(v2, 2, 3).unwrap(), 7);
/// ```
#[derive(Debug)]
pub struct SegmentForest<S> {
    store: S,
}

impl<S: NodeStore> SegmentForest<S> {
    // CONSTRUCTORS
    // --------------------------------------------------------------------------------------------

    /// Creates a forest on top of `store`. Trees already in the store remain usable through their
    /// versions.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    // PUBLIC ACCESSORS
    // --------------------------------------------------------------------------------------------

    /// Returns the underlying node store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Consumes the forest and returns the underlying node store.
    pub fn into_store(self) -> S {
        self.store
    }

    /// Returns the sum of all elements of `version`, read from the root in one fetch.
    pub fn total(&self, version: Version) -> Result<Value> {
        Ok(self.fetch(version.root(), Span::root(version.len()))?.value())
    }

    /// Returns the element at `index` in `version`.
    ///
    /// # Errors
    /// Returns `IndexOutOfRange` if `index >= version.len()`.
    pub fn get(&self, version: Version, index: usize) -> Result<Value> {
        check_index(version, index)?;

        let mut span = Span::root(version.len());
        let mut node = self.fetch(version.root(), span)?;
        while let Some((left, right)) = node.children() {
            let (child, child_span) = if index <= span.mid() {
                (left, span.left())
            } else {
                (right, span.right())
            };
            span = child_span;
            node = self.fetch(child, span)?;
        }

        Ok(node.value())
    }

    /// Returns all elements of `version` in index order.
    pub fn leaves(&self, version: Version) -> Result<Vec<Value>> {
        let mut values = Vec::with_capacity(version.len());
        self.collect_leaves(version.root(), Span::root(version.len()), &mut values)?;
        debug_assert_eq!(values.len(), version.len());
        Ok(values)
    }

    // HELPER METHODS
    // --------------------------------------------------------------------------------------------

    /// Fetches the node `id` which is expected to cover `span`.
    ///
    /// Leaves can only appear at single-index spans and internal nodes only above them; anything
    /// else means the version's length does not describe the tree under its root.
    fn fetch(&self, id: NodeId, span: Span) -> Result<Node> {
        let node = self.store.fetch(id)?;
        if node.is_leaf() != span.is_unit() {
            debug!("node {id} is misplaced at span {span}");
            return Err(TreeError::ShapeMismatch { node: id, lo: span.lo, hi: span.hi });
        }
        Ok(node)
    }

    fn collect_leaves(&self, id: NodeId, span: Span, values: &mut Vec<Value>) -> Result<()> {
        match self.fetch(id, span)? {
            Node::Leaf { value } => values.push(value),
            Node::Internal { left, right, .. } => {
                self.collect_leaves(left, span.left(), values)?;
                self.collect_leaves(right, span.right(), values)?;
            },
        }
        Ok(())
    }
}

// HELPER FUNCTIONS
// ================================================================================================

fn check_index(version: Version, index: usize) -> Result<()> {
    if index < version.len() {
        Ok(())
    } else {
        Err(TreeError::IndexOutOfRange { index, length: version.len() })
    }
}

fn checked_sum(left: Value, right: Value) -> Result<Value> {
    left.checked_add(right).ok_or(TreeError::SumOverflow)
}
