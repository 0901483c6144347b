use log::debug;

use super::{Node, NodeId, Result, SegmentForest, Span, Version, check_index, checked_sum};
use crate::{NodeStore, Value};

impl<S: NodeStore> SegmentForest<S> {
    /// Returns a new version equal to `version` except that the element at `index` is `value`.
    ///
    /// Only the nodes on the path from the root to `index` are recreated; every sibling off that
    /// path is referenced by its existing identifier and read once for its cached sum. The old
    /// version is left untouched.
    ///
    /// # Errors
    /// - `IndexOutOfRange` if `index >= version.len()`. Nothing is written in this case.
    /// - `ShapeMismatch` if the tree under the root does not have `version.len()` leaves.
    /// - `SumOverflow` if a recomputed sum does not fit in [`Value`].
    pub fn update(&self, version: Version, index: usize, value: Value) -> Result<Version> {
        check_index(version, index)?;

        let (root, _) = self.update_span(version.root(), Span::root(version.len()), index, value)?;
        let updated = Version::new(root, version.len());
        debug!("updated index {index} of {version} to {value}, new version {updated}");

        Ok(updated)
    }

    fn update_span(
        &self,
        id: NodeId,
        span: Span,
        index: usize,
        value: Value,
    ) -> Result<(NodeId, Value)> {
        debug_assert!(span.contains(index));

        let (left, right) = match self.fetch(id, span)? {
            Node::Leaf { .. } => return Ok((self.store.create(Node::Leaf { value })?, value)),
            Node::Internal { left, right, .. } => (left, right),
        };

        let ((left, left_value), (right, right_value)) = if index <= span.mid() {
            let updated = self.update_span(left, span.left(), index, value)?;
            let sibling = self.fetch(right, span.right())?.value();
            (updated, (right, sibling))
        } else {
            let sibling = self.fetch(left, span.left())?.value();
            let updated = self.update_span(right, span.right(), index, value)?;
            ((left, sibling), updated)
        };

        let value = checked_sum(left_value, right_value)?;
        Ok((self.store.create(Node::Internal { left, right, value })?, value))
    }
}
