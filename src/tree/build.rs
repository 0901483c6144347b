use log::debug;

use super::{Node, NodeId, Result, SegmentForest, Span, TreeError, Version, checked_sum};
use crate::{NodeStore, Value};

impl<S: NodeStore> SegmentForest<S> {
    /// Builds a new tree holding `values` and returns its version.
    ///
    /// Nodes are written bottom-up, so every child record exists in the store before the parent
    /// that references it. A tree over `n` values takes `2n - 1` writes.
    ///
    /// # Errors
    /// - `EmptyInput` if `values` is empty.
    /// - `SumOverflow` if a subtree sum does not fit in [`Value`].
    pub fn build(&self, values: &[Value]) -> Result<Version> {
        if values.is_empty() {
            return Err(TreeError::EmptyInput);
        }

        let (root, total) = self.build_span(values, Span::root(values.len()))?;
        let version = Version::new(root, values.len());
        debug!("built {version} with total {total}");

        Ok(version)
    }

    fn build_span(&self, values: &[Value], span: Span) -> Result<(NodeId, Value)> {
        if span.is_unit() {
            let value = values[span.lo];
            return Ok((self.store.create(Node::Leaf { value })?, value));
        }

        let (left, left_value) = self.build_span(values, span.left())?;
        let (right, right_value) = self.build_span(values, span.right())?;
        let value = checked_sum(left_value, right_value)?;

        Ok((self.store.create(Node::Internal { left, right, value })?, value))
    }
}
