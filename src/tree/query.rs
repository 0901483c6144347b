use super::{NodeId, Result, SegmentForest, Span, TreeError, Version, checked_sum};
use crate::{NodeStore, Value};

impl<S: NodeStore> SegmentForest<S> {
    /// Returns the sum of the elements of `version` in the inclusive range `[lo, hi]`.
    ///
    /// The range is clamped to the array: an empty range (`lo > hi`) or one starting past the
    /// last element sums to zero. Nodes whose span lies inside the range contribute their cached
    /// sum without being descended into, and children outside the range are never fetched, so a
    /// query touches O(log n) nodes.
    pub fn query(&self, version: Version, lo: usize, hi: usize) -> Result<Value> {
        let last = version.len() - 1;
        if lo > hi || lo > last {
            return Ok(0);
        }

        self.query_span(version.root(), Span::root(version.len()), lo, hi.min(last))
    }

    fn query_span(&self, id: NodeId, span: Span, lo: usize, hi: usize) -> Result<Value> {
        let node = self.fetch(id, span)?;
        if span.within(lo, hi) {
            return Ok(node.value());
        }

        // a unit span that intersects the range lies within it, so this node has children
        let (left, right) = node
            .children()
            .ok_or(TreeError::ShapeMismatch { node: id, lo: span.lo, hi: span.hi })?;

        let mut sum = 0;
        if !span.left().disjoint(lo, hi) {
            sum = self.query_span(left, span.left(), lo, hi)?;
        }
        if !span.right().disjoint(lo, hi) {
            sum = checked_sum(sum, self.query_span(right, span.right(), lo, hi)?)?;
        }

        Ok(sum)
    }
}
