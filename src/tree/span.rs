use core::fmt;

/// The inclusive index range `[lo, hi]` covered by a node.
///
/// Spans are never stored; they are derived top-down from the array length by midpoint
/// bisection, which fixes a single tree shape for each length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Span {
    pub lo: usize,
    pub hi: usize,
}

impl Span {
    /// Returns the span of the root of a tree with `length` leaves.
    pub fn root(length: usize) -> Self {
        debug_assert!(length > 0);
        Self { lo: 0, hi: length - 1 }
    }

    pub fn is_unit(&self) -> bool {
        self.lo == self.hi
    }

    pub fn mid(&self) -> usize {
        // written to avoid `lo + hi` overflowing near usize::MAX
        self.lo + (self.hi - self.lo) / 2
    }

    pub fn left(&self) -> Self {
        Self { lo: self.lo, hi: self.mid() }
    }

    pub fn right(&self) -> Self {
        Self { lo: self.mid() + 1, hi: self.hi }
    }

    pub fn contains(&self, index: usize) -> bool {
        self.lo <= index && index <= self.hi
    }

    /// Returns true if this span lies entirely within `[lo, hi]`.
    pub fn within(&self, lo: usize, hi: usize) -> bool {
        lo <= self.lo && self.hi <= hi
    }

    /// Returns true if this span shares no index with `[lo, hi]`.
    pub fn disjoint(&self, lo: usize, hi: usize) -> bool {
        hi < self.lo || self.hi < lo
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.lo, self.hi)
    }
}

/// Returns the number of nodes on the path from the root to the leaf at `index` in a tree with
/// `length` leaves, both ends included.
pub(crate) fn path_len(length: usize, index: usize) -> usize {
    let mut span = Span::root(length);
    let mut nodes = 1;
    while !span.is_unit() {
        span = if index <= span.mid() { span.left() } else { span.right() };
        nodes += 1;
    }
    nodes
}
