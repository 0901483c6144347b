use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

use assert_matches::assert_matches;

use super::{Node, NodeId, SegmentForest, TreeError, Version, span::path_len};
use crate::{MemoryNodeStore, NodeStore, StoreError, Value};

// HELPERS
// ================================================================================================

/// A memory store that counts fetches, for checking how many nodes an operation visits.
#[derive(Debug, Default)]
struct CountingStore {
    inner: MemoryNodeStore,
    fetches: AtomicUsize,
}

impl CountingStore {
    fn take_fetches(&self) -> usize {
        self.fetches.swap(0, Ordering::Relaxed)
    }
}

impl NodeStore for CountingStore {
    fn create(&self, node: Node) -> Result<NodeId, StoreError> {
        self.inner.create(node)
    }

    fn fetch(&self, id: NodeId) -> Result<Node, StoreError> {
        self.fetches.fetch_add(1, Ordering::Relaxed);
        self.inner.fetch(id)
    }

    fn node_count(&self) -> Result<usize, StoreError> {
        self.inner.node_count()
    }
}

fn forest() -> SegmentForest<MemoryNodeStore> {
    SegmentForest::new(MemoryNodeStore::new())
}

fn node_count<S: NodeStore>(forest: &SegmentForest<S>) -> usize {
    forest.store().node_count().unwrap()
}

fn naive_sum(values: &[Value], lo: usize, hi: usize) -> Value {
    if lo > hi || lo >= values.len() {
        return 0;
    }
    values[lo..=hi.min(values.len() - 1)].iter().sum()
}

// BUILD
// ================================================================================================

#[test]
fn test_build_empty_input() {
    let forest = forest();
    assert_matches!(forest.build(&[]), Err(TreeError::EmptyInput));
    assert_eq!(node_count(&forest), 0);
}

#[test]
fn test_build_writes_two_n_minus_one_nodes() {
    for n in 1..=17 {
        let forest = forest();
        let values = (0..n as Value).collect::<Vec<_>>();
        let version = forest.build(&values).unwrap();
        assert_eq!(version.len(), n);
        assert_eq!(node_count(&forest), 2 * n - 1);
    }
}

#[test]
fn test_build_children_are_written_before_parents() {
    let forest = forest();
    let version = forest.build(&[5, 6, 7]).unwrap();

    let mut stack = vec![version.root()];
    while let Some(id) = stack.pop() {
        if let Some((left, right)) = forest.store().fetch(id).unwrap().children() {
            assert!(left < id && right < id);
            stack.extend([left, right]);
        }
    }
}

#[test]
fn test_build_single_element() -> Result<(), TreeError> {
    let forest = forest();
    let version = forest.build(&[42])?;
    assert_eq!(forest.store().fetch(version.root())?, Node::Leaf { value: 42 });
    assert_eq!(forest.query(version, 0, 0)?, 42);
    assert_eq!(forest.total(version)?, 42);
    Ok(())
}

#[test]
fn test_build_internal_values_are_child_sums() {
    let forest = forest();
    let version = forest.build(&[3, -1, 4, 1, -5, 9, 2]).unwrap();

    let mut stack = vec![version.root()];
    while let Some(id) = stack.pop() {
        if let Node::Internal { left, right, value } = forest.store().fetch(id).unwrap() {
            let left_value = forest.store().fetch(left).unwrap().value();
            let right_value = forest.store().fetch(right).unwrap().value();
            assert_eq!(value, left_value + right_value);
            stack.extend([left, right]);
        }
    }
}

#[test]
fn test_build_overflow() {
    let forest = forest();
    assert_matches!(forest.build(&[Value::MAX, 1]), Err(TreeError::SumOverflow));
}

// QUERY
// ================================================================================================

#[test]
fn test_query_scenario() -> Result<(), TreeError> {
    let forest = forest();
    let v1 = forest.build(&[1, 2, 3, 4])?;
    assert_eq!(forest.query(v1, 0, 3)?, 10);

    let v2 = forest.update(v1, 1, 10)?;
    assert_eq!(forest.query(v2, 0, 3)?, 18);
    assert_eq!(forest.query(v2, 2, 3)?, 7);

    // the version taken before the update still sees the old array
    assert_eq!(forest.query(v1, 0, 3)?, 10);
    Ok(())
}

#[test]
fn test_query_all_ranges_match_naive_sums() -> Result<(), TreeError> {
    let forest = forest();
    let values = [7, -3, 0, 12, 5, -8, 1, 4, 9, -2, 6];
    let version = forest.build(&values)?;

    for lo in 0..values.len() + 2 {
        for hi in 0..values.len() + 2 {
            assert_eq!(forest.query(version, lo, hi)?, naive_sum(&values, lo, hi), "[{lo}, {hi}]");
        }
    }
    Ok(())
}

#[test]
fn test_query_empty_and_outside_ranges() -> Result<(), TreeError> {
    let forest = forest();
    let version = forest.build(&[1, 2, 3, 4])?;
    assert_eq!(forest.query(version, 2, 1)?, 0);
    assert_eq!(forest.query(version, 4, 9)?, 0);
    assert_eq!(forest.query(version, 2, usize::MAX)?, 7);
    Ok(())
}

#[test]
fn test_query_full_range_reads_only_the_root() -> Result<(), TreeError> {
    let forest = SegmentForest::new(CountingStore::default());
    let version = forest.build(&(1..=100).collect::<Vec<Value>>())?;
    forest.store().take_fetches();

    assert_eq!(forest.query(version, 0, 99)?, 5050);
    assert_eq!(forest.store().take_fetches(), 1);
    Ok(())
}

#[test]
fn test_query_visits_logarithmically_many_nodes() -> Result<(), TreeError> {
    let n = 1024;
    let forest = SegmentForest::new(CountingStore::default());
    let values = (0..n as Value).collect::<Vec<_>>();
    let version = forest.build(&values)?;
    forest.store().take_fetches();

    // at most four nodes per level intersect an arbitrary range
    let bound = 4 * (path_len(n, 0));
    for (lo, hi) in [(1, 1022), (3, 700), (511, 512), (0, 0), (100, 900)] {
        assert_eq!(forest.query(version, lo, hi)?, naive_sum(&values, lo, hi));
        let fetches = forest.store().take_fetches();
        assert!(fetches <= bound, "[{lo}, {hi}] fetched {fetches} nodes");
    }
    Ok(())
}

// UPDATE
// ================================================================================================

#[test]
fn test_update_out_of_range_writes_nothing() {
    let forest = forest();
    let version = forest.build(&[1, 2, 3, 4]).unwrap();
    let before = node_count(&forest);

    assert_matches!(
        forest.update(version, 4, 1),
        Err(TreeError::IndexOutOfRange { index: 4, length: 4 })
    );
    assert_eq!(node_count(&forest), before);
}

#[test]
fn test_update_creates_one_node_per_level() -> Result<(), TreeError> {
    for n in [1, 2, 4, 8, 64] {
        let forest = forest();
        let version = forest.build(&vec![1_i64; n])?;
        for index in [0, n / 2, n - 1] {
            let before = node_count(&forest);
            forest.update(version, index, 5)?;
            // ceil(log2(n)) + 1 for powers of two
            assert_eq!(node_count(&forest) - before, n.trailing_zeros() as usize + 1);
        }
    }
    Ok(())
}

#[test]
fn test_update_writes_follow_leaf_depth() -> Result<(), TreeError> {
    let n = 11;
    let forest = forest();
    let version = forest.build(&vec![0_i64; n])?;
    let deepest = (n as f64).log2().ceil() as usize + 1;

    for index in 0..n {
        let before = node_count(&forest);
        forest.update(version, index, 1)?;
        let written = node_count(&forest) - before;
        assert_eq!(written, path_len(n, index));
        assert!(written <= deepest);
    }
    Ok(())
}

#[test]
fn test_update_shares_every_off_path_subtree() -> Result<(), TreeError> {
    let forest = forest();
    let old = forest.build(&[1, 2, 3, 4, 5, 6, 7, 8])?;
    let new = forest.update(old, 5, 60)?;

    // walk both trees in lockstep: off-path children must be the very same records
    let (mut old_id, mut new_id) = (old.root(), new.root());
    let mut span = super::Span::root(8);
    while let (Some((ol, or)), Some((nl, nr))) = (
        forest.store().fetch(old_id)?.children(),
        forest.store().fetch(new_id)?.children(),
    ) {
        assert_ne!(old_id, new_id);
        if 5 <= span.mid() {
            assert_eq!(or, nr);
            (old_id, new_id, span) = (ol, nl, span.left());
        } else {
            assert_eq!(ol, nl);
            (old_id, new_id, span) = (or, nr, span.right());
        }
    }
    assert_eq!(forest.store().fetch(old_id)?, Node::Leaf { value: 6 });
    assert_eq!(forest.store().fetch(new_id)?, Node::Leaf { value: 60 });
    Ok(())
}

#[test]
fn test_update_leaves_old_version_untouched() -> Result<(), TreeError> {
    let forest = forest();
    let values = [4, 8, 15, 16, 23, 42];
    let v1 = forest.build(&values)?;
    let v2 = forest.update(v1, 3, -16)?;
    let v3 = forest.update(v2, 0, 0)?;

    assert_eq!(forest.leaves(v1)?, values);
    assert_eq!(forest.leaves(v2)?, [4, 8, 15, -16, 23, 42]);
    assert_eq!(forest.leaves(v3)?, [0, 8, 15, -16, 23, 42]);
    assert_eq!(forest.total(v1)?, 108);
    assert_eq!(forest.total(v3)?, 72);
    Ok(())
}

#[test]
fn test_update_single_element_array() -> Result<(), TreeError> {
    let forest = forest();
    let v1 = forest.build(&[1])?;
    let v2 = forest.update(v1, 0, 2)?;
    assert_ne!(v1.root(), v2.root());
    assert_eq!(forest.get(v1, 0)?, 1);
    assert_eq!(forest.get(v2, 0)?, 2);
    Ok(())
}

#[test]
fn test_update_overflow_does_not_produce_a_version() {
    let forest = forest();
    let version = forest.build(&[Value::MAX - 1, 0]).unwrap();
    assert_matches!(forest.update(version, 1, 2), Err(TreeError::SumOverflow));
    assert_eq!(forest.total(version).unwrap(), Value::MAX - 1);
}

// ACCESSORS AND SHAPE
// ================================================================================================

#[test]
fn test_get_every_index() -> Result<(), TreeError> {
    let forest = forest();
    let values = [9, 8, 7, 6, 5];
    let version = forest.build(&values)?;
    for (index, value) in values.iter().enumerate() {
        assert_eq!(forest.get(version, index)?, *value);
    }
    assert_matches!(forest.get(version, 5), Err(TreeError::IndexOutOfRange { .. }));
    Ok(())
}

#[test]
fn test_wrong_length_is_a_shape_mismatch() {
    let forest = forest();
    let version = forest.build(&[1, 2, 3, 4]).unwrap();

    // read as five elements, the leaf holding element 0 is reached over the span [0, 1]
    let wrong = Version::new(version.root(), 5);
    assert_matches!(forest.leaves(wrong), Err(TreeError::ShapeMismatch { .. }));
    assert_matches!(forest.update(wrong, 0, 1), Err(TreeError::ShapeMismatch { .. }));
}

#[test]
fn test_dangling_reference_is_a_storage_error() {
    let forest = forest();
    let dangling = Version::new(NodeId::new(99), 3);
    assert_matches!(
        forest.query(dangling, 0, 1),
        Err(TreeError::Storage(StoreError::NotFound(id))) if id == NodeId::new(99)
    );
}

#[test]
fn test_forest_over_shared_store() -> Result<(), TreeError> {
    let store = Arc::new(MemoryNodeStore::new());
    let writer = SegmentForest::new(store.clone());
    let reader = SegmentForest::new(store.clone());

    let version = writer.build(&[2, 4, 6])?;
    assert_eq!(reader.query(version, 1, 2)?, 10);
    assert_eq!(store.node_count()?, 5);
    Ok(())
}
