//! Versioned numeric arrays backed by a persistent segment tree.
//!
//! Every array state is a [`Version`]: the root of an immutable sum tree plus the number of
//! leaves it covers. Point updates copy only the path from the root to the changed leaf, so any
//! number of versions can share the bulk of their nodes, and cloning an array is a single
//! directory write.
//!
//! The crate is layered as follows:
//! - [`store`]: the [`NodeStore`] trait for write-once node records, with in-memory and (with the
//!   `rocksdb` feature) RocksDB backends.
//! - [`tree`]: the [`SegmentForest`], which builds, updates and queries trees in a store.
//! - [`directory`]: the [`VersionDirectory`] trait binding opaque [`Handle`]s to versions.
//! - [`VersionedArrays`]: the caller-facing create/update/query/clone operations.

pub mod directory;
pub mod store;
pub mod tree;

mod arrays;
mod config;
mod error;

// RE-EXPORTS
// ================================================================================================

pub use arrays::VersionedArrays;
pub use config::ArraysConfig;
pub use directory::{DirectoryError, Handle, MemoryDirectory, VersionDirectory};
pub use error::ArrayError;
#[cfg(feature = "rocksdb")]
pub use store::{RocksDbConfig, RocksDbStorage};
pub use store::{MemoryNodeStore, NodeStore, StoreError};
pub use tree::{Node, NodeId, SegmentForest, TreeError, Version};

// TYPE ALIASES
// ================================================================================================

/// The element type of every array, and of the sums cached on internal nodes.
pub type Value = i64;

/// An alias for a key-value map.
///
/// By default, this is an alias for the [`std::collections::BTreeMap`], however, when the
/// `hashmaps` feature is enabled, this is an alias for the `hashbrown`'s `HashMap`.
#[cfg(feature = "hashmaps")]
pub type Map<K, V> = hashbrown::HashMap<K, V>;

/// An alias for a key-value map.
///
/// By default, this is an alias for the [`std::collections::BTreeMap`], however, when the
/// `hashmaps` feature is enabled, this is an alias for the `hashbrown`'s `HashMap`.
#[cfg(not(feature = "hashmaps"))]
pub type Map<K, V> = std::collections::BTreeMap<K, V>;

// TESTS
// ================================================================================================

#[test]
#[should_panic]
fn debug_assert_is_checked() {
    // the sum and shape invariants are additionally guarded with `debug_assert`, so the test
    // suite must run with debug assertions enabled.
    debug_assert!(false);
}
