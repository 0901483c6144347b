//! Write-once storage for segment-tree nodes.
//!
//! The forest is storage agnostic: it only ever creates node records and fetches them back by
//! identifier. Records are never updated or deleted, which is what lets any number of versions
//! share subtrees and lets readers traverse a tree without locking.

use core::{fmt, ops::Deref};

use crate::tree::{Node, NodeId};

mod error;
pub use error::StoreError;
pub(crate) use error::LockError;

mod memory;
pub use memory::MemoryNodeStore;

#[cfg(feature = "rocksdb")]
mod rocksdb;
#[cfg(feature = "rocksdb")]
pub use rocksdb::{RocksDbConfig, RocksDbStorage};

/// Node storage backend.
///
/// Implementations assign each created record a fresh [`NodeId`] that is never reused, and must
/// make the record visible to [`NodeStore::fetch`] before `create` returns. The forest relies on
/// this to guarantee that a parent is never written before its children.
///
/// The trait takes `&self` everywhere and relies on interior mutability, so a single store can be
/// shared between concurrent readers and the (serial) writer of each handle.
pub trait NodeStore: 'static + fmt::Debug + Send + Sync {
    /// Persists `node` and returns its newly assigned identifier.
    ///
    /// # Errors
    /// Returns `StoreError::Backend` if the write fails.
    fn create(&self, node: Node) -> Result<NodeId, StoreError>;

    /// Retrieves the record stored under `id`.
    ///
    /// # Errors
    /// - `StoreError::NotFound` if no record exists for `id`.
    /// - `StoreError::Backend` or `StoreError::Decode` if the record cannot be read.
    fn fetch(&self, id: NodeId) -> Result<Node, StoreError>;

    /// Returns the number of node records created so far.
    ///
    /// # Errors
    /// Returns `StoreError` if the storage read operation fails.
    fn node_count(&self) -> Result<usize, StoreError>;
}

// Blanket impl to allow any pointer to a `NodeStore` to be used as a store.
impl<P, T> NodeStore for P
where
    P: Deref<Target = T> + fmt::Debug + Send + Sync + 'static,
    T: NodeStore + ?Sized,
{
    #[inline]
    fn create(&self, node: Node) -> Result<NodeId, StoreError> {
        self.deref().create(node)
    }

    #[inline]
    fn fetch(&self, id: NodeId) -> Result<Node, StoreError> {
        self.deref().fetch(id)
    }

    #[inline]
    fn node_count(&self) -> Result<usize, StoreError> {
        self.deref().node_count()
    }
}
