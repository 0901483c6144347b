use std::sync::RwLock;

use log::trace;

use super::{NodeStore, StoreError};
use crate::tree::{Node, NodeId};

/// In-memory, append-only node storage.
///
/// Node identifiers are positions in a vector, so they are dense, assigned in creation order and
/// never reused. Access is synchronized with a `std::sync::RwLock`: fetches from concurrent
/// queries share the read lock and only `create` takes the write lock.
///
/// It is primarily intended for:
/// - Testing environments.
/// - Arrays with a limited operational lifecycle.
/// - Applications that handle persistence at a higher level.
#[derive(Debug, Default)]
pub struct MemoryNodeStore {
    nodes: RwLock<Vec<Node>>,
}

impl MemoryNodeStore {
    /// Creates a new, empty in-memory node store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl Clone for MemoryNodeStore {
    fn clone(&self) -> Self {
        MemoryNodeStore {
            nodes: RwLock::new(
                self.nodes.read().expect("Failed to read lock for nodes in clone").clone(),
            ),
        }
    }
}

impl NodeStore for MemoryNodeStore {
    fn create(&self, node: Node) -> Result<NodeId, StoreError> {
        let mut nodes = self.nodes.write()?;
        let id = NodeId::new(nodes.len() as u64);
        nodes.push(node);
        trace!("created node {id}: {node:?}");
        Ok(id)
    }

    fn fetch(&self, id: NodeId) -> Result<Node, StoreError> {
        let nodes = self.nodes.read()?;
        usize::try_from(id.as_u64())
            .ok()
            .and_then(|position| nodes.get(position))
            .copied()
            .ok_or(StoreError::NotFound(id))
    }

    fn node_count(&self) -> Result<usize, StoreError> {
        Ok(self.nodes.read()?.len())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn identifiers_are_assigned_in_creation_order() {
        let store = MemoryNodeStore::new();
        let a = store.create(Node::Leaf { value: 1 }).unwrap();
        let b = store.create(Node::Leaf { value: 2 }).unwrap();
        assert!(a < b);
        assert_eq!(store.fetch(a).unwrap(), Node::Leaf { value: 1 });
        assert_eq!(store.fetch(b).unwrap(), Node::Leaf { value: 2 });
        assert_eq!(store.node_count().unwrap(), 2);
    }

    #[test]
    fn unknown_identifier_is_not_found() {
        let store = MemoryNodeStore::new();
        assert_matches!(store.fetch(NodeId::new(0)), Err(StoreError::NotFound(_)));
    }

    #[test]
    fn shared_pointer_is_a_store() {
        let store = Arc::new(MemoryNodeStore::new());
        let id = store.create(Node::Leaf { value: 9 }).unwrap();
        assert_eq!(store.fetch(id).unwrap().value(), 9);
    }

    #[test]
    fn clone_is_detached_from_the_original() {
        let store = MemoryNodeStore::new();
        store.create(Node::Leaf { value: 1 }).unwrap();
        let copy = store.clone();
        store.create(Node::Leaf { value: 2 }).unwrap();
        assert_eq!(copy.node_count().unwrap(), 1);
        assert_eq!(store.node_count().unwrap(), 2);
    }
}
