use core::fmt;

use winter_utils::{
    ByteReader, ByteWriter, Deserializable, DeserializationError, Serializable,
};

use crate::Value;

// NODE ID
// ================================================================================================

/// The permanent identifier of a node record, assigned by a [`crate::NodeStore`] when the node is
/// created and never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(u64);

impl NodeId {
    /// The size of a serialized [`NodeId`] in bytes.
    pub const SERIALIZED_SIZE: usize = 8;

    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub const fn as_u64(&self) -> u64 {
        self.0
    }

    /// Returns the big-endian key under which a store may index this node, so that byte order
    /// matches creation order.
    pub fn to_key(&self) -> [u8; 8] {
        self.0.to_be_bytes()
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "n{}", self.0)
    }
}

impl Serializable for NodeId {
    fn write_into<W: ByteWriter>(&self, target: &mut W) {
        target.write_u64(self.0);
    }

    fn get_size_hint(&self) -> usize {
        Self::SERIALIZED_SIZE
    }
}

impl Deserializable for NodeId {
    fn read_from<R: ByteReader>(source: &mut R) -> Result<Self, DeserializationError> {
        source.read_u64().map(Self)
    }
}

// NODE
// ================================================================================================

const LEAF_TAG: u8 = 0;
const INTERNAL_TAG: u8 = 1;

/// An immutable segment-tree vertex.
///
/// The index range a node covers is not stored on the node; it follows from the node's position
/// in the tree and is recomputed while traversing from the root.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Node {
    /// A single array element.
    Leaf { value: Value },
    /// The sum of its two subtrees. `value == value(left) + value(right)` always holds.
    Internal { left: NodeId, right: NodeId, value: Value },
}

impl Node {
    /// Returns the value of this node: the element for a leaf, the cached subtree sum otherwise.
    pub fn value(&self) -> Value {
        match self {
            Node::Leaf { value } | Node::Internal { value, .. } => *value,
        }
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self, Node::Leaf { .. })
    }

    /// Returns the identifiers of the children of an internal node, or `None` for a leaf.
    pub fn children(&self) -> Option<(NodeId, NodeId)> {
        match self {
            Node::Leaf { .. } => None,
            Node::Internal { left, right, .. } => Some((*left, *right)),
        }
    }
}

impl Serializable for Node {
    fn write_into<W: ByteWriter>(&self, target: &mut W) {
        match self {
            Node::Leaf { value } => {
                target.write_u8(LEAF_TAG);
                target.write_u64(*value as u64);
            },
            Node::Internal { left, right, value } => {
                target.write_u8(INTERNAL_TAG);
                target.write_u64(*value as u64);
                left.write_into(target);
                right.write_into(target);
            },
        }
    }

    fn get_size_hint(&self) -> usize {
        match self {
            Node::Leaf { .. } => 1 + 8,
            Node::Internal { .. } => 1 + 8 + 2 * NodeId::SERIALIZED_SIZE,
        }
    }
}

impl Deserializable for Node {
    fn read_from<R: ByteReader>(source: &mut R) -> Result<Self, DeserializationError> {
        let tag = source.read_u8()?;
        let value = source.read_u64()? as Value;
        match tag {
            LEAF_TAG => Ok(Node::Leaf { value }),
            INTERNAL_TAG => {
                let left = NodeId::read_from(source)?;
                let right = NodeId::read_from(source)?;
                Ok(Node::Internal { left, right, value })
            },
            other => Err(DeserializationError::InvalidValue(format!("unknown node tag {other}"))),
        }
    }
}

// VERSION
// ================================================================================================

/// One complete array state: the root of its tree and the number of leaves under that root.
///
/// The length is carried next to the root so that a traversal always recomputes node ranges from
/// the length the tree was built with. It is never inferred from the root's value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Version {
    root: NodeId,
    length: usize,
}

impl Version {
    pub(crate) fn new(root: NodeId, length: usize) -> Self {
        debug_assert!(length > 0, "a version always covers at least one element");
        Self { root, length }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn len(&self) -> usize {
        self.length
    }

    /// Always `false`: empty arrays cannot be built. Provided for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.length == 0
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]", self.root, self.length)
    }
}

impl Serializable for Version {
    fn write_into<W: ByteWriter>(&self, target: &mut W) {
        self.root.write_into(target);
        target.write_u64(self.length as u64);
    }

    fn get_size_hint(&self) -> usize {
        NodeId::SERIALIZED_SIZE + 8
    }
}

impl Deserializable for Version {
    fn read_from<R: ByteReader>(source: &mut R) -> Result<Self, DeserializationError> {
        let root = NodeId::read_from(source)?;
        let length = source.read_u64()?;
        if length == 0 {
            return Err(DeserializationError::InvalidValue(String::from(
                "a version must cover at least one element",
            )));
        }
        let length = usize::try_from(length).map_err(|_| {
            DeserializationError::InvalidValue(format!("version length {length} exceeds usize"))
        })?;
        Ok(Self { root, length })
    }
}

// TESTS
// ================================================================================================
