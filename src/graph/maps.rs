//! Arena slot types and edge lists
//!
//! Defines the core data structures for efficient graph traversal.

use std::fmt;

use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use crate::tensor::{ElementType, Shape};

use super::ops::{Op, OpKind};

/// Stable index of a node slot in its graph's arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    /// Create an id from a raw slot index
    pub fn new(index: usize) -> Self {
        Self(index)
    }

    /// Raw slot index
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "%{}", self.0)
    }
}

/// Ordered argument edges of a node (most ops take 1-2)
pub type ArgumentList = SmallVec<[NodeId; 2]>;

/// Reverse edges: one entry per argument edge that points at the node
///
/// Inline for the common case of 1-4 consumers.
pub type UserList = SmallVec<[NodeId; 4]>;

/// Type alias for name map: node name → node id
pub type NameMap = FxHashMap<String, NodeId>;

/// Type alias for user map: node id → per-edge user list
pub type UserMap = FxHashMap<NodeId, UserList>;

/// Entry in the node arena - tracks node and its state
#[derive(Debug, Clone)]
pub struct NodeEntry {
    /// Unique node name
    pub name: String,
    /// Operation with attributes
    pub op: Op,
    /// Output shape
    pub shape: Shape,
    /// Output element type
    pub element_type: ElementType,
    /// Producers, in argument order
    pub arguments: ArgumentList,
    /// Consumers, one entry per argument edge
    pub users: UserList,
    /// Whether the liveness sweep has detached this node
    pub eliminated: bool,
}

impl NodeEntry {
    /// Create a new entry with no users
    pub fn new(
        name: String,
        op: Op,
        shape: Shape,
        element_type: ElementType,
        arguments: ArgumentList,
    ) -> Self {
        Self {
            name,
            op,
            shape,
            element_type,
            arguments,
            users: UserList::new(),
            eliminated: false,
        }
    }

    /// Operation kind
    pub fn kind(&self) -> OpKind {
        self.op.kind()
    }

    /// Output rank
    pub fn rank(&self) -> usize {
        self.shape.len()
    }

    /// Mark this node as eliminated
    pub fn mark_eliminated(&mut self) {
        self.eliminated = true;
    }
}

/// Build the user map implied by the argument lists of `entries`
///
/// The result is what every node's `users` must equal as a multiset.
pub fn build_user_map(entries: &[NodeEntry]) -> UserMap {
    let mut map: UserMap = FxHashMap::default();

    for (index, entry) in entries.iter().enumerate() {
        if entry.eliminated {
            continue;
        }
        for &argument in &entry.arguments {
            map.entry(argument).or_default().push(NodeId::new(index));
        }
    }

    map
}
