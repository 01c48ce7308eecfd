//! Graph arena
//!
//! `Graph` is the central structure for working with computation graphs.
//! Nodes live in a dense table addressed by [`NodeId`]; argument edges and
//! their reverse user edges are stored as id lists on each slot, so there is
//! no pointer aliasing and every mutation can keep both directions in sync.

use crate::error::{GraphError, GraphResult};
use crate::tensor::{ElementType, Shape};

use super::maps::{ArgumentList, NameMap, NodeEntry, NodeId};
use super::ops::{Op, OpKind};

/// Arena of operation nodes
#[derive(Debug, Clone, Default)]
pub struct Graph {
    /// Node slots, indexed by `NodeId`
    entries: Vec<NodeEntry>,

    /// Maps node name → node id
    name_map: NameMap,
}

impl Graph {
    /// Create an empty graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty graph with room for `capacity` nodes
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
            name_map: NameMap::default(),
        }
    }

    // ========================================================================
    // Node accessors
    // ========================================================================

    /// Get a node entry by id
    pub fn get(&self, id: NodeId) -> Option<&NodeEntry> {
        self.entries.get(id.index())
    }

    /// Get a node entry by id, failing with `NodeNotFound`
    pub fn node(&self, id: NodeId) -> GraphResult<&NodeEntry> {
        self.get(id).ok_or(GraphError::NodeNotFound(id))
    }

    pub(crate) fn entry_mut(&mut self, id: NodeId) -> GraphResult<&mut NodeEntry> {
        self.entries
            .get_mut(id.index())
            .ok_or(GraphError::NodeNotFound(id))
    }

    pub(crate) fn entries(&self) -> &[NodeEntry] {
        &self.entries
    }

    /// Check if a node exists
    pub fn contains(&self, id: NodeId) -> bool {
        id.index() < self.entries.len()
    }

    /// Look a node up by name
    pub fn get_by_name(&self, name: &str) -> Option<NodeId> {
        self.name_map.get(name).copied()
    }

    /// Get the number of slots, including eliminated ones
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the arena is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over all node ids in creation order
    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        (0..self.entries.len()).map(NodeId::new)
    }

    /// Iterate over ids of nodes not detached by the liveness sweep
    pub fn active_node_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.entries
            .iter()
            .enumerate()
            .filter(|(_, e)| !e.eliminated)
            .map(|(i, _)| NodeId::new(i))
    }

    /// Count nodes not detached by the liveness sweep
    pub fn active_node_count(&self) -> usize {
        self.entries.iter().filter(|e| !e.eliminated).count()
    }

    // ========================================================================
    // Attribute shortcuts
    // ========================================================================

    /// Operation kind of a node
    pub fn kind(&self, id: NodeId) -> Option<OpKind> {
        self.get(id).map(|e| e.kind())
    }

    /// Output shape of a node
    pub fn shape(&self, id: NodeId) -> Option<&[usize]> {
        self.get(id).map(|e| e.shape.as_slice())
    }

    /// Output element type of a node
    pub fn element_type(&self, id: NodeId) -> Option<ElementType> {
        self.get(id).map(|e| e.element_type)
    }

    /// Name of a node
    pub fn name(&self, id: NodeId) -> Option<&str> {
        self.get(id).map(|e| e.name.as_str())
    }

    /// Argument list of a node (empty for unknown ids)
    pub fn arguments(&self, id: NodeId) -> &[NodeId] {
        self.get(id).map(|e| e.arguments.as_slice()).unwrap_or(&[])
    }

    /// Argument at `index`
    pub fn argument(&self, id: NodeId, index: usize) -> Option<NodeId> {
        self.arguments(id).get(index).copied()
    }

    // ========================================================================
    // Users
    // ========================================================================

    /// Per-edge user list (a consumer appears once per argument slot)
    pub fn user_edges(&self, id: NodeId) -> &[NodeId] {
        self.get(id).map(|e| e.users.as_slice()).unwrap_or(&[])
    }

    /// Unique users in ascending id order
    pub fn users(&self, id: NodeId) -> Vec<NodeId> {
        let mut users = self.user_edges(id).to_vec();
        users.sort_unstable();
        users.dedup();
        users
    }

    /// Number of unique users
    pub fn user_count(&self, id: NodeId) -> usize {
        self.users(id).len()
    }

    /// Check if exactly one distinct node consumes `id`
    pub fn has_single_user(&self, id: NodeId) -> bool {
        match self.user_edges(id) {
            [] => false,
            [first, rest @ ..] => rest.iter().all(|u| u == first),
        }
    }

    /// Check if nothing consumes `id`
    pub fn has_no_users(&self, id: NodeId) -> bool {
        self.user_edges(id).is_empty()
    }

    // ========================================================================
    // Raw insertion
    // ========================================================================

    /// Insert a node without shape inference
    ///
    /// Registers the new node as a user of each argument. Only arity and
    /// argument existence are checked; the typed `add_*` helpers in the
    /// mutators module validate shapes on top of this.
    pub fn insert_node(
        &mut self,
        op: Op,
        arguments: &[NodeId],
        shape: Shape,
        element_type: ElementType,
        name: Option<&str>,
    ) -> GraphResult<NodeId> {
        let kind = op.kind();
        if arguments.len() != kind.arity() {
            return Err(GraphError::ArityMismatch {
                op: kind,
                expected: kind.arity(),
                actual: arguments.len(),
            });
        }
        for &argument in arguments {
            let entry = self.node(argument)?;
            if entry.eliminated {
                return Err(GraphError::invariant(format!(
                    "{} ({}) was eliminated and cannot be used as an argument",
                    entry.name, argument
                )));
            }
        }

        let id = NodeId::new(self.entries.len());
        let name = self.unique_name(name, kind, id);

        for &argument in arguments {
            self.entry_mut(argument)?.users.push(id);
        }

        self.name_map.insert(name.clone(), id);
        self.entries.push(NodeEntry::new(
            name,
            op,
            shape,
            element_type,
            ArgumentList::from_slice(arguments),
        ));

        Ok(id)
    }

    fn unique_name(&self, requested: Option<&str>, kind: OpKind, id: NodeId) -> String {
        if let Some(name) = requested.filter(|name| !self.name_map.contains_key(*name)) {
            return name.to_string();
        }

        let stem = requested.unwrap_or(kind.name());
        let mut name = format!("{}_{}", stem, id.index());
        let mut suffix = 1;
        while self.name_map.contains_key(&name) {
            name = format!("{}_{}_{}", stem, id.index(), suffix);
            suffix += 1;
        }
        name
    }
}
