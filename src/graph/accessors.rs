//! Advanced graph accessor methods
//!
//! High-level methods for pattern callbacks and graph analysis.

use crate::error::{GraphError, GraphResult};
use crate::pattern::traversal::BfsIterator;
use crate::tensor::{is_default_order, permuted_shape, ElementType};

use super::context::Graph;
use super::maps::{NodeEntry, NodeId};
use super::ops::{Op, OpKind};

/// Borrowed view of a reshape node and its single argument
///
/// Obtained from [`Graph::reshape`]; lets callbacks read the axis order
/// without matching on [`Op`] themselves.
#[derive(Debug, Clone, Copy)]
pub struct ReshapeView<'g> {
    /// The reshape node
    pub id: NodeId,
    /// Its argument
    pub argument: NodeId,
    /// Axis order applied before reshaping
    pub input_order: &'g [usize],
    /// Output shape
    pub shape: &'g [usize],
    /// Shape of the argument
    pub argument_shape: &'g [usize],
    /// Element type shared by input and output
    pub element_type: ElementType,
}

impl<'g> ReshapeView<'g> {
    /// Whether the axis order is the identity
    pub fn has_default_order(&self) -> bool {
        is_default_order(self.input_order)
    }

    /// Whether the reshape leaves its argument untouched
    pub fn is_noop(&self) -> bool {
        self.has_default_order() && self.shape == self.argument_shape
    }

    /// Whether the reshape only permutes axes
    pub fn is_pure_transpose(&self) -> bool {
        permuted_shape(self.argument_shape, self.input_order)
            .is_some_and(|permuted| permuted == self.shape)
    }

    /// Whether this is a rank-2 transpose with order `[1, 0]`
    pub fn is_transpose_2d(&self) -> bool {
        self.input_order == [1, 0] && self.is_pure_transpose()
    }
}

impl Graph {
    // ========================================================================
    // Typed views
    // ========================================================================

    /// View a reshape node
    ///
    /// # Errors
    /// * `NodeNotFound` for unknown ids
    /// * `InvariantViolation` if the node is not a reshape or has no argument
    pub fn reshape(&self, id: NodeId) -> GraphResult<ReshapeView<'_>> {
        let entry = self.node(id)?;
        let Op::Reshape { input_order } = &entry.op else {
            return Err(GraphError::invariant(format!(
                "{} is a {}, not a Reshape",
                entry.name,
                entry.kind()
            )));
        };
        let argument = entry.arguments.first().copied().ok_or_else(|| {
            GraphError::invariant(format!("reshape {} has no argument", entry.name))
        })?;
        let argument_entry = self.node(argument)?;

        Ok(ReshapeView {
            id,
            argument,
            input_order,
            shape: &entry.shape,
            argument_shape: &argument_entry.shape,
            element_type: entry.element_type,
        })
    }

    /// Get a node, requiring a particular kind
    pub fn expect_kind(&self, id: NodeId, kind: OpKind) -> GraphResult<&NodeEntry> {
        let entry = self.node(id)?;
        if entry.kind() != kind {
            return Err(GraphError::invariant(format!(
                "expected {} to be a {}, found {}",
                entry.name,
                kind,
                entry.kind()
            )));
        }
        Ok(entry)
    }

    // ========================================================================
    // Search helpers
    // ========================================================================

    /// Find live nodes of a kind, in insertion order
    pub fn find_nodes_by_kind(&self, kind: OpKind) -> Vec<NodeId> {
        self.active_node_ids()
            .filter(|&id| self.kind(id) == Some(kind))
            .collect()
    }

    /// Find live nodes matching any of the given kinds
    pub fn find_nodes_by_kinds(&self, kinds: &[OpKind]) -> Vec<NodeId> {
        self.active_node_ids()
            .filter(|&id| self.kind(id).is_some_and(|k| kinds.contains(&k)))
            .collect()
    }

    /// Whether `node` transitively consumes `ancestor`
    ///
    /// A node does not depend on itself.
    pub fn depends_on(&self, node: NodeId, ancestor: NodeId) -> bool {
        BfsIterator::backward(self, node)
            .skip(1)
            .any(|current| current == ancestor)
    }
}
