//! Error types for reshape-optimizer
//!
//! This module defines all error types used throughout the crate.
//!
//! Structural mismatches and callback rejections are not errors: matchers
//! return `None` and callbacks return `Ok(false)`. Everything here signals
//! either a malformed construction request or a broken graph invariant.

use thiserror::Error;

use crate::graph::{NodeId, OpKind};
use crate::tensor::ElementType;

/// Main error type for graph construction and rewriting
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    /// Node id does not belong to the graph
    #[error("Node not found: {0}")]
    NodeNotFound(NodeId),

    /// Shape inference rejected a construction request
    #[error("Invalid shape: {0}")]
    InvalidShape(String),

    /// Axis order is not a permutation of the argument rank
    #[error("Invalid axis order {order:?} for rank {rank}")]
    InvalidPermutation {
        /// Offending order
        order: Vec<usize>,
        /// Rank of the argument
        rank: usize,
    },

    /// Operation kind not accepted by a construction helper
    #[error("Unsupported operation: {0}")]
    UnsupportedOperation(String),

    /// Wrong number of arguments for an operation
    #[error("{op} expects {expected} argument(s), got {actual}")]
    ArityMismatch {
        /// Operation kind
        op: OpKind,
        /// Expected argument count
        expected: usize,
        /// Actual argument count
        actual: usize,
    },

    /// Operands disagree on element type
    #[error("Element type mismatch: expected {expected}, got {actual}")]
    ElementTypeMismatch {
        /// Expected element type
        expected: ElementType,
        /// Actual element type
        actual: ElementType,
    },

    /// `replace_node` called with identical target and replacement
    #[error("Cannot replace node {0} with itself")]
    SelfReplacement(NodeId),

    /// Rewiring would make the graph cyclic
    #[error("Replacing {target} with {replacement} would introduce a cycle")]
    CycleDetected {
        /// Node being replaced
        target: NodeId,
        /// Proposed replacement
        replacement: NodeId,
    },

    /// Graph or match invariant broken; fatal for the running pass
    #[error("Invariant violation: {0}")]
    InvariantViolation(String),

    /// Missing required field
    #[error("Missing required field: {0}")]
    MissingField(String),
}

impl GraphError {
    /// Shorthand for an invariant violation
    pub fn invariant(message: impl Into<String>) -> Self {
        Self::InvariantViolation(message.into())
    }

    /// Whether this error reports a broken invariant rather than a bad request
    pub fn is_invariant_violation(&self) -> bool {
        matches!(
            self,
            Self::InvariantViolation(_) | Self::CycleDetected { .. } | Self::SelfReplacement(_)
        )
    }
}

/// Result type alias for graph operations
pub type GraphResult<T> = Result<T, GraphError>;
