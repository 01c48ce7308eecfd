//! Operation kinds
//!
//! Operations form a closed sum type. Pattern matching compares only the
//! fieldless [`OpKind`]; attribute checks (axis orders, shapes) belong to
//! rewrite callbacks.

use std::fmt;

use crate::tensor::AxisVector;

/// Operation discriminant used by patterns and predicates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum OpKind {
    /// Function parameter
    Parameter,
    /// Function result
    Result,
    /// Transpose-then-reshape
    Reshape,
    /// Tensor contraction
    Dot,
    /// Element-wise addition
    Add,
    /// Element-wise multiplication
    Multiply,
    /// Element-wise negation
    Negative,
    /// Rectified linear unit
    Relu,
}

impl OpKind {
    /// Number of arguments every node of this kind takes
    pub fn arity(self) -> usize {
        match self {
            OpKind::Parameter => 0,
            OpKind::Result | OpKind::Reshape | OpKind::Negative | OpKind::Relu => 1,
            OpKind::Dot | OpKind::Add | OpKind::Multiply => 2,
        }
    }

    /// Operation name, also used as the prefix of generated node names
    pub fn name(self) -> &'static str {
        match self {
            OpKind::Parameter => "Parameter",
            OpKind::Result => "Result",
            OpKind::Reshape => "Reshape",
            OpKind::Dot => "Dot",
            OpKind::Add => "Add",
            OpKind::Multiply => "Multiply",
            OpKind::Negative => "Negative",
            OpKind::Relu => "Relu",
        }
    }

    /// Check if the kind is an element-wise binary operation
    pub fn is_binary_elementwise(self) -> bool {
        matches!(self, OpKind::Add | OpKind::Multiply)
    }

    /// Check if the kind is an element-wise unary operation
    pub fn is_unary_elementwise(self) -> bool {
        matches!(self, OpKind::Negative | OpKind::Relu)
    }
}

impl fmt::Display for OpKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Operation carried by a node, with its attributes
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Op {
    /// Function parameter
    Parameter,
    /// Function result
    Result,
    /// Transpose the argument by `input_order`, then reshape row-major to the
    /// node's output shape
    Reshape {
        /// Permutation applied to the argument axes
        input_order: AxisVector,
    },
    /// Contract the last axis of the left operand with the first axis of the right
    Dot,
    /// Element-wise addition
    Add,
    /// Element-wise multiplication
    Multiply,
    /// Element-wise negation
    Negative,
    /// Rectified linear unit
    Relu,
}

impl Op {
    /// Discriminant of this operation
    pub fn kind(&self) -> OpKind {
        match self {
            Op::Parameter => OpKind::Parameter,
            Op::Result => OpKind::Result,
            Op::Reshape { .. } => OpKind::Reshape,
            Op::Dot => OpKind::Dot,
            Op::Add => OpKind::Add,
            Op::Multiply => OpKind::Multiply,
            Op::Negative => OpKind::Negative,
            Op::Relu => OpKind::Relu,
        }
    }

    /// Reshape input order, if this is a reshape
    pub fn input_order(&self) -> Option<&[usize]> {
        match self {
            Op::Reshape { input_order } => Some(input_order),
            _ => None,
        }
    }

    /// Element-wise binary operation for a kind
    pub fn binary(kind: OpKind) -> Option<Op> {
        match kind {
            OpKind::Add => Some(Op::Add),
            OpKind::Multiply => Some(Op::Multiply),
            _ => None,
        }
    }

    /// Element-wise unary operation for a kind
    pub fn unary(kind: OpKind) -> Option<Op> {
        match kind {
            OpKind::Negative => Some(Op::Negative),
            OpKind::Relu => Some(Op::Relu),
            _ => None,
        }
    }
}
