//! Tensor metadata for graph nodes
//!
//! This module provides the value-level descriptions carried by every node:
//! - Element types (`dtype`)
//! - Shapes and axis orders (`shape`)
//!
//! Tensor data itself never lives in the graph; only shapes, axis orders and
//! element type tags are needed to decide whether a rewrite is sound.
//!
//! # Example
//!
//! ```ignore
//! use reshape_optimizer::tensor::{apply_permutation, default_order, is_default_order};
//!
//! let order = default_order(3);
//! assert!(is_default_order(&order));
//!
//! let transposed = apply_permutation(&[2, 3, 4], &[2, 0, 1]);
//! assert_eq!(transposed, Some(vec![4, 2, 3]));
//! ```

pub mod dtype;
pub mod shape;

// Re-export commonly used items
pub use dtype::ElementType;
pub use shape::{
    apply_permutation, compose_orders, default_order, inverse_permutation, is_default_order,
    is_permutation, numel, permuted_shape, transposed_2d, AxisVector, Shape,
};
