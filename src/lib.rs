//! # Reshape Optimizer
//!
//! Graph rewrite core for tensor computation graphs.
//!
//! This crate provides structural pattern matching over an arena-backed
//! dataflow graph and the rewrite passes built on it: identity-reshape
//! removal, reshape-pair cancellation, transposed-product rewriting and
//! collapse of arbitrarily long reshape chains.
//!
//! ## Features
//!
//! - **Pattern Matching**: labels, wildcards with predicates, optional
//!   (skip) nodes and chain matching with a fan-out guard
//! - **Rewrite Driver**: one reverse-topological sweep per pass with
//!   first-accepting-matcher semantics
//! - **Graph Cleanup**: dead-node sweep after rewrites
//!
//! ## Example
//!
//! ```ignore
//! use reshape_optimizer::prelude::*;
//!
//! let mut builder = FunctionBuilder::new("f");
//! let x = builder.parameter("x", ElementType::F32, vec![2, 3])?;
//! let t = builder.transpose(x, vec![1, 0])?;
//! let back = builder.transpose(t, vec![1, 0])?;
//! let mut function = builder.build(&[back])?;
//!
//! let stats = OptimizationPipeline::default().run(&mut function)?;
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

// ============================================================================
// Module declarations
// ============================================================================

pub mod builder;
pub mod error;
pub mod graph;
pub mod pattern;
pub mod tensor;
pub mod traits;
pub mod transform;
pub mod transformers;

// ============================================================================
// Prelude module for convenient imports
// ============================================================================

/// Prelude module - import commonly used types with `use reshape_optimizer::prelude::*`
pub mod prelude {
    pub use crate::builder::{optimize_function, FunctionBuilder};
    pub use crate::error::{GraphError, GraphResult};
    pub use crate::graph::{Function, Graph, NodeId, Op, OpKind};
    pub use crate::pattern::{
        Label, Matcher, Pattern, PatternMap, PredicateExt, RecurrentMatch, RecurrentMatcher,
    };
    pub use crate::tensor::{AxisVector, ElementType, Shape};
    pub use crate::traits::Transformer;
    pub use crate::transform::{eliminate_dead_nodes, GraphRewrite, RewriteConfig, RewriteStats};
    pub use crate::transformers::{
        OptimizationPipeline, RecurrentReshapeElimination, ReshapeElimination,
    };
}

// ============================================================================
// Crate-level re-exports
// ============================================================================

pub use error::{GraphError, GraphResult};
pub use traits::Transformer;

// ============================================================================
// Version information
// ============================================================================

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::prelude::*;
    use super::VERSION;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_prelude_end_to_end() {
        let mut builder = FunctionBuilder::new("end_to_end");
        let a = builder.parameter("a", ElementType::F32, vec![2, 3]).unwrap();
        let b = builder.parameter("b", ElementType::F32, vec![3, 4]).unwrap();
        let product = builder.dot(a, b).unwrap();
        let flat = builder.reshape(product, vec![0, 1], vec![8]).unwrap();
        let back = builder.reshape(flat, vec![0], vec![2, 4]).unwrap();
        let out = builder.relu(back).unwrap();
        let mut function = builder.build(&[out]).unwrap();

        let stats = optimize_function(&mut function).unwrap();

        assert!(stats.changed());
        assert_eq!(function.graph().arguments(out), &[product]);
        assert_eq!(function.live_node_count().unwrap(), 5);
    }
}
