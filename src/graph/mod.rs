//! Computation graph module
//!
//! This module provides the core infrastructure for working with graphs:
//!
//! - [`Graph`]: arena of operation nodes with O(1) id lookups
//! - [`Function`]: a graph plus its parameter and result lists
//! - [`maps`]: id types, node slots and map builders
//!
//! # Overview
//!
//! Every node records its operation, output shape and element type, its
//! ordered argument ids and the reverse user edges. The typed `add_*`
//! helpers infer shapes; [`Graph::replace_node`] is the only primitive that
//! moves edges from one node to another.
//!
//! # Example
//!
//! ```ignore
//! use reshape_optimizer::graph::{Function, Graph};
//! use reshape_optimizer::tensor::ElementType;
//!
//! let mut graph = Graph::new();
//! let x = graph.add_parameter("x", ElementType::F32, vec![2, 3])?;
//! let t = graph.add_transpose(x, vec![1, 0])?;
//! let r = graph.add_result(t)?;
//!
//! let function = Function::new("f", graph, vec![r])?;
//! assert_eq!(function.ordered_ops()?.len(), 3);
//! ```
//!
//! # Edges
//!
//! | Field | Description |
//! |-------|-------------|
//! | `arguments` | ordered operand ids, one per input |
//! | `users` | one entry per argument edge pointing at this node |

pub mod accessors;
pub mod context;
pub mod function;
pub mod maps;
pub mod mutators;
pub mod ops;

// Re-export main types
pub use accessors::ReshapeView;
pub use context::Graph;
pub use function::Function;
pub use maps::{ArgumentList, NodeEntry, NodeId, UserList};
pub use ops::{Op, OpKind};
