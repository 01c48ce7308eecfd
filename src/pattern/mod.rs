//! Pattern matching module for graph rewriting
//!
//! This module provides tools for identifying subgraphs to rewrite.
//!
//! # Overview
//!
//! The pattern matching system works by:
//! 1. Describing a subgraph as a [`Pattern`] tree of operations, labels and skips
//! 2. Matching it at a candidate node, walking toward the arguments
//! 3. Handing the resulting [`PatternMap`] to a callback that checks the
//!    conditions the grammar cannot express and mutates the graph
//!
//! # Example
//!
//! ```ignore
//! use reshape_optimizer::pattern::{Label, Matcher, Pattern};
//!
//! let operand = Label::new("operand");
//! let pattern = Pattern::reshape(operand.pattern());
//!
//! let matcher = Matcher::new("identity_reshape", pattern, move |graph, map| {
//!     let root = map.root().expect("root");
//!     let view = graph.reshape(root)?;
//!     if !view.is_noop() {
//!         return Ok(false);
//!     }
//!     graph.replace_node(root, map.node(&operand)?)?;
//!     Ok(true)
//! });
//! ```
//!
//! # Chains
//!
//! [`RecurrentMatcher`] re-applies one pattern along a chain of
//! single-consumer links:
//!
//! ```ignore
//! let chain = recurrent.match_chain(&graph, seed)?;
//! let innermost_operand = chain.last(&operand)?;
//! ```
//!
//! # Traversal
//!
//! The module also provides breadth-first reachability:
//!
//! ```ignore
//! use reshape_optimizer::pattern::traversal::{reachable_nodes, BfsIterator, Direction};
//!
//! let feeds_root = BfsIterator::backward(&graph, root).any(|node| node == x);
//! let downstream = reachable_nodes(&graph, x, Direction::Forward);
//! ```

pub mod matcher;
pub mod node;
pub mod predicate;
pub mod recurrent;
pub mod traversal;

// Re-export main types
pub use matcher::{match_pattern, match_seeded, MatchCallback, Matcher, PatternMap};
pub use node::{Label, LabelId, Pattern};
pub use predicate::{
    And, FnPredicate, HasElementType, HasRank, HasShape, IsKind, NodePredicate, Not, Or,
    Predicate, PredicateExt, SingleUser,
};
pub use recurrent::{RecurrentCallback, RecurrentMatch, RecurrentMatcher};
pub use traversal::{predecessors, reachable_nodes, BfsIterator, Direction};
