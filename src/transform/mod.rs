//! Graph transformation module
//!
//! This module provides the rewrite infrastructure:
//!
//! - [`GraphRewrite`]: the pass driver over registered matchers
//! - [`eliminate`]: the dead-node sweep run between passes
//!
//! # Overview
//!
//! Transformations work on a [`Function`](crate::graph::Function) and modify
//! it in place. The typical workflow is:
//!
//! 1. Create a `GraphRewrite` and register matchers in priority order
//! 2. `run` it over the function
//! 3. Sweep abandoned nodes with `eliminate_dead_nodes`
//!
//! # Example
//!
//! ```ignore
//! use reshape_optimizer::transform::{eliminate_dead_nodes, GraphRewrite};
//!
//! let mut pass = GraphRewrite::new("cleanup");
//! pass.add_matcher(identity_reshape_matcher());
//!
//! let stats = pass.run(&mut function)?;
//! let swept = eliminate_dead_nodes(&mut function)?;
//! ```

pub mod core;
pub mod eliminate;

// Re-export main types and functions
pub use self::core::{GraphRewrite, RewriteConfig, RewriteStats};
pub use eliminate::{can_eliminate, eliminate_dead_nodes};
