//! Function builder module
//!
//! This module provides utilities for assembling functions to optimize:
//!
//! - [`FunctionBuilder`]: fluent construction over the typed node helpers
//! - [`optimize_function`]: run the default pipeline and validate the result
//!
//! # Overview
//!
//! The builder owns a [`Graph`](crate::graph::Graph) until
//! [`FunctionBuilder::build`] appends the result nodes and wraps it into a
//! [`Function`](crate::graph::Function).
//!
//! # Example
//!
//! ```ignore
//! use reshape_optimizer::builder::{optimize_function, FunctionBuilder};
//! use reshape_optimizer::tensor::ElementType;
//!
//! let mut builder = FunctionBuilder::new("transpose_pair");
//! let x = builder.parameter("x", ElementType::F32, vec![2, 3])?;
//! let t = builder.transpose(x, vec![1, 0])?;
//! let back = builder.transpose(t, vec![1, 0])?;
//! let mut function = builder.build(&[back])?;
//!
//! let stats = optimize_function(&mut function)?;
//! println!("Applied {} rewrites", stats.rewrites_applied);
//! ```

pub mod function;

pub use function::{optimize_function, FunctionBuilder};
