//! Reshape transformers
//!
//! This module provides the ready-to-use reshape passes:
//!
//! - **Local elimination**: identity reshapes, round-tripping reshape pairs,
//!   transposed products ([`ReshapeElimination`])
//! - **Chain collapse**: arbitrarily long default-order reshape chains
//!   ([`RecurrentReshapeElimination`])
//!
//! # Overview
//!
//! Each pass implements the [`Transformer`] trait and can be applied
//! individually or combined.
//!
//! # Example
//!
//! ```ignore
//! use reshape_optimizer::transformers::{ReshapeElimination, RecurrentReshapeElimination};
//! use reshape_optimizer::traits::Transformer;
//!
//! let stats = ReshapeElimination::new().transform(&mut function)?;
//! let chains = RecurrentReshapeElimination::new().transform(&mut function)?;
//!
//! println!("Applied {} rewrites", stats.rewrites_applied + chains.rewrites_applied);
//! ```
//!
//! # Using OptimizationPipeline
//!
//! [`OptimizationPipeline`] repeats the enabled passes until nothing changes:
//!
//! ```ignore
//! use reshape_optimizer::transformers::OptimizationPipeline;
//!
//! let pipeline = OptimizationPipeline::default();
//! let stats = pipeline.run(&mut function)?;
//! ```

/// Common utilities
pub mod common;
/// Recurrent reshape-chain collapse
pub mod recurrent_reshape;
/// Local reshape elimination
pub mod reshape_elimination;

#[cfg(test)]
mod testing;

pub use common::{match_root, orders_cancel, replace_if_compatible, run_transformers};
pub use recurrent_reshape::{recurrent_reshape_matcher, RecurrentReshapeElimination};
pub use reshape_elimination::{
    dot_transpose_matcher, identity_reshape_matcher, reshape_pair_matcher, ReshapeElimination,
};

use tracing::{debug, debug_span};

use crate::error::GraphResult;
use crate::graph::Function;
use crate::traits::Transformer;
use crate::transform::{eliminate_dead_nodes, RewriteConfig, RewriteStats};

/// Optimization pipeline that runs the reshape passes to a fixpoint
#[derive(Debug, Clone)]
pub struct OptimizationPipeline {
    /// Iteration bound, chain bound, sweep and validation switches
    pub config: RewriteConfig,
    /// Enable the local elimination pass
    pub reshape_elimination: bool,
    /// Enable the chain collapse pass
    pub recurrent_reshape: bool,
}

impl Default for OptimizationPipeline {
    fn default() -> Self {
        Self {
            config: RewriteConfig::default(),
            reshape_elimination: true,
            recurrent_reshape: true,
        }
    }
}

impl OptimizationPipeline {
    /// Create a new pipeline with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable only the local elimination pass
    pub fn reshape_only() -> Self {
        Self {
            recurrent_reshape: false,
            ..Self::default()
        }
    }

    /// Enable only the chain collapse pass
    pub fn recurrent_only() -> Self {
        Self {
            reshape_elimination: false,
            ..Self::default()
        }
    }

    /// Replace the configuration
    pub fn with_config(mut self, config: RewriteConfig) -> Self {
        self.config = config;
        self
    }

    /// Run the optimization pipeline
    ///
    /// Stops after the first iteration in which no pass applied a rewrite,
    /// or after `max_iterations`.
    pub fn run(&self, function: &mut Function) -> GraphResult<RewriteStats> {
        let span = debug_span!("optimization_pipeline", function = %function.name());
        let _enter = span.enter();

        let reshape = ReshapeElimination::new();
        let recurrent =
            RecurrentReshapeElimination::with_max_chain_length(self.config.max_chain_length);

        let mut passes: Vec<&dyn Transformer> = Vec::with_capacity(2);
        if self.reshape_elimination {
            passes.push(&reshape);
        }
        if self.recurrent_reshape {
            passes.push(&recurrent);
        }

        let mut total = RewriteStats::new();

        for iteration in 0..self.config.max_iterations {
            let mut changed = false;

            for pass in &passes {
                if !pass.is_applicable(function) {
                    continue;
                }

                let stats = pass.transform(function)?;
                changed |= stats.changed();
                total.merge(stats);

                if self.config.cleanup_after {
                    total.nodes_eliminated += eliminate_dead_nodes(function)?;
                }
                if self.config.validate_after_pass {
                    function.validate()?;
                }
            }

            debug!(iteration, changed, applied = total.rewrites_applied, "pipeline iteration");

            // Stop if no progress
            if !changed {
                break;
            }
        }

        Ok(total)
    }
}

impl Transformer for OptimizationPipeline {
    fn name(&self) -> &'static str {
        "OptimizationPipeline"
    }

    fn transform(&self, function: &mut Function) -> GraphResult<RewriteStats> {
        self.run(function)
    }
}
