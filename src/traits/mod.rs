//! Core traits for reshape-optimizer
//!
//! Defines the fundamental interface for function-level passes.

use crate::error::GraphResult;
use crate::graph::Function;
use crate::transform::RewriteStats;

/// Transformer trait for function-level rewrites
///
/// This is the core abstraction for all passes. Implementations rewrite the
/// function in place and report what they did.
///
/// # Example
///
/// ```ignore
/// struct NoopPass;
///
/// impl Transformer for NoopPass {
///     fn name(&self) -> &'static str {
///         "NoopPass"
///     }
///
///     fn transform(&self, function: &mut Function) -> GraphResult<RewriteStats> {
///         Ok(RewriteStats::new())
///     }
/// }
/// ```
pub trait Transformer {
    /// Name of the transformer
    fn name(&self) -> &'static str;

    /// Transform the given function in place
    ///
    /// # Arguments
    /// * `function` - The function to rewrite
    ///
    /// # Returns
    /// * `GraphResult<RewriteStats>` - What the pass did, or a fatal error
    fn transform(&self, function: &mut Function) -> GraphResult<RewriteStats>;

    /// Check if this transformer can do anything on the function
    fn is_applicable(&self, _function: &Function) -> bool {
        true
    }
}

/// Chainable transformer that applies multiple transformers in sequence
pub struct TransformerChain {
    transformers: Vec<Box<dyn Transformer>>,
}

impl TransformerChain {
    /// Create a new empty transformer chain
    pub fn new() -> Self {
        Self {
            transformers: Vec::new(),
        }
    }

    /// Add a transformer to the chain
    #[allow(clippy::should_implement_trait)]
    pub fn add<T: Transformer + 'static>(mut self, transformer: T) -> Self {
        self.transformers.push(Box::new(transformer));
        self
    }

    /// Number of transformers in the chain
    pub fn len(&self) -> usize {
        self.transformers.len()
    }

    /// Whether the chain is empty
    pub fn is_empty(&self) -> bool {
        self.transformers.is_empty()
    }
}

impl Default for TransformerChain {
    fn default() -> Self {
        Self::new()
    }
}

impl Transformer for TransformerChain {
    fn name(&self) -> &'static str {
        "TransformerChain"
    }

    fn transform(&self, function: &mut Function) -> GraphResult<RewriteStats> {
        let mut total = RewriteStats::new();
        for transformer in &self.transformers {
            if transformer.is_applicable(function) {
                total.merge(transformer.transform(function)?);
            }
        }
        Ok(total)
    }
}
