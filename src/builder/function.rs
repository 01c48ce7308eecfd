//! Function builder
//!
//! Assembles a [`Function`] from typed node helpers.

use crate::error::{GraphError, GraphResult};
use crate::graph::{Function, Graph, NodeId, OpKind};
use crate::tensor::{AxisVector, ElementType, Shape};
use crate::transform::RewriteStats;
use crate::transformers::OptimizationPipeline;

/// Builder for constructing functions
#[derive(Debug, Clone)]
pub struct FunctionBuilder {
    /// Function name
    name: String,
    /// Graph under construction
    graph: Graph,
}

impl FunctionBuilder {
    /// Create a builder with an empty graph
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            graph: Graph::new(),
        }
    }

    /// Create a builder with room for `capacity` nodes
    pub fn with_capacity(name: impl Into<String>, capacity: usize) -> Self {
        Self {
            name: name.into(),
            graph: Graph::with_capacity(capacity),
        }
    }

    /// Graph built so far
    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    /// Add a named input
    pub fn parameter(
        &mut self,
        name: &str,
        element_type: ElementType,
        shape: impl Into<Shape>,
    ) -> GraphResult<NodeId> {
        self.graph.add_parameter(name, element_type, shape)
    }

    /// Add a reshape with an explicit axis order
    pub fn reshape(
        &mut self,
        argument: NodeId,
        input_order: impl Into<AxisVector>,
        output_shape: impl Into<Shape>,
    ) -> GraphResult<NodeId> {
        self.graph.add_reshape(argument, input_order, output_shape)
    }

    /// Add a pure transpose
    pub fn transpose(
        &mut self,
        argument: NodeId,
        input_order: impl Into<AxisVector>,
    ) -> GraphResult<NodeId> {
        self.graph.add_transpose(argument, input_order)
    }

    /// Add a dot product
    pub fn dot(&mut self, lhs: NodeId, rhs: NodeId) -> GraphResult<NodeId> {
        self.graph.add_dot(lhs, rhs)
    }

    /// Add element-wise addition
    pub fn add(&mut self, lhs: NodeId, rhs: NodeId) -> GraphResult<NodeId> {
        self.graph.add_binary(OpKind::Add, lhs, rhs)
    }

    /// Add element-wise multiplication
    pub fn multiply(&mut self, lhs: NodeId, rhs: NodeId) -> GraphResult<NodeId> {
        self.graph.add_binary(OpKind::Multiply, lhs, rhs)
    }

    /// Add negation
    pub fn negative(&mut self, argument: NodeId) -> GraphResult<NodeId> {
        self.graph.add_unary(OpKind::Negative, argument)
    }

    /// Add a rectifier
    pub fn relu(&mut self, argument: NodeId) -> GraphResult<NodeId> {
        self.graph.add_unary(OpKind::Relu, argument)
    }

    /// Build the function
    ///
    /// Appends one `Result` node per entry of `outputs`, in order.
    pub fn build(mut self, outputs: &[NodeId]) -> GraphResult<Function> {
        if outputs.is_empty() {
            return Err(GraphError::MissingField("outputs".to_string()));
        }

        let results = outputs
            .iter()
            .map(|&output| self.graph.add_result(output))
            .collect::<GraphResult<Vec<_>>>()?;

        Function::new(self.name, self.graph, results)
    }
}

/// Run the default pipeline over `function` and validate the outcome
///
/// This is the main entry point for optimizing a built function.
pub fn optimize_function(function: &mut Function) -> GraphResult<RewriteStats> {
    let stats = OptimizationPipeline::default().run(function)?;
    function.validate()?;
    Ok(stats)
}
