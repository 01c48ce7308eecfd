//! Functions: a graph together with its parameter and result lists
//!
//! A [`Function`] owns its [`Graph`] and knows which nodes are the graph's
//! inputs and outputs. Liveness, topological ordering, validation and
//! structural comparison are all defined relative to the result list.

use std::hash::{Hash, Hasher};

use rustc_hash::{FxHashMap, FxHasher};
use smallvec::SmallVec;

use crate::error::{GraphError, GraphResult};
use crate::tensor::{is_permutation, numel, AxisVector, ElementType, Shape};

use super::context::Graph;
use super::maps::{build_user_map, NodeId};
use super::ops::OpKind;

/// A graph with designated parameters and results
#[derive(Debug, Clone)]
pub struct Function {
    name: String,
    graph: Graph,
    parameters: Vec<NodeId>,
    results: Vec<NodeId>,
}

/// Position-independent encoding of one node, used for comparison
#[derive(Debug, PartialEq, Eq, Hash)]
struct CanonicalNode {
    kind: OpKind,
    input_order: Option<AxisVector>,
    shape: Shape,
    element_type: ElementType,
    arguments: SmallVec<[usize; 2]>,
}

impl Function {
    /// Wrap a graph
    ///
    /// Parameters are collected from the graph in insertion order; every
    /// id in `results` must be a `Result` node.
    pub fn new(name: impl Into<String>, graph: Graph, results: Vec<NodeId>) -> GraphResult<Self> {
        for &result in &results {
            graph.expect_kind(result, OpKind::Result)?;
        }
        let parameters = graph.find_nodes_by_kind(OpKind::Parameter);

        Ok(Self {
            name: name.into(),
            graph,
            parameters,
            results,
        })
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// Function name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Underlying graph
    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    /// Underlying graph, mutably
    pub fn graph_mut(&mut self) -> &mut Graph {
        &mut self.graph
    }

    /// Parameter nodes in declaration order
    pub fn parameters(&self) -> &[NodeId] {
        &self.parameters
    }

    /// Result nodes in declaration order
    pub fn results(&self) -> &[NodeId] {
        &self.results
    }

    /// The value feeding result `index`
    pub fn result_value(&self, index: usize) -> Option<NodeId> {
        let result = *self.results.get(index)?;
        self.graph.argument(result, 0)
    }

    // ========================================================================
    // Ordering and liveness
    // ========================================================================

    /// Live nodes in topological order, arguments before users
    ///
    /// Parameters come first in declaration order, followed by a post-order
    /// walk from each result. Nodes not reachable from a result (other than
    /// parameters) are dead and omitted.
    ///
    /// # Errors
    /// * `InvariantViolation` if the reachable subgraph contains a cycle
    pub fn ordered_ops(&self) -> GraphResult<Vec<NodeId>> {
        #[derive(Clone, Copy, PartialEq)]
        enum Mark {
            Unvisited,
            InProgress,
            Done,
        }

        let mut marks = vec![Mark::Unvisited; self.graph.len()];
        let mut order = Vec::with_capacity(self.graph.len());

        for &parameter in &self.parameters {
            marks[parameter.index()] = Mark::Done;
            order.push(parameter);
        }

        for &root in &self.results {
            if marks[root.index()] == Mark::Done {
                continue;
            }
            // (node, next argument position)
            let mut stack: Vec<(NodeId, usize)> = vec![(root, 0)];
            marks[root.index()] = Mark::InProgress;

            while let Some((node, position)) = stack.pop() {
                match self.graph.argument(node, position) {
                    Some(argument) => {
                        stack.push((node, position + 1));
                        match marks[argument.index()] {
                            Mark::Done => {}
                            Mark::InProgress => {
                                return Err(GraphError::invariant(format!(
                                    "cycle through {} in function {}",
                                    argument, self.name
                                )));
                            }
                            Mark::Unvisited => {
                                marks[argument.index()] = Mark::InProgress;
                                stack.push((argument, 0));
                            }
                        }
                    }
                    None => {
                        marks[node.index()] = Mark::Done;
                        order.push(node);
                    }
                }
            }
        }

        Ok(order)
    }

    /// Number of live nodes (parameters included)
    pub fn live_node_count(&self) -> GraphResult<usize> {
        Ok(self.ordered_ops()?.len())
    }

    // ========================================================================
    // Validation
    // ========================================================================

    /// Check graph invariants over every non-eliminated node
    ///
    /// * arguments exist, are live and match the operation's arity
    /// * user lists mirror argument lists edge for edge
    /// * the name index resolves every node's name back to it
    /// * reshape orders are permutations and preserve element counts
    /// * results are acyclic
    pub fn validate(&self) -> GraphResult<()> {
        let user_map = build_user_map(self.graph.entries());

        for id in self.graph.active_node_ids() {
            let entry = self.graph.node(id)?;

            if entry.arguments.len() != entry.kind().arity() {
                return Err(GraphError::ArityMismatch {
                    op: entry.kind(),
                    expected: entry.kind().arity(),
                    actual: entry.arguments.len(),
                });
            }

            for &argument in &entry.arguments {
                if self.graph.node(argument)?.eliminated {
                    return Err(GraphError::invariant(format!(
                        "{} consumes eliminated node {}",
                        entry.name, argument
                    )));
                }
            }

            if self.graph.get_by_name(&entry.name) != Some(id) {
                return Err(GraphError::invariant(format!(
                    "name {} does not resolve to {}",
                    entry.name, id
                )));
            }

            let mut expected: Vec<NodeId> =
                user_map.get(&id).map(|u| u.to_vec()).unwrap_or_default();
            let mut recorded = entry.users.to_vec();
            expected.sort_unstable();
            recorded.sort_unstable();
            if expected != recorded {
                return Err(GraphError::invariant(format!(
                    "user list of {} is {:?}, arguments say {:?}",
                    entry.name, recorded, expected
                )));
            }

            if let Some(order) = entry.op.input_order() {
                let argument = self.graph.node(entry.arguments[0])?;
                if !is_permutation(order, argument.rank()) {
                    return Err(GraphError::InvalidPermutation {
                        order: order.to_vec(),
                        rank: argument.rank(),
                    });
                }
                if numel(&argument.shape) != numel(&entry.shape) {
                    return Err(GraphError::InvalidShape(format!(
                        "{} changes element count from {} to {}",
                        entry.name,
                        numel(&argument.shape),
                        numel(&entry.shape)
                    )));
                }
            }
        }

        self.ordered_ops().map(|_| ())
    }

    // ========================================================================
    // Structural comparison
    // ========================================================================

    fn canonical_form(&self) -> GraphResult<Vec<CanonicalNode>> {
        let order = self.ordered_ops()?;
        let positions: FxHashMap<NodeId, usize> = order
            .iter()
            .enumerate()
            .map(|(position, &id)| (id, position))
            .collect();

        order
            .iter()
            .map(|&id| {
                let entry = self.graph.node(id)?;
                let arguments = entry
                    .arguments
                    .iter()
                    .map(|argument| {
                        positions.get(argument).copied().ok_or_else(|| {
                            GraphError::invariant(format!("{} is not ordered", argument))
                        })
                    })
                    .collect::<GraphResult<_>>()?;
                Ok(CanonicalNode {
                    kind: entry.kind(),
                    input_order: entry.op.input_order().map(<[usize]>::to_vec),
                    shape: entry.shape.clone(),
                    element_type: entry.element_type,
                    arguments,
                })
            })
            .collect()
    }

    /// Hash of the live graph that ignores node ids and names
    ///
    /// Two functions with equal fingerprints are very likely structurally
    /// equal; use [`Function::structurally_eq`] to be sure.
    pub fn fingerprint(&self) -> GraphResult<u64> {
        let mut hasher = FxHasher::default();
        self.canonical_form()?.hash(&mut hasher);
        self.results.len().hash(&mut hasher);
        Ok(hasher.finish())
    }

    /// Whether two functions compute the same expression structure
    pub fn structurally_eq(&self, other: &Function) -> GraphResult<bool> {
        Ok(self.results.len() == other.results.len()
            && self.canonical_form()? == other.canonical_form()?)
    }
}
