//! Graph mutation operations
//!
//! Typed node construction with shape inference, the `replace_node`
//! rewiring primitive, and detaching of dead nodes.

use tracing::trace;

use crate::error::{GraphError, GraphResult};
use crate::tensor::{is_permutation, numel, permuted_shape, AxisVector, ElementType, Shape};

use super::context::Graph;
use super::maps::{NodeId, UserList};
use super::ops::{Op, OpKind};

impl Graph {
    // ========================================================================
    // Typed node construction
    // ========================================================================

    /// Add a function parameter
    pub fn add_parameter(
        &mut self,
        name: &str,
        element_type: ElementType,
        shape: impl Into<Shape>,
    ) -> GraphResult<NodeId> {
        self.insert_node(Op::Parameter, &[], shape.into(), element_type, Some(name))
    }

    /// Add a reshape: transpose `argument` by `input_order`, then reinterpret
    /// it as `output_shape`
    pub fn add_reshape(
        &mut self,
        argument: NodeId,
        input_order: impl Into<AxisVector>,
        output_shape: impl Into<Shape>,
    ) -> GraphResult<NodeId> {
        let input_order = input_order.into();
        let output_shape = output_shape.into();
        let entry = self.node(argument)?;

        if !is_permutation(&input_order, entry.rank()) {
            return Err(GraphError::InvalidPermutation {
                order: input_order,
                rank: entry.rank(),
            });
        }
        if numel(&output_shape) != numel(&entry.shape) {
            return Err(GraphError::InvalidShape(format!(
                "cannot reshape {:?} ({} elements) to {:?} ({} elements)",
                entry.shape,
                numel(&entry.shape),
                output_shape,
                numel(&output_shape)
            )));
        }

        let element_type = entry.element_type;
        self.insert_node(
            Op::Reshape { input_order },
            &[argument],
            output_shape,
            element_type,
            None,
        )
    }

    /// Add a pure transpose (a reshape whose output shape is the permuted
    /// argument shape)
    pub fn add_transpose(
        &mut self,
        argument: NodeId,
        input_order: impl Into<AxisVector>,
    ) -> GraphResult<NodeId> {
        let input_order = input_order.into();
        let entry = self.node(argument)?;
        let output_shape = permuted_shape(&entry.shape, &input_order).ok_or_else(|| {
            GraphError::InvalidPermutation {
                order: input_order.clone(),
                rank: entry.rank(),
            }
        })?;
        self.add_reshape(argument, input_order, output_shape)
    }

    /// Add a dot product contracting the last axis of `lhs` with the first
    /// axis of `rhs`
    pub fn add_dot(&mut self, lhs: NodeId, rhs: NodeId) -> GraphResult<NodeId> {
        let left = self.node(lhs)?;
        let right = self.node(rhs)?;

        if left.element_type != right.element_type {
            return Err(GraphError::ElementTypeMismatch {
                expected: left.element_type,
                actual: right.element_type,
            });
        }

        let (Some((&contracted_left, outer_left)), Some((&contracted_right, outer_right))) =
            (left.shape.split_last(), right.shape.split_first())
        else {
            return Err(GraphError::InvalidShape(format!(
                "dot operands must have rank >= 1, got {:?} and {:?}",
                left.shape, right.shape
            )));
        };
        if contracted_left != contracted_right {
            return Err(GraphError::InvalidShape(format!(
                "dot contraction mismatch: {:?} x {:?}",
                left.shape, right.shape
            )));
        }

        let mut output_shape = outer_left.to_vec();
        output_shape.extend_from_slice(outer_right);
        let element_type = left.element_type;

        self.insert_node(Op::Dot, &[lhs, rhs], output_shape, element_type, None)
    }

    /// Add an element-wise binary operation over equally shaped operands
    pub fn add_binary(&mut self, kind: OpKind, lhs: NodeId, rhs: NodeId) -> GraphResult<NodeId> {
        let op = Op::binary(kind).ok_or_else(|| {
            GraphError::UnsupportedOperation(format!("{kind} is not element-wise binary"))
        })?;
        let left = self.node(lhs)?;
        let right = self.node(rhs)?;

        if left.element_type != right.element_type {
            return Err(GraphError::ElementTypeMismatch {
                expected: left.element_type,
                actual: right.element_type,
            });
        }
        if left.shape != right.shape {
            return Err(GraphError::InvalidShape(format!(
                "{kind} operands differ in shape: {:?} vs {:?}",
                left.shape, right.shape
            )));
        }

        let shape = left.shape.clone();
        let element_type = left.element_type;
        self.insert_node(op, &[lhs, rhs], shape, element_type, None)
    }

    /// Add an element-wise unary operation
    pub fn add_unary(&mut self, kind: OpKind, argument: NodeId) -> GraphResult<NodeId> {
        let op = Op::unary(kind).ok_or_else(|| {
            GraphError::UnsupportedOperation(format!("{kind} is not element-wise unary"))
        })?;
        let entry = self.node(argument)?;
        let shape = entry.shape.clone();
        let element_type = entry.element_type;
        self.insert_node(op, &[argument], shape, element_type, None)
    }

    /// Add a function result over `argument`
    pub fn add_result(&mut self, argument: NodeId) -> GraphResult<NodeId> {
        let entry = self.node(argument)?;
        let shape = entry.shape.clone();
        let element_type = entry.element_type;
        self.insert_node(Op::Result, &[argument], shape, element_type, None)
    }

    // ========================================================================
    // Rewiring
    // ========================================================================

    /// Rewire every consumer of `target` to consume `replacement` instead
    ///
    /// The caller must have checked that `replacement` produces a value of the
    /// same shape and element type. All preconditions are verified before any
    /// edge is touched, so an `Err` leaves the graph unchanged.
    ///
    /// # Returns
    /// * Number of argument edges rewired
    ///
    /// # Errors
    /// * `NodeNotFound` for unknown ids
    /// * `SelfReplacement` when both ids are equal
    /// * `InvariantViolation` when a recorded user does not hold `target` as
    ///   an argument the recorded number of times, or `replacement` was eliminated
    /// * `CycleDetected` when `replacement` depends on `target`
    pub fn replace_node(&mut self, target: NodeId, replacement: NodeId) -> GraphResult<usize> {
        let target_entry = self.node(target)?;
        let replacement_entry = self.node(replacement)?;

        if target == replacement {
            return Err(GraphError::SelfReplacement(target));
        }
        if replacement_entry.eliminated {
            return Err(GraphError::invariant(format!(
                "replacement {} was eliminated",
                replacement_entry.name
            )));
        }

        let edges: UserList = target_entry.users.clone();
        let mut users = edges.to_vec();
        users.sort_unstable();
        users.dedup();

        for &user in &users {
            let recorded = edges.iter().filter(|&&u| u == user).count();
            let actual = self
                .arguments(user)
                .iter()
                .filter(|&&a| a == target)
                .count();
            if recorded != actual {
                return Err(GraphError::invariant(format!(
                    "{} is recorded {} time(s) as a user of {} but holds it as an argument {} time(s)",
                    user, recorded, target, actual
                )));
            }
        }

        if self.depends_on(replacement, target) {
            return Err(GraphError::CycleDetected {
                target,
                replacement,
            });
        }

        for &user in &users {
            for argument in self.entry_mut(user)?.arguments.iter_mut() {
                if *argument == target {
                    *argument = replacement;
                }
            }
        }

        let moved = std::mem::take(&mut self.entry_mut(target)?.users);
        let rewired = moved.len();
        self.entry_mut(replacement)?.users.extend(moved);

        trace!(%target, %replacement, rewired, "replaced node");
        Ok(rewired)
    }

    /// Detach a node from its arguments and mark it eliminated
    ///
    /// Used by the liveness sweep; the node's own users must be detached too
    /// (or be absent) for the graph to stay consistent.
    pub(crate) fn detach_node(&mut self, id: NodeId) -> GraphResult<()> {
        let arguments = std::mem::take(&mut self.entry_mut(id)?.arguments);

        for argument in arguments {
            let users = &mut self.entry_mut(argument)?.users;
            if let Some(position) = users.iter().position(|&u| u == id) {
                users.remove(position);
            }
        }

        self.entry_mut(id)?.mark_eliminated();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::Function;
    use proptest::prelude::*;
    use proptest::sample::Index;

    fn make_test_graph() -> (Graph, NodeId, NodeId, NodeId, NodeId) {
        let mut graph = Graph::new();
        let x = graph.add_parameter("x", ElementType::F32, vec![2, 3]).unwrap();
        let reshape = graph.add_reshape(x, vec![0, 1], vec![3, 2]).unwrap();
        let relu = graph.add_unary(OpKind::Relu, reshape).unwrap();
        let neg = graph.add_unary(OpKind::Negative, reshape).unwrap();
        (graph, x, reshape, relu, neg)
    }

    #[test]
    fn test_add_reshape_validates_order() {
        let mut graph = Graph::new();
        let x = graph.add_parameter("x", ElementType::F32, vec![2, 3]).unwrap();

        let err = graph.add_reshape(x, vec![0], vec![6]).unwrap_err();
        assert!(matches!(err, GraphError::InvalidPermutation { rank: 2, .. }));

        let err = graph.add_reshape(x, vec![0, 1], vec![7]).unwrap_err();
        assert!(matches!(err, GraphError::InvalidShape(_)));

        assert_eq!(graph.len(), 1);
    }

    #[test]
    fn test_add_transpose_permutes_shape() {
        let mut graph = Graph::new();
        let x = graph.add_parameter("x", ElementType::F32, vec![2, 3, 4]).unwrap();
        let t = graph.add_transpose(x, vec![2, 0, 1]).unwrap();

        assert_eq!(graph.shape(t), Some(&[4, 2, 3][..]));
        assert_eq!(
            graph.get(t).unwrap().op.input_order(),
            Some(&[2, 0, 1][..])
        );
    }

    #[test]
    fn test_add_dot_shapes() {
        let mut graph = Graph::new();
        let a = graph.add_parameter("a", ElementType::F32, vec![2, 3]).unwrap();
        let b = graph.add_parameter("b", ElementType::F32, vec![3, 4]).unwrap();
        let v = graph.add_parameter("v", ElementType::F32, vec![4]).unwrap();

        let ab = graph.add_dot(a, b).unwrap();
        assert_eq!(graph.shape(ab), Some(&[2, 4][..]));

        let abv = graph.add_dot(ab, v).unwrap();
        assert_eq!(graph.shape(abv), Some(&[2][..]));

        assert!(matches!(
            graph.add_dot(a, a),
            Err(GraphError::InvalidShape(_))
        ));
    }

    #[test]
    fn test_add_binary_checks_types() {
        let mut graph = Graph::new();
        let a = graph.add_parameter("a", ElementType::F32, vec![2]).unwrap();
        let b = graph.add_parameter("b", ElementType::I32, vec![2]).unwrap();

        assert!(matches!(
            graph.add_binary(OpKind::Add, a, b),
            Err(GraphError::ElementTypeMismatch { .. })
        ));
        assert!(matches!(
            graph.add_binary(OpKind::Relu, a, a),
            Err(GraphError::UnsupportedOperation(_))
        ));
    }

    #[test]
    fn test_replace_node() {
        let (mut graph, x, reshape, relu, neg) = make_test_graph();
        let other = graph.add_parameter("y", ElementType::F32, vec![3, 2]).unwrap();
        let extra = graph.add_unary(OpKind::Relu, other).unwrap();

        let rewired = graph.replace_node(reshape, other).unwrap();

        assert_eq!(rewired, 2);
        assert_eq!(graph.arguments(relu), &[other]);
        assert_eq!(graph.arguments(neg), &[other]);
        assert!(graph.has_no_users(reshape));
        assert_eq!(graph.users(other), vec![relu, neg, extra]);
        // the replaced node still points at its own argument
        assert_eq!(graph.users(x), vec![reshape]);
    }

    #[test]
    fn test_replace_node_repeated_argument() {
        let mut graph = Graph::new();
        let x = graph.add_parameter("x", ElementType::F32, vec![4]).unwrap();
        let y = graph.add_parameter("y", ElementType::F32, vec![4]).unwrap();
        let neg = graph.add_unary(OpKind::Negative, x).unwrap();
        let sum = graph.add_binary(OpKind::Add, neg, neg).unwrap();

        assert_eq!(graph.replace_node(neg, y).unwrap(), 2);
        assert_eq!(graph.arguments(sum), &[y, y]);
        assert_eq!(graph.user_edges(y), &[sum, sum]);
    }

    #[test]
    fn test_replace_node_rejects_self() {
        let (mut graph, _, reshape, _, _) = make_test_graph();
        assert_eq!(
            graph.replace_node(reshape, reshape),
            Err(GraphError::SelfReplacement(reshape))
        );
    }

    #[test]
    fn test_replace_node_rejects_cycle() {
        let (mut graph, _, reshape, relu, neg) = make_test_graph();
        let before = graph.users(reshape);

        let err = graph.replace_node(reshape, relu).unwrap_err();

        assert!(matches!(err, GraphError::CycleDetected { .. }));
        // nothing was rewired
        assert_eq!(graph.users(reshape), before);
        assert_eq!(graph.arguments(neg), &[reshape]);
    }

    #[test]
    fn test_replace_node_detects_inconsistent_users() {
        let (mut graph, x, reshape, relu, _) = make_test_graph();
        // corrupt the argument list behind the user list's back
        graph.entry_mut(relu).unwrap().arguments[0] = x;

        let err = graph.replace_node(reshape, x).unwrap_err();
        assert!(err.is_invariant_violation());
    }

    #[test]
    fn test_detach_node() {
        let (mut graph, _, reshape, relu, neg) = make_test_graph();
        graph.detach_node(relu).unwrap();

        assert!(graph.get(relu).unwrap().eliminated);
        assert!(graph.arguments(relu).is_empty());
        assert_eq!(graph.users(reshape), vec![neg]);
        assert_eq!(graph.active_node_count(), 3);
    }

    /// Two parameters followed by random unary and binary nodes over `[4]`;
    /// kind 3 always repeats its argument
    fn make_random_dag(ops: &[(u8, Index, Index)]) -> (Graph, Vec<NodeId>) {
        let mut graph = Graph::new();
        let mut nodes = vec![
            graph.add_parameter("p0", ElementType::F32, vec![4]).unwrap(),
            graph.add_parameter("p1", ElementType::F32, vec![4]).unwrap(),
        ];
        for (kind, lhs, rhs) in ops {
            let lhs = nodes[lhs.index(nodes.len())];
            let rhs = nodes[rhs.index(nodes.len())];
            let node = match kind {
                0 => graph.add_unary(OpKind::Negative, lhs),
                1 => graph.add_unary(OpKind::Relu, lhs),
                2 => graph.add_binary(OpKind::Add, lhs, rhs),
                _ => graph.add_binary(OpKind::Multiply, lhs, lhs),
            }
            .unwrap();
            nodes.push(node);
        }
        (graph, nodes)
    }

    proptest! {
        #[test]
        fn prop_replace_node_consistency(
            ops in prop::collection::vec((0u8..4, any::<Index>(), any::<Index>()), 1..12),
            target in any::<Index>(),
            replacement in any::<Index>(),
        ) {
            let (mut graph, nodes) = make_random_dag(&ops);
            let last = nodes[nodes.len() - 1];
            let result = graph.add_result(last).unwrap();
            let mut function = Function::new("f", graph, vec![result]).unwrap();

            let target = nodes[target.index(nodes.len())];
            let replacement = nodes[replacement.index(nodes.len())];
            let graph = function.graph_mut();

            let target_edges = graph.user_edges(target).to_vec();
            let replacement_edges = graph.user_edges(replacement).to_vec();
            let positions: Vec<(NodeId, Vec<usize>)> = graph
                .users(target)
                .into_iter()
                .map(|user| {
                    let at = graph
                        .arguments(user)
                        .iter()
                        .enumerate()
                        .filter(|&(_, &argument)| argument == target)
                        .map(|(position, _)| position)
                        .collect();
                    (user, at)
                })
                .collect();

            if target == replacement {
                prop_assert_eq!(
                    graph.replace_node(target, replacement),
                    Err(GraphError::SelfReplacement(target))
                );
                return Ok(());
            }
            if graph.depends_on(replacement, target) {
                let err = graph.replace_node(target, replacement).unwrap_err();
                prop_assert!(
                    matches!(err, GraphError::CycleDetected { .. }),
                    "unexpected error: {:?}",
                    err
                );
                prop_assert_eq!(graph.user_edges(target), target_edges.as_slice());
                return Ok(());
            }

            let rewired = graph.replace_node(target, replacement).unwrap();
            prop_assert_eq!(rewired, target_edges.len());

            let mut expected = replacement_edges;
            expected.extend(target_edges);
            expected.sort_unstable();
            let mut actual = graph.user_edges(replacement).to_vec();
            actual.sort_unstable();
            prop_assert_eq!(actual, expected);

            for (user, at) in positions {
                for position in at {
                    prop_assert_eq!(graph.arguments(user)[position], replacement);
                }
                prop_assert!(!graph.arguments(user).contains(&target));
            }
            prop_assert!(graph.has_no_users(target));
            prop_assert!(function.validate().is_ok());
        }
    }
}
