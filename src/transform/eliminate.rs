//! Dead-node elimination
//!
//! Rewrites leave replaced nodes in the arena with their argument edges
//! intact. The sweep here detaches everything no longer reachable from the
//! function results, so abandoned subgraphs stop showing up as users.

use rustc_hash::FxHashSet;
use tracing::debug;

use crate::error::GraphResult;
use crate::graph::{Function, NodeId};
use crate::pattern::traversal::BfsIterator;

/// Whether a node can be eliminated by the sweep
///
/// Parameters and results are never eliminated; everything else must be
/// absent from `live`.
pub fn can_eliminate(function: &Function, live: &FxHashSet<NodeId>, node: NodeId) -> bool {
    let graph = function.graph();
    match graph.get(node) {
        Some(entry) => {
            !entry.eliminated
                && !live.contains(&node)
                && !function.parameters().contains(&node)
                && !function.results().contains(&node)
        }
        None => false,
    }
}

/// Eliminate nodes unreachable from the function results
///
/// Detaches each dead node from its arguments and marks it eliminated.
/// Because every user of a dead node is itself dead, all eliminated nodes
/// end with empty user lists.
///
/// # Returns
/// * Number of nodes eliminated
pub fn eliminate_dead_nodes(function: &mut Function) -> GraphResult<usize> {
    let graph = function.graph();
    let live: FxHashSet<NodeId> = function
        .results()
        .iter()
        .flat_map(|&result| BfsIterator::backward(graph, result))
        .collect();

    let dead: Vec<NodeId> = function
        .graph()
        .node_ids()
        .filter(|&id| can_eliminate(function, &live, id))
        .collect();

    let graph = function.graph_mut();
    for &node in &dead {
        graph.detach_node(node)?;
    }

    if !dead.is_empty() {
        debug!(eliminated = dead.len(), function = function.name(), "swept dead nodes");
    }
    Ok(dead.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{Graph, OpKind};
    use crate::tensor::ElementType;

    fn make_test_function() -> (Function, NodeId, Vec<NodeId>) {
        let mut graph = Graph::new();
        let x = graph.add_parameter("x", ElementType::F32, vec![2, 3]).unwrap();
        let t1 = graph.add_transpose(x, vec![1, 0]).unwrap();
        let t2 = graph.add_transpose(t1, vec![1, 0]).unwrap();
        let neg = graph.add_unary(OpKind::Negative, t2).unwrap();
        let r = graph.add_result(neg).unwrap();
        (Function::new("f", graph, vec![r]).unwrap(), x, vec![t1, t2, neg])
    }

    #[test]
    fn test_nothing_to_eliminate() {
        let (mut function, _, _) = make_test_function();
        assert_eq!(eliminate_dead_nodes(&mut function).unwrap(), 0);
        assert_eq!(function.graph().active_node_count(), 5);
    }

    #[test]
    fn test_eliminate_abandoned_chain() {
        let (mut function, x, nodes) = make_test_function();
        let (t1, t2, neg) = (nodes[0], nodes[1], nodes[2]);
        function.graph_mut().replace_node(t2, x).unwrap();

        // t1 still counts t2 as a user until the sweep
        assert_eq!(function.graph().users(t1), vec![t2]);

        let eliminated = eliminate_dead_nodes(&mut function).unwrap();

        assert_eq!(eliminated, 2);
        let graph = function.graph();
        assert!(graph.get(t1).unwrap().eliminated);
        assert!(graph.get(t2).unwrap().eliminated);
        assert!(graph.has_no_users(t1));
        assert!(graph.has_no_users(t2));
        assert_eq!(graph.users(x), vec![neg]);
        assert!(function.validate().is_ok());
    }

    #[test]
    fn test_unused_parameter_is_kept() {
        let mut graph = Graph::new();
        let x = graph.add_parameter("x", ElementType::F32, vec![4]).unwrap();
        let unused = graph.add_parameter("unused", ElementType::F32, vec![4]).unwrap();
        graph.add_unary(OpKind::Relu, unused).unwrap();
        let r = graph.add_result(x).unwrap();
        let mut function = Function::new("f", graph, vec![r]).unwrap();

        assert_eq!(eliminate_dead_nodes(&mut function).unwrap(), 1);
        assert!(!function.graph().get(unused).unwrap().eliminated);
        assert!(function.graph().has_no_users(unused));
    }
}
