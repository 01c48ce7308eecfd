//! Common utilities for transformers
//!
//! Shared helper functions used by the reshape passes.

use tracing::debug;

use crate::error::{GraphError, GraphResult};
use crate::graph::{Function, Graph, NodeId};
use crate::pattern::PatternMap;
use crate::tensor::{compose_orders, is_default_order};
use crate::traits::Transformer;
use crate::transform::RewriteStats;

/// Root node of a match
pub fn match_root(map: &PatternMap) -> GraphResult<NodeId> {
    map.root()
        .ok_or_else(|| GraphError::invariant("pattern map has no root"))
}

/// Whether applying `first` and then `second` restores the original axis order
pub fn orders_cancel(first: &[usize], second: &[usize]) -> bool {
    compose_orders(first, second).is_some_and(|composed| is_default_order(&composed))
}

/// Replace `target` by `replacement` if both produce the same shape and type
///
/// # Returns
/// * `Ok(true)` after rewiring
/// * `Ok(false)` when the values are incompatible; nothing is changed
pub fn replace_if_compatible(
    graph: &mut Graph,
    target: NodeId,
    replacement: NodeId,
) -> GraphResult<bool> {
    let target_entry = graph.node(target)?;
    let replacement_entry = graph.node(replacement)?;

    if target_entry.shape != replacement_entry.shape
        || target_entry.element_type != replacement_entry.element_type
    {
        debug!(
            %target,
            %replacement,
            target_shape = ?target_entry.shape,
            replacement_shape = ?replacement_entry.shape,
            "replacement rejected: incompatible value"
        );
        return Ok(false);
    }

    graph.replace_node(target, replacement)?;
    Ok(true)
}

/// Run multiple transformers in sequence
pub fn run_transformers(
    function: &mut Function,
    transformers: &[&dyn Transformer],
) -> GraphResult<RewriteStats> {
    let mut total = RewriteStats::new();

    for transformer in transformers {
        if transformer.is_applicable(function) {
            let stats = transformer.transform(function)?;
            total.merge(stats);
        }
    }

    Ok(total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::OpKind;
    use crate::tensor::ElementType;

    #[test]
    fn test_orders_cancel() {
        assert!(orders_cancel(&[1, 0], &[1, 0]));
        assert!(orders_cancel(&[1, 2, 0], &[2, 0, 1]));
        assert!(!orders_cancel(&[1, 2, 0], &[1, 2, 0]));
        assert!(!orders_cancel(&[1, 0], &[0, 1, 2]));
    }

    #[test]
    fn test_replace_if_compatible() {
        let mut graph = Graph::new();
        let x = graph.add_parameter("x", ElementType::F32, vec![2, 3]).unwrap();
        let t = graph.add_transpose(x, vec![1, 0]).unwrap();
        let id = graph.add_reshape(x, vec![0, 1], vec![2, 3]).unwrap();
        let n = graph.add_unary(OpKind::Negative, id).unwrap();
        let m = graph.add_unary(OpKind::Negative, t).unwrap();

        // [3, 2] cannot stand in for [2, 3]
        assert!(!replace_if_compatible(&mut graph, t, x).unwrap());
        assert_eq!(graph.arguments(m), &[t]);

        assert!(replace_if_compatible(&mut graph, id, x).unwrap());
        assert_eq!(graph.arguments(n), &[x]);
    }
}
