//! Reshape elimination
//!
//! Three local rules over reshape nodes, tried in this order at every node:
//!
//! 1. identity reshape: `reshape(x) -> x` when the reshape is a no-op
//! 2. reshape pair: `reshape(reshape(x)) -> x` when the pair round-trips
//! 3. transpose of a product: `transpose(dot(a, b)) -> dot(transpose(b), transpose(a))`

#![allow(missing_docs)]

use tracing::debug;

use crate::error::GraphResult;
use crate::graph::{Function, OpKind};
use crate::pattern::{IsKind, Label, Matcher, Pattern};
use crate::tensor::transposed_2d;
use crate::traits::Transformer;
use crate::transform::{GraphRewrite, RewriteStats};

use super::common::{match_root, orders_cancel, replace_if_compatible};

/// `reshape(x) -> x` for reshapes with default order and unchanged shape
pub fn identity_reshape_matcher() -> Matcher {
    let operand = Label::new("operand");
    let pattern = Pattern::reshape(operand.pattern());

    Matcher::new("identity_reshape", pattern, move |graph, map| {
        let root = match_root(map)?;
        let view = graph.reshape(root)?;

        if !view.is_noop() {
            debug!(node = %root, order = ?view.input_order, "reshape is not a no-op");
            return Ok(false);
        }

        replace_if_compatible(graph, root, map.node(&operand)?)
    })
}

/// `reshape(reshape(x)) -> x` when the pair restores `x`
///
/// Accepted when the outer shape equals the shape of `x` and either both
/// reshapes use the default order, or both are pure transposes whose orders
/// cancel.
pub fn reshape_pair_matcher() -> Matcher {
    let operand = Label::new("operand");
    let inner = Label::new("inner").wrapping(Pattern::reshape(operand.pattern()));
    let pattern = Pattern::reshape(inner.pattern());

    Matcher::new("reshape_pair", pattern, move |graph, map| {
        let root = match_root(map)?;
        let operand = map.node(&operand)?;
        let outer = graph.reshape(root)?;
        let first = graph.reshape(map.node(&inner)?)?;

        if outer.shape != graph.node(operand)?.shape.as_slice() {
            debug!(node = %root, "reshape pair does not round-trip the shape");
            return Ok(false);
        }

        let shape_only = first.has_default_order() && outer.has_default_order();
        let transposes_cancel = first.is_pure_transpose()
            && outer.is_pure_transpose()
            && orders_cancel(first.input_order, outer.input_order);

        if !shape_only && !transposes_cancel {
            debug!(
                node = %root,
                first_order = ?first.input_order,
                second_order = ?outer.input_order,
                "reshape pair orders do not cancel"
            );
            return Ok(false);
        }

        replace_if_compatible(graph, root, operand)
    })
}

/// `transpose(dot(a, b)) -> dot(transpose(b), transpose(a))` for rank-2 operands
pub fn dot_transpose_matcher() -> Matcher {
    let lhs = Label::new("lhs");
    let rhs = Label::new("rhs");
    let product = Label::new("product")
        .with_predicate(IsKind(OpKind::Dot))
        .wrapping(Pattern::dot(lhs.pattern(), rhs.pattern()));
    let pattern = Pattern::reshape(product.pattern());

    Matcher::new("dot_transpose", pattern, move |graph, map| {
        let root = match_root(map)?;
        let view = graph.reshape(root)?;

        if !view.is_transpose_2d() {
            return Ok(false);
        }

        let lhs = map.node(&lhs)?;
        let rhs = map.node(&rhs)?;
        let product = graph.expect_kind(map.node(&product)?, OpKind::Dot)?;
        let lhs_shape = graph.node(lhs)?.shape.clone();
        let rhs_shape = graph.node(rhs)?.shape.clone();

        let (Some(lhs_t), Some(rhs_t)) = (transposed_2d(&lhs_shape), transposed_2d(&rhs_shape))
        else {
            debug!(node = %root, "dot operands are not rank 2");
            return Ok(false);
        };
        if product.rank() != 2 {
            return Ok(false);
        }

        // dot(b^T, a^T) has shape [b^T rows, a^T cols]
        let rewritten_shape = vec![rhs_t[0], lhs_t[1]];
        if rewritten_shape != view.shape {
            debug!(node = %root, "transposed product shape mismatch");
            return Ok(false);
        }

        let lhs_transposed = graph.add_transpose(lhs, vec![1, 0])?;
        let rhs_transposed = graph.add_transpose(rhs, vec![1, 0])?;
        let swapped = graph.add_dot(rhs_transposed, lhs_transposed)?;

        graph.replace_node(root, swapped)?;
        Ok(true)
    })
}

/// Local reshape and transpose elimination pass
#[derive(Debug)]
pub struct ReshapeElimination {
    pass: GraphRewrite,
}

impl ReshapeElimination {
    pub fn new() -> Self {
        let mut pass = GraphRewrite::new("ReshapeElimination");
        pass.add_matcher(identity_reshape_matcher())
            .add_matcher(reshape_pair_matcher())
            .add_matcher(dot_transpose_matcher());
        Self { pass }
    }

    /// The underlying rewrite pass
    pub fn pass(&self) -> &GraphRewrite {
        &self.pass
    }
}

impl Default for ReshapeElimination {
    fn default() -> Self {
        Self::new()
    }
}

impl Transformer for ReshapeElimination {
    fn name(&self) -> &'static str {
        "ReshapeElimination"
    }

    fn transform(&self, function: &mut Function) -> GraphResult<RewriteStats> {
        self.pass.run(function)
    }

    fn is_applicable(&self, function: &Function) -> bool {
        !function.graph().find_nodes_by_kind(OpKind::Reshape).is_empty()
    }
}
