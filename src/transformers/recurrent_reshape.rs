//! Recurrent reshape elimination
//!
//! Collapses a chain of default-order reshapes in one step, whatever its
//! length. The chain is found by a [`RecurrentMatcher`] seeded at the
//! reshape nearest the consumers; every later link must have that previous
//! link as its only user. Links are restricted to default-order reshapes, so
//! a chain ends at the first transposing reshape.

#![allow(missing_docs)]

use tracing::debug;

use crate::error::GraphResult;
use crate::graph::{Function, Graph, OpKind};
use crate::pattern::{FnPredicate, Label, Pattern, RecurrentMatcher};
use crate::tensor::default_order;
use crate::traits::Transformer;
use crate::transform::{GraphRewrite, RewriteStats};

use super::common::replace_if_compatible;

/// Chain rule: `reshape(reshape(...reshape(x)))` with default orders
///
/// The seed (outermost link) is replaced by `x` when the shapes agree, or
/// by a single default-order reshape of `x` otherwise. A transposing reshape
/// never binds as a link.
pub fn recurrent_reshape_matcher(max_chain_length: Option<usize>) -> RecurrentMatcher {
    let operand = Label::new("operand");
    let link = Label::new("link")
        .with_predicate(FnPredicate::new("default_order", |graph: &Graph, node| {
            graph.reshape(node).is_ok_and(|view| view.has_default_order())
        }))
        .wrapping(Pattern::reshape(operand.pattern()));

    let links = link.clone();
    let operands = operand.clone();

    RecurrentMatcher::new(
        "recurrent_reshape",
        link.pattern(),
        link,
        operand,
        Vec::new(),
        move |graph, chain| {
            let bound = chain.bound_nodes(&links);
            let drivers = chain.bound_nodes(&operands);
            let collapsible = bound.len();

            let (Some(&sink), Some(&driver)) = (bound.first(), drivers.last()) else {
                return Ok(false);
            };
            let sink_shape = graph.node(sink)?.shape.clone();
            let driver_rank = graph.node(driver)?.rank();

            if graph.node(driver)?.shape == sink_shape {
                debug!(%sink, %driver, length = collapsible, "reshape chain is a no-op");
                return replace_if_compatible(graph, sink, driver);
            }

            if collapsible < 2 {
                return Ok(false);
            }

            debug!(%sink, %driver, length = collapsible, "collapsing reshape chain");
            let single = graph.add_reshape(driver, default_order(driver_rank), sink_shape)?;
            replace_if_compatible(graph, sink, single)
        },
    )
    .with_max_length(max_chain_length)
}

/// Reshape-chain collapse pass
#[derive(Debug)]
pub struct RecurrentReshapeElimination {
    pass: GraphRewrite,
}

impl RecurrentReshapeElimination {
    pub fn new() -> Self {
        Self::with_max_chain_length(None)
    }

    /// Bound the number of links collapsed at once
    pub fn with_max_chain_length(max_chain_length: Option<usize>) -> Self {
        let mut pass = GraphRewrite::new("RecurrentReshapeElimination");
        pass.add_recurrent_matcher(recurrent_reshape_matcher(max_chain_length));
        Self { pass }
    }

    /// The underlying rewrite pass
    pub fn pass(&self) -> &GraphRewrite {
        &self.pass
    }
}

impl Default for RecurrentReshapeElimination {
    fn default() -> Self {
        Self::new()
    }
}

impl Transformer for RecurrentReshapeElimination {
    fn name(&self) -> &'static str {
        "RecurrentReshapeElimination"
    }

    fn transform(&self, function: &mut Function) -> GraphResult<RewriteStats> {
        self.pass.run(function)
    }

    fn is_applicable(&self, function: &Function) -> bool {
        !function.graph().find_nodes_by_kind(OpKind::Reshape).is_empty()
    }
}
